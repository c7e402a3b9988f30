//! Build archive verification and installation

use crate::{Emulator, EmulatorError};
use emuhub_config::{VersionKey, VersionStore};
use emuhub_progress::ProgressHandle;
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tar::Archive;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArchiveKind {
    Zip,
    TarGz,
}

fn archive_kind(path: &Path) -> Result<ArchiveKind, EmulatorError> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();

    if name.ends_with(".zip") {
        Ok(ArchiveKind::Zip)
    } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        Ok(ArchiveKind::TarGz)
    } else {
        Err(EmulatorError::UnsupportedArchive(path.to_path_buf()))
    }
}

/// Check that an archive actually contains a build of this emulator
///
/// A build is recognized by its executable entry, for example
/// `publish/Ryujinx.exe` or `Dolphin.exe`.
pub fn verify_build_archive(emulator: &Emulator, path: &Path) -> Result<(), EmulatorError> {
    if !path.is_file() {
        return Err(EmulatorError::InvalidArchive(format!(
            "{} is not a file",
            path.display()
        )));
    }

    let markers = emulator.archive_markers();
    let found = match archive_kind(path)? {
        ArchiveKind::Zip => {
            let archive = zip::ZipArchive::new(File::open(path)?)?;
            archive
                .file_names()
                .any(|name| markers.contains(&name.trim_start_matches("./")))
        }
        ArchiveKind::TarGz => {
            let mut archive = Archive::new(GzDecoder::new(BufReader::new(File::open(path)?)));
            let mut found = false;
            for entry in archive.entries()? {
                let entry = entry?;
                let entry_path = entry.path()?;
                let name = entry_path.to_string_lossy();
                if markers.contains(&name.trim_start_matches("./")) {
                    found = true;
                    break;
                }
            }
            found
        }
    };

    if found {
        Ok(())
    } else {
        Err(EmulatorError::InvalidArchive(format!(
            "no {} executable inside {}",
            emulator.id().display_name(),
            path.display()
        )))
    }
}

/// Install an emulator build from a release or local archive
///
/// The emulator's build root is wiped first, so a reinstall replaces the old
/// build. Cancellation between entries removes the partly extracted build
/// root. On success the version is recorded in the store; pass an empty
/// version for local archives of unknown origin.
pub fn install_build(
    emulator: &Emulator,
    archive_path: &Path,
    version: &str,
    versions: &mut VersionStore,
    progress: &ProgressHandle,
) -> Result<PathBuf, EmulatorError> {
    let build_root = emulator.build_root();
    if build_root.exists() {
        tracing::info!("Removing previous build at {}", build_root.display());
        fs::remove_dir_all(&build_root)?;
    }
    fs::create_dir_all(emulator.install_directory())?;

    tracing::info!(
        "Installing {} from {}",
        emulator.id().display_name(),
        archive_path.display()
    );

    match archive_kind(archive_path)? {
        ArchiveKind::Zip => extract_zip(emulator, archive_path, &build_root, progress)?,
        ArchiveKind::TarGz => extract_tar_gz(emulator, archive_path, &build_root, progress)?,
    }

    versions.set(VersionKey::Build(emulator.id()), version)?;
    progress.finish();
    tracing::info!(
        "{} installed to {}",
        emulator.id().display_name(),
        build_root.display()
    );
    Ok(build_root)
}

fn extract_zip(
    emulator: &Emulator,
    archive_path: &Path,
    build_root: &Path,
    progress: &ProgressHandle,
) -> Result<(), EmulatorError> {
    let mut archive = zip::ZipArchive::new(File::open(archive_path)?)?;
    let install_dir = emulator.install_directory();

    progress.begin(
        &format!("Installing {}", emulator.id().display_name()),
        archive.len() as u64,
        "files",
    );
    progress.set_status("Extracting...");

    for i in 0..archive.len() {
        if progress.is_cancelled() {
            let _ = fs::remove_dir_all(build_root);
            tracing::info!("Build install cancelled, removed {}", build_root.display());
            return Err(EmulatorError::Cancelled);
        }

        let mut entry = archive.by_index(i)?;
        let Some(relative) = entry.enclosed_name() else {
            return Err(EmulatorError::InvalidArchive(format!(
                "unsafe entry path {:?}",
                entry.name()
            )));
        };
        let destination = install_dir.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&destination)?;
        } else {
            if let Some(parent) = destination.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut out = File::create(&destination)?;
            std::io::copy(&mut entry, &mut out)?;
        }
        progress.advance(1);
    }

    Ok(())
}

fn extract_tar_gz(
    emulator: &Emulator,
    archive_path: &Path,
    build_root: &Path,
    progress: &ProgressHandle,
) -> Result<(), EmulatorError> {
    let file = File::open(archive_path)?;
    let mut archive = Archive::new(GzDecoder::new(BufReader::new(file)));
    let install_dir = emulator.install_directory();

    // Entry count is unknown without reading the stream twice
    progress.begin(
        &format!("Installing {}", emulator.id().display_name()),
        0,
        "files",
    );
    progress.set_status("Extracting...");

    for entry in archive.entries()? {
        if progress.is_cancelled() {
            let _ = fs::remove_dir_all(build_root);
            tracing::info!("Build install cancelled, removed {}", build_root.display());
            return Err(EmulatorError::Cancelled);
        }

        let mut entry = entry?;
        entry.unpack_in(install_dir)?;
        progress.advance(1);
    }

    Ok(())
}

/// Remove an installed build, keeping user data intact
pub fn delete_build(emulator: &Emulator, versions: &mut VersionStore) -> Result<(), EmulatorError> {
    let build_root = emulator.build_root();
    if !build_root.exists() {
        return Err(EmulatorError::NotInstalled(emulator.id()));
    }

    fs::remove_dir_all(&build_root)?;
    versions.clear(VersionKey::Build(emulator.id()))?;
    tracing::info!("Deleted build at {}", build_root.display());
    Ok(())
}

/// Version of the installed build, if one is present
///
/// `Some("")` means a build is installed but its version is unknown, which
/// happens after installing a local archive.
pub fn installed_version(emulator: &Emulator, versions: &VersionStore) -> Option<String> {
    if !emulator.is_installed() {
        return None;
    }
    Some(
        versions
            .get(VersionKey::Build(emulator.id()))
            .unwrap_or_default()
            .to_string(),
    )
}
