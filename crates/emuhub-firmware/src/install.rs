//! Firmware and key installation with rollback

use crate::layout::nca_id;
use crate::{ContentLayout, FirmwareError, SwitchPaths};
use emuhub_progress::ProgressHandle;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Result of a firmware install
#[derive(Debug, Clone, Default)]
pub struct FirmwareInstallOutcome {
    /// Content files written
    pub installed: usize,
    /// Archive entries that were not NCA content and were left out
    pub skipped: Vec<String>,
}

/// Result of a key install
#[derive(Debug, Clone, Default)]
pub struct KeyInstallOutcome {
    /// Entry names extracted into the key directory
    pub extracted: Vec<String>,
    /// Whether `prod.keys` was among them (callers warn when it was not)
    pub has_prod_keys: bool,
}

/// Install a firmware archive into the emulator's content directory
///
/// Any existing firmware is removed first, so an install over old firmware
/// replaces it wholesale. Entries that are not NCA content are skipped,
/// recorded in the outcome and subtracted from the progress total.
/// Cancellation rolls back by deleting the whole content directory; an I/O
/// or zip error aborts with the directory left for the next install to
/// wipe.
pub fn install_firmware(
    archive_path: &Path,
    paths: &SwitchPaths,
    progress: &ProgressHandle,
) -> Result<FirmwareInstallOutcome, FirmwareError> {
    let file = File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file)?;

    let firmware_dir = &paths.firmware_dir;
    if firmware_dir.exists() {
        fs::remove_dir_all(firmware_dir)?;
    }
    fs::create_dir_all(firmware_dir)?;

    let mut total = archive.len() as u64;
    progress.begin("Installing firmware", total, "files");
    progress.set_status("Extracting...");
    tracing::info!(
        "Installing firmware from {} ({} entries)",
        archive_path.display(),
        total
    );

    let mut outcome = FirmwareInstallOutcome::default();

    for i in 0..archive.len() {
        if progress.is_cancelled() {
            fs::remove_dir_all(firmware_dir)?;
            tracing::info!("Firmware install cancelled, removed {}", firmware_dir.display());
            return Err(FirmwareError::Cancelled);
        }

        let mut entry = archive.by_index(i)?;
        let name = entry.name().to_string();

        let Some(content_id) = nca_id(&name) else {
            tracing::debug!("Skipping non-content entry {:?}", name);
            total -= 1;
            progress.set_total(total);
            outcome.skipped.push(name);
            continue;
        };

        match paths.layout {
            ContentLayout::Registered => {
                let content_dir = firmware_dir.join(&content_id);
                fs::create_dir_all(&content_dir)?;
                let mut out = File::create(content_dir.join("00"))?;
                std::io::copy(&mut entry, &mut out)?;
            }
            ContentLayout::Flat => {
                let mut out = File::create(firmware_dir.join(&content_id))?;
                std::io::copy(&mut entry, &mut out)?;
            }
        }

        outcome.installed += 1;
        progress.advance(1);
    }

    progress.finish();
    tracing::info!(
        "Installed {} content files to {} ({} skipped)",
        outcome.installed,
        firmware_dir.display(),
        outcome.skipped.len()
    );
    Ok(outcome)
}

/// Extract a key archive into the emulator's key directory
///
/// Every entry is extracted, creating parent directories as needed.
/// Cancellation unlinks the files extracted so far.
pub fn install_keys_from_archive(
    archive_path: &Path,
    paths: &SwitchPaths,
    progress: &ProgressHandle,
) -> Result<KeyInstallOutcome, FirmwareError> {
    let file = File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file)?;

    let key_dir = &paths.key_dir;
    fs::create_dir_all(key_dir)?;

    progress.begin("Installing keys", archive.len() as u64, "files");
    progress.set_status("Extracting...");

    let mut outcome = KeyInstallOutcome::default();
    let mut extracted_paths: Vec<PathBuf> = Vec::new();

    for i in 0..archive.len() {
        if progress.is_cancelled() {
            for path in &extracted_paths {
                let _ = fs::remove_file(path);
            }
            tracing::info!(
                "Key install cancelled, removed {} extracted files",
                extracted_paths.len()
            );
            return Err(FirmwareError::Cancelled);
        }

        let mut entry = archive.by_index(i)?;
        let Some(relative) = entry.enclosed_name() else {
            return Err(FirmwareError::InvalidKeys(format!(
                "unsafe entry path {:?}",
                entry.name()
            )));
        };
        let destination = key_dir.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&destination)?;
            continue;
        }
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut out = File::create(&destination)?;
        std::io::copy(&mut entry, &mut out)?;

        if entry.name() == "prod.keys" {
            outcome.has_prod_keys = true;
        }
        outcome.extracted.push(entry.name().to_string());
        extracted_paths.push(destination);
        progress.advance(1);
    }

    progress.finish();
    tracing::info!(
        "Extracted {} key files to {}",
        outcome.extracted.len(),
        key_dir.display()
    );
    Ok(outcome)
}

/// Copy a bare key file into the emulator's key directory
pub fn install_key_file(source: &Path, paths: &SwitchPaths) -> Result<PathBuf, FirmwareError> {
    if !source.is_file() {
        return Err(FirmwareError::NotFound(source.to_path_buf()));
    }
    let name = source
        .file_name()
        .ok_or_else(|| FirmwareError::InvalidKeys("key file has no name".into()))?;

    fs::create_dir_all(&paths.key_dir)?;
    let destination = paths.key_dir.join(name);
    fs::copy(source, &destination)?;

    tracing::info!("Copied {} to {}", source.display(), destination.display());
    Ok(destination)
}
