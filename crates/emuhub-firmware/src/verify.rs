//! Archive verification and installed-state checks

use crate::{FirmwareError, SwitchPaths};
use std::fs::File;
use std::path::Path;

/// Summary of a verified firmware archive
#[derive(Debug, Clone)]
pub struct FirmwareArchiveInfo {
    pub entries: usize,
    pub uncompressed_size: u64,
}

/// Which key files are present
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyPresence {
    pub prod: bool,
    pub title: bool,
}

impl KeyPresence {
    pub fn any(&self) -> bool {
        self.prod || self.title
    }
}

/// Verify that an archive is a plausible firmware bundle
///
/// Firmware archives contain nothing but NCA content files; a single
/// foreign entry rejects the whole archive.
pub fn verify_firmware_archive(path: &Path) -> Result<FirmwareArchiveInfo, FirmwareError> {
    if !path.is_file() {
        return Err(FirmwareError::NotFound(path.to_path_buf()));
    }
    if path.extension().is_none_or(|e| e != "zip") {
        return Err(FirmwareError::InvalidArchive(
            "firmware archives must be .zip files".into(),
        ));
    }

    let file = File::open(path)?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| FirmwareError::InvalidArchive(e.to_string()))?;

    if archive.is_empty() {
        return Err(FirmwareError::InvalidArchive("archive is empty".into()));
    }

    let mut uncompressed_size = 0u64;
    for i in 0..archive.len() {
        let entry = archive.by_index(i)?;
        if !entry.name().ends_with(".nca") {
            return Err(FirmwareError::InvalidArchive(format!(
                "unexpected entry {:?}",
                entry.name()
            )));
        }
        uncompressed_size += entry.size();
    }

    Ok(FirmwareArchiveInfo {
        entries: archive.len(),
        uncompressed_size,
    })
}

/// Verify a key file or key archive, reporting which keys it carries
///
/// A bare file named `prod.keys` or `title.keys` passes as-is; anything
/// else must be a zip with at least one of the two at its root.
pub fn verify_key_archive(path: &Path) -> Result<KeyPresence, FirmwareError> {
    if !path.is_file() {
        return Err(FirmwareError::NotFound(path.to_path_buf()));
    }

    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    match file_name {
        "prod.keys" => {
            return Ok(KeyPresence {
                prod: true,
                title: false,
            });
        }
        "title.keys" => {
            return Ok(KeyPresence {
                prod: false,
                title: true,
            });
        }
        _ => {}
    }

    if path.extension().is_none_or(|e| e != "zip") {
        return Err(FirmwareError::InvalidKeys(
            "expected prod.keys, title.keys or a .zip archive".into(),
        ));
    }

    let file = File::open(path)?;
    let mut archive =
        zip::ZipArchive::new(file).map_err(|e| FirmwareError::InvalidKeys(e.to_string()))?;

    let mut presence = KeyPresence::default();
    for i in 0..archive.len() {
        let entry = archive.by_index(i)?;
        match entry.name() {
            "prod.keys" => presence.prod = true,
            "title.keys" => presence.title = true,
            _ => {}
        }
    }

    if !presence.any() {
        return Err(FirmwareError::InvalidKeys(
            "archive contains neither prod.keys nor title.keys".into(),
        ));
    }

    Ok(presence)
}

/// Whether any firmware content is installed
pub fn firmware_installed(paths: &SwitchPaths) -> bool {
    let dir = &paths.firmware_dir;
    dir.is_dir()
        && dir
            .read_dir()
            .map(|mut entries| entries.next().is_some())
            .unwrap_or(false)
}

/// Which key files are installed
pub fn installed_keys(paths: &SwitchPaths) -> KeyPresence {
    KeyPresence {
        prod: paths.key_dir.join("prod.keys").is_file(),
        title: paths.key_dir.join("title.keys").is_file(),
    }
}
