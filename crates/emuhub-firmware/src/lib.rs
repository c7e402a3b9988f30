//! Switch firmware and key installation for EmuHub
//!
//! Firmware ships as a zip of NCA content files which must land in the
//! emulator's content directory under its own layout; keys ship as a zip
//! (or a bare `prod.keys`/`title.keys` file) extracted into the key
//! directory. Both installs report progress per entry and roll back when
//! cancelled.

mod install;
mod layout;
mod verify;

pub use install::{
    FirmwareInstallOutcome, KeyInstallOutcome, install_firmware, install_key_file,
    install_keys_from_archive,
};
pub use layout::{ContentLayout, SwitchPaths};
pub use verify::{
    FirmwareArchiveInfo, KeyPresence, firmware_installed, installed_keys,
    verify_firmware_archive, verify_key_archive,
};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FirmwareError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid firmware archive: {0}")]
    InvalidArchive(String),

    #[error("Invalid key file: {0}")]
    InvalidKeys(String),

    #[error("Installation cancelled")]
    Cancelled,

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
