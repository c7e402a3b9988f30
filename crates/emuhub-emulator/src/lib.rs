//! Emulator management for EmuHub
//!
//! Installs emulator builds from release archives, launches the installed
//! executables, moves user data around, and reconciles installed Switch
//! firmware and key versions against the release catalog before a launch.

mod install;
mod launch;
mod profile;
mod reconcile;
mod userdata;

pub use install::{delete_build, install_build, installed_version, verify_build_archive};
pub use launch::{LaunchOutcome, launch};
pub use profile::Emulator;
pub use reconcile::{
    Prompter, ReconcileOutcome, ReconcilePlan, ReconcileState, execute_reconcile_plan,
    plan_reconcile,
};
pub use userdata::{CopyOutcome, DataScope, delete_data, export_data, import_data};

use emuhub_config::EmulatorId;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmulatorError {
    #[error("{} is not installed", .0.display_name())]
    NotInstalled(EmulatorId),

    #[error("No {} executable found", .0.display_name())]
    ExecutableNotFound(EmulatorId),

    #[error("{} does not use Switch firmware", .0.display_name())]
    NotSwitch(EmulatorId),

    #[error("Invalid build archive: {0}")]
    InvalidArchive(String),

    #[error("Unsupported archive type: {0}")]
    UnsupportedArchive(PathBuf),

    #[error("No user data at {0}")]
    MissingData(PathBuf),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Launch failed: {0}")]
    LaunchFailed(String),

    #[error("Settings error: {0}")]
    Config(#[from] emuhub_config::ConfigError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] emuhub_catalog::CatalogError),

    #[error("Firmware error: {0}")]
    Firmware(#[from] emuhub_firmware::FirmwareError),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
