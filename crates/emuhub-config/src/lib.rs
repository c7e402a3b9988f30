//! Configuration management for EmuHub
//!
//! Two JSON-backed stores: user settings (per-emulator directories and
//! release channels plus application behavior) and installed-version
//! metadata (which emulator build, firmware and keys are currently on disk).

mod ids;
mod paths;
mod settings;
mod versions;

pub use ids::{DolphinChannel, EmulatorId, XeniaChannel, YuzuChannel};
pub use paths::Paths;
pub use settings::{
    AppSettings, DolphinSettings, RyujinxSettings, SETTINGS_SCHEMA_VERSION, Settings,
    XeniaSettings, YuzuSettings,
};
pub use versions::{VersionKey, VersionStore};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unsupported settings schema version: {0}")]
    UnsupportedSchema(String),

    #[error("Unknown emulator: {0}")]
    UnknownEmulator(String),

    #[error("Unknown release channel: {0}")]
    UnknownChannel(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
