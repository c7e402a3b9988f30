//! User settings, persisted as JSON
//!
//! Schema version 4. A version-3 file is upgraded in place (the one shipped
//! migration normalizes the Dolphin channel); anything older or unreadable
//! is replaced with defaults.

use crate::{ConfigError, DolphinChannel, Paths, XeniaChannel, YuzuChannel};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const SETTINGS_SCHEMA_VERSION: &str = "4";

/// Application-wide behavior switches
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Remove downloaded archives once they are installed
    #[serde(default = "default_true")]
    pub delete_files_after_installing: bool,

    /// Check for a newer emulator build before every launch
    #[serde(default)]
    pub auto_emulator_updates: bool,

    /// Offer to install firmware when a launch finds none
    #[serde(default = "default_true")]
    pub ask_firmware: bool,

    /// Check for a newer EmuHub release on startup
    #[serde(default = "default_true")]
    pub check_for_app_updates: bool,

    /// GitHub token for release API requests (raises the rate limit)
    #[serde(default)]
    pub github_token: Option<String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            delete_files_after_installing: true,
            auto_emulator_updates: false,
            ask_firmware: true,
            check_for_app_updates: true,
            github_token: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DolphinSettings {
    /// Where Dolphin keeps its user data (saves, configs)
    #[serde(default = "default_dolphin_user")]
    pub user_directory: PathBuf,

    /// Where EmuHub installs Dolphin builds
    #[serde(default = "default_dolphin_install")]
    pub install_directory: PathBuf,

    #[serde(default)]
    pub rom_directory: Option<PathBuf>,

    #[serde(default)]
    pub channel: DolphinChannel,
}

impl Default for DolphinSettings {
    fn default() -> Self {
        Self {
            user_directory: default_dolphin_user(),
            install_directory: default_dolphin_install(),
            rom_directory: None,
            channel: DolphinChannel::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YuzuSettings {
    #[serde(default = "default_yuzu_user")]
    pub user_directory: PathBuf,

    #[serde(default = "default_yuzu_install")]
    pub install_directory: PathBuf,

    #[serde(default)]
    pub channel: YuzuChannel,
}

impl Default for YuzuSettings {
    fn default() -> Self {
        Self {
            user_directory: default_yuzu_user(),
            install_directory: default_yuzu_install(),
            channel: YuzuChannel::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RyujinxSettings {
    #[serde(default = "default_ryujinx_user")]
    pub user_directory: PathBuf,

    #[serde(default = "default_ryujinx_install")]
    pub install_directory: PathBuf,
}

impl Default for RyujinxSettings {
    fn default() -> Self {
        Self {
            user_directory: default_ryujinx_user(),
            install_directory: default_ryujinx_install(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XeniaSettings {
    /// Xenia is portable; user data lives beside the executable by default
    #[serde(default = "default_xenia_install")]
    pub user_directory: PathBuf,

    #[serde(default = "default_xenia_install")]
    pub install_directory: PathBuf,

    #[serde(default)]
    pub rom_directory: Option<PathBuf>,

    #[serde(default)]
    pub channel: XeniaChannel,
}

impl Default for XeniaSettings {
    fn default() -> Self {
        Self {
            user_directory: default_xenia_install(),
            install_directory: default_xenia_install(),
            rom_directory: None,
            channel: XeniaChannel::default(),
        }
    }
}

/// Root settings document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_schema_version")]
    pub version: String,

    #[serde(default)]
    pub app: AppSettings,

    #[serde(default)]
    pub dolphin: DolphinSettings,

    #[serde(default)]
    pub yuzu: YuzuSettings,

    #[serde(default)]
    pub ryujinx: RyujinxSettings,

    #[serde(default)]
    pub xenia: XeniaSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: SETTINGS_SCHEMA_VERSION.to_string(),
            app: AppSettings::default(),
            dolphin: DolphinSettings::default(),
            yuzu: YuzuSettings::default(),
            ryujinx: RyujinxSettings::default(),
            xenia: XeniaSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from a file, upgrading the schema if needed
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let (settings, _) = Self::load_inner(path)?;
        Ok(settings)
    }

    /// Load settings, creating or replacing the file when it is missing or
    /// unusable; an upgraded schema is written back immediately
    pub fn load_or_create(paths: &Paths) -> Result<Self, ConfigError> {
        let path = paths.settings_file();
        if !path.exists() {
            let settings = Self::default();
            settings.save(&path)?;
            tracing::info!("Created settings file at {}", path.display());
            return Ok(settings);
        }

        match Self::load_inner(&path) {
            Ok((settings, upgraded)) => {
                if upgraded {
                    settings.save(&path)?;
                }
                Ok(settings)
            }
            Err(ConfigError::Io(e)) => Err(ConfigError::Io(e)),
            Err(e) => {
                tracing::warn!(
                    "Settings file {} is unusable ({}), recreating defaults",
                    path.display(),
                    e
                );
                let settings = Self::default();
                settings.save(&path)?;
                Ok(settings)
            }
        }
    }

    fn load_inner(path: &Path) -> Result<(Self, bool), ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut value: serde_json::Value = serde_json::from_str(&contents)?;
        let upgraded = upgrade_schema(&mut value)?;

        let mut settings: Settings = serde_json::from_value(value)?;
        settings.sanitize();
        if upgraded {
            tracing::info!("Upgraded settings schema to version {}", settings.version);
        }
        Ok((settings, upgraded))
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = serde_json::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, contents)?;
        tracing::debug!("Settings saved to {}", path.display());
        Ok(())
    }

    /// Replace empty directory values with their defaults
    fn sanitize(&mut self) {
        fn fix(dir: &mut PathBuf, default: PathBuf) {
            if dir.as_os_str().is_empty() {
                *dir = default;
            }
        }

        fix(&mut self.dolphin.user_directory, default_dolphin_user());
        fix(&mut self.dolphin.install_directory, default_dolphin_install());
        fix(&mut self.yuzu.user_directory, default_yuzu_user());
        fix(&mut self.yuzu.install_directory, default_yuzu_install());
        fix(&mut self.ryujinx.user_directory, default_ryujinx_user());
        fix(&mut self.ryujinx.install_directory, default_ryujinx_install());
        fix(&mut self.xenia.user_directory, default_xenia_install());
        fix(&mut self.xenia.install_directory, default_xenia_install());

        if let Some(rom) = &self.dolphin.rom_directory {
            if rom.as_os_str().is_empty() {
                self.dolphin.rom_directory = None;
            }
        }
        if let Some(rom) = &self.xenia.rom_directory {
            if rom.as_os_str().is_empty() {
                self.xenia.rom_directory = None;
            }
        }
        if let Some(token) = &self.app.github_token {
            if token.trim().is_empty() {
                self.app.github_token = None;
            }
        }
    }
}

/// Upgrade a raw settings document to the current schema in place
///
/// Returns whether anything changed. Version 3 files carry a Dolphin channel
/// predating the release/development split; anything not "development"
/// becomes "release".
fn upgrade_schema(value: &mut serde_json::Value) -> Result<bool, ConfigError> {
    let version = value
        .get("version")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    match version.as_str() {
        SETTINGS_SCHEMA_VERSION => Ok(false),
        "3" => {
            if let Some(channel) = value.pointer_mut("/dolphin/channel") {
                let current = channel.as_str().unwrap_or_default();
                if current != "development" {
                    *channel = serde_json::Value::String("release".to_string());
                }
            }
            value["version"] = serde_json::Value::String(SETTINGS_SCHEMA_VERSION.to_string());
            Ok(true)
        }
        other => Err(ConfigError::UnsupportedSchema(other.to_string())),
    }
}

fn default_schema_version() -> String {
    SETTINGS_SCHEMA_VERSION.to_string()
}

fn default_true() -> bool {
    true
}

fn data_root() -> PathBuf {
    dirs::data_dir().unwrap_or_else(|| PathBuf::from("."))
}

fn data_local_root() -> PathBuf {
    dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."))
}

fn default_dolphin_user() -> PathBuf {
    data_root().join("Dolphin Emulator")
}

fn default_dolphin_install() -> PathBuf {
    data_local_root().join("Dolphin")
}

fn default_yuzu_user() -> PathBuf {
    data_root().join("yuzu")
}

fn default_yuzu_install() -> PathBuf {
    data_local_root().join("yuzu")
}

fn default_ryujinx_user() -> PathBuf {
    data_root().join("Ryujinx")
}

fn default_ryujinx_install() -> PathBuf {
    data_local_root().join("Ryujinx")
}

fn default_xenia_install() -> PathBuf {
    data_local_root().join("Xenia")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.version, SETTINGS_SCHEMA_VERSION);
        assert!(settings.app.delete_files_after_installing);
        assert!(settings.app.ask_firmware);
        assert!(!settings.app.auto_emulator_updates);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let temp_file = NamedTempFile::new().unwrap();
        let mut settings = Settings::default();
        settings.yuzu.channel = YuzuChannel::EarlyAccess;
        settings.app.auto_emulator_updates = true;

        settings.save(temp_file.path()).unwrap();
        let loaded = Settings::load(temp_file.path()).unwrap();

        assert_eq!(loaded.yuzu.channel, YuzuChannel::EarlyAccess);
        assert!(loaded.app.auto_emulator_updates);
    }

    #[test]
    fn test_upgrade_v3_normalizes_dolphin_channel() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(
            temp_file,
            r#"{{"version": "3", "dolphin": {{"channel": "beta"}}}}"#
        )
        .unwrap();

        let loaded = Settings::load(temp_file.path()).unwrap();
        assert_eq!(loaded.version, SETTINGS_SCHEMA_VERSION);
        assert_eq!(loaded.dolphin.channel, DolphinChannel::Release);
    }

    #[test]
    fn test_upgrade_v3_keeps_development_channel() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(
            temp_file,
            r#"{{"version": "3", "dolphin": {{"channel": "development"}}}}"#
        )
        .unwrap();

        let loaded = Settings::load(temp_file.path()).unwrap();
        assert_eq!(loaded.dolphin.channel, DolphinChannel::Development);
    }

    #[test]
    fn test_rejects_older_schema() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, r#"{{"version": "2"}}"#).unwrap();

        let result = Settings::load(temp_file.path());
        assert!(matches!(result, Err(ConfigError::UnsupportedSchema(_))));
    }

    #[test]
    fn test_empty_directories_fall_back_to_defaults() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(
            temp_file,
            r#"{{"version": "4", "yuzu": {{"user_directory": "", "install_directory": ""}}}}"#
        )
        .unwrap();

        let loaded = Settings::load(temp_file.path()).unwrap();
        assert_eq!(loaded.yuzu.user_directory, default_yuzu_user());
        assert_eq!(loaded.yuzu.install_directory, default_yuzu_install());
    }

    #[test]
    fn test_blank_token_becomes_none() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(
            temp_file,
            r#"{{"version": "4", "app": {{"github_token": "  "}}}}"#
        )
        .unwrap();

        let loaded = Settings::load(temp_file.path()).unwrap();
        assert_eq!(loaded.app.github_token, None);
    }

    #[test]
    fn test_load_or_create_replaces_damaged_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let paths = Paths::with_root(temp.path());
        paths.ensure().unwrap();
        std::fs::write(paths.settings_file(), "not json at all").unwrap();

        let settings = Settings::load_or_create(&paths).unwrap();
        assert_eq!(settings.version, SETTINGS_SCHEMA_VERSION);

        // The damaged file was replaced with a loadable one
        let reloaded = Settings::load(&paths.settings_file()).unwrap();
        assert_eq!(reloaded.version, SETTINGS_SCHEMA_VERSION);
    }

    #[test]
    fn test_load_or_create_persists_upgrade() {
        let temp = tempfile::TempDir::new().unwrap();
        let paths = Paths::with_root(temp.path());
        paths.ensure().unwrap();
        std::fs::write(
            paths.settings_file(),
            r#"{"version": "3", "dolphin": {"channel": "old"}}"#,
        )
        .unwrap();

        Settings::load_or_create(&paths).unwrap();

        let raw = std::fs::read_to_string(paths.settings_file()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["version"], "4");
        assert_eq!(value["dolphin"]["channel"], "release");
    }
}
