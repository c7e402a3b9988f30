//! Emulator identifiers and release channels

use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The emulators EmuHub manages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmulatorId {
    Dolphin,
    Yuzu,
    Ryujinx,
    Xenia,
}

impl EmulatorId {
    pub const ALL: [EmulatorId; 4] = [
        EmulatorId::Dolphin,
        EmulatorId::Yuzu,
        EmulatorId::Ryujinx,
        EmulatorId::Xenia,
    ];

    /// Stable lowercase identifier used in files and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            EmulatorId::Dolphin => "dolphin",
            EmulatorId::Yuzu => "yuzu",
            EmulatorId::Ryujinx => "ryujinx",
            EmulatorId::Xenia => "xenia",
        }
    }

    /// Name as the emulator projects write it
    pub fn display_name(&self) -> &'static str {
        match self {
            EmulatorId::Dolphin => "Dolphin",
            EmulatorId::Yuzu => "yuzu",
            EmulatorId::Ryujinx => "Ryujinx",
            EmulatorId::Xenia => "Xenia",
        }
    }

    /// Whether this emulator runs Nintendo Switch content and therefore
    /// needs firmware and decryption keys
    pub fn is_switch(&self) -> bool {
        matches!(self, EmulatorId::Yuzu | EmulatorId::Ryujinx)
    }
}

impl fmt::Display for EmulatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmulatorId {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dolphin" => Ok(EmulatorId::Dolphin),
            "yuzu" => Ok(EmulatorId::Yuzu),
            "ryujinx" => Ok(EmulatorId::Ryujinx),
            "xenia" => Ok(EmulatorId::Xenia),
            other => Err(ConfigError::UnknownEmulator(other.to_string())),
        }
    }
}

/// Dolphin release channels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DolphinChannel {
    #[default]
    Release,
    Development,
}

impl DolphinChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DolphinChannel::Release => "release",
            DolphinChannel::Development => "development",
        }
    }
}

impl FromStr for DolphinChannel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "release" => Ok(DolphinChannel::Release),
            "development" => Ok(DolphinChannel::Development),
            other => Err(ConfigError::UnknownChannel(other.to_string())),
        }
    }
}

/// Yuzu release channels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YuzuChannel {
    #[default]
    Mainline,
    EarlyAccess,
}

impl YuzuChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            YuzuChannel::Mainline => "mainline",
            YuzuChannel::EarlyAccess => "early_access",
        }
    }
}

impl FromStr for YuzuChannel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mainline" => Ok(YuzuChannel::Mainline),
            "early_access" | "ea" => Ok(YuzuChannel::EarlyAccess),
            other => Err(ConfigError::UnknownChannel(other.to_string())),
        }
    }
}

/// Xenia release channels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum XeniaChannel {
    #[default]
    Master,
    Canary,
}

impl XeniaChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            XeniaChannel::Master => "master",
            XeniaChannel::Canary => "canary",
        }
    }
}

impl FromStr for XeniaChannel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "master" => Ok(XeniaChannel::Master),
            "canary" => Ok(XeniaChannel::Canary),
            other => Err(ConfigError::UnknownChannel(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emulator_id_round_trip() {
        for id in EmulatorId::ALL {
            assert_eq!(id.as_str().parse::<EmulatorId>().unwrap(), id);
        }
    }

    #[test]
    fn test_emulator_id_case_insensitive() {
        assert_eq!("Ryujinx".parse::<EmulatorId>().unwrap(), EmulatorId::Ryujinx);
    }

    #[test]
    fn test_unknown_emulator() {
        assert!("citra".parse::<EmulatorId>().is_err());
    }

    #[test]
    fn test_switch_emulators() {
        assert!(EmulatorId::Yuzu.is_switch());
        assert!(EmulatorId::Ryujinx.is_switch());
        assert!(!EmulatorId::Dolphin.is_switch());
        assert!(!EmulatorId::Xenia.is_switch());
    }

    #[test]
    fn test_channel_serde_names() {
        let json = serde_json::to_string(&YuzuChannel::EarlyAccess).unwrap();
        assert_eq!(json, "\"early_access\"");

        let parsed: DolphinChannel = serde_json::from_str("\"development\"").unwrap();
        assert_eq!(parsed, DolphinChannel::Development);
    }
}
