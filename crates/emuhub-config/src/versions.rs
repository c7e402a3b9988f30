//! Installed-version metadata store
//!
//! A flat JSON map recording which emulator build, firmware and key set are
//! on disk. Keys follow the `"<emulator>"`, `"<emulator>_firmware"`,
//! `"<emulator>_keys"` naming so installs and launches can cross-check
//! versions cheaply. An empty version string means "installed from a local
//! archive, version unknown".

use crate::{ConfigError, EmulatorId};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// What a version entry describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionKey {
    /// The emulator build itself
    Build(EmulatorId),
    /// Installed Switch firmware
    Firmware(EmulatorId),
    /// Installed Switch decryption keys
    Keys(EmulatorId),
}

impl VersionKey {
    /// Key under which the entry is stored in the JSON map
    pub fn storage_key(&self) -> String {
        match self {
            VersionKey::Build(id) => id.as_str().to_string(),
            VersionKey::Firmware(id) => format!("{}_firmware", id.as_str()),
            VersionKey::Keys(id) => format!("{}_keys", id.as_str()),
        }
    }
}

impl fmt::Display for VersionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.storage_key())
    }
}

/// Write-through store for installed versions
#[derive(Debug)]
pub struct VersionStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl VersionStore {
    /// Load the store; a missing file yields an empty store
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let entries = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            match serde_json::from_str(&contents) {
                Ok(map) => map,
                Err(e) => {
                    tracing::warn!(
                        "Version store {} is unreadable ({}), starting empty",
                        path.display(),
                        e
                    );
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    /// Get the recorded version, if any
    pub fn get(&self, key: VersionKey) -> Option<&str> {
        self.entries.get(&key.storage_key()).map(String::as_str)
    }

    /// Record a version and persist immediately
    pub fn set(&mut self, key: VersionKey, version: &str) -> Result<(), ConfigError> {
        self.entries.insert(key.storage_key(), version.to_string());
        self.persist()?;
        tracing::debug!("Recorded {} = {:?}", key, version);
        Ok(())
    }

    /// Forget an entry and persist immediately
    pub fn clear(&mut self, key: VersionKey) -> Result<(), ConfigError> {
        if self.entries.remove(&key.storage_key()).is_some() {
            self.persist()?;
        }
        Ok(())
    }

    fn persist(&self) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(&self.path, contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_storage_keys() {
        assert_eq!(
            VersionKey::Build(EmulatorId::Ryujinx).storage_key(),
            "ryujinx"
        );
        assert_eq!(
            VersionKey::Firmware(EmulatorId::Ryujinx).storage_key(),
            "ryujinx_firmware"
        );
        assert_eq!(
            VersionKey::Keys(EmulatorId::Yuzu).storage_key(),
            "yuzu_keys"
        );
    }

    #[test]
    fn test_missing_file_starts_empty() {
        let temp = TempDir::new().unwrap();
        let store = VersionStore::load(&temp.path().join("versions.json")).unwrap();
        assert_eq!(store.get(VersionKey::Build(EmulatorId::Yuzu)), None);
    }

    #[test]
    fn test_set_persists_immediately() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("versions.json");

        let mut store = VersionStore::load(&path).unwrap();
        store
            .set(VersionKey::Firmware(EmulatorId::Ryujinx), "18.1.0")
            .unwrap();

        let reloaded = VersionStore::load(&path).unwrap();
        assert_eq!(
            reloaded.get(VersionKey::Firmware(EmulatorId::Ryujinx)),
            Some("18.1.0")
        );
    }

    #[test]
    fn test_empty_version_means_unknown_build() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("versions.json");

        let mut store = VersionStore::load(&path).unwrap();
        store.set(VersionKey::Build(EmulatorId::Ryujinx), "").unwrap();

        assert_eq!(store.get(VersionKey::Build(EmulatorId::Ryujinx)), Some(""));
    }

    #[test]
    fn test_clear_removes_entry() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("versions.json");

        let mut store = VersionStore::load(&path).unwrap();
        store.set(VersionKey::Keys(EmulatorId::Yuzu), "17.0.0").unwrap();
        store.clear(VersionKey::Keys(EmulatorId::Yuzu)).unwrap();

        let reloaded = VersionStore::load(&path).unwrap();
        assert_eq!(reloaded.get(VersionKey::Keys(EmulatorId::Yuzu)), None);
    }

    #[test]
    fn test_damaged_store_starts_empty() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("versions.json");
        std::fs::write(&path, "[1, 2").unwrap();

        let store = VersionStore::load(&path).unwrap();
        assert_eq!(store.get(VersionKey::Build(EmulatorId::Dolphin)), None);
    }
}
