//! Locations of EmuHub's own data files
//!
//! A `PORTABLE.txt` beside the executable switches every data file under a
//! `portable/` directory next to it; otherwise the platform's per-user
//! config and cache directories are used.

use crate::ConfigError;
use std::path::{Path, PathBuf};

pub const PORTABLE_MARKER: &str = "PORTABLE.txt";

#[derive(Debug, Clone)]
pub struct Paths {
    config_dir: PathBuf,
    cache_dir: PathBuf,
    portable: bool,
}

impl Paths {
    /// Resolve paths for this installation, honoring portable mode
    pub fn discover() -> Self {
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                if dir.join(PORTABLE_MARKER).exists() {
                    tracing::info!("Portable mode: data under {}", dir.display());
                    let root = dir.join("portable");
                    return Self {
                        config_dir: root.join("config"),
                        cache_dir: root.join("cache"),
                        portable: true,
                    };
                }
            }
        }

        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("emuhub");
        let cache_dir = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("emuhub");

        Self {
            config_dir,
            cache_dir,
            portable: false,
        }
    }

    /// Root all paths under a single directory (tests, custom setups)
    pub fn with_root(root: &Path) -> Self {
        Self {
            config_dir: root.join("config"),
            cache_dir: root.join("cache"),
            portable: false,
        }
    }

    /// Create the directories if they do not exist yet
    pub fn ensure(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.config_dir)?;
        std::fs::create_dir_all(&self.cache_dir)?;
        std::fs::create_dir_all(self.download_dir())?;
        Ok(())
    }

    pub fn is_portable(&self) -> bool {
        self.portable
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Where downloaded archives land before installation
    pub fn download_dir(&self) -> PathBuf {
        self.cache_dir.join("downloads")
    }

    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }

    pub fn versions_file(&self) -> PathBuf {
        self.config_dir.join("versions.json")
    }
}
