//! Shared state the commands operate on

use anyhow::{Context as _, Result};
use emuhub_catalog::{Downloader, ReleaseCatalog};
use emuhub_config::{EmulatorId, Paths, Settings, VersionStore};
use emuhub_emulator::Emulator;

/// Settings and stores loaded once per command
pub struct App {
    pub paths: Paths,
    pub settings: Settings,
    pub versions: VersionStore,
}

impl App {
    pub fn load() -> Result<Self> {
        let paths = Paths::discover();
        paths.ensure().context("Creating data directories")?;

        let settings = Settings::load_or_create(&paths).context("Loading settings")?;
        let versions =
            VersionStore::load(&paths.versions_file()).context("Loading version store")?;

        Ok(Self {
            paths,
            settings,
            versions,
        })
    }

    pub fn emulator(&self, id: EmulatorId) -> Emulator {
        Emulator::from_settings(id, &self.settings)
    }

    pub fn catalog(&self) -> ReleaseCatalog {
        ReleaseCatalog::new(
            self.paths.cache_dir().to_path_buf(),
            self.settings.app.github_token.clone(),
        )
    }

    pub fn downloader(&self) -> Downloader {
        Downloader::new(self.paths.download_dir())
    }

    pub fn save_settings(&self) -> Result<()> {
        self.settings
            .save(&self.paths.settings_file())
            .context("Saving settings")
    }
}
