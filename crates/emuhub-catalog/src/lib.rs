//! Release catalog client for EmuHub
//!
//! Talks to GitHub's release API for emulator builds and the Switch
//! system-archive repository, caches the firmware/keys catalog on disk,
//! and streams archive downloads with resume and cancellation.

mod cache;
mod download;
mod firmware;
mod github;
mod sources;

pub use cache::{Cache, FIRMWARE_KEYS_CACHE_KEY, FIRMWARE_KEYS_CACHE_TTL};
pub use download::Downloader;
pub use firmware::{FirmwareKeyCatalog, FirmwareVersion};
pub use github::{GhAsset, GhRelease, GithubClient};
pub use sources::{AssetFilter, EmulatorBuild, ReleaseSource, ReleaseStrategy, release_source};

use emuhub_config::{EmulatorId, Settings};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("GitHub API rate limit exceeded (a token in settings raises the limit)")]
    RateLimited,

    #[error("Server returned {0}")]
    Status(reqwest::StatusCode),

    #[error("No release asset matching {0}")]
    MissingAsset(String),

    #[error("Invalid release data: {0}")]
    InvalidRelease(String),

    #[error("Invalid version: {0}")]
    InvalidVersion(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Download cancelled")]
    Cancelled,

    #[error("Not enough disk space: need {needed} bytes, have {available}")]
    InsufficientSpace { needed: u64, available: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One downloadable release artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteArchive {
    /// File name the archive is saved under
    pub filename: String,

    /// Direct download URL
    pub download_url: String,

    /// Size in bytes as reported by the API
    pub size: u64,

    /// Tag of the release the asset belongs to
    pub version: String,
}

/// Client facade over the GitHub API and the on-disk cache
pub struct ReleaseCatalog {
    github: GithubClient,
    cache: Cache,
}

impl ReleaseCatalog {
    pub fn new(cache_dir: PathBuf, token: Option<String>) -> Self {
        Self {
            github: GithubClient::new(token),
            cache: Cache::new(cache_dir),
        }
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    /// Fetch the firmware/keys catalog, serving a cached copy when fresh
    ///
    /// The remote repository publishes one release per system version with
    /// obfuscated asset names; classification happens in
    /// [`FirmwareKeyCatalog::from_releases`]. Results are cached for seven
    /// days.
    pub async fn firmware_key_catalog(
        &self,
        force_refresh: bool,
    ) -> Result<FirmwareKeyCatalog, CatalogError> {
        if !force_refresh {
            if let Some(cached) = self
                .cache
                .get_fresh::<FirmwareKeyCatalog>(FIRMWARE_KEYS_CACHE_KEY, FIRMWARE_KEYS_CACHE_TTL)
            {
                tracing::debug!("Using cached firmware/keys catalog");
                return Ok(cached);
            }
        }

        let (owner, repo) = sources::FIRMWARE_KEYS_REPO;
        let releases = self.github.all_releases(owner, repo).await?;
        let catalog = FirmwareKeyCatalog::from_releases(&releases);

        if catalog.is_empty() {
            tracing::warn!("Firmware/keys repository yielded no usable releases");
        } else {
            self.cache.put(FIRMWARE_KEYS_CACHE_KEY, &catalog)?;
        }

        Ok(catalog)
    }

    /// Find the newest build of an emulator for its configured channel
    pub async fn emulator_build(
        &self,
        id: EmulatorId,
        settings: &Settings,
    ) -> Result<EmulatorBuild, CatalogError> {
        let source = release_source(id, settings);
        let release = match source.strategy {
            ReleaseStrategy::Latest => {
                self.github.latest_release(source.owner, source.repo).await?
            }
            ReleaseStrategy::Newest => {
                let releases = self.github.all_releases(source.owner, source.repo).await?;
                releases.into_iter().next().ok_or_else(|| {
                    CatalogError::InvalidRelease(format!(
                        "{}/{} has no releases",
                        source.owner, source.repo
                    ))
                })?
            }
        };

        let asset = source
            .asset
            .pick(&release.assets)
            .ok_or_else(|| CatalogError::MissingAsset(source.asset.describe()))?;

        Ok(EmulatorBuild {
            version: release.tag_name.clone(),
            archive: RemoteArchive {
                filename: asset.name.clone(),
                download_url: asset.browser_download_url.clone(),
                size: asset.size,
                version: release.tag_name.clone(),
            },
        })
    }

    /// Check whether a newer EmuHub release exists, returning its tag
    pub async fn app_update_available(
        &self,
        current_version: &str,
    ) -> Result<Option<String>, CatalogError> {
        let (owner, repo) = sources::EMUHUB_REPO;
        let release = self.github.latest_release(owner, repo).await?;

        if is_newer(&release.tag_name, current_version) {
            Ok(Some(release.tag_name))
        } else {
            Ok(None)
        }
    }
}

/// Compare version strings (semver-aware, string fallback)
pub fn is_newer(new_version: &str, current_version: &str) -> bool {
    match (
        semver::Version::parse(new_version.trim_start_matches('v')),
        semver::Version::parse(current_version.trim_start_matches('v')),
    ) {
        (Ok(new), Ok(current)) => new > current,
        _ => new_version.cmp(current_version) == Ordering::Greater,
    }
}
