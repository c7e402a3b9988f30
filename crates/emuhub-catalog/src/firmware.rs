//! Firmware and key release catalog
//!
//! The system-archive repository publishes one release per Switch firmware
//! version. To keep automated scrapers away the assets carry neutral names:
//! the one containing `Alpha` is the firmware archive, the one containing
//! `Beta` (but not `Rebootless`) is the key archive. Rebootless updates are
//! tagged `<base>-<n>` and displayed as `<base> (Rebootless Update <n>)`.

use crate::{CatalogError, GhRelease, RemoteArchive};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Version of a firmware or key release
///
/// A rebootless revision orders above its base version, so `16.0.3-1` is
/// newer than `16.0.3` but older than `16.1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FirmwareVersion {
    major: u32,
    minor: u32,
    patch: u32,
    rebootless: Option<u32>,
}

impl FirmwareVersion {
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
            rebootless: None,
        }
    }

    pub fn with_rebootless(major: u32, minor: u32, patch: u32, revision: u32) -> Self {
        Self {
            major,
            minor,
            patch,
            rebootless: Some(revision),
        }
    }

    /// The `major.minor.patch` part without any rebootless suffix
    pub fn base(&self) -> FirmwareVersion {
        FirmwareVersion::new(self.major, self.minor, self.patch)
    }

    pub fn is_rebootless(&self) -> bool {
        self.rebootless.is_some()
    }
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        match self.rebootless {
            Some(0) => write!(f, " (Rebootless Update)"),
            Some(n) => write!(f, " (Rebootless Update {})", n),
            None => Ok(()),
        }
    }
}

impl FromStr for FirmwareVersion {
    type Err = CatalogError;

    /// Accepts tag form (`16.0.3`, `16.0.3-1`) and display form
    /// (`16.0.3 (Rebootless Update 1)`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CatalogError::InvalidVersion(s.to_string());
        let s = s.trim().trim_start_matches('v');

        let (base, rebootless) = if let Some((head, tail)) = s.split_once(' ') {
            let inner = tail
                .trim()
                .strip_prefix('(')
                .and_then(|t| t.strip_suffix(')'))
                .and_then(|t| t.strip_prefix("Rebootless Update"))
                .ok_or_else(invalid)?;
            let revision = if inner.trim().is_empty() {
                0
            } else {
                inner.trim().parse().map_err(|_| invalid())?
            };
            (head, Some(revision))
        } else if let Some((head, post)) = s.split_once('-') {
            (head, Some(post.parse().map_err(|_| invalid())?))
        } else {
            (s, None)
        };

        let mut parts = base.split('.');
        let major = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(invalid)?;
        let minor = match parts.next() {
            Some(p) => p.parse().map_err(|_| invalid())?,
            None => 0,
        };
        let patch = match parts.next() {
            Some(p) => p.parse().map_err(|_| invalid())?,
            None => 0,
        };
        if parts.next().is_some() {
            return Err(invalid());
        }

        Ok(Self {
            major,
            minor,
            patch,
            rebootless,
        })
    }
}

impl Serialize for FirmwareVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for FirmwareVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(|_| D::Error::custom(format!("invalid firmware version: {}", s)))
    }
}

/// Firmware and key archives available remotely, keyed by version
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FirmwareKeyCatalog {
    pub firmware: BTreeMap<FirmwareVersion, RemoteArchive>,
    pub keys: BTreeMap<FirmwareVersion, RemoteArchive>,
}

impl FirmwareKeyCatalog {
    /// Classify release assets into firmware and key archives
    ///
    /// Releases without assets or with unparseable names are skipped.
    pub fn from_releases(releases: &[GhRelease]) -> Self {
        let mut catalog = Self::default();

        for release in releases {
            if release.assets.is_empty() {
                continue;
            }

            let label = if release.name.is_empty() {
                &release.tag_name
            } else {
                &release.name
            };
            let version: FirmwareVersion = match label.parse() {
                Ok(v) => v,
                Err(_) => {
                    tracing::debug!("Skipping release with unparseable name {:?}", label);
                    continue;
                }
            };

            let mut firmware_release = None;
            let mut key_release = None;

            for asset in &release.assets {
                if asset.name.contains("Alpha") {
                    firmware_release = Some(RemoteArchive {
                        filename: asset.name.replace("Alpha", "Firmware"),
                        download_url: asset.browser_download_url.clone(),
                        size: asset.size,
                        version: release.tag_name.clone(),
                    });
                } else if !asset.name.contains("Rebootless") && asset.name.contains("Beta") {
                    key_release = Some(RemoteArchive {
                        filename: asset.name.replace("Beta", "Keys"),
                        download_url: asset.browser_download_url.clone(),
                        size: asset.size,
                        version: release.tag_name.clone(),
                    });
                }
            }

            if let Some(firmware) = firmware_release {
                catalog.firmware.insert(version, firmware);
            }
            if let Some(keys) = key_release {
                catalog.keys.insert(version, keys);
            }
        }

        tracing::info!(
            "Catalog holds {} firmware and {} key releases",
            catalog.firmware.len(),
            catalog.keys.len()
        );
        catalog
    }

    pub fn is_empty(&self) -> bool {
        self.firmware.is_empty() && self.keys.is_empty()
    }

    pub fn firmware_for(&self, version: &FirmwareVersion) -> Option<&RemoteArchive> {
        self.firmware.get(version)
    }

    pub fn keys_for(&self, version: &FirmwareVersion) -> Option<&RemoteArchive> {
        self.keys.get(version)
    }

    /// Newest version that has both a firmware and a key archive
    pub fn latest_common_version(&self) -> Option<FirmwareVersion> {
        self.firmware
            .keys()
            .filter(|v| self.keys.contains_key(v))
            .max()
            .copied()
    }

    /// Firmware versions, newest first
    pub fn firmware_versions(&self) -> Vec<FirmwareVersion> {
        self.firmware.keys().rev().copied().collect()
    }

    /// Key versions, newest first
    pub fn key_versions(&self) -> Vec<FirmwareVersion> {
        self.keys.keys().rev().copied().collect()
    }
}
