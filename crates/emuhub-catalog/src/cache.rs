//! Time-boxed JSON cache for catalog lookups
//!
//! Each entry is a `<key>.json` file wrapping the payload in an envelope
//! with the unix time it was written. Readers pass a maximum age; stale,
//! missing or damaged entries count as misses.

use crate::CatalogError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub const FIRMWARE_KEYS_CACHE_KEY: &str = "firmware_keys";

/// Firmware releases are rare; a week of staleness is acceptable
pub const FIRMWARE_KEYS_CACHE_TTL: Duration = Duration::from_secs(604_800);

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    time: u64,
    data: T,
}

/// File-backed cache rooted at one directory
#[derive(Debug, Clone)]
pub struct Cache {
    dir: PathBuf,
}

impl Cache {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Store a payload under `key` with the current time
    pub fn put<T: Serialize>(&self, key: &str, data: &T) -> Result<(), CatalogError> {
        std::fs::create_dir_all(&self.dir)?;

        let envelope = Envelope {
            time: now_unix(),
            data,
        };
        let contents = serde_json::to_string(&envelope)?;
        std::fs::write(self.entry_path(key), contents)?;
        tracing::debug!("Cached {} entry", key);
        Ok(())
    }

    /// Read a payload no older than `max_age`
    pub fn get_fresh<T: DeserializeOwned>(&self, key: &str, max_age: Duration) -> Option<T> {
        let path = self.entry_path(key);
        let contents = std::fs::read_to_string(&path).ok()?;

        let envelope: Envelope<T> = match serde_json::from_str(&contents) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::debug!("Cache entry {} is unreadable: {}", key, e);
                return None;
            }
        };

        let age = now_unix().saturating_sub(envelope.time);
        if age >= max_age.as_secs() {
            tracing::debug!("Cache entry {} is stale ({}s old)", key, age);
            return None;
        }

        Some(envelope.data)
    }

    /// Drop every cache entry
    pub fn clear(&self) -> Result<(), CatalogError> {
        if !self.dir.exists() {
            return Ok(());
        }

        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|e| e == "json") {
                std::fs::remove_file(path)?;
            }
        }
        tracing::info!("Cache cleared");
        Ok(())
    }
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
