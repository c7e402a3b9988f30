//! Firmware/keys version reconciliation
//!
//! Before a Switch emulator launches, the installed firmware and keys are
//! checked against each other and against the release catalog. The outcome
//! is a plan of install tasks, built with yes/no confirmations through
//! [`Prompter`] so front-ends decide how to ask. Executing the plan
//! downloads and installs the archives and updates the version store.

use crate::{Emulator, EmulatorError};
use emuhub_catalog::{CatalogError, Downloader, FirmwareKeyCatalog, FirmwareVersion};
use emuhub_config::{Settings, VersionKey, VersionStore};
use emuhub_firmware::{
    firmware_installed, install_firmware, install_keys_from_archive, installed_keys,
};
use emuhub_progress::ProgressHandle;
use std::fs;

/// Asks the user yes/no questions during planning
pub trait Prompter {
    fn confirm(&mut self, message: &str) -> bool;
}

/// What is on disk right now
#[derive(Debug, Clone, Default)]
pub struct ReconcileState {
    /// Recorded firmware version; `None` when absent or unparseable
    pub firmware_version: Option<FirmwareVersion>,

    /// Recorded key version; `None` when absent or unparseable
    pub keys_version: Option<FirmwareVersion>,

    /// Whether the firmware directory has content
    pub firmware_present: bool,

    /// Whether `prod.keys` exists
    pub prod_keys_present: bool,

    /// Whether the user still wants to be offered firmware installs
    pub ask_firmware: bool,
}

impl ReconcileState {
    /// Read the installed state for one emulator
    pub fn gather(
        emulator: &Emulator,
        versions: &VersionStore,
        settings: &Settings,
    ) -> Result<Self, EmulatorError> {
        let paths = emulator
            .switch_paths()
            .ok_or(EmulatorError::NotSwitch(emulator.id()))?;

        let firmware_present = firmware_installed(&paths);
        let prod_keys_present = installed_keys(&paths).prod;

        let recorded = |key: VersionKey| -> Option<FirmwareVersion> {
            versions.get(key).and_then(|v| v.parse().ok())
        };
        let firmware_version = if firmware_present {
            recorded(VersionKey::Firmware(emulator.id()))
        } else {
            None
        };
        let keys_version = if prod_keys_present {
            recorded(VersionKey::Keys(emulator.id()))
        } else {
            None
        };

        Ok(Self {
            firmware_version,
            keys_version,
            firmware_present,
            prod_keys_present,
            ask_firmware: settings.app.ask_firmware,
        })
    }
}

/// Install tasks agreed on during planning
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcilePlan {
    /// Firmware version to download and install
    pub firmware: Option<FirmwareVersion>,

    /// Key version to download and install
    pub keys: Option<FirmwareVersion>,

    /// The user declined the firmware offer; callers persist
    /// `ask_firmware = false` so the question is not asked again
    pub disable_ask_firmware: bool,

    /// Human-readable remarks about fallbacks taken during planning
    pub notes: Vec<String>,
}

impl ReconcilePlan {
    pub fn is_empty(&self) -> bool {
        self.firmware.is_none() && self.keys.is_none()
    }
}

/// Work out which firmware/key installs are needed
pub fn plan_reconcile(
    state: &ReconcileState,
    catalog: &FirmwareKeyCatalog,
    prompter: &mut dyn Prompter,
) -> ReconcilePlan {
    let latest = catalog.latest_common_version();
    let mut plan = ReconcilePlan::default();

    // Missing keys: offer them at the installed firmware version so the
    // pair stays consistent, else at the newest version with both archives
    if !state.prod_keys_present {
        if let Some(target) = state.firmware_version.or(latest) {
            let message = format!(
                "The Switch decryption keys are missing. Games cannot run without them. \
                 Install keys {} now?",
                target
            );
            if prompter.confirm(&message) {
                plan.keys = Some(target);
            }
        }
    }

    // Missing firmware: a one-time offer, declining turns the prompt off
    if plan.firmware.is_none() && !state.firmware_present && state.ask_firmware {
        if let Some(target) = state.keys_version.or(latest) {
            let message = format!(
                "No Switch firmware is installed. Some games will not run without it. \
                 Install firmware {} now? Answering no disables this prompt.",
                target
            );
            if prompter.confirm(&message) {
                plan.firmware = Some(target);
            } else {
                plan.disable_ask_firmware = true;
            }
        }
    }

    // Both installed but at different versions: offer to align on the
    // higher of the two
    if let (Some(firmware), Some(keys)) = (state.firmware_version, state.keys_version) {
        if firmware != keys {
            let target = firmware.max(keys);
            let message = format!(
                "The installed firmware ({}) and keys ({}) versions do not match, which \
                 may cause issues. Install both at {}?",
                firmware, keys, target
            );
            if prompter.confirm(&message) {
                plan.firmware = Some(target);
                plan.keys = Some(target);
            }
        }
    }

    resolve_catalog_misses(&mut plan, catalog, prompter);

    // Versions already on disk need no work
    if plan.keys.is_some() && plan.keys == state.keys_version {
        plan.keys = None;
    }
    if plan.firmware.is_some() && plan.firmware == state.firmware_version {
        plan.firmware = None;
    }

    plan
}

/// Replace planned versions the catalog cannot deliver
///
/// Falls back to the newest version available on both sides, after
/// confirmation; a declined fallback drops the task.
fn resolve_catalog_misses(
    plan: &mut ReconcilePlan,
    catalog: &FirmwareKeyCatalog,
    prompter: &mut dyn Prompter,
) {
    let latest = catalog.latest_common_version();

    if let Some(version) = plan.keys {
        if catalog.keys_for(&version).is_none() {
            plan.notes
                .push(format!("Keys {} are not in the release catalog", version));
            match latest {
                Some(latest)
                    if prompter.confirm(&format!(
                        "Keys {} are not available for download. Install firmware and \
                         keys {} instead?",
                        version, latest
                    )) =>
                {
                    plan.keys = Some(latest);
                    plan.firmware = Some(latest);
                }
                _ => plan.keys = None,
            }
        }
    }

    if let Some(version) = plan.firmware {
        if catalog.firmware_for(&version).is_none() {
            plan.notes.push(format!(
                "Firmware {} is not in the release catalog",
                version
            ));
            match latest {
                Some(latest)
                    if prompter.confirm(&format!(
                        "Firmware {} is not available for download. Install firmware and \
                         keys {} instead?",
                        version, latest
                    )) =>
                {
                    plan.firmware = Some(latest);
                    plan.keys = Some(latest);
                }
                _ => plan.firmware = None,
            }
        }
    }
}

/// What executing a plan installed
#[derive(Debug, Default)]
pub struct ReconcileOutcome {
    pub keys_installed: Option<FirmwareVersion>,
    pub firmware_installed: Option<FirmwareVersion>,

    /// Firmware archive entries that were skipped during extraction
    pub skipped_entries: Vec<String>,

    /// A keys install ran but the archive held no `prod.keys`
    pub keys_missing_prod: bool,
}

/// Download and install everything the plan calls for
///
/// Keys install before firmware, matching the order the prompts were made
/// in. Each installed version is recorded in the store immediately.
pub async fn execute_reconcile_plan(
    plan: &ReconcilePlan,
    emulator: &Emulator,
    catalog: &FirmwareKeyCatalog,
    downloader: &Downloader,
    versions: &mut VersionStore,
    delete_archives: bool,
    progress: &ProgressHandle,
) -> Result<ReconcileOutcome, EmulatorError> {
    let paths = emulator
        .switch_paths()
        .ok_or(EmulatorError::NotSwitch(emulator.id()))?;
    let mut outcome = ReconcileOutcome::default();

    if let Some(version) = plan.keys {
        let archive = catalog.keys_for(&version).ok_or_else(|| {
            EmulatorError::Catalog(CatalogError::MissingAsset(format!("keys {}", version)))
        })?;

        let downloaded = downloader.download(archive, progress).await?;
        let result = install_keys_from_archive(&downloaded, &paths, progress)?;
        if !result.has_prod_keys {
            tracing::warn!("Key archive {} held no prod.keys", archive.filename);
            outcome.keys_missing_prod = true;
        }

        versions.set(VersionKey::Keys(emulator.id()), &archive.version)?;
        if delete_archives {
            let _ = fs::remove_file(&downloaded);
        }
        outcome.keys_installed = Some(version);
    }

    if let Some(version) = plan.firmware {
        let archive = catalog.firmware_for(&version).ok_or_else(|| {
            EmulatorError::Catalog(CatalogError::MissingAsset(format!("firmware {}", version)))
        })?;

        let downloaded = downloader.download(archive, progress).await?;
        let result = install_firmware(&downloaded, &paths, progress)?;
        outcome.skipped_entries = result.skipped;

        versions.set(VersionKey::Firmware(emulator.id()), &archive.version)?;
        if delete_archives {
            let _ = fs::remove_file(&downloaded);
        }
        outcome.firmware_installed = Some(version);
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use emuhub_catalog::RemoteArchive;
    use std::collections::VecDeque;

    struct Scripted {
        answers: VecDeque<bool>,
        asked: Vec<String>,
    }

    impl Scripted {
        fn new(answers: &[bool]) -> Self {
            Self {
                answers: answers.iter().copied().collect(),
                asked: Vec::new(),
            }
        }
    }

    impl Prompter for Scripted {
        fn confirm(&mut self, message: &str) -> bool {
            self.asked.push(message.to_string());
            self.answers.pop_front().unwrap_or(false)
        }
    }

    fn version(s: &str) -> FirmwareVersion {
        s.parse().unwrap()
    }

    fn archive(name: &str, tag: &str) -> RemoteArchive {
        RemoteArchive {
            filename: name.to_string(),
            download_url: format!("https://example.com/{}", name),
            size: 1,
            version: tag.to_string(),
        }
    }

    /// Catalog holding both firmware and keys for every listed version
    fn catalog_with(versions: &[&str]) -> FirmwareKeyCatalog {
        let mut catalog = FirmwareKeyCatalog::default();
        for tag in versions {
            catalog.firmware.insert(
                version(tag),
                archive(&format!("Firmware {}.zip", tag), tag),
            );
            catalog
                .keys
                .insert(version(tag), archive(&format!("Keys {}.zip", tag), tag));
        }
        catalog
    }

    fn healthy_state(tag: &str) -> ReconcileState {
        ReconcileState {
            firmware_version: Some(version(tag)),
            keys_version: Some(version(tag)),
            firmware_present: true,
            prod_keys_present: true,
            ask_firmware: true,
        }
    }

    #[test]
    fn test_nothing_to_do_asks_nothing() {
        let catalog = catalog_with(&["16.1.0", "17.0.0"]);
        let mut prompter = Scripted::new(&[]);

        let plan = plan_reconcile(&healthy_state("17.0.0"), &catalog, &mut prompter);

        assert!(plan.is_empty());
        assert!(prompter.asked.is_empty());
    }

    #[test]
    fn test_missing_keys_use_installed_firmware_version() {
        let catalog = catalog_with(&["16.1.0", "17.0.0"]);
        let state = ReconcileState {
            firmware_version: Some(version("16.1.0")),
            firmware_present: true,
            prod_keys_present: false,
            ask_firmware: true,
            ..Default::default()
        };
        let mut prompter = Scripted::new(&[true]);

        let plan = plan_reconcile(&state, &catalog, &mut prompter);

        assert_eq!(plan.keys, Some(version("16.1.0")));
        assert_eq!(plan.firmware, None);
    }

    #[test]
    fn test_missing_keys_without_firmware_use_latest_common() {
        let catalog = catalog_with(&["16.1.0", "17.0.0"]);
        let state = ReconcileState {
            ask_firmware: false,
            ..Default::default()
        };
        let mut prompter = Scripted::new(&[true]);

        let plan = plan_reconcile(&state, &catalog, &mut prompter);

        assert_eq!(plan.keys, Some(version("17.0.0")));
    }

    #[test]
    fn test_declined_keys_are_not_planned() {
        let catalog = catalog_with(&["17.0.0"]);
        let state = ReconcileState {
            ask_firmware: false,
            ..Default::default()
        };
        let mut prompter = Scripted::new(&[false]);

        let plan = plan_reconcile(&state, &catalog, &mut prompter);

        assert!(plan.is_empty());
        assert_eq!(prompter.asked.len(), 1);
    }

    #[test]
    fn test_firmware_prompt_respects_ask_flag() {
        let catalog = catalog_with(&["17.0.0"]);
        let state = ReconcileState {
            keys_version: Some(version("17.0.0")),
            prod_keys_present: true,
            ask_firmware: false,
            ..Default::default()
        };
        let mut prompter = Scripted::new(&[]);

        let plan = plan_reconcile(&state, &catalog, &mut prompter);

        assert!(plan.is_empty());
        assert!(prompter.asked.is_empty());
    }

    #[test]
    fn test_declining_firmware_disables_the_prompt() {
        let catalog = catalog_with(&["17.0.0"]);
        let state = ReconcileState {
            keys_version: Some(version("17.0.0")),
            prod_keys_present: true,
            ask_firmware: true,
            ..Default::default()
        };
        let mut prompter = Scripted::new(&[false]);

        let plan = plan_reconcile(&state, &catalog, &mut prompter);

        assert!(plan.is_empty());
        assert!(plan.disable_ask_firmware);
    }

    #[test]
    fn test_accepted_firmware_uses_installed_keys_version() {
        let catalog = catalog_with(&["16.1.0", "17.0.0"]);
        let state = ReconcileState {
            keys_version: Some(version("16.1.0")),
            prod_keys_present: true,
            ask_firmware: true,
            ..Default::default()
        };
        let mut prompter = Scripted::new(&[true]);

        let plan = plan_reconcile(&state, &catalog, &mut prompter);

        assert_eq!(plan.firmware, Some(version("16.1.0")));
        assert!(!plan.disable_ask_firmware);
    }

    #[test]
    fn test_version_mismatch_aligns_on_higher_version() {
        let catalog = catalog_with(&["16.1.0", "17.0.0"]);
        let state = ReconcileState {
            firmware_version: Some(version("17.0.0")),
            keys_version: Some(version("16.1.0")),
            firmware_present: true,
            prod_keys_present: true,
            ask_firmware: true,
        };
        let mut prompter = Scripted::new(&[true]);

        let plan = plan_reconcile(&state, &catalog, &mut prompter);

        // Firmware is already at the target, only the keys move
        assert_eq!(plan.keys, Some(version("17.0.0")));
        assert_eq!(plan.firmware, None);
    }

    #[test]
    fn test_rebootless_revision_wins_mismatch() {
        let catalog = catalog_with(&["16.1.0", "16.1.0-1"]);
        let state = ReconcileState {
            firmware_version: Some(version("16.1.0-1")),
            keys_version: Some(version("16.1.0")),
            firmware_present: true,
            prod_keys_present: true,
            ask_firmware: true,
        };
        let mut prompter = Scripted::new(&[true]);

        let plan = plan_reconcile(&state, &catalog, &mut prompter);

        assert_eq!(plan.keys, Some(version("16.1.0-1")));
    }

    #[test]
    fn test_catalog_miss_falls_back_to_latest_common() {
        // Keys for 17.0.0 were never published; 18.0.0 has both
        let mut catalog = catalog_with(&["16.1.0", "18.0.0"]);
        catalog
            .firmware
            .insert(version("17.0.0"), archive("Firmware 17.0.0.zip", "17.0.0"));

        let state = ReconcileState {
            firmware_version: Some(version("17.0.0")),
            keys_version: Some(version("16.1.0")),
            firmware_present: true,
            prod_keys_present: true,
            ask_firmware: true,
        };
        let mut prompter = Scripted::new(&[true, true]);

        let plan = plan_reconcile(&state, &catalog, &mut prompter);

        assert_eq!(plan.keys, Some(version("18.0.0")));
        assert_eq!(plan.firmware, Some(version("18.0.0")));
        assert!(!plan.notes.is_empty());
    }

    #[test]
    fn test_declined_fallback_drops_the_task() {
        let mut catalog = catalog_with(&["16.1.0", "18.0.0"]);
        catalog
            .firmware
            .insert(version("17.0.0"), archive("Firmware 17.0.0.zip", "17.0.0"));

        let state = ReconcileState {
            firmware_version: Some(version("17.0.0")),
            keys_version: Some(version("16.1.0")),
            firmware_present: true,
            prod_keys_present: true,
            ask_firmware: true,
        };
        // Yes to aligning versions, no to the latest-common fallback
        let mut prompter = Scripted::new(&[true, false]);

        let plan = plan_reconcile(&state, &catalog, &mut prompter);

        // The keys task is dropped and the firmware task matches what is
        // already installed, leaving nothing to do
        assert!(plan.is_empty());
    }

    #[test]
    fn test_unknown_recorded_versions_skip_the_mismatch_check() {
        let catalog = catalog_with(&["17.0.0"]);
        let state = ReconcileState {
            firmware_version: Some(version("16.1.0")),
            keys_version: None,
            firmware_present: true,
            prod_keys_present: true,
            ask_firmware: true,
        };
        let mut prompter = Scripted::new(&[]);

        let plan = plan_reconcile(&state, &catalog, &mut prompter);

        assert!(plan.is_empty());
        assert!(prompter.asked.is_empty());
    }
}
