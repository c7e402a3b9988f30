//! Switch firmware and key commands

use crate::args::{
    FirmwareArgs, FirmwareCmd, FirmwareInstallArgs, KeysArgs, KeysCmd, KeysInstallArgs, SyncArgs,
};
use crate::context::App;
use crate::progress;
use crate::prompt::ConsolePrompter;
use anyhow::{Result, anyhow};
use emuhub_catalog::{FirmwareKeyCatalog, FirmwareVersion, RemoteArchive};
use emuhub_config::{VersionKey, VersionStore};
use emuhub_emulator::{
    Emulator, EmulatorError, ReconcileState, execute_reconcile_plan, plan_reconcile,
};
use emuhub_firmware::{
    FirmwareInstallOutcome, KeyInstallOutcome, install_firmware, install_key_file,
    install_keys_from_archive, verify_firmware_archive, verify_key_archive,
};
use emuhub_progress::ProgressHandle;
use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

pub async fn firmware(args: FirmwareArgs) -> Result<()> {
    match args.cmd {
        FirmwareCmd::List { refresh } => list(refresh).await,
        FirmwareCmd::Install(args) => install_firmware_cmd(args).await,
    }
}

pub async fn keys(args: KeysArgs) -> Result<()> {
    match args.cmd {
        KeysCmd::Install(args) => install_keys_cmd(args).await,
    }
}

pub async fn sync(args: SyncArgs, assume_yes: bool) -> Result<()> {
    let mut app = App::load()?;
    let emulator = app.emulator(args.emulator);

    let catalog = app.catalog().firmware_key_catalog(false).await?;
    let installed = run_reconcile(&mut app, &emulator, catalog, assume_yes).await?;
    if !installed {
        println!("Firmware and keys are in order; nothing to do");
    }
    Ok(())
}

/// Gather state, plan with prompts, then execute whatever was agreed
///
/// Returns whether anything was installed.
pub(crate) async fn run_reconcile(
    app: &mut App,
    emulator: &Emulator,
    catalog: FirmwareKeyCatalog,
    assume_yes: bool,
) -> Result<bool> {
    let state = ReconcileState::gather(emulator, &app.versions, &app.settings)?;
    let mut prompter = ConsolePrompter::new(assume_yes);
    let plan = plan_reconcile(&state, &catalog, &mut prompter);

    for note in &plan.notes {
        println!("{}", note);
    }

    if plan.disable_ask_firmware {
        app.settings.app.ask_firmware = false;
        app.save_settings()?;
        println!("Firmware offers are now off (`config set app.ask_firmware true` re-enables them)");
    }

    if plan.is_empty() {
        return Ok(false);
    }

    let handle = ProgressHandle::new();
    let worker = handle.clone();
    let target = emulator.clone();
    let downloader = app.downloader();
    let delete_archives = app.settings.app.delete_files_after_installing;
    let versions_file = app.paths.versions_file();

    let outcome = progress::watch(&handle, async move {
        let mut versions = VersionStore::load(&versions_file).map_err(EmulatorError::from)?;
        execute_reconcile_plan(
            &plan,
            &target,
            &catalog,
            &downloader,
            &mut versions,
            delete_archives,
            &worker,
        )
        .await
    })
    .await?;

    if let Some(version) = outcome.keys_installed {
        println!("Installed keys {}", version);
    }
    if outcome.keys_missing_prod {
        println!("Warning: the key archive held no prod.keys; games will not boot without them");
    }
    if let Some(version) = outcome.firmware_installed {
        println!("Installed firmware {}", version);
    }
    for entry in &outcome.skipped_entries {
        tracing::debug!("Skipped firmware entry {}", entry);
    }

    // The worker wrote through its own store; pick the changes up
    app.versions = VersionStore::load(&app.paths.versions_file())?;

    Ok(true)
}

async fn list(refresh: bool) -> Result<()> {
    let app = App::load()?;
    let catalog = app.catalog().firmware_key_catalog(refresh).await?;

    if catalog.is_empty() {
        println!("The release catalog has no firmware entries");
        return Ok(());
    }

    let mut versions: BTreeSet<FirmwareVersion> = catalog.firmware.keys().copied().collect();
    versions.extend(catalog.keys.keys().copied());

    println!("{:<30} {:<8} {:<8}", "Version", "Firmware", "Keys");
    for version in versions.iter().rev() {
        println!(
            "{:<30} {:<8} {:<8}",
            version.to_string(),
            mark(catalog.firmware_for(version).is_some()),
            mark(catalog.keys_for(version).is_some()),
        );
    }

    if let Some(latest) = catalog.latest_common_version() {
        println!();
        println!("Latest installable pair: {}", latest);
    }

    Ok(())
}

async fn install_firmware_cmd(args: FirmwareInstallArgs) -> Result<()> {
    let app = App::load()?;
    let emulator = app.emulator(args.emulator);
    let switch = emulator
        .switch_paths()
        .ok_or_else(|| anyhow!("{} does not use Switch firmware", args.emulator.display_name()))?;

    let handle = ProgressHandle::new();

    if let Some(file) = args.file {
        let info = verify_firmware_archive(&file)?;
        println!(
            "{}: {} NCA entries, {:.1} MiB uncompressed",
            file.display(),
            info.entries,
            info.uncompressed_size as f64 / (1024.0 * 1024.0)
        );

        let worker = handle.clone();
        let outcome =
            progress::watch_blocking(&handle, move || install_firmware(&file, &switch, &worker))
                .await?;
        report_firmware(&outcome);

        // Without --version a local archive's system version is unknown
        let recorded = match args.version.as_deref() {
            Some(raw) => raw.parse::<FirmwareVersion>()?.to_string(),
            None => String::new(),
        };
        let mut versions = app.versions;
        versions.set(VersionKey::Firmware(args.emulator), &recorded)?;
        return Ok(());
    }

    let catalog = app.catalog().firmware_key_catalog(false).await?;
    let version = pick_version(args.version.as_deref(), &catalog, |c| {
        c.firmware_versions()
    })?;
    let archive = catalog
        .firmware_for(&version)
        .ok_or_else(|| anyhow!("Firmware {} is not in the release catalog", version))?
        .clone();

    let downloaded = download(&app, &handle, &archive).await?;

    let worker = handle.clone();
    let to_install = downloaded.clone();
    let outcome =
        progress::watch_blocking(&handle, move || install_firmware(&to_install, &switch, &worker))
            .await?;
    report_firmware(&outcome);

    let mut versions = app.versions;
    versions.set(VersionKey::Firmware(args.emulator), &archive.version)?;
    if app.settings.app.delete_files_after_installing {
        let _ = fs::remove_file(&downloaded);
    }

    println!("Installed firmware {}", version);
    Ok(())
}

async fn install_keys_cmd(args: KeysInstallArgs) -> Result<()> {
    let app = App::load()?;
    let emulator = app.emulator(args.emulator);
    let switch = emulator
        .switch_paths()
        .ok_or_else(|| anyhow!("{} does not use Switch keys", args.emulator.display_name()))?;

    let handle = ProgressHandle::new();

    if let Some(file) = args.file {
        verify_key_archive(&file)?;

        if file.extension().is_some_and(|e| e == "keys") {
            let installed = install_key_file(&file, &switch)?;
            println!("Installed {}", installed.display());
        } else {
            let worker = handle.clone();
            let outcome = progress::watch_blocking(&handle, move || {
                install_keys_from_archive(&file, &switch, &worker)
            })
            .await?;
            report_keys(&outcome);
        }

        let recorded = match args.version.as_deref() {
            Some(raw) => raw.parse::<FirmwareVersion>()?.to_string(),
            None => String::new(),
        };
        let mut versions = app.versions;
        versions.set(VersionKey::Keys(args.emulator), &recorded)?;
        return Ok(());
    }

    let catalog = app.catalog().firmware_key_catalog(false).await?;
    let version = pick_version(args.version.as_deref(), &catalog, |c| c.key_versions())?;
    let archive = catalog
        .keys_for(&version)
        .ok_or_else(|| anyhow!("Keys {} are not in the release catalog", version))?
        .clone();

    let downloaded = download(&app, &handle, &archive).await?;

    let worker = handle.clone();
    let to_install = downloaded.clone();
    let outcome = progress::watch_blocking(&handle, move || {
        install_keys_from_archive(&to_install, &switch, &worker)
    })
    .await?;
    report_keys(&outcome);

    let mut versions = app.versions;
    versions.set(VersionKey::Keys(args.emulator), &archive.version)?;
    if app.settings.app.delete_files_after_installing {
        let _ = fs::remove_file(&downloaded);
    }

    println!("Installed keys {}", version);
    Ok(())
}

/// Parse a requested version or fall back to the newest installable one
fn pick_version(
    requested: Option<&str>,
    catalog: &FirmwareKeyCatalog,
    available: impl Fn(&FirmwareKeyCatalog) -> Vec<FirmwareVersion>,
) -> Result<FirmwareVersion> {
    match requested {
        Some(raw) => Ok(raw.parse()?),
        None => catalog
            .latest_common_version()
            .or_else(|| available(catalog).into_iter().next())
            .ok_or_else(|| anyhow!("The release catalog has no usable entries")),
    }
}

async fn download(app: &App, handle: &ProgressHandle, archive: &RemoteArchive) -> Result<PathBuf> {
    let downloader = app.downloader();
    let archive = archive.clone();
    let worker = handle.clone();
    progress::watch(handle, async move {
        downloader.download(&archive, &worker).await
    })
    .await
}

fn report_firmware(outcome: &FirmwareInstallOutcome) {
    println!("Installed {} content files", outcome.installed);
    for entry in &outcome.skipped {
        println!("Skipped {}", entry);
    }
}

fn report_keys(outcome: &KeyInstallOutcome) {
    println!("Extracted {} key files", outcome.extracted.len());
    if !outcome.has_prod_keys {
        println!("Warning: the archive held no prod.keys; games will not boot without them");
    }
}

fn mark(present: bool) -> &'static str {
    if present { "yes" } else { "-" }
}
