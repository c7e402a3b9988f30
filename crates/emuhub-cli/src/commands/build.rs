//! Installing, launching and deleting emulator builds

use crate::args::{DeleteArgs, InstallArgs, LaunchArgs};
use crate::commands::firmware;
use crate::context::App;
use crate::progress;
use crate::prompt::ConsolePrompter;
use anyhow::{Context as _, Result};
use emuhub_catalog::{EmulatorBuild, FirmwareKeyCatalog, is_newer};
use emuhub_config::VersionStore;
use emuhub_emulator::{
    Emulator, EmulatorError, Prompter, install_build, installed_version, verify_build_archive,
};
use emuhub_progress::ProgressHandle;
use std::fs;
use std::path::PathBuf;

pub async fn install(args: InstallArgs) -> Result<()> {
    let app = App::load()?;
    let emulator = app.emulator(args.emulator);

    match args.file {
        Some(file) => {
            verify_build_archive(&emulator, &file)?;

            let handle = ProgressHandle::new();
            let worker = handle.clone();
            let versions_file = app.paths.versions_file();
            let target = emulator.clone();
            progress::watch_blocking(&handle, move || -> Result<PathBuf, EmulatorError> {
                let mut versions = VersionStore::load(&versions_file)?;
                install_build(&target, &file, "", &mut versions, &worker)
            })
            .await?;

            println!(
                "Installed {} from local archive",
                args.emulator.display_name()
            );
        }
        None => {
            let build = app
                .catalog()
                .emulator_build(args.emulator, &app.settings)
                .await?;
            println!(
                "Latest {} build: {}",
                args.emulator.display_name(),
                build.version
            );
            install_remote_build(&app, &emulator, build, args.keep_archive).await?;
        }
    }

    Ok(())
}

pub async fn launch(args: LaunchArgs, assume_yes: bool) -> Result<()> {
    let mut app = App::load()?;
    let emulator = app.emulator(args.emulator);

    if !args.no_checks && app.settings.app.auto_emulator_updates {
        offer_update(&app, &emulator, assume_yes).await?;
    }

    if !args.no_checks && args.emulator.is_switch() {
        // A launch should still work offline; a missing catalog just means
        // nothing can be offered for download
        let catalog = match app.catalog().firmware_key_catalog(false).await {
            Ok(catalog) => catalog,
            Err(e) => {
                tracing::warn!("Release catalog unavailable: {}", e);
                FirmwareKeyCatalog::default()
            }
        };
        firmware::run_reconcile(&mut app, &emulator, catalog, assume_yes).await?;
    }

    let wait = !args.detach;
    let target = emulator.clone();
    let outcome = tokio::task::spawn_blocking(move || emuhub_emulator::launch(&target, wait))
        .await
        .context("Launch task failed")??;

    match outcome.status {
        Some(status) if status.success() => {}
        Some(status) => println!("{} exited with {}", args.emulator.display_name(), status),
        None => println!(
            "Started {} (pid {})",
            args.emulator.display_name(),
            outcome.pid
        ),
    }

    Ok(())
}

pub async fn delete(args: DeleteArgs, assume_yes: bool) -> Result<()> {
    let app = App::load()?;
    let emulator = app.emulator(args.emulator);

    let mut prompter = ConsolePrompter::new(assume_yes);
    let message = format!(
        "Remove the installed {} build at {}?",
        args.emulator.display_name(),
        emulator.build_root().display()
    );
    if !prompter.confirm(&message) {
        println!("Aborted");
        return Ok(());
    }

    let mut versions = app.versions;
    emuhub_emulator::delete_build(&emulator, &mut versions)?;
    println!("Removed {}", args.emulator.display_name());
    Ok(())
}

/// Download a build archive and install it, recording its version
async fn install_remote_build(
    app: &App,
    emulator: &Emulator,
    build: EmulatorBuild,
    keep_archive: bool,
) -> Result<()> {
    let handle = ProgressHandle::new();

    let downloader = app.downloader();
    let archive = build.archive.clone();
    let dl_worker = handle.clone();
    let archive_path = progress::watch(&handle, async move {
        downloader.download(&archive, &dl_worker).await
    })
    .await?;

    let versions_file = app.paths.versions_file();
    let target = emulator.clone();
    let version = build.version.clone();
    let worker = handle.clone();
    let to_install = archive_path.clone();
    progress::watch_blocking(&handle, move || -> Result<PathBuf, EmulatorError> {
        let mut versions = VersionStore::load(&versions_file)?;
        install_build(&target, &to_install, &version, &mut versions, &worker)
    })
    .await?;

    if app.settings.app.delete_files_after_installing && !keep_archive {
        let _ = fs::remove_file(&archive_path);
    }

    println!(
        "Installed {} {}",
        emulator.id().display_name(),
        build.version
    );
    Ok(())
}

/// Offer to install a newer build when one exists
async fn offer_update(app: &App, emulator: &Emulator, assume_yes: bool) -> Result<()> {
    let current = match installed_version(emulator, &app.versions) {
        Some(version) if !version.is_empty() => version,
        // Local archives have no comparable version
        _ => return Ok(()),
    };

    let build = match app
        .catalog()
        .emulator_build(emulator.id(), &app.settings)
        .await
    {
        Ok(build) => build,
        Err(e) => {
            tracing::warn!("Update check failed: {}", e);
            return Ok(());
        }
    };

    if !is_newer(&build.version, &current) {
        return Ok(());
    }

    let mut prompter = ConsolePrompter::new(assume_yes);
    let message = format!(
        "{} {} is available (installed {}). Install it before launching?",
        emulator.id().display_name(),
        build.version,
        current
    );
    if prompter.confirm(&message) {
        install_remote_build(app, emulator, build, false).await?;
    }
    Ok(())
}
