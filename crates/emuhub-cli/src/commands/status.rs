//! The `status` command

use crate::context::App;
use anyhow::Result;
use emuhub_config::{EmulatorId, VersionKey};
use emuhub_emulator::installed_version;
use emuhub_firmware::{firmware_installed, installed_keys};

pub async fn run() -> Result<()> {
    let app = App::load()?;

    println!(
        "Data directory: {}{}",
        app.paths.config_dir().display(),
        if app.paths.is_portable() {
            " (portable)"
        } else {
            ""
        }
    );
    println!();

    for id in EmulatorId::ALL {
        let emulator = app.emulator(id);

        match installed_version(&emulator, &app.versions) {
            Some(version) if version.is_empty() => {
                println!("{:<10} installed (local archive)", id.display_name());
            }
            Some(version) => println!("{:<10} installed {}", id.display_name(), version),
            None => println!("{:<10} not installed", id.display_name()),
        }

        if let Some(exe) = emulator.executable_path() {
            println!("{:<10}   executable: {}", "", exe.display());
        }

        if let Some(paths) = emulator.switch_paths() {
            println!(
                "{:<10}   firmware: {}, keys: {}",
                "",
                describe(firmware_installed(&paths), app.versions.get(VersionKey::Firmware(id))),
                describe(installed_keys(&paths).prod, app.versions.get(VersionKey::Keys(id))),
            );
        }
    }

    if app.settings.app.check_for_app_updates {
        match app.catalog().app_update_available(env!("CARGO_PKG_VERSION")).await {
            Ok(Some(tag)) => {
                println!();
                println!(
                    "EmuHub {} is available (this is {})",
                    tag,
                    env!("CARGO_PKG_VERSION")
                );
            }
            Ok(None) => {}
            Err(e) => tracing::debug!("Update check failed: {}", e),
        }
    }

    Ok(())
}

fn describe(present: bool, recorded: Option<&str>) -> String {
    match (present, recorded) {
        (false, _) => "none".to_string(),
        (true, Some(version)) if !version.is_empty() => version.to_string(),
        (true, _) => "unknown version".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_states() {
        assert_eq!(describe(false, Some("17.0.0")), "none");
        assert_eq!(describe(true, Some("17.0.0")), "17.0.0");
        assert_eq!(describe(true, Some("")), "unknown version");
        assert_eq!(describe(true, None), "unknown version");
    }
}
