//! Settings and cache commands

use crate::args::{CacheArgs, CacheCmd, ConfigArgs, ConfigCmd};
use crate::context::App;
use anyhow::{Context as _, Result, bail};
use emuhub_catalog::Cache;
use emuhub_config::Settings;
use std::path::PathBuf;

pub fn run(args: ConfigArgs) -> Result<()> {
    match args.cmd {
        ConfigCmd::Show => show(),
        ConfigCmd::Set { key, value } => set(&key, &value),
    }
}

pub fn cache(args: CacheArgs) -> Result<()> {
    match args.cmd {
        CacheCmd::Clear => {
            let app = App::load()?;
            Cache::new(app.paths.cache_dir().to_path_buf()).clear()?;
            app.downloader().cleanup()?;
            println!("Cache cleared");
            Ok(())
        }
    }
}

fn show() -> Result<()> {
    let app = App::load()?;
    println!("Settings file: {}", app.paths.settings_file().display());
    println!("{}", serde_json::to_string_pretty(&app.settings)?);
    Ok(())
}

fn set(key: &str, value: &str) -> Result<()> {
    let mut app = App::load()?;
    apply_setting(&mut app.settings, key, value)?;
    app.save_settings()?;
    println!("{} = {}", key, value);
    Ok(())
}

fn apply_setting(settings: &mut Settings, key: &str, value: &str) -> Result<()> {
    match key {
        "app.delete_files_after_installing" => {
            settings.app.delete_files_after_installing = parse_bool(value)?;
        }
        "app.auto_emulator_updates" => settings.app.auto_emulator_updates = parse_bool(value)?,
        "app.ask_firmware" => settings.app.ask_firmware = parse_bool(value)?,
        "app.check_for_app_updates" => settings.app.check_for_app_updates = parse_bool(value)?,
        "app.github_token" => {
            settings.app.github_token = if value.trim().is_empty() {
                None
            } else {
                Some(value.to_string())
            };
        }

        "dolphin.user_directory" => settings.dolphin.user_directory = parse_dir(value)?,
        "dolphin.install_directory" => settings.dolphin.install_directory = parse_dir(value)?,
        "dolphin.rom_directory" => settings.dolphin.rom_directory = parse_optional_dir(value)?,
        "dolphin.channel" => settings.dolphin.channel = value.parse()?,

        "yuzu.user_directory" => settings.yuzu.user_directory = parse_dir(value)?,
        "yuzu.install_directory" => settings.yuzu.install_directory = parse_dir(value)?,
        "yuzu.channel" => settings.yuzu.channel = value.parse()?,

        "ryujinx.user_directory" => settings.ryujinx.user_directory = parse_dir(value)?,
        "ryujinx.install_directory" => settings.ryujinx.install_directory = parse_dir(value)?,

        "xenia.user_directory" => settings.xenia.user_directory = parse_dir(value)?,
        "xenia.install_directory" => settings.xenia.install_directory = parse_dir(value)?,
        "xenia.rom_directory" => settings.xenia.rom_directory = parse_optional_dir(value)?,
        "xenia.channel" => settings.xenia.channel = value.parse()?,

        other => bail!("Unknown setting: {}", other),
    }
    Ok(())
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        other => bail!("Not a boolean: {}", other),
    }
}

/// Directories must exist or be creatable
fn parse_dir(value: &str) -> Result<PathBuf> {
    if value.trim().is_empty() {
        bail!("Directory values may not be empty");
    }
    let path = PathBuf::from(value);
    std::fs::create_dir_all(&path)
        .with_context(|| format!("{} is not a usable directory", path.display()))?;
    Ok(path)
}

/// An empty value clears an optional directory
fn parse_optional_dir(value: &str) -> Result<Option<PathBuf>> {
    if value.trim().is_empty() {
        Ok(None)
    } else {
        parse_dir(value).map(Some)
    }
}
