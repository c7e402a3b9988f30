//! Command line surface

use clap::{Args, Parser, Subcommand};
use emuhub_config::EmulatorId;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "emuhub",
    version,
    about = "Manage game console emulators: builds, Switch firmware, keys and user data"
)]
pub struct Cli {
    /// Answer yes to every confirmation
    #[arg(long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show installed emulators, firmware and keys
    Status,
    /// Download and install an emulator build
    Install(InstallArgs),
    /// Launch an emulator, checking firmware and updates first
    Launch(LaunchArgs),
    /// Remove an installed emulator build
    Delete(DeleteArgs),
    /// Switch firmware catalog and installs
    Firmware(FirmwareArgs),
    /// Switch decryption keys
    Keys(KeysArgs),
    /// Reconcile installed firmware and keys with the release catalog
    Sync(SyncArgs),
    /// Copy or remove emulator user data
    Data(DataArgs),
    /// Show or change settings
    Config(ConfigArgs),
    /// Manage cached release data
    Cache(CacheArgs),
}

#[derive(Args)]
pub struct InstallArgs {
    /// Emulator to install (dolphin, yuzu, ryujinx, xenia)
    pub emulator: EmulatorId,

    /// Install this local archive instead of downloading the latest build
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Keep the downloaded archive after installing
    #[arg(long)]
    pub keep_archive: bool,
}

#[derive(Args)]
pub struct LaunchArgs {
    /// Emulator to launch
    pub emulator: EmulatorId,

    /// Return immediately instead of waiting for the emulator to exit
    #[arg(long)]
    pub detach: bool,

    /// Skip the firmware, key and update checks
    #[arg(long)]
    pub no_checks: bool,
}

#[derive(Args)]
pub struct DeleteArgs {
    /// Emulator whose build to remove
    pub emulator: EmulatorId,
}

#[derive(Args)]
pub struct FirmwareArgs {
    #[command(subcommand)]
    pub cmd: FirmwareCmd,
}

#[derive(Subcommand)]
pub enum FirmwareCmd {
    /// List firmware and key versions available for download
    List {
        /// Refetch the catalog even when the cached copy is fresh
        #[arg(long)]
        refresh: bool,
    },
    /// Install firmware for a Switch emulator
    Install(FirmwareInstallArgs),
}

#[derive(Args)]
pub struct FirmwareInstallArgs {
    /// Target emulator (yuzu or ryujinx)
    pub emulator: EmulatorId,

    /// Version to install (defaults to the newest with matching keys)
    #[arg(long)]
    pub version: Option<String>,

    /// Install this local archive instead of downloading
    #[arg(long)]
    pub file: Option<PathBuf>,
}

#[derive(Args)]
pub struct KeysArgs {
    #[command(subcommand)]
    pub cmd: KeysCmd,
}

#[derive(Subcommand)]
pub enum KeysCmd {
    /// Install decryption keys for a Switch emulator
    Install(KeysInstallArgs),
}

#[derive(Args)]
pub struct KeysInstallArgs {
    /// Target emulator (yuzu or ryujinx)
    pub emulator: EmulatorId,

    /// Version to install (defaults to the newest with matching firmware)
    #[arg(long)]
    pub version: Option<String>,

    /// Install this local archive or bare .keys file instead of downloading
    #[arg(long)]
    pub file: Option<PathBuf>,
}

#[derive(Args)]
pub struct SyncArgs {
    /// Emulator whose firmware and keys to reconcile (yuzu or ryujinx)
    pub emulator: EmulatorId,
}

#[derive(Args)]
pub struct DataArgs {
    #[command(subcommand)]
    pub cmd: DataCmd,
}

#[derive(Subcommand)]
pub enum DataCmd {
    /// Copy user data out of an emulator's user directory
    Export(DataCopyArgs),
    /// Copy previously exported data back in
    Import(DataCopyArgs),
    /// Remove user data
    Delete(DataDeleteArgs),
}

#[derive(Args)]
pub struct DataCopyArgs {
    /// Emulator whose data to copy
    pub emulator: EmulatorId,

    /// Directory to copy to (export) or from (import)
    pub path: PathBuf,

    /// Only the emulator's save data
    #[arg(long, conflicts_with = "folders")]
    pub saves: bool,

    /// Only these top-level folders (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub folders: Vec<String>,
}

#[derive(Args)]
pub struct DataDeleteArgs {
    /// Emulator whose data to remove
    pub emulator: EmulatorId,

    /// Only the emulator's save data
    #[arg(long, conflicts_with = "folders")]
    pub saves: bool,

    /// Only these top-level folders (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub folders: Vec<String>,
}

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub cmd: ConfigCmd,
}

#[derive(Subcommand)]
pub enum ConfigCmd {
    /// Print the settings and where they live
    Show,
    /// Change one setting, e.g. `config set yuzu.channel early_access`
    Set {
        /// Dotted setting name (section.field)
        key: String,
        /// New value
        value: String,
    },
}

#[derive(Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub cmd: CacheCmd,
}

#[derive(Subcommand)]
pub enum CacheCmd {
    /// Delete cached catalog data and stale partial downloads
    Clear,
}
