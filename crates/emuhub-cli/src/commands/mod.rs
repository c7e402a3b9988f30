//! Command implementations

mod build;
mod config;
mod data;
mod firmware;
mod status;

use crate::args::{Cli, Command};
use anyhow::Result;

pub async fn dispatch(cli: Cli) -> Result<()> {
    let assume_yes = cli.yes;

    match cli.cmd {
        Command::Status => status::run().await,
        Command::Install(args) => build::install(args).await,
        Command::Launch(args) => build::launch(args, assume_yes).await,
        Command::Delete(args) => build::delete(args, assume_yes).await,
        Command::Firmware(args) => firmware::firmware(args).await,
        Command::Keys(args) => firmware::keys(args).await,
        Command::Sync(args) => firmware::sync(args, assume_yes).await,
        Command::Data(args) => data::run(args, assume_yes).await,
        Command::Config(args) => config::run(args),
        Command::Cache(args) => config::cache(args),
    }
}
