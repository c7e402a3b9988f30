//! EmuHub command line front-end
//!
//! Wires the library crates together behind an `emuhub` binary: installing
//! emulator builds, keeping Switch firmware and keys in order, moving user
//! data around and launching the emulators themselves.

mod args;
mod commands;
mod context;
mod progress;
mod prompt;

use args::Cli;
use clap::Parser;

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    setup_logging();

    let cli = Cli::parse();
    if let Err(e) = commands::dispatch(cli).await {
        tracing::debug!("Command failed: {:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Logging to stderr, filtered by `RUST_LOG` (default `info`)
fn setup_logging() {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(std::io::stderr),
        )
        .init();
}
