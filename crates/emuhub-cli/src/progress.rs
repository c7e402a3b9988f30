//! Single status line over a polled progress handle

use anyhow::{Context as _, Result};
use emuhub_progress::{ProgressHandle, ProgressSnapshot};
use std::future::Future;
use std::io::{self, Write};
use std::time::Duration;
use tokio::task::JoinHandle;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Run a worker future to completion while rendering its progress
///
/// The worker holds its own clone of the handle; this side polls snapshots
/// every 100 ms and redraws one line. Ctrl-C requests cancellation and the
/// worker's unwind surfaces as its error.
pub async fn watch<F, T, E>(progress: &ProgressHandle, worker: F) -> Result<T>
where
    F: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    Ok(drive(progress, tokio::spawn(worker)).await??)
}

/// Like [`watch`] for blocking work, run on the blocking thread pool
pub async fn watch_blocking<F, T, E>(progress: &ProgressHandle, work: F) -> Result<T>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    Ok(drive(progress, tokio::task::spawn_blocking(work)).await??)
}

async fn drive<R: Send + 'static>(progress: &ProgressHandle, mut task: JoinHandle<R>) -> Result<R> {
    let mut ticker = tokio::time::interval(POLL_INTERVAL);
    let mut width = 0usize;

    loop {
        tokio::select! {
            joined = &mut task => {
                redraw(&render(&progress.snapshot()), &mut width);
                if width > 0 {
                    println!();
                }
                return joined.context("Worker task failed");
            }
            _ = tokio::signal::ctrl_c() => {
                progress.cancel();
                redraw("Cancelling...", &mut width);
            }
            _ = ticker.tick() => {
                redraw(&render(&progress.snapshot()), &mut width);
            }
        }
    }
}

/// Overwrite the current line, padding over leftovers from longer ones
fn redraw(line: &str, width: &mut usize) {
    if line.is_empty() && *width == 0 {
        return;
    }
    print!("\r{:<pad$}", line, pad = *width);
    let _ = io::stdout().flush();
    *width = (*width).max(line.len());
}

fn render(snap: &ProgressSnapshot) -> String {
    if snap.title.is_empty() {
        return String::new();
    }

    let mut line = snap.title.clone();
    if !snap.status.is_empty() {
        line.push_str(": ");
        line.push_str(&snap.status);
    }

    // Byte totals read better in MiB
    if snap.units == "bytes" {
        if snap.total > 0 {
            line.push_str(&format!(
                " {:.1}/{:.1} MiB ({}%)",
                mib(snap.completed),
                mib(snap.total),
                snap.percent()
            ));
        } else if snap.completed > 0 {
            line.push_str(&format!(" {:.1} MiB", mib(snap.completed)));
        }
    } else if snap.total > 0 {
        line.push_str(&format!(
            " {}/{} {} ({}%)",
            snap.completed,
            snap.total,
            snap.units,
            snap.percent()
        ));
    }

    line
}

fn mib(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}
