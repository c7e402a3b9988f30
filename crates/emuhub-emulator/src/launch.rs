//! Launching installed emulators

use crate::{Emulator, EmulatorError};
use std::process::{Command, ExitStatus, Stdio};

/// What a launch produced
#[derive(Debug)]
pub struct LaunchOutcome {
    /// PID of the spawned process
    pub pid: u32,

    /// Exit status when the launch waited for the emulator to close
    pub status: Option<ExitStatus>,
}

/// Start the emulator, either waiting for it to exit or detaching
pub fn launch(emulator: &Emulator, wait_for_exit: bool) -> Result<LaunchOutcome, EmulatorError> {
    let executable = emulator
        .executable_path()
        .ok_or(EmulatorError::ExecutableNotFound(emulator.id()))?;

    tracing::info!(
        "Launching {} via {}",
        emulator.id().display_name(),
        executable.display()
    );

    let mut cmd = Command::new(&executable);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::null());
    cmd.stderr(Stdio::null());

    let mut child = cmd
        .spawn()
        .map_err(|e| EmulatorError::LaunchFailed(format!("Failed to spawn process: {}", e)))?;
    let pid = child.id();

    let status = if wait_for_exit {
        let status = child
            .wait()
            .map_err(|e| EmulatorError::LaunchFailed(format!("Failed to wait for exit: {}", e)))?;
        tracing::info!("{} exited with {}", emulator.id().display_name(), status);
        Some(status)
    } else {
        None
    };

    Ok(LaunchOutcome { pid, status })
}
