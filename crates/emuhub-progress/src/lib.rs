//! Progress reporting and cancellation shared between workers and front-ends
//!
//! Long-running jobs (downloads, archive installs, data copies) run on a
//! background thread or blocking task. The front-end keeps a clone of the
//! same [`ProgressHandle`], polls [`ProgressHandle::snapshot`] to redraw,
//! and calls [`ProgressHandle::cancel`] to request an unwind. Workers check
//! [`ProgressHandle::is_cancelled`] between units of work and roll back
//! before returning.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Lifecycle of a background task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Running,
    Finished,
    Cancelled,
    Failed,
}

impl TaskState {
    /// Whether the task has reached a final state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Finished | TaskState::Cancelled | TaskState::Failed
        )
    }
}

/// Point-in-time view of a task, cloned out for pollers
#[derive(Debug, Clone)]
pub struct ProgressSnapshot {
    /// Operation title ("Installing firmware 18.1.0")
    pub title: String,
    /// Current phase label ("Downloading...", "Extracting...")
    pub status: String,
    /// Unit name for display ("bytes", "files")
    pub units: String,
    /// Total units of work, 0 when unknown
    pub total: u64,
    /// Units completed so far
    pub completed: u64,
    /// Current state
    pub state: TaskState,
}

impl ProgressSnapshot {
    /// Get progress as percentage (0-100)
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            0
        } else {
            ((self.completed as f64 / self.total as f64) * 100.0) as u8
        }
    }
}

impl Default for ProgressSnapshot {
    fn default() -> Self {
        Self {
            title: String::new(),
            status: String::new(),
            units: String::new(),
            total: 0,
            completed: 0,
            state: TaskState::Pending,
        }
    }
}

#[derive(Debug)]
struct Inner {
    snapshot: Mutex<ProgressSnapshot>,
    cancelled: AtomicBool,
}

/// Handle shared between a background worker and a polling front-end
///
/// Cloning is cheap; all clones observe the same task. Cancellation is
/// sticky until [`reset`](ProgressHandle::reset).
#[derive(Debug, Clone)]
pub struct ProgressHandle {
    inner: Arc<Inner>,
}

impl Default for ProgressHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressHandle {
    /// Create an idle handle in `Pending` state
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                snapshot: Mutex::new(ProgressSnapshot::default()),
                cancelled: AtomicBool::new(false),
            }),
        }
    }

    /// Start a new operation on this handle
    ///
    /// A pipeline shares one handle across its stages, so a pending
    /// cancellation carries over: beginning on a cancelled handle starts in
    /// `Cancelled` and the worker unwinds at its first check.
    pub fn begin(&self, title: &str, total: u64, units: &str) {
        let cancelled = self.is_cancelled();
        let mut snap = self.inner.snapshot.lock().unwrap();
        *snap = ProgressSnapshot {
            title: title.to_string(),
            status: String::new(),
            units: units.to_string(),
            total,
            completed: 0,
            state: if cancelled {
                TaskState::Cancelled
            } else {
                TaskState::Running
            },
        };
        tracing::debug!("Task started: {} ({} {})", title, total, units);
    }

    /// Clear any cancellation and return to `Pending` for reuse
    pub fn reset(&self) {
        self.inner.cancelled.store(false, Ordering::SeqCst);
        let mut snap = self.inner.snapshot.lock().unwrap();
        *snap = ProgressSnapshot::default();
    }

    /// Update the phase label
    pub fn set_status(&self, status: &str) {
        let mut snap = self.inner.snapshot.lock().unwrap();
        snap.status = status.to_string();
    }

    /// Adjust the total mid-run (installers shrink it when skipping entries)
    pub fn set_total(&self, total: u64) {
        let mut snap = self.inner.snapshot.lock().unwrap();
        snap.total = total;
    }

    /// Set absolute completed units
    pub fn set_completed(&self, completed: u64) {
        let mut snap = self.inner.snapshot.lock().unwrap();
        snap.completed = completed;
    }

    /// Add `n` completed units
    pub fn advance(&self, n: u64) {
        let mut snap = self.inner.snapshot.lock().unwrap();
        snap.completed = snap.completed.saturating_add(n);
    }

    /// Mark the task finished; completed snaps to total
    pub fn finish(&self) {
        let mut snap = self.inner.snapshot.lock().unwrap();
        if snap.total > 0 {
            snap.completed = snap.total;
        }
        snap.state = TaskState::Finished;
    }

    /// Mark the task failed
    pub fn fail(&self) {
        let mut snap = self.inner.snapshot.lock().unwrap();
        snap.state = TaskState::Failed;
    }

    /// Request cancellation
    ///
    /// Sets the flag workers poll and flips a running task to `Cancelled`.
    /// The worker still owns the unwind (rollback, partial-file removal).
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        let mut snap = self.inner.snapshot.lock().unwrap();
        if !snap.state.is_terminal() {
            snap.state = TaskState::Cancelled;
        }
        tracing::debug!("Task cancelled: {}", snap.title);
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Get current progress
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.inner.snapshot.lock().unwrap().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_percent() {
        let handle = ProgressHandle::new();
        handle.begin("Test", 100, "bytes");
        handle.advance(50);

        assert_eq!(handle.snapshot().percent(), 50);
    }

    #[test]
    fn test_percent_zero_total() {
        let handle = ProgressHandle::new();
        handle.begin("Test", 0, "");
        assert_eq!(handle.snapshot().percent(), 0);
    }

    #[test]
    fn test_cancel_carries_over_to_next_begin() {
        let handle = ProgressHandle::new();
        handle.begin("Test", 10, "files");
        handle.cancel();

        assert!(handle.is_cancelled());
        assert_eq!(handle.snapshot().state, TaskState::Cancelled);

        handle.begin("Next", 5, "files");
        assert!(handle.is_cancelled());
        assert_eq!(handle.snapshot().state, TaskState::Cancelled);
    }

    #[test]
    fn test_reset_clears_cancellation() {
        let handle = ProgressHandle::new();
        handle.begin("Test", 10, "files");
        handle.cancel();
        handle.reset();

        assert!(!handle.is_cancelled());
        assert_eq!(handle.snapshot().state, TaskState::Pending);

        handle.begin("Next", 5, "files");
        assert_eq!(handle.snapshot().state, TaskState::Running);
    }

    #[test]
    fn test_cancel_does_not_override_terminal_state() {
        let handle = ProgressHandle::new();
        handle.begin("Test", 10, "files");
        handle.finish();
        handle.cancel();

        assert_eq!(handle.snapshot().state, TaskState::Finished);
        assert!(handle.is_cancelled());
    }

    #[test]
    fn test_finish_snaps_to_total() {
        let handle = ProgressHandle::new();
        handle.begin("Test", 8, "files");
        handle.advance(3);
        handle.finish();

        let snap = handle.snapshot();
        assert_eq!(snap.completed, 8);
        assert_eq!(snap.state, TaskState::Finished);
    }

    #[test]
    fn test_set_total_shrinks() {
        let handle = ProgressHandle::new();
        handle.begin("Test", 10, "files");
        handle.set_total(7);

        assert_eq!(handle.snapshot().total, 7);
    }

    #[test]
    fn test_clones_share_state() {
        let handle = ProgressHandle::new();
        let other = handle.clone();

        handle.begin("Shared", 4, "");
        other.advance(2);

        assert_eq!(handle.snapshot().completed, 2);
    }
}
