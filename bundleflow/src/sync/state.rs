//! Sync run state tracking.
//!
//! [`SyncState`] is the run-level state machine; [`FetchState`] tracks the
//! progress of the fetch phase of a single run.

use std::fmt;
use std::path::PathBuf;

/// State of a sync run.
///
/// ```text
/// None ──(empty plan)──────────────► Success
/// None ──► InProgress ──────────────► Success
///              └────────────────────► Failed
/// ```
///
/// `Success` and `Failed` are terminal for a run; the next run starts again
/// from `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SyncState {
    /// No run has started.
    #[default]
    None,
    /// Fetches are being executed.
    InProgress,
    /// The run completed and the version was persisted.
    Success,
    /// The run was aborted.
    Failed,
}

impl SyncState {
    /// Whether the state is terminal for the current run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SyncState::Success | SyncState::Failed)
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SyncState::None => "none",
            SyncState::InProgress => "in progress",
            SyncState::Success => "success",
            SyncState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// A single bundle to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchJob {
    /// Bundle name.
    pub bundle: String,
    /// Remote location of the bundle.
    pub location: String,
    /// Local destination file.
    pub destination: PathBuf,
}

/// Progress of the fetch phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchState {
    /// Number of bundles in the plan.
    pub total: usize,
    /// Number of bundles fetched so far. Never decreases.
    pub completed: usize,
    /// Total bytes written so far.
    pub bytes_fetched: u64,
    /// Bundle whose fetch failed, if any.
    pub failed: Option<String>,
}

impl FetchState {
    /// Create state for a plan of `total` bundles.
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    /// Whether every bundle was fetched.
    pub fn is_complete(&self) -> bool {
        self.completed == self.total && self.failed.is_none()
    }

    /// Progress as a ratio (0.0 to 1.0). An empty plan is complete.
    pub fn progress_ratio(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }

    /// Record a successful fetch.
    pub fn record_success(&mut self, bytes: u64) {
        self.completed += 1;
        self.bytes_fetched += bytes;
    }

    /// Record the failed fetch that aborted the run.
    pub fn record_failure(&mut self, bundle: impl Into<String>) {
        self.failed = Some(bundle.into());
    }
}
