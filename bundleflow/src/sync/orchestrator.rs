//! Sync run orchestrator.
//!
//! Drives a [`SyncPlan`] through a [`FetchStrategy`], then runs the caller's
//! confirm step (manifest re-acquisition, index rebuild, version persist)
//! and reports the outcome to a [`SyncObserver`].

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::error::{SyncError, SyncResult};
use super::observer::SyncObserver;
use super::planner::SyncPlan;
use super::state::{FetchJob, FetchState, SyncState};
use super::strategy::{
    FetchContext, FetchStrategy, ParallelStrategy, SequentialStrategy, DEFAULT_FETCH_TIMEOUT,
};
use super::transport::Transport;

/// Sync run orchestrator.
///
/// Owns the run state machine. Every call to [`run`](Self::run) starts from
/// [`SyncState::None`].
pub struct FetchOrchestrator {
    strategy: Box<dyn FetchStrategy>,
    timeout: Duration,
    state: SyncState,
}

impl Default for FetchOrchestrator {
    fn default() -> Self {
        Self::new(Box::new(SequentialStrategy::default()), DEFAULT_FETCH_TIMEOUT)
    }
}

impl std::fmt::Debug for FetchOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchOrchestrator")
            .field("strategy", &self.strategy.name())
            .field("timeout", &self.timeout)
            .field("state", &self.state)
            .finish()
    }
}

impl FetchOrchestrator {
    /// Create an orchestrator with an explicit strategy.
    pub fn new(strategy: Box<dyn FetchStrategy>, timeout: Duration) -> Self {
        Self {
            strategy,
            timeout,
            state: SyncState::None,
        }
    }

    /// Create an orchestrator that fetches one bundle at a time.
    pub fn sequential(pacing: Duration, timeout: Duration) -> Self {
        Self::new(Box::new(SequentialStrategy::new(pacing)), timeout)
    }

    /// Create an orchestrator that fetches up to `concurrency` bundles at once.
    pub fn parallel(concurrency: usize, timeout: Duration) -> Self {
        Self::new(Box::new(ParallelStrategy::new(concurrency)), timeout)
    }

    /// State of the current or most recent run.
    pub fn state(&self) -> SyncState {
        self.state
    }

    /// Return to [`SyncState::None`].
    pub fn reset(&mut self) {
        self.state = SyncState::None;
    }

    /// Fail the run before any fetch was attempted.
    ///
    /// Used when planning itself fails; the observer receives `on_failed`.
    pub fn fail(&mut self, error: &SyncError, observer: &dyn SyncObserver) {
        self.state = SyncState::Failed;
        error!(error = %error, "Sync failed before fetching");
        observer.on_failed(error);
    }

    /// Name of the configured strategy.
    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Execute a sync run.
    ///
    /// # Arguments
    ///
    /// * `plan` - Bundles to fetch, in order
    /// * `jobs` - One fetch job per plan entry
    /// * `transport` - Transport used for every fetch
    /// * `observer` - Receives progress and the final outcome
    /// * `cancel` - Aborts the run when triggered
    /// * `confirm` - Runs after every fetch succeeded; its error fails the run
    ///
    /// # Returns
    ///
    /// The final fetch state on success. On failure the observer has already
    /// received `on_failed` exactly once.
    pub async fn run<F>(
        &mut self,
        plan: &SyncPlan,
        jobs: &[FetchJob],
        transport: &dyn Transport,
        observer: &dyn SyncObserver,
        cancel: &CancellationToken,
        confirm: F,
    ) -> SyncResult<FetchState>
    where
        F: FnOnce() -> SyncResult<()>,
    {
        self.state = SyncState::None;
        let mut fetch_state = FetchState::new(jobs.len());

        let outcome = if plan.is_empty() {
            info!(version = plan.version, "Bundles up to date");
            confirm().map(|()| observer.on_progress(1, 1))
        } else {
            self.state = SyncState::InProgress;
            info!(
                bundles = plan.len(),
                strategy = self.strategy.name(),
                reason = %plan.reason,
                "Fetching bundles"
            );

            let ctx = FetchContext {
                transport,
                observer,
                cancel,
                timeout: self.timeout,
            };
            match self.strategy.execute(&mut fetch_state, jobs, ctx).await {
                Ok(()) => confirm(),
                Err(e) => Err(e),
            }
        };

        match outcome {
            Ok(()) => {
                self.state = SyncState::Success;
                info!(
                    version = plan.version,
                    fetched = fetch_state.completed,
                    bytes = fetch_state.bytes_fetched,
                    "Sync complete"
                );
                observer.on_complete();
                Ok(fetch_state)
            }
            Err(e) => {
                self.state = SyncState::Failed;
                error!(error = %e, "Sync failed");
                observer.on_failed(&e);
                Err(e)
            }
        }
    }
}
