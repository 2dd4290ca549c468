//! Fetch strategies for executing a sync plan.
//!
//! Implements the Strategy pattern for sequential vs parallel fetching of
//! bundles. Both strategies are fail-fast: the first failed fetch aborts the
//! remaining work and is returned as the run's error.

use std::time::Duration;

use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::error::{SyncError, SyncResult};
use super::observer::SyncObserver;
use super::state::{FetchJob, FetchState};
use super::transport::{BoxFuture, Transport};

/// Default pause between sequential fetches.
pub const DEFAULT_PACING: Duration = Duration::from_millis(100);

/// Default per-fetch timeout.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(300);

/// Shared inputs for a strategy run.
#[derive(Clone, Copy)]
pub struct FetchContext<'a> {
    /// Transport used for every fetch.
    pub transport: &'a dyn Transport,
    /// Receives one `on_progress` per completed fetch.
    pub observer: &'a dyn SyncObserver,
    /// Aborts the run when triggered.
    pub cancel: &'a CancellationToken,
    /// Upper bound on a single fetch.
    pub timeout: Duration,
}

/// Strategy for fetching the bundles of a plan.
pub trait FetchStrategy: Send + Sync {
    /// Execute the fetch jobs.
    ///
    /// # Arguments
    ///
    /// * `state` - Fetch state to update as jobs complete
    /// * `jobs` - Jobs in plan order
    /// * `ctx` - Transport, observer, cancellation and timeout
    ///
    /// # Returns
    ///
    /// Ok(()) when every job succeeded, or the first error encountered.
    fn execute<'a>(
        &'a self,
        state: &'a mut FetchState,
        jobs: &'a [FetchJob],
        ctx: FetchContext<'a>,
    ) -> BoxFuture<'a, SyncResult<()>>;

    /// Short name for logging.
    fn name(&self) -> &'static str;
}

/// Fetch a single job, honouring cancellation and the timeout.
async fn fetch_one(job: &FetchJob, ctx: FetchContext<'_>) -> SyncResult<u64> {
    let fetch = ctx.transport.fetch(&job.location, &job.destination);

    tokio::select! {
        biased;
        _ = ctx.cancel.cancelled() => Err(SyncError::Cancelled),
        result = tokio::time::timeout(ctx.timeout, fetch) => match result {
            Ok(Ok(bytes)) => {
                debug!(bundle = %job.bundle, bytes, "Fetched bundle");
                Ok(bytes)
            }
            Ok(Err(source)) => Err(SyncError::Fetch {
                bundle: job.bundle.clone(),
                location: job.location.clone(),
                source,
            }),
            Err(_) => Err(SyncError::Timeout {
                bundle: job.bundle.clone(),
                timeout: ctx.timeout,
            }),
        },
    }
}

fn record_outcome(
    state: &mut FetchState,
    outcome: SyncResult<u64>,
    observer: &dyn SyncObserver,
) -> SyncResult<()> {
    match outcome {
        Ok(bytes) => {
            state.record_success(bytes);
            observer.on_progress(state.completed, state.total);
            Ok(())
        }
        Err(e) => {
            if let Some(bundle) = e.failed_bundle() {
                state.record_failure(bundle);
            }
            warn!(error = %e, "Bundle fetch failed, abandoning remaining fetches");
            Err(e)
        }
    }
}

/// Sequential fetch strategy.
///
/// Fetches one bundle at a time in plan order, pausing for `pacing` between
/// fetches.
#[derive(Debug, Clone)]
pub struct SequentialStrategy {
    /// Pause between consecutive fetches.
    pub pacing: Duration,
}

impl SequentialStrategy {
    /// Create a sequential strategy with the given pacing.
    pub fn new(pacing: Duration) -> Self {
        Self { pacing }
    }
}

impl Default for SequentialStrategy {
    fn default() -> Self {
        Self::new(DEFAULT_PACING)
    }
}

impl FetchStrategy for SequentialStrategy {
    fn execute<'a>(
        &'a self,
        state: &'a mut FetchState,
        jobs: &'a [FetchJob],
        ctx: FetchContext<'a>,
    ) -> BoxFuture<'a, SyncResult<()>> {
        Box::pin(async move {
            for (i, job) in jobs.iter().enumerate() {
                if ctx.cancel.is_cancelled() {
                    return Err(SyncError::Cancelled);
                }

                let outcome = fetch_one(job, ctx).await;
                record_outcome(state, outcome, ctx.observer)?;

                let last = i + 1 == jobs.len();
                if !last && !self.pacing.is_zero() {
                    tokio::select! {
                        biased;
                        _ = ctx.cancel.cancelled() => return Err(SyncError::Cancelled),
                        _ = tokio::time::sleep(self.pacing) => {}
                    }
                }
            }
            Ok(())
        })
    }

    fn name(&self) -> &'static str {
        "sequential"
    }
}

/// Parallel fetch strategy.
///
/// Runs up to `concurrency` fetches at once. Progress is reported in
/// completion order. No pacing is applied.
#[derive(Debug, Clone)]
pub struct ParallelStrategy {
    /// Maximum number of concurrent fetches.
    pub concurrency: usize,
}

impl ParallelStrategy {
    /// Create a new parallel strategy.
    ///
    /// # Arguments
    ///
    /// * `concurrency` - Maximum number of concurrent fetches (minimum 1)
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
        }
    }
}

impl Default for ParallelStrategy {
    fn default() -> Self {
        Self::new(4)
    }
}

impl FetchStrategy for ParallelStrategy {
    fn execute<'a>(
        &'a self,
        state: &'a mut FetchState,
        jobs: &'a [FetchJob],
        ctx: FetchContext<'a>,
    ) -> BoxFuture<'a, SyncResult<()>> {
        Box::pin(async move {
            let fetches: Vec<_> = jobs.iter().map(|job| fetch_one(job, ctx)).collect();
            let mut outcomes = stream::iter(fetches).buffer_unordered(self.concurrency);

            // Dropping the stream on error cancels the in-flight fetches.
            while let Some(outcome) = outcomes.next().await {
                record_outcome(state, outcome, ctx.observer)?;
            }
            Ok(())
        })
    }

    fn name(&self) -> &'static str {
        "parallel"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::observer::NoopObserver;
    use crate::sync::transport::TransportError;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    /// Transport that succeeds for every location except `fail`.
    struct StubTransport {
        fail: Option<&'static str>,
        delay: Duration,
        seen: Mutex<Vec<String>>,
    }

    impl StubTransport {
        fn new() -> Self {
            Self {
                fail: None,
                delay: Duration::ZERO,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl Transport for StubTransport {
        fn fetch<'a>(
            &'a self,
            location: &'a str,
            _destination: &'a Path,
        ) -> BoxFuture<'a, Result<u64, TransportError>> {
            Box::pin(async move {
                if !self.delay.is_zero() {
                    tokio::time::sleep(self.delay).await;
                }
                self.seen.lock().unwrap().push(location.to_string());
                if self.fail == Some(location) {
                    return Err(TransportError::Status {
                        location: location.to_string(),
                        status: 500,
                    });
                }
                Ok(10)
            })
        }

        fn read<'a>(
            &'a self,
            _location: &'a str,
        ) -> BoxFuture<'a, Result<Vec<u8>, TransportError>> {
            Box::pin(async { Ok(Vec::new()) })
        }
    }

    #[derive(Default)]
    struct RecordingObserver {
        progress: Mutex<Vec<(usize, usize)>>,
    }

    impl SyncObserver for RecordingObserver {
        fn on_progress(&self, completed: usize, total: usize) {
            self.progress.lock().unwrap().push((completed, total));
        }
    }

    fn jobs(names: &[&str]) -> Vec<FetchJob> {
        names
            .iter()
            .map(|n| FetchJob {
                bundle: n.to_string(),
                location: n.to_string(),
                destination: PathBuf::from(format!("/unused/{}", n)),
            })
            .collect()
    }

    fn ctx<'a>(
        transport: &'a dyn Transport,
        observer: &'a dyn SyncObserver,
        cancel: &'a CancellationToken,
    ) -> FetchContext<'a> {
        FetchContext {
            transport,
            observer,
            cancel,
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn test_sequential_fetches_in_plan_order() {
        let transport = StubTransport::new();
        let observer = RecordingObserver::default();
        let cancel = CancellationToken::new();
        let jobs = jobs(&["a", "b", "c"]);
        let mut state = FetchState::new(jobs.len());

        SequentialStrategy::new(Duration::ZERO)
            .execute(&mut state, &jobs, ctx(&transport, &observer, &cancel))
            .await
            .unwrap();

        assert_eq!(*transport.seen.lock().unwrap(), vec!["a", "b", "c"]);
        assert_eq!(
            *observer.progress.lock().unwrap(),
            vec![(1, 3), (2, 3), (3, 3)]
        );
        assert!(state.is_complete());
        assert_eq!(state.bytes_fetched, 30);
    }

    #[tokio::test]
    async fn test_sequential_stops_at_first_failure() {
        let mut transport = StubTransport::new();
        transport.fail = Some("b");
        let observer = RecordingObserver::default();
        let cancel = CancellationToken::new();
        let jobs = jobs(&["a", "b", "c"]);
        let mut state = FetchState::new(jobs.len());

        let err = SequentialStrategy::new(Duration::ZERO)
            .execute(&mut state, &jobs, ctx(&transport, &observer, &cancel))
            .await
            .unwrap_err();

        assert_eq!(err.failed_bundle(), Some("b"));
        assert_eq!(*transport.seen.lock().unwrap(), vec!["a", "b"]);
        assert_eq!(*observer.progress.lock().unwrap(), vec![(1, 3)]);
        assert_eq!(state.failed.as_deref(), Some("b"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequential_pacing_between_fetches() {
        let transport = StubTransport::new();
        let cancel = CancellationToken::new();
        let jobs = jobs(&["a", "b", "c"]);
        let mut state = FetchState::new(jobs.len());

        let start = tokio::time::Instant::now();
        SequentialStrategy::new(Duration::from_millis(100))
            .execute(&mut state, &jobs, ctx(&transport, &NoopObserver, &cancel))
            .await
            .unwrap();

        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(200));
        assert!(elapsed < Duration::from_millis(300));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let transport = StubTransport::new();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let jobs = jobs(&["a"]);
        let mut state = FetchState::new(1);

        let err = SequentialStrategy::default()
            .execute(&mut state, &jobs, ctx(&transport, &NoopObserver, &cancel))
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Cancelled));
        assert!(transport.seen.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_timeout() {
        let mut transport = StubTransport::new();
        transport.delay = Duration::from_secs(10);
        let cancel = CancellationToken::new();
        let jobs = jobs(&["slow"]);
        let mut state = FetchState::new(1);
        let mut context = ctx(&transport, &NoopObserver, &cancel);
        context.timeout = Duration::from_secs(1);

        let err = SequentialStrategy::new(Duration::ZERO)
            .execute(&mut state, &jobs, context)
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Timeout { ref bundle, .. } if bundle == "slow"));
    }

    #[tokio::test]
    async fn test_parallel_fetches_everything() {
        let transport = StubTransport::new();
        let observer = RecordingObserver::default();
        let cancel = CancellationToken::new();
        let jobs = jobs(&["a", "b", "c", "d"]);
        let mut state = FetchState::new(jobs.len());

        ParallelStrategy::new(2)
            .execute(&mut state, &jobs, ctx(&transport, &observer, &cancel))
            .await
            .unwrap();

        let progress = observer.progress.lock().unwrap();
        let completed: Vec<usize> = progress.iter().map(|(c, _)| *c).collect();
        assert_eq!(completed, vec![1, 2, 3, 4]);
        assert_eq!(transport.seen.lock().unwrap().len(), 4);
        assert!(state.is_complete());
    }

    #[tokio::test]
    async fn test_parallel_reports_failure() {
        let mut transport = StubTransport::new();
        transport.fail = Some("c");
        let cancel = CancellationToken::new();
        let jobs = jobs(&["a", "b", "c"]);
        let mut state = FetchState::new(jobs.len());

        let err = ParallelStrategy::new(3)
            .execute(&mut state, &jobs, ctx(&transport, &NoopObserver, &cancel))
            .await
            .unwrap_err();

        assert_eq!(err.failed_bundle(), Some("c"));
        assert!(!state.is_complete());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_parallel_runs_on_spawned_task() {
        let handle = tokio::spawn(async {
            let transport = StubTransport::new();
            let cancel = CancellationToken::new();
            let jobs = jobs(&["a", "b", "c"]);
            let mut state = FetchState::new(jobs.len());

            ParallelStrategy::new(2)
                .execute(&mut state, &jobs, ctx(&transport, &NoopObserver, &cancel))
                .await
                .map(|()| state.completed)
        });

        assert_eq!(handle.await.unwrap().unwrap(), 3);
    }

    #[test]
    fn test_parallel_strategy_min_concurrency() {
        assert_eq!(ParallelStrategy::new(0).concurrency, 1);
        assert_eq!(ParallelStrategy::default().concurrency, 4);
    }

    #[test]
    fn test_sequential_default_pacing() {
        assert_eq!(SequentialStrategy::default().pacing, Duration::from_millis(100));
    }
}
