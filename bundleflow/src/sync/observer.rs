//! Observer for sync progress, completion and failure.

use super::error::SyncError;

/// Receives sync notifications.
///
/// Ordering guarantees for a run:
/// - `on_progress` fires once per fetched bundle, in completion order, with a
///   strictly increasing `completed` count
/// - an empty plan reports a single `on_progress(1, 1)`
/// - exactly one of `on_complete` / `on_failed` fires, after every
///   `on_progress` call
///
/// All methods default to no-ops.
pub trait SyncObserver: Send + Sync {
    /// A bundle finished fetching.
    fn on_progress(&self, _completed: usize, _total: usize) {}

    /// The run reached `Success`.
    fn on_complete(&self) {}

    /// The run reached `Failed`.
    fn on_failed(&self, _error: &SyncError) {}
}

/// Observer that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl SyncObserver for NoopObserver {}

/// Observer backed by closures.
///
/// # Example
///
/// ```
/// use bundleflow::sync::CallbackObserver;
///
/// let observer = CallbackObserver::new()
///     .with_progress(|done, total| println!("{}/{}", done, total))
///     .with_complete(|| println!("synced"));
/// ```
#[derive(Default)]
pub struct CallbackObserver {
    progress: Option<Box<dyn Fn(usize, usize) + Send + Sync>>,
    complete: Option<Box<dyn Fn() + Send + Sync>>,
    failed: Option<Box<dyn Fn(&SyncError) + Send + Sync>>,
}

impl CallbackObserver {
    /// Create an observer with no callbacks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the progress callback.
    pub fn with_progress(mut self, f: impl Fn(usize, usize) + Send + Sync + 'static) -> Self {
        self.progress = Some(Box::new(f));
        self
    }

    /// Set the completion callback.
    pub fn with_complete(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.complete = Some(Box::new(f));
        self
    }

    /// Set the failure callback.
    pub fn with_failed(mut self, f: impl Fn(&SyncError) + Send + Sync + 'static) -> Self {
        self.failed = Some(Box::new(f));
        self
    }
}

impl SyncObserver for CallbackObserver {
    fn on_progress(&self, completed: usize, total: usize) {
        if let Some(f) = &self.progress {
            f(completed, total);
        }
    }

    fn on_complete(&self) {
        if let Some(f) = &self.complete {
            f();
        }
    }

    fn on_failed(&self, error: &SyncError) {
        if let Some(f) = &self.failed {
            f(error);
        }
    }
}
