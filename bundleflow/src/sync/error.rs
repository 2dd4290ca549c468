//! Error types for bundle synchronization.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use super::transport::TransportError;
use crate::catalog::CatalogError;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that abort a sync run.
///
/// Every variant leaves the persisted version untouched. Files written by
/// fetches that completed before the failure stay on disk.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The remote catalog could not be read.
    #[error("failed to read catalog from {location}: {source}")]
    CatalogUnavailable {
        location: String,
        source: TransportError,
    },

    /// The remote catalog could not be parsed.
    #[error("invalid catalog at {location}: {source}")]
    CatalogInvalid {
        location: String,
        source: CatalogError,
    },

    /// The local bundle directory could not be inspected.
    #[error("failed to inspect local bundles in {}: {source}", path.display())]
    LocalState { path: PathBuf, source: io::Error },

    /// A single bundle fetch failed; the rest of the plan was abandoned.
    #[error("failed to fetch bundle {bundle} from {location}: {source}")]
    Fetch {
        bundle: String,
        location: String,
        source: TransportError,
    },

    /// A single bundle fetch stalled past the configured timeout.
    #[error("fetch of bundle {bundle} timed out after {}ms", timeout.as_millis())]
    Timeout { bundle: String, timeout: Duration },

    /// The dependency manifest could not be acquired after fetching.
    #[error("dependency manifest {} unavailable after sync", path.display())]
    ManifestUnavailable { path: PathBuf },

    /// The new version could not be written.
    #[error("failed to persist sync version to {}: {source}", path.display())]
    PersistFailed { path: PathBuf, source: io::Error },

    /// The caller cancelled the run.
    #[error("sync cancelled")]
    Cancelled,
}

impl SyncError {
    /// Whether the run failed before any fetch was attempted.
    pub fn is_planning_error(&self) -> bool {
        matches!(
            self,
            SyncError::CatalogUnavailable { .. }
                | SyncError::CatalogInvalid { .. }
                | SyncError::LocalState { .. }
        )
    }

    /// Name of the bundle whose fetch failed, if any.
    pub fn failed_bundle(&self) -> Option<&str> {
        match self {
            SyncError::Fetch { bundle, .. } | SyncError::Timeout { bundle, .. } => Some(bundle),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_display() {
        let err = SyncError::Fetch {
            bundle: "a.bundle".to_string(),
            location: "http://cdn/a.bundle".to_string(),
            source: TransportError::Status {
                location: "http://cdn/a.bundle".to_string(),
                status: 404,
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("a.bundle"));
        assert!(msg.contains("404"));
        assert_eq!(err.failed_bundle(), Some("a.bundle"));
        assert!(!err.is_planning_error());
    }

    #[test]
    fn test_timeout_display() {
        let err = SyncError::Timeout {
            bundle: "b.bundle".to_string(),
            timeout: Duration::from_millis(1500),
        };
        assert_eq!(err.to_string(), "fetch of bundle b.bundle timed out after 1500ms");
    }

    #[test]
    fn test_planning_errors() {
        let err = SyncError::LocalState {
            path: PathBuf::from("/tmp/x"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.is_planning_error());
        assert!(!SyncError::Cancelled.is_planning_error());
    }
}
