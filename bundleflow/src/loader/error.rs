//! Error types for bundle loading.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for load operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Errors that can occur when loading bundles and assets.
#[derive(Debug, Error)]
pub enum LoadError {
    /// No dependency manifest has been acquired this session.
    #[error("bundles are not synced; run a sync before loading")]
    NotSynced,

    /// The asset path is not listed in any synced catalog.
    #[error("asset not indexed: {path}")]
    AssetNotIndexed { path: String },

    /// A bundle file could not be opened.
    #[error("failed to open bundle {bundle} at {}: {reason}", path.display())]
    OpenFailed {
        bundle: String,
        path: PathBuf,
        reason: String,
    },

    /// Some bundles of the dependency closure failed to open.
    #[error("bundle {bundle} loaded with failed dependencies: {}", failed.join(", "))]
    DependenciesFailed { bundle: String, failed: Vec<String> },

    /// The bundle is not in the loaded-bundle cache after loading.
    #[error("bundle {bundle} is not resident")]
    BundleNotResident { bundle: String },

    /// The bundle does not contain the requested object.
    #[error("object {name} not found in bundle {bundle}")]
    ObjectNotFound { bundle: String, name: String },

    /// The object exists but has a different type.
    #[error("object {name} in bundle {bundle} is not a {expected}")]
    TypeMismatch {
        bundle: String,
        name: String,
        expected: &'static str,
    },

    /// The bundle contains no scenes.
    #[error("bundle {bundle} contains no scenes")]
    NoScenes { bundle: String },
}

/// Errors from the loaded-bundle cache.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CacheError {
    /// A handle is already registered under this name.
    #[error("bundle {0} is already loaded")]
    AlreadyLoaded(String),
}
