//! Engine-level error type.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::loader::LoadError;
use crate::sync::{SyncError, TransportError};

/// Result type for engine operations.
pub type FlowResult<T> = Result<T, FlowError>;

/// Any error surfaced by [`BundleFlow`](super::BundleFlow).
#[derive(Debug, Error)]
pub enum FlowError {
    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Local storage could not be prepared or cleared.
    #[error("local storage error at {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
}
