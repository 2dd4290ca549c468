//! Logging setup.
//!
//! Library code only emits `tracing` events. Binaries call [`init_logging`]
//! once at startup and keep the returned [`LoggingGuard`] alive until exit
//! so buffered file output is flushed.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "bundleflow=info";

/// Filter used for verbose output when `RUST_LOG` is not set.
pub const VERBOSE_FILTER: &str = "bundleflow=debug";

/// Prefix of rolling log files.
pub const LOG_FILE_PREFIX: &str = "bundleflow.log";

/// Errors from logging initialization.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The log directory could not be created.
    #[error("failed to create log directory {}: {source}", path.display())]
    CreateDir { path: PathBuf, source: io::Error },

    /// A global subscriber is already installed.
    #[error("failed to install log subscriber: {0}")]
    Init(String),
}

/// Keeps the background log writer alive.
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard {
    file: Option<WorkerGuard>,
}

impl LoggingGuard {
    /// Whether file logging is active.
    pub fn has_file_output(&self) -> bool {
        self.file.is_some()
    }
}

/// Build the event filter.
///
/// `RUST_LOG` wins; otherwise `verbose` selects debug output for this crate.
pub fn build_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            VERBOSE_FILTER
        } else {
            DEFAULT_FILTER
        })
    })
}

/// Install the global subscriber.
///
/// Events go to stderr. With `log_dir`, they are also written to a daily
/// rolling file through a non-blocking writer.
///
/// # Arguments
///
/// * `log_dir` - Directory for rolling log files, if any
/// * `verbose` - Use debug level when `RUST_LOG` is not set
pub fn init_logging(log_dir: Option<&Path>, verbose: bool) -> Result<LoggingGuard, LoggingError> {
    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).map_err(|source| LoggingError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(build_filter(verbose))
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .with(file_layer)
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))?;

    Ok(LoggingGuard { file: guard })
}
