//! CLI error type.

use std::fmt;
use std::path::PathBuf;

use bundleflow::config::ConfigError;
use bundleflow::logging::LoggingError;
use bundleflow::sync::SyncError;

/// Errors reported by CLI commands.
#[derive(Debug)]
pub enum CliError {
    /// Config file could not be read or is invalid.
    Config(ConfigError),

    /// Logging could not be initialized.
    Logging(LoggingError),

    /// Failed to create the Tokio runtime.
    Runtime(std::io::Error),

    /// Remote catalog could not be read or planned against.
    Plan(SyncError),

    /// A local file or directory operation failed.
    Io { path: PathBuf, source: std::io::Error },
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::Logging(e) => write!(f, "Failed to initialize logging: {}", e),
            CliError::Runtime(e) => write!(f, "Failed to create Tokio runtime: {}", e),
            CliError::Plan(e) => write!(f, "Planning failed: {}", e),
            CliError::Io { path, source } => write!(f, "{}: {}", path.display(), source),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Logging(e) => Some(e),
            CliError::Runtime(e) => Some(e),
            CliError::Plan(e) => Some(e),
            CliError::Io { source, .. } => Some(source),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e)
    }
}

impl From<LoggingError> for CliError {
    fn from(e: LoggingError) -> Self {
        CliError::Logging(e)
    }
}

impl From<SyncError> for CliError {
    fn from(e: SyncError) -> Self {
        CliError::Plan(e)
    }
}
