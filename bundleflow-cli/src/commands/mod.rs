//! CLI command implementations.

pub mod clear;
pub mod hash;
pub mod name;
pub mod plan;
pub mod status;

use std::path::Path;

use bundleflow::config::{ConfigFile, FlowConfig};
use tracing::debug;

use crate::error::CliError;

/// Load the runtime configuration from `path` or the default config file.
///
/// A missing file yields the defaults.
pub fn load_config(path: Option<&Path>) -> Result<FlowConfig, CliError> {
    let file = match path {
        Some(path) => ConfigFile::load_from(path)?,
        None => ConfigFile::load()?,
    };
    let config = file.to_flow_config();
    debug!(?config, "Configuration loaded");
    Ok(config)
}

/// Format a byte count with a binary unit.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
