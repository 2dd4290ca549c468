//! `clear` command.

use bundleflow::config::FlowConfig;
use bundleflow::local::LocalStateTracker;
use console::style;

use crate::error::CliError;

/// Delete the contents of the local bundle directory.
///
/// The directory itself is kept so the next sync can write into it.
pub fn run(config: &FlowConfig) -> Result<(), CliError> {
    let tracker = LocalStateTracker::new(config.bundle_dir(), config.hash_algorithm);
    println!("Clearing bundle cache at: {}", tracker.bundle_dir().display());

    tracker.clear().map_err(|source| CliError::Io {
        path: tracker.bundle_dir().to_path_buf(),
        source,
    })?;

    println!("{}", style("Bundle cache cleared").green());
    Ok(())
}
