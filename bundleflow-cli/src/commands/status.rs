//! `status` command.

use bundleflow::config::FlowConfig;
use bundleflow::local::LocalStateTracker;
use console::style;

use crate::error::CliError;

/// Local bundle hashes sorted by file name.
fn sorted_hashes(tracker: &LocalStateTracker) -> Result<Vec<(String, String)>, CliError> {
    let mut hashes: Vec<_> = tracker
        .scan_hashes()
        .map_err(|source| CliError::Io {
            path: tracker.bundle_dir().to_path_buf(),
            source,
        })?
        .into_iter()
        .collect();
    hashes.sort();
    Ok(hashes)
}

/// Print configured locations and what is on disk.
pub fn run(config: &FlowConfig) -> Result<(), CliError> {
    let tracker = LocalStateTracker::new(config.bundle_dir(), config.hash_algorithm);

    println!("{}", style("Configuration").bold());
    println!("  Platform:     {}", config.platform);
    println!("  Catalog:      {}", config.catalog_location());
    println!("  Bundle dir:   {}", tracker.bundle_dir().display());
    println!("  Asset root:   {}", config.asset_root);
    println!("  Fetch mode:   {:?}", config.fetch_mode);
    println!();

    let version = tracker.persisted_version();
    let manifest = if config.manifest_path().is_file() {
        style("present").green()
    } else {
        style("missing").yellow()
    };
    println!("{}", style("Local state").bold());
    println!("  Version:      {}", version);
    println!("  Manifest:     {}", manifest);

    let hashes = sorted_hashes(&tracker)?;
    println!("  Files:        {}", hashes.len());
    for (name, hash) in &hashes {
        println!("    {:<44} {} {}", name, config.hash_algorithm, hash);
    }
    Ok(())
}
