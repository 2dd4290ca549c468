//! `plan` command.

use bundleflow::catalog::Catalog;
use bundleflow::config::FlowConfig;
use bundleflow::local::LocalStateTracker;
use bundleflow::sync::{
    self, is_http_location, FileTransport, HttpTransport, SyncError, SyncPlan, Transport,
};
use console::style;
use tracing::debug;

use super::format_size;
use crate::error::CliError;

/// Transport matching the configured source root.
fn transport_for(source_root: &str) -> Result<Box<dyn Transport>, CliError> {
    if is_http_location(source_root) {
        let transport = HttpTransport::new().map_err(|source| SyncError::CatalogUnavailable {
            location: source_root.to_string(),
            source,
        })?;
        Ok(Box::new(transport))
    } else {
        Ok(Box::new(FileTransport::new()))
    }
}

/// Read the remote catalog and plan against local state.
///
/// Without a bundle store the manifest counts as available when its file
/// is present in the local bundle directory.
pub async fn compute_plan(
    config: &FlowConfig,
    transport: &dyn Transport,
) -> Result<(Catalog, SyncPlan), CliError> {
    let location = config.catalog_location();
    debug!(location = %location, "Reading catalog");

    let bytes = transport
        .read(&location)
        .await
        .map_err(|source| SyncError::CatalogUnavailable {
            location: location.clone(),
            source,
        })?;
    let catalog = Catalog::from_slice(&bytes)
        .map_err(|source| SyncError::CatalogInvalid { location, source })?;

    let tracker = LocalStateTracker::new(config.bundle_dir(), config.hash_algorithm);
    let manifest_available = config.manifest_path().is_file();
    let state = tracker
        .snapshot_blocking(manifest_available, catalog.version)
        .await
        .map_err(|source| SyncError::LocalState {
            path: tracker.bundle_dir().to_path_buf(),
            source,
        })?;

    let plan = sync::plan(&catalog, &state);
    Ok((catalog, plan))
}

/// Print what a sync would fetch.
pub fn run(config: &FlowConfig) -> Result<(), CliError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    let transport = transport_for(&config.source_root)?;
    let (catalog, plan) = runtime.block_on(compute_plan(config, transport.as_ref()))?;

    println!("Catalog: {}", config.catalog_location());
    println!(
        "  Version: {} ({} bundles, {})",
        catalog.version,
        catalog.len(),
        format_size(catalog.total_size())
    );
    println!("  Reason:  {}", plan.reason);
    println!();

    if plan.is_empty() {
        println!("{}", style("Up to date, nothing to fetch").green());
        return Ok(());
    }

    let mut total = 0u64;
    for bundle in plan.iter() {
        let size = catalog.get(bundle).map(|e| e.size_bytes).unwrap_or(0);
        total += size;
        println!("  {:<48} {:>10}", bundle, format_size(size));
    }
    println!();
    println!(
        "{}",
        style(format!("{} bundles to fetch, {}", plan.len(), format_size(total))).bold()
    );
    Ok(())
}
