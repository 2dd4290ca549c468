//! Dependency-aware bundle loading.
//!
//! Loading a bundle brings its full transitive dependency closure into the
//! [`LoadedBundleCache`]. Bundles already resident are skipped, so each
//! bundle is opened at most once per residency.

use std::collections::HashSet;
use std::path::Path;

use tracing::{debug, warn};

use super::cache::LoadedBundleCache;
use super::error::{LoadError, LoadResult};
use crate::store::{BundleStore, DependencyManifest};

/// Outcome of loading one bundle and its dependencies.
#[derive(Debug)]
pub struct LoadReport {
    /// Bundle that was requested.
    pub bundle: String,
    /// Bundles newly opened by this call, in open order.
    pub opened: Vec<String>,
    /// Bundles that failed to open. Earlier successes are not unwound.
    pub failures: Vec<LoadError>,
}

impl LoadReport {
    /// Whether every bundle of the closure is resident.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Names of bundles that failed to open.
    pub fn failed_bundles(&self) -> Vec<String> {
        self.failures
            .iter()
            .filter_map(|e| match e {
                LoadError::OpenFailed { bundle, .. } => Some(bundle.clone()),
                _ => None,
            })
            .collect()
    }

    /// Convert into the list of newly opened bundles.
    ///
    /// If the requested bundle itself failed, its open error is returned;
    /// if only dependencies failed, [`LoadError::DependenciesFailed`].
    pub fn into_result(mut self) -> LoadResult<Vec<String>> {
        if self.is_complete() {
            return Ok(self.opened);
        }

        let own = self.failures.iter().position(|e| {
            matches!(e, LoadError::OpenFailed { bundle, .. } if *bundle == self.bundle)
        });
        if let Some(i) = own {
            return Err(self.failures.swap_remove(i));
        }

        let failed = self.failed_bundles();
        Err(LoadError::DependenciesFailed {
            bundle: self.bundle,
            failed,
        })
    }
}

/// Loads bundles together with their transitive dependencies.
pub struct DependencyGraphLoader<'a> {
    store: &'a dyn BundleStore,
    manifest: &'a dyn DependencyManifest,
    bundle_dir: &'a Path,
}

impl<'a> DependencyGraphLoader<'a> {
    /// Create a loader.
    ///
    /// # Arguments
    ///
    /// * `store` - Opens bundle files
    /// * `manifest` - Source of dependency closures
    /// * `bundle_dir` - Directory holding the synced bundle files
    pub fn new(
        store: &'a dyn BundleStore,
        manifest: &'a dyn DependencyManifest,
        bundle_dir: &'a Path,
    ) -> Self {
        Self {
            store,
            manifest,
            bundle_dir,
        }
    }

    /// Bundles that must be resident for `bundle`: its dependencies in
    /// manifest order, then itself, each listed once.
    pub fn closure(&self, bundle: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        self.manifest
            .all_dependencies(bundle)
            .into_iter()
            .chain(std::iter::once(bundle.to_string()))
            .filter(|name| seen.insert(name.clone()))
            .collect()
    }

    /// Load `bundle` and its dependency closure into `cache`.
    ///
    /// No cycle detection is done; the manifest is expected to return a
    /// finite closure.
    pub fn load(&self, bundle: &str, cache: &mut LoadedBundleCache) -> LoadReport {
        let mut report = LoadReport {
            bundle: bundle.to_string(),
            opened: Vec::new(),
            failures: Vec::new(),
        };

        for name in self.closure(bundle) {
            if cache.contains(&name) {
                continue;
            }

            let path = self.bundle_dir.join(&name);
            match self.store.open(&path) {
                Ok(handle) => {
                    if cache.put(&name, handle).is_ok() {
                        debug!(bundle = %name, "Bundle opened");
                        report.opened.push(name);
                    }
                }
                Err(e) => {
                    warn!(bundle = %name, error = %e, "Failed to open bundle");
                    report.failures.push(LoadError::OpenFailed {
                        bundle: name,
                        path,
                        reason: e.to_string(),
                    });
                }
            }
        }

        report
    }
}
