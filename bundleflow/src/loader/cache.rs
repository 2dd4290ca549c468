//! Loaded-bundle cache.
//!
//! Maps bundle names to open handles. There is never more than one handle per
//! name. There is no reference counting: unloading a bundle may invalidate
//! objects that were previously handed out from it.

use std::collections::HashMap;

use tracing::{debug, warn};

use super::error::CacheError;
use crate::store::BundleHandle;

/// Map of bundle name to open handle.
#[derive(Debug, Default)]
pub struct LoadedBundleCache {
    handles: HashMap<String, Box<dyn BundleHandle>>,
}

impl LoadedBundleCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for `name`, if loaded.
    pub fn get(&self, name: &str) -> Option<&dyn BundleHandle> {
        self.handles.get(name).map(|h| &**h)
    }

    /// Whether `name` is loaded.
    pub fn contains(&self, name: &str) -> bool {
        self.handles.contains_key(name)
    }

    /// Register a newly opened handle.
    ///
    /// A second handle for an already loaded name is rejected and released
    /// without unloading objects; the existing handle stays.
    pub fn put(&mut self, name: &str, handle: Box<dyn BundleHandle>) -> Result<(), CacheError> {
        if self.handles.contains_key(name) {
            warn!(bundle = %name, "Bundle already loaded, rejecting duplicate handle");
            handle.unload(false);
            return Err(CacheError::AlreadyLoaded(name.to_string()));
        }

        debug!(bundle = %name, "Bundle cached");
        self.handles.insert(name.to_string(), handle);
        Ok(())
    }

    /// Remove and release the handle for `name`.
    ///
    /// Returns `false` (with a warning) if the bundle was not loaded.
    pub fn unload(&mut self, name: &str, unload_all_objects: bool) -> bool {
        match self.handles.remove(name) {
            Some(handle) => {
                handle.unload(unload_all_objects);
                debug!(bundle = %name, unload_all_objects, "Bundle unloaded");
                true
            }
            None => {
                warn!(bundle = %name, "Unload requested for bundle that is not loaded");
                false
            }
        }
    }

    /// Unload every bundle, releasing their objects, and empty the cache.
    pub fn clear(&mut self) {
        for (_, handle) in self.handles.drain() {
            handle.unload(true);
        }
    }

    /// Names of loaded bundles, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handles.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of loaded bundles.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Whether nothing is loaded.
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}
