//! Asset-path to bundle-name index.

use std::collections::HashMap;

use crate::catalog::Catalog;

/// Maps asset paths to the bundle that contains them.
///
/// Insertion is first-writer-wins: once a path is indexed it is never
/// reassigned, even if a later catalog lists it under another bundle. Only
/// [`clear`](Self::clear) removes entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetIndex {
    entries: HashMap<String, String>,
}

impl AssetIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from a catalog, walking entries in catalog order.
    pub fn build(catalog: &Catalog) -> Self {
        let mut index = Self::new();
        index.extend_from(catalog);
        index
    }

    /// Add every asset path of `catalog` that is not yet indexed.
    ///
    /// Returns the number of paths added.
    pub fn extend_from(&mut self, catalog: &Catalog) -> usize {
        let before = self.entries.len();
        for entry in catalog.entries() {
            for path in &entry.asset_paths {
                self.entries
                    .entry(path.clone())
                    .or_insert_with(|| entry.name.clone());
            }
        }
        self.entries.len() - before
    }

    /// Bundle containing `asset_path`, if indexed.
    pub fn resolve(&self, asset_path: &str) -> Option<&str> {
        self.entries.get(asset_path).map(String::as_str)
    }

    /// Number of indexed paths.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(asset path, bundle name)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
