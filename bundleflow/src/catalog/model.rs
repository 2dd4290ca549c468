//! Catalog document types and JSON (de)serialization.
//!
//! The catalog is produced offline alongside the bundle files and describes
//! every publishable bundle: its name, the source asset it was built from,
//! its content hash, its size and the asset paths it contains.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File name of the catalog document in a bundle source directory.
pub const CATALOG_FILENAME: &str = "catalog.json";

/// Errors that can occur while reading or writing a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The document is not valid catalog JSON.
    #[error("invalid catalog document: {0}")]
    Parse(#[from] serde_json::Error),

    /// Failed to write the catalog to disk.
    #[error("failed to write catalog to {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
}

/// Versioned description of every bundle a source publishes.
///
/// Bundles keep the order in which they appear in the document; sync plans
/// and the asset index are both built in that order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    /// Catalog version. Any change forces a full re-fetch.
    pub version: u32,

    /// Bundle entries keyed by bundle name.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub bundles: IndexMap<String, BundleEntry>,
}

/// A single bundle as described by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleEntry {
    /// Unique bundle name, also the file name on disk.
    pub name: String,

    /// Source asset path the bundle was built from.
    #[serde(rename = "path", default)]
    pub source_path: String,

    /// Lowercase hex digest of the published bundle bytes.
    #[serde(rename = "hash", deserialize_with = "lowercase_hex")]
    pub content_hash: String,

    /// Size of the bundle file in bytes.
    #[serde(rename = "size", default)]
    pub size_bytes: u64,

    /// Asset paths contained in the bundle, in producer order.
    #[serde(rename = "assets", default, deserialize_with = "null_as_empty")]
    pub asset_paths: Vec<String>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn lowercase_hex<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(String::deserialize(deserializer)?.to_lowercase())
}

impl BundleEntry {
    /// Create a new entry.
    pub fn new(
        name: impl Into<String>,
        source_path: impl Into<String>,
        content_hash: impl Into<String>,
        size_bytes: u64,
    ) -> Self {
        Self {
            name: name.into(),
            source_path: source_path.into(),
            content_hash: content_hash.into().to_lowercase(),
            size_bytes,
            asset_paths: Vec::new(),
        }
    }

    /// Add an asset path (builder pattern).
    pub fn with_asset(mut self, asset_path: impl Into<String>) -> Self {
        self.asset_paths.push(asset_path.into());
        self
    }
}

impl Catalog {
    /// Create an empty catalog with the given version.
    pub fn new(version: u32) -> Self {
        Self {
            version,
            bundles: IndexMap::new(),
        }
    }

    /// Add a bundle entry keyed by its name (builder pattern).
    pub fn with_bundle(mut self, entry: BundleEntry) -> Self {
        self.insert(entry);
        self
    }

    /// Insert a bundle entry keyed by its name.
    ///
    /// Returns the previous entry under that name, if any.
    pub fn insert(&mut self, entry: BundleEntry) -> Option<BundleEntry> {
        self.bundles.insert(entry.name.clone(), entry)
    }

    /// Parse a catalog from JSON text.
    pub fn parse(content: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Parse a catalog from raw JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CatalogError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Serialize the catalog to JSON text.
    pub fn to_json(&self) -> Result<String, CatalogError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the catalog as `catalog.json` into `dir`, creating it if needed.
    pub fn write_to_dir(&self, dir: &Path) -> Result<(), CatalogError> {
        let path = dir.join(CATALOG_FILENAME);
        let write_err = |source| CatalogError::Write {
            path: path.display().to_string(),
            source,
        };

        fs::create_dir_all(dir).map_err(write_err)?;
        fs::write(&path, self.to_json()?).map_err(write_err)
    }

    /// Look up an entry by bundle name.
    pub fn get(&self, name: &str) -> Option<&BundleEntry> {
        self.bundles.get(name)
    }

    /// Bundle names in catalog order.
    pub fn bundle_names(&self) -> impl Iterator<Item = &str> {
        self.bundles.keys().map(String::as_str)
    }

    /// Bundle entries in catalog order.
    pub fn entries(&self) -> impl Iterator<Item = &BundleEntry> {
        self.bundles.values()
    }

    /// Number of bundles.
    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    /// Whether the catalog lists no bundles.
    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }

    /// Sum of all bundle sizes in bytes.
    pub fn total_size(&self) -> u64 {
        self.entries().map(|e| e.size_bytes).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"{
        "version": 3,
        "bundles": {
            "b.bundle": {
                "name": "b.bundle",
                "path": "Assets/AssetBundles/B.prefab",
                "hash": "bbbb",
                "size": 20,
                "assets": ["Assets/AssetBundles/B.prefab"]
            },
            "a.bundle": {
                "name": "a.bundle",
                "path": "Assets/AssetBundles/A.prefab",
                "hash": "aaaa",
                "size": 10,
                "assets": ["Assets/AssetBundles/A.prefab", "Assets/AssetBundles/A.mat"]
            }
        }
    }"#;

    #[test]
    fn test_parse_catalog() {
        let catalog = Catalog::parse(SAMPLE).unwrap();

        assert_eq!(catalog.version, 3);
        assert_eq!(catalog.len(), 2);

        let a = catalog.get("a.bundle").unwrap();
        assert_eq!(a.source_path, "Assets/AssetBundles/A.prefab");
        assert_eq!(a.content_hash, "aaaa");
        assert_eq!(a.size_bytes, 10);
        assert_eq!(a.asset_paths.len(), 2);
    }

    #[test]
    fn test_parse_preserves_document_order() {
        let catalog = Catalog::parse(SAMPLE).unwrap();
        let names: Vec<_> = catalog.bundle_names().collect();
        assert_eq!(names, vec!["b.bundle", "a.bundle"]);
    }

    #[test]
    fn test_parse_tolerates_missing_optional_fields() {
        let catalog = Catalog::parse(
            r#"{"version":1,"bundles":{"x":{"name":"x","hash":"00","assets":null}}}"#,
        )
        .unwrap();

        let x = catalog.get("x").unwrap();
        assert!(x.asset_paths.is_empty());
        assert_eq!(x.size_bytes, 0);
        assert!(x.source_path.is_empty());
    }

    #[test]
    fn test_parse_lowercases_hash() {
        let catalog = Catalog::parse(
            r#"{"version":1,"bundles":{"a.bundle":{"name":"a.bundle","hash":"ABCDEF"}}}"#,
        )
        .unwrap();

        let parsed = catalog.get("a.bundle").unwrap();
        let built = BundleEntry::new("a.bundle", "", "ABCDEF", 0);
        assert_eq!(parsed.content_hash, "abcdef");
        assert_eq!(parsed.content_hash, built.content_hash);
    }

    #[test]
    fn test_parse_null_bundles() {
        let catalog = Catalog::parse(r#"{"version":2,"bundles":null}"#).unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(
            Catalog::parse("not json"),
            Err(CatalogError::Parse(_))
        ));
        assert!(Catalog::parse(r#"{"bundles":{}}"#).is_err());
    }

    #[test]
    fn test_serialize_uses_wire_field_names() {
        let catalog = Catalog::new(1).with_bundle(
            BundleEntry::new("a.bundle", "Assets/A.prefab", "ABCD", 4).with_asset("x"),
        );

        let json = catalog.to_json().unwrap();
        assert!(json.contains("\"path\""));
        assert!(json.contains("\"hash\": \"abcd\""));
        assert!(json.contains("\"size\""));
        assert!(json.contains("\"assets\""));

        let reparsed = Catalog::parse(&json).unwrap();
        assert_eq!(reparsed, catalog);
    }

    #[test]
    fn test_write_to_dir() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("nested");
        let catalog = Catalog::new(7).with_bundle(BundleEntry::new("a", "A", "00", 1));

        catalog.write_to_dir(&dir).unwrap();

        let content = fs::read_to_string(dir.join(CATALOG_FILENAME)).unwrap();
        assert_eq!(Catalog::parse(&content).unwrap(), catalog);
    }

    #[test]
    fn test_total_size() {
        let catalog = Catalog::parse(SAMPLE).unwrap();
        assert_eq!(catalog.total_size(), 30);
    }
}
