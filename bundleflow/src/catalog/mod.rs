//! Catalog data model and bundle naming.
//!
//! The catalog (`catalog.json`) is the authoritative, versioned description
//! of every bundle a source publishes. It is fetched fresh on each sync
//! attempt and never mutated in place.
//!
//! # File Format
//!
//! ```text
//! {
//!   "version": 2,
//!   "bundles": {
//!     "<bundle name>": {
//!       "name": "<bundle name>",
//!       "path": "<source asset path>",
//!       "hash": "<lowercase hex digest>",
//!       "size": <bytes>,
//!       "assets": ["<asset path>", ...]
//!     }
//!   }
//! }
//! ```

mod model;
mod naming;

pub use model::{BundleEntry, Catalog, CatalogError, CATALOG_FILENAME};
pub use naming::{
    bundle_name_for_asset, normalize_asset_path, BUNDLE_VARIANT_SUFFIX, DEFAULT_ASSET_ROOT,
};
