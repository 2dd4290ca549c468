//! Bundle store abstraction.
//!
//! Opening a bundle file and extracting objects from it is platform
//! specific, so the engine depends only on the traits defined here. A host
//! application implements [`BundleStore`] on top of its asset runtime.
//!
//! # Object model
//!
//! Objects are type-erased as [`AssetObject`]. Callers ask a handle for an
//! object by name and [`TypeId`]; the handle returns `None` if no object of
//! that name exists. Returning an object of a different type is permitted and
//! is detected by the loader when downcasting.

use std::any::{Any, TypeId};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

/// A type-erased object loaded from a bundle.
pub type AssetObject = Arc<dyn Any + Send + Sync>;

/// Errors reported by a [`BundleStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// The bundle file does not exist.
    #[error("bundle file not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// The bundle file could not be read.
    #[error("failed to read bundle {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    /// The file is not a valid bundle.
    #[error("invalid bundle {}: {reason}", path.display())]
    Invalid { path: PathBuf, reason: String },
}

impl StoreError {
    /// Path of the bundle that failed to open.
    pub fn path(&self) -> &Path {
        match self {
            StoreError::NotFound { path }
            | StoreError::Io { path, .. }
            | StoreError::Invalid { path, .. } => path,
        }
    }
}

/// Transitive dependency information for every bundle.
pub trait DependencyManifest: Send + Sync {
    /// Full transitive dependency closure of `bundle`, excluding itself.
    ///
    /// Returns an empty list for bundles without dependencies or unknown to
    /// the manifest.
    fn all_dependencies(&self, bundle: &str) -> Vec<String>;
}

/// An open bundle.
pub trait BundleHandle: Send {
    /// Load an object by name and requested type.
    fn load_object(&self, name: &str, type_id: TypeId) -> Option<AssetObject>;

    /// Scene entry points contained in the bundle, in bundle order.
    fn scene_paths(&self) -> Vec<String>;

    /// Dependency manifest carried by this bundle, if it is the manifest
    /// bundle.
    fn dependency_manifest(&self) -> Option<Arc<dyn DependencyManifest>> {
        None
    }

    /// Release the bundle.
    ///
    /// With `unload_all_objects`, objects previously loaded from it are
    /// released too.
    fn unload(self: Box<Self>, unload_all_objects: bool);
}

/// Opens bundle files from local storage.
pub trait BundleStore: Send + Sync {
    /// Open the bundle at `path`.
    fn open(&self, path: &Path) -> Result<Box<dyn BundleHandle>, StoreError>;
}

impl fmt::Debug for dyn BundleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BundleHandle")
    }
}

/// Open the manifest bundle at `path` and take its dependency manifest.
///
/// The handle is released without unloading objects; only the manifest
/// capability is kept. Returns `None` when the file cannot be opened or
/// carries no manifest.
pub fn acquire_manifest(
    store: &dyn BundleStore,
    path: &Path,
) -> Option<Arc<dyn DependencyManifest>> {
    let handle = match store.open(path) {
        Ok(handle) => handle,
        Err(e) => {
            tracing::debug!(error = %e, "Dependency manifest not available");
            return None;
        }
    };

    let manifest = handle.dependency_manifest();
    if manifest.is_none() {
        tracing::warn!(path = %path.display(), "Manifest bundle carries no dependency manifest");
    }
    handle.unload(false);
    manifest
}
