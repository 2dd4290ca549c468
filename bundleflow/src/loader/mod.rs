//! Bundle loading.
//!
//! - Asset-path to bundle-name index (`index`)
//! - Loaded-bundle cache with unload semantics (`cache`)
//! - Dependency-closure loading (`graph`)
//!
//! The engine resolves an asset path through the [`AssetIndex`], loads the
//! owning bundle with a [`DependencyGraphLoader`], then reads the object from
//! the handle held by the [`LoadedBundleCache`].

mod cache;
mod error;
mod graph;
mod index;

pub use cache::LoadedBundleCache;
pub use error::{CacheError, LoadError, LoadResult};
pub use graph::{DependencyGraphLoader, LoadReport};
pub use index::AssetIndex;
