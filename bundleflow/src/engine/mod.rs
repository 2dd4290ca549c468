//! The `BundleFlow` engine.
//!
//! [`BundleFlow`] is the composition root: it owns the configuration, the
//! transport and bundle store collaborators, local state, the asset index,
//! the loaded-bundle cache and the dependency manifest. The host application
//! constructs one and passes it around by reference.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use bundleflow::config::FlowConfig;
//! use bundleflow::engine::BundleFlow;
//! use bundleflow::sync::{CallbackObserver, FileTransport};
//! use tokio_util::sync::CancellationToken;
//!
//! let config = FlowConfig::new("/srv/game", "/var/lib/game");
//! let mut flow = BundleFlow::new(config, Arc::new(FileTransport::new()), store)?;
//!
//! let observer = CallbackObserver::new().with_progress(|done, total| {
//!     println!("{}/{}", done, total);
//! });
//! flow.sync(&observer, &CancellationToken::new()).await?;
//!
//! let hero: Arc<Prefab> = flow.load_asset("Characters/Hero.prefab")?;
//! ```

mod error;

pub use error::{FlowError, FlowResult};

use std::any::{type_name, Any, TypeId};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::catalog::{normalize_asset_path, Catalog};
use crate::config::FlowConfig;
use crate::loader::{
    AssetIndex, DependencyGraphLoader, LoadError, LoadReport, LoadResult, LoadedBundleCache,
};
use crate::local::{LocalStateTracker, LocalSyncState, VERSION_FILENAME};
use crate::store::{acquire_manifest, BundleStore, DependencyManifest};
use crate::sync::{
    self, FetchJob, FetchOrchestrator, FetchState, SyncError, SyncObserver, SyncPlan,
    SyncResult, SyncState, Transport,
};

/// Outcome of a successful sync.
#[derive(Debug, Clone)]
pub struct SyncReport {
    /// Catalog version now persisted.
    pub version: u32,
    /// The plan that was executed.
    pub plan: SyncPlan,
    /// Fetch counters.
    pub fetched: FetchState,
}

/// Bundle synchronization and loading engine.
pub struct BundleFlow {
    config: FlowConfig,
    transport: Arc<dyn Transport>,
    store: Arc<dyn BundleStore>,
    tracker: LocalStateTracker,
    orchestrator: FetchOrchestrator,
    index: AssetIndex,
    cache: LoadedBundleCache,
    manifest: Option<Arc<dyn DependencyManifest>>,
}

impl std::fmt::Debug for BundleFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BundleFlow")
            .field("config", &self.config)
            .field("orchestrator", &self.orchestrator)
            .field("indexed_assets", &self.index.len())
            .field("loaded_bundles", &self.cache.len())
            .field("synced", &self.manifest.is_some())
            .finish()
    }
}

impl BundleFlow {
    /// Create an engine and its local bundle directory.
    ///
    /// # Arguments
    ///
    /// * `config` - Engine configuration
    /// * `transport` - Fetches the catalog and bundle files
    /// * `store` - Opens synced bundle files
    pub fn new(
        config: FlowConfig,
        transport: Arc<dyn Transport>,
        store: Arc<dyn BundleStore>,
    ) -> FlowResult<Self> {
        let tracker = LocalStateTracker::new(config.bundle_dir(), config.hash_algorithm);
        tracker.ensure_dir().map_err(|source| FlowError::Io {
            path: tracker.bundle_dir().to_path_buf(),
            source,
        })?;

        Ok(Self {
            orchestrator: config.orchestrator(),
            config,
            transport,
            store,
            tracker,
            index: AssetIndex::new(),
            cache: LoadedBundleCache::new(),
            manifest: None,
        })
    }

    /// Engine configuration.
    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    /// Read and parse the remote catalog.
    async fn fetch_catalog(&self) -> SyncResult<Catalog> {
        let location = self.config.catalog_location();
        let bytes = self
            .transport
            .read(&location)
            .await
            .map_err(|source| SyncError::CatalogUnavailable {
                location: location.clone(),
                source,
            })?;
        Catalog::from_slice(&bytes).map_err(|source| SyncError::CatalogInvalid { location, source })
    }

    async fn snapshot(
        &self,
        manifest_available: bool,
        catalog: &Catalog,
    ) -> SyncResult<LocalSyncState> {
        self.tracker
            .snapshot_blocking(manifest_available, catalog.version)
            .await
            .map_err(|source| SyncError::LocalState {
                path: self.tracker.bundle_dir().to_path_buf(),
                source,
            })
    }

    /// Compute the sync plan without fetching anything.
    pub async fn plan(&self) -> SyncResult<SyncPlan> {
        let catalog = self.fetch_catalog().await?;
        let manifest_available =
            acquire_manifest(self.store.as_ref(), &self.config.manifest_path()).is_some();
        let state = self.snapshot(manifest_available, &catalog).await?;
        Ok(sync::plan(&catalog, &state))
    }

    /// Synchronize local bundles with the remote catalog.
    ///
    /// Every call starts a new run. The observer receives progress in
    /// completion order followed by exactly one of `on_complete` or
    /// `on_failed`. The persisted version only changes when the run
    /// succeeds; files fetched before a failure stay on disk.
    pub async fn sync(
        &mut self,
        observer: &dyn SyncObserver,
        cancel: &CancellationToken,
    ) -> SyncResult<SyncReport> {
        let (catalog, plan) = match self.prepare_sync().await {
            Ok(prepared) => prepared,
            Err(e) => {
                self.orchestrator.fail(&e, observer);
                return Err(e);
            }
        };

        let jobs: Vec<FetchJob> = plan
            .iter()
            .map(|bundle| FetchJob {
                bundle: bundle.to_string(),
                location: self.config.bundle_location(bundle),
                destination: self.tracker.bundle_path(bundle),
            })
            .collect();

        let Self {
            config,
            transport,
            store,
            tracker,
            orchestrator,
            index,
            manifest,
            ..
        } = self;

        let manifest_path = config.manifest_path();
        let fetched_anything = !plan.is_empty();
        let confirm = || {
            match acquire_manifest(store.as_ref(), &manifest_path) {
                Some(acquired) => *manifest = Some(acquired),
                None if fetched_anything => {
                    return Err(SyncError::ManifestUnavailable {
                        path: manifest_path.clone(),
                    });
                }
                None => warn!(
                    path = %manifest_path.display(),
                    "Nothing fetched and no dependency manifest present"
                ),
            }

            let added = index.extend_from(&catalog);
            info!(added, total = index.len(), "Asset index updated");

            tracker
                .save_version(catalog.version)
                .map_err(|source| SyncError::PersistFailed {
                    path: tracker.bundle_dir().join(VERSION_FILENAME),
                    source,
                })
        };

        let fetched = orchestrator
            .run(&plan, &jobs, transport.as_ref(), observer, cancel, confirm)
            .await?;

        Ok(SyncReport {
            version: plan.version,
            plan,
            fetched,
        })
    }

    async fn prepare_sync(&mut self) -> SyncResult<(Catalog, SyncPlan)> {
        let catalog = self.fetch_catalog().await?;
        info!(
            version = catalog.version,
            bundles = catalog.len(),
            "Remote catalog loaded"
        );

        self.manifest = acquire_manifest(self.store.as_ref(), &self.config.manifest_path());
        let state = self.snapshot(self.manifest.is_some(), &catalog).await?;
        let plan = sync::plan(&catalog, &state);
        info!(bundles = plan.len(), reason = %plan.reason, "Sync planned");

        Ok((catalog, plan))
    }

    /// Bundle that contains `asset_path`.
    ///
    /// The path is joined onto the configured asset root unless it already
    /// starts with it.
    pub fn resolve(&self, asset_path: &str) -> LoadResult<&str> {
        let full = normalize_asset_path(&self.config.asset_root, asset_path);
        self.index
            .resolve(&full)
            .ok_or(LoadError::AssetNotIndexed { path: full })
    }

    /// Load `bundle` and its dependency closure.
    ///
    /// Open failures are listed in the report; bundles that did open stay
    /// resident.
    pub fn load_bundle(&mut self, bundle: &str) -> LoadResult<LoadReport> {
        let manifest = self.manifest.as_deref().ok_or(LoadError::NotSynced)?;
        let loader =
            DependencyGraphLoader::new(self.store.as_ref(), manifest, self.tracker.bundle_dir());
        Ok(loader.load(bundle, &mut self.cache))
    }

    /// Resolve an asset path and make its bundle resident.
    ///
    /// Returns the full asset path and the owning bundle name.
    fn prepare_asset(&mut self, asset_path: &str) -> LoadResult<(String, String)> {
        if self.manifest.is_none() {
            return Err(LoadError::NotSynced);
        }

        let full = normalize_asset_path(&self.config.asset_root, asset_path);
        let bundle = self
            .index
            .resolve(&full)
            .map(str::to_string)
            .ok_or_else(|| LoadError::AssetNotIndexed { path: full.clone() })?;

        self.load_bundle(&bundle)?.into_result()?;
        Ok((full, bundle))
    }

    /// Load a typed object by asset path.
    ///
    /// # Errors
    ///
    /// - [`LoadError::NotSynced`] before a successful sync
    /// - [`LoadError::AssetNotIndexed`] for unknown paths
    /// - [`LoadError::OpenFailed`] / [`LoadError::DependenciesFailed`] when
    ///   the bundle or part of its closure could not be opened
    /// - [`LoadError::ObjectNotFound`] / [`LoadError::TypeMismatch`]
    pub fn load_asset<T>(&mut self, asset_path: &str) -> LoadResult<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        let (full, bundle) = self.prepare_asset(asset_path)?;
        let handle = self
            .cache
            .get(&bundle)
            .ok_or_else(|| LoadError::BundleNotResident {
                bundle: bundle.clone(),
            })?;

        let object = handle
            .load_object(&full, TypeId::of::<T>())
            .ok_or_else(|| LoadError::ObjectNotFound {
                bundle: bundle.clone(),
                name: full.clone(),
            })?;

        object.downcast::<T>().map_err(|_| LoadError::TypeMismatch {
            bundle,
            name: full,
            expected: type_name::<T>(),
        })
    }

    /// Load the bundle containing a scene and return the first scene path.
    pub fn load_scene(&mut self, asset_path: &str) -> LoadResult<String> {
        let (_, bundle) = self.prepare_asset(asset_path)?;
        let handle = self
            .cache
            .get(&bundle)
            .ok_or_else(|| LoadError::BundleNotResident {
                bundle: bundle.clone(),
            })?;

        handle
            .scene_paths()
            .into_iter()
            .next()
            .ok_or(LoadError::NoScenes { bundle })
    }

    /// Unload a single bundle.
    ///
    /// Returns `false` (and logs a warning) if it was not loaded.
    pub fn unload_bundle(&mut self, bundle: &str, unload_all_objects: bool) -> bool {
        self.cache.unload(bundle, unload_all_objects)
    }

    /// Drop all local and in-memory state.
    ///
    /// Unloads every bundle with its objects, empties the asset index,
    /// deletes the contents of the local bundle directory and resets the
    /// sync state. The next sync starts cold.
    pub fn clear_cache(&mut self) -> FlowResult<()> {
        self.cache.clear();
        self.index.clear();
        self.manifest = None;
        self.orchestrator.reset();

        self.tracker.clear().map_err(|source| FlowError::Io {
            path: self.tracker.bundle_dir().to_path_buf(),
            source,
        })?;
        info!(dir = %self.tracker.bundle_dir().display(), "Bundle cache cleared");
        Ok(())
    }

    /// State of the current or most recent sync run.
    pub fn sync_state(&self) -> SyncState {
        self.orchestrator.state()
    }

    /// Version recorded by the last successful sync (0 if none).
    pub fn persisted_version(&self) -> u32 {
        self.tracker.persisted_version()
    }

    /// Whether a dependency manifest has been acquired this session.
    pub fn is_synced(&self) -> bool {
        self.manifest.is_some()
    }

    /// Whether `bundle` is resident.
    pub fn is_loaded(&self, bundle: &str) -> bool {
        self.cache.contains(bundle)
    }

    /// Names of resident bundles, sorted.
    pub fn loaded_bundles(&self) -> Vec<String> {
        self.cache.names()
    }

    /// The session's asset index.
    pub fn asset_index(&self) -> &AssetIndex {
        &self.index
    }
}
