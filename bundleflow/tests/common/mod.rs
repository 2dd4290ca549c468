//! Shared fixtures for engine integration tests.
//!
//! The source side is a real directory served through `FileTransport`; the
//! bundle store is an in-memory mock that treats any existing file as a
//! bundle and counts how often each bundle is opened.

#![allow(dead_code)]

use std::any::TypeId;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;

use bundleflow::catalog::{BundleEntry, Catalog};
use bundleflow::config::{FlowConfig, Platform};
use bundleflow::local::{calculate_bytes_hash, HashAlgorithm};
use bundleflow::store::{AssetObject, BundleHandle, BundleStore, DependencyManifest, StoreError};
use bundleflow::sync::{FileTransport, SyncError, SyncObserver};
use bundleflow::BundleFlow;

/// Manifest bundle name for the test platform.
pub const MANIFEST: &str = "StandaloneWindows64";

// ============================================================================
// Bundle Store Mock
// ============================================================================

struct MapManifest(HashMap<String, Vec<String>>);

impl DependencyManifest for MapManifest {
    fn all_dependencies(&self, bundle: &str) -> Vec<String> {
        self.0.get(bundle).cloned().unwrap_or_default()
    }
}

struct MockHandle {
    manifest: Option<Arc<dyn DependencyManifest>>,
    objects: HashMap<String, AssetObject>,
    scenes: Vec<String>,
    name: String,
    unloads: Arc<Mutex<Vec<(String, bool)>>>,
}

impl BundleHandle for MockHandle {
    fn load_object(&self, name: &str, _type_id: TypeId) -> Option<AssetObject> {
        self.objects.get(name).cloned()
    }

    fn scene_paths(&self) -> Vec<String> {
        self.scenes.clone()
    }

    fn dependency_manifest(&self) -> Option<Arc<dyn DependencyManifest>> {
        self.manifest.clone()
    }

    fn unload(self: Box<Self>, unload_all_objects: bool) {
        self.unloads
            .lock()
            .unwrap()
            .push((self.name.clone(), unload_all_objects));
    }
}

/// Bundle store over the local bundle directory.
#[derive(Default)]
pub struct MockStore {
    dependencies: HashMap<String, Vec<String>>,
    objects: HashMap<String, HashMap<String, AssetObject>>,
    scenes: HashMap<String, Vec<String>>,
    opens: Mutex<HashMap<String, usize>>,
    pub unloads: Arc<Mutex<Vec<(String, bool)>>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dependencies(mut self, bundle: &str, deps: &[&str]) -> Self {
        self.dependencies.insert(
            bundle.to_string(),
            deps.iter().map(|d| d.to_string()).collect(),
        );
        self
    }

    pub fn with_object<T>(mut self, bundle: &str, path: &str, value: T) -> Self
    where
        T: Send + Sync + 'static,
    {
        self.objects
            .entry(bundle.to_string())
            .or_default()
            .insert(path.to_string(), Arc::new(value));
        self
    }

    pub fn with_scene(mut self, bundle: &str, scene: &str) -> Self {
        self.scenes
            .entry(bundle.to_string())
            .or_default()
            .push(scene.to_string());
        self
    }

    /// How often `bundle` was opened.
    pub fn open_count(&self, bundle: &str) -> usize {
        self.opens.lock().unwrap().get(bundle).copied().unwrap_or(0)
    }
}

impl BundleStore for MockStore {
    fn open(&self, path: &Path) -> Result<Box<dyn BundleHandle>, StoreError> {
        if !path.is_file() {
            return Err(StoreError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        *self.opens.lock().unwrap().entry(name.clone()).or_default() += 1;

        let manifest: Option<Arc<dyn DependencyManifest>> = if name == MANIFEST {
            Some(Arc::new(MapManifest(self.dependencies.clone())))
        } else {
            None
        };

        Ok(Box::new(MockHandle {
            manifest,
            objects: self.objects.get(&name).cloned().unwrap_or_default(),
            scenes: self.scenes.get(&name).cloned().unwrap_or_default(),
            name,
            unloads: self.unloads.clone(),
        }))
    }
}

// ============================================================================
// Observer
// ============================================================================

/// Observer that records every notification in order.
#[derive(Default)]
pub struct RecordingObserver {
    pub events: Mutex<Vec<String>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.events()
            .iter()
            .filter(|e| e.starts_with(prefix))
            .count()
    }
}

impl SyncObserver for RecordingObserver {
    fn on_progress(&self, completed: usize, total: usize) {
        self.events
            .lock()
            .unwrap()
            .push(format!("progress {}/{}", completed, total));
    }

    fn on_complete(&self) {
        self.events.lock().unwrap().push("complete".to_string());
    }

    fn on_failed(&self, error: &SyncError) {
        self.events.lock().unwrap().push(format!("failed: {}", error));
    }
}

// ============================================================================
// Source / Persist Fixture
// ============================================================================

/// A published bundle: name, bytes, asset paths.
pub type Published<'a> = (&'a str, &'a [u8], &'a [&'a str]);

/// Temporary source and persist roots.
pub struct Fixture {
    _temp: TempDir,
    pub source_root: PathBuf,
    pub persist_root: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let source_root = temp.path().join("source");
        let persist_root = temp.path().join("persist");
        Self {
            _temp: temp,
            source_root,
            persist_root,
        }
    }

    /// Remote bundle directory for the test platform.
    pub fn source_dir(&self) -> PathBuf {
        self.source_root.join("AssetBundles").join(MANIFEST)
    }

    /// Local bundle directory for the test platform.
    pub fn bundle_dir(&self) -> PathBuf {
        self.persist_root.join("AssetBundles").join(MANIFEST)
    }

    /// Write bundle files and `catalog.json` into the source directory.
    pub fn publish(&self, version: u32, bundles: &[Published<'_>]) -> Catalog {
        let dir = self.source_dir();
        std::fs::create_dir_all(&dir).unwrap();

        let mut catalog = Catalog::new(version);
        for (name, bytes, assets) in bundles {
            std::fs::write(dir.join(name), bytes).unwrap();
            let hash = calculate_bytes_hash(bytes, HashAlgorithm::Md5);
            let source = format!("Assets/{}", name);
            let mut entry = BundleEntry::new(*name, source, hash, bytes.len() as u64);
            for asset in *assets {
                entry = entry.with_asset(*asset);
            }
            catalog.insert(entry);
        }
        catalog.write_to_dir(&dir).unwrap();
        catalog
    }

    /// Remove a published bundle file so its fetch fails.
    pub fn unpublish(&self, name: &str) {
        std::fs::remove_file(self.source_dir().join(name)).unwrap();
    }

    /// Put a file directly into the local bundle directory.
    pub fn place_local(&self, name: &str, bytes: &[u8]) {
        let dir = self.bundle_dir();
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(name), bytes).unwrap();
    }

    pub fn local_file(&self, name: &str) -> PathBuf {
        self.bundle_dir().join(name)
    }

    pub fn config(&self) -> FlowConfig {
        FlowConfig::new(self.source_root.to_string_lossy(), &self.persist_root)
            .with_platform(Platform::StandaloneWindows64)
            .with_pacing(Duration::ZERO)
            .with_fetch_timeout(Duration::from_secs(10))
    }

    pub fn engine(&self, store: Arc<MockStore>) -> BundleFlow {
        self.engine_with(self.config(), store)
    }

    pub fn engine_with(&self, config: FlowConfig, store: Arc<MockStore>) -> BundleFlow {
        BundleFlow::new(config, Arc::new(FileTransport::new()), store).unwrap()
    }
}
