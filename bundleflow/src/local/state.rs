//! Persisted sync version and on-disk bundle scanning.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::checksum::{calculate_file_hash, HashAlgorithm};

/// File holding the last successfully synced catalog version.
pub const VERSION_FILENAME: &str = "version.txt";

/// Local view used by the sync planner.
///
/// Only `persisted_version` survives between runs; hashes are recomputed
/// from disk on every sync attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalSyncState {
    /// Whether a dependency manifest could be acquired locally.
    pub manifest_available: bool,

    /// Last successfully synced catalog version (0 = never synced).
    pub persisted_version: u32,

    /// File name → content hash for every file in the bundle directory.
    ///
    /// `None` when hashing was skipped because the plan cannot depend on it.
    pub cached_bundle_hashes: Option<HashMap<String, String>>,
}

impl LocalSyncState {
    /// State of a client that has never synced.
    pub fn cold() -> Self {
        Self::default()
    }
}

/// Tracks the local bundle directory.
///
/// The directory holds `version.txt` plus one file per bundle, named by the
/// bundle's catalog name.
#[derive(Debug, Clone)]
pub struct LocalStateTracker {
    bundle_dir: PathBuf,
    algorithm: HashAlgorithm,
}

impl LocalStateTracker {
    /// Create a tracker for `bundle_dir`.
    pub fn new(bundle_dir: impl Into<PathBuf>, algorithm: HashAlgorithm) -> Self {
        Self {
            bundle_dir: bundle_dir.into(),
            algorithm,
        }
    }

    /// The local bundle directory.
    pub fn bundle_dir(&self) -> &Path {
        &self.bundle_dir
    }

    /// Hash algorithm used when scanning.
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Local path of a bundle file.
    pub fn bundle_path(&self, bundle_name: &str) -> PathBuf {
        self.bundle_dir.join(bundle_name)
    }

    /// Create the bundle directory if it does not exist.
    pub fn ensure_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.bundle_dir)
    }

    /// Read the persisted sync version.
    ///
    /// A missing or unparsable `version.txt` reads as 0.
    pub fn persisted_version(&self) -> u32 {
        let path = self.bundle_dir.join(VERSION_FILENAME);
        match fs::read_to_string(&path) {
            Ok(content) => content.trim().parse().unwrap_or_else(|_| {
                warn!(path = %path.display(), "Unparsable sync version, treating as 0");
                0
            }),
            Err(_) => 0,
        }
    }

    /// Persist the sync version.
    pub fn save_version(&self, version: u32) -> io::Result<()> {
        self.ensure_dir()?;
        fs::write(self.bundle_dir.join(VERSION_FILENAME), version.to_string())
    }

    /// Hash every regular file directly inside the bundle directory.
    ///
    /// Files that cannot be read hash to the empty string, which never
    /// matches a catalog hash. A missing directory yields an empty map.
    pub fn scan_hashes(&self) -> io::Result<HashMap<String, String>> {
        let entries = match fs::read_dir(&self.bundle_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => return Err(e),
        };

        let mut hashes = HashMap::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            let hash = calculate_file_hash(&entry.path(), self.algorithm).unwrap_or_else(|e| {
                warn!(file = %name, error = %e, "Failed to hash local bundle");
                String::new()
            });
            debug!(file = %name, hash = %hash, "Hashed local file");
            hashes.entry(name).or_insert(hash);
        }

        Ok(hashes)
    }

    /// Build the planner's view of local state.
    ///
    /// Files are only rehashed when the plan can depend on them: a manifest
    /// must be available and the persisted version must equal
    /// `remote_version`.
    pub fn snapshot(
        &self,
        manifest_available: bool,
        remote_version: u32,
    ) -> io::Result<LocalSyncState> {
        let persisted_version = self.persisted_version();
        let cached_bundle_hashes = if manifest_available && persisted_version == remote_version {
            Some(self.scan_hashes()?)
        } else {
            None
        };

        Ok(LocalSyncState {
            manifest_available,
            persisted_version,
            cached_bundle_hashes,
        })
    }

    /// [`snapshot`](Self::snapshot) on the blocking thread pool.
    ///
    /// Reading and hashing every local bundle is blocking disk work; async
    /// callers use this so the executor keeps running.
    pub async fn snapshot_blocking(
        &self,
        manifest_available: bool,
        remote_version: u32,
    ) -> io::Result<LocalSyncState> {
        let tracker = self.clone();
        tokio::task::spawn_blocking(move || tracker.snapshot(manifest_available, remote_version))
            .await
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?
    }

    /// Delete every file and subdirectory in the bundle directory, then
    /// recreate it empty.
    pub fn clear(&self) -> io::Result<()> {
        if self.bundle_dir.exists() {
            for entry in fs::read_dir(&self.bundle_dir)? {
                let entry = entry?;
                if entry.file_type()?.is_dir() {
                    fs::remove_dir_all(entry.path())?;
                } else {
                    fs::remove_file(entry.path())?;
                }
            }
        }
        self.ensure_dir()
    }
}
