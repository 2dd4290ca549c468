//! Engine configuration.
//!
//! [`FlowConfig`] is the runtime configuration consumed by the engine. It can
//! be built in code with the `with_*` methods or loaded from an INI
//! [`ConfigFile`]:
//!
//! ```ini
//! [bundles]
//! source_root = https://cdn.example.com/game
//! persist_root = /home/user/.local/share/bundleflow
//! platform = Android
//! asset_root = Assets/AssetBundles/
//!
//! [sync]
//! pacing_ms = 100
//! fetch_timeout_secs = 300
//! parallel_fetches = 1
//! hash = md5
//! ```

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use ini::Ini;
use thiserror::Error;

use crate::catalog::{CATALOG_FILENAME, DEFAULT_ASSET_ROOT};
use crate::local::HashAlgorithm;
use crate::sync::{join_location, FetchOrchestrator, DEFAULT_FETCH_TIMEOUT, DEFAULT_PACING};

/// Directory under both roots that holds per-platform bundle folders.
pub const BUNDLES_DIR: &str = "AssetBundles";

/// Configuration file name inside the config directory.
pub const CONFIG_FILENAME: &str = "config.ini";

/// Application directory name used under platform data/config dirs.
const APP_DIR: &str = "bundleflow";

const SECTION_BUNDLES: &str = "bundles";
const SECTION_SYNC: &str = "sync";

/// Errors from loading or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read or parsed.
    #[error("failed to read config file {}: {source}", path.display())]
    Read { path: PathBuf, source: ini::Error },

    /// The config file could not be written.
    #[error("failed to write config file {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    /// A key holds a value that cannot be used.
    #[error("invalid value '{value}' for {section}.{key}: {reason}")]
    InvalidValue {
        section: &'static str,
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Target platform, which selects the bundle folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Desktop builds.
    StandaloneWindows64,
    /// iOS builds.
    Ios,
    /// Android builds.
    Android,
}

impl Platform {
    /// All platforms.
    pub const ALL: [Platform; 3] = [
        Platform::StandaloneWindows64,
        Platform::Ios,
        Platform::Android,
    ];

    /// Folder name under `AssetBundles/`. The dependency manifest bundle
    /// carries the same name.
    pub fn folder_name(&self) -> &'static str {
        match self {
            Platform::StandaloneWindows64 => "StandaloneWindows64",
            Platform::Ios => "iOS",
            Platform::Android => "Android",
        }
    }

    /// Platform for the compilation target. Anything that is neither iOS
    /// nor Android uses the desktop folder.
    pub fn current() -> Self {
        if cfg!(target_os = "ios") {
            Platform::Ios
        } else if cfg!(target_os = "android") {
            Platform::Android
        } else {
            Platform::StandaloneWindows64
        }
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.folder_name())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "standalonewindows64" | "windows" | "desktop" => Ok(Platform::StandaloneWindows64),
            "ios" => Ok(Platform::Ios),
            "android" => Ok(Platform::Android),
            other => Err(format!("unknown platform: {}", other)),
        }
    }
}

/// How the fetch phase runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchMode {
    /// One bundle at a time with pacing.
    #[default]
    Sequential,
    /// Up to N bundles at once.
    Parallel(usize),
}

impl FetchMode {
    /// Mode for a configured number of concurrent fetches.
    pub fn from_concurrency(n: usize) -> Self {
        if n <= 1 {
            FetchMode::Sequential
        } else {
            FetchMode::Parallel(n)
        }
    }

    /// Configured number of concurrent fetches.
    pub fn concurrency(&self) -> usize {
        match self {
            FetchMode::Sequential => 1,
            FetchMode::Parallel(n) => *n,
        }
    }
}

/// Default persistent storage root.
pub fn default_persist_root() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR)
}

/// Path of the default configuration file.
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(CONFIG_FILENAME)
}

/// Runtime configuration for the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowConfig {
    /// Root of the remote source: a directory path or an HTTP(S) URL.
    pub source_root: String,

    /// Root of persistent local storage.
    pub persist_root: PathBuf,

    /// Target platform.
    pub platform: Platform,

    /// Prefix joined onto caller-supplied asset paths.
    pub asset_root: String,

    /// Pause between sequential fetches.
    pub pacing: Duration,

    /// Upper bound on a single fetch.
    pub fetch_timeout: Duration,

    /// Sequential or parallel fetching.
    pub fetch_mode: FetchMode,

    /// Digest used to compare local files against the catalog.
    pub hash_algorithm: HashAlgorithm,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            source_root: ".".to_string(),
            persist_root: default_persist_root(),
            platform: Platform::current(),
            asset_root: DEFAULT_ASSET_ROOT.to_string(),
            pacing: DEFAULT_PACING,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            fetch_mode: FetchMode::Sequential,
            hash_algorithm: HashAlgorithm::Md5,
        }
    }
}

impl FlowConfig {
    /// Create a config with the given source and persist roots.
    pub fn new(source_root: impl Into<String>, persist_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            persist_root: persist_root.into(),
            ..Default::default()
        }
    }

    /// Set the remote source root.
    pub fn with_source_root(mut self, root: impl Into<String>) -> Self {
        self.source_root = root.into();
        self
    }

    /// Set the local persist root.
    pub fn with_persist_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.persist_root = root.into();
        self
    }

    /// Set the platform.
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Set the asset root prefix.
    pub fn with_asset_root(mut self, root: impl Into<String>) -> Self {
        self.asset_root = root.into();
        self
    }

    /// Set the pause between sequential fetches.
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    /// Set the per-fetch timeout.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Set the fetch mode.
    pub fn with_fetch_mode(mut self, mode: FetchMode) -> Self {
        self.fetch_mode = mode;
        self
    }

    /// Set the hash algorithm.
    pub fn with_hash_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.hash_algorithm = algorithm;
        self
    }

    /// Remote directory holding this platform's bundles and catalog.
    pub fn source_dir(&self) -> String {
        let bundles = join_location(&self.source_root, BUNDLES_DIR);
        join_location(&bundles, self.platform.folder_name())
    }

    /// Remote location of the catalog.
    pub fn catalog_location(&self) -> String {
        join_location(&self.source_dir(), CATALOG_FILENAME)
    }

    /// Remote location of a bundle.
    pub fn bundle_location(&self, bundle: &str) -> String {
        join_location(&self.source_dir(), bundle)
    }

    /// Local directory holding this platform's synced bundles.
    pub fn bundle_dir(&self) -> PathBuf {
        self.persist_root
            .join(BUNDLES_DIR)
            .join(self.platform.folder_name())
    }

    /// Local path of the dependency manifest bundle.
    pub fn manifest_path(&self) -> PathBuf {
        self.bundle_dir().join(self.platform.folder_name())
    }

    /// Build the fetch orchestrator for this configuration.
    pub fn orchestrator(&self) -> FetchOrchestrator {
        match self.fetch_mode {
            FetchMode::Sequential => FetchOrchestrator::sequential(self.pacing, self.fetch_timeout),
            FetchMode::Parallel(n) => FetchOrchestrator::parallel(n, self.fetch_timeout),
        }
    }
}

/// `[bundles]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundlesSection {
    pub source_root: String,
    pub persist_root: PathBuf,
    pub platform: Platform,
    pub asset_root: String,
}

/// `[sync]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSection {
    pub pacing_ms: u64,
    pub fetch_timeout_secs: u64,
    pub parallel_fetches: usize,
    pub hash: HashAlgorithm,
}

/// Configuration loaded from an INI file.
///
/// Missing keys keep their defaults; present keys must be valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    pub bundles: BundlesSection,
    pub sync: SyncSection,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::from(&FlowConfig::default())
    }
}

impl From<&FlowConfig> for ConfigFile {
    fn from(config: &FlowConfig) -> Self {
        Self {
            bundles: BundlesSection {
                source_root: config.source_root.clone(),
                persist_root: config.persist_root.clone(),
                platform: config.platform,
                asset_root: config.asset_root.clone(),
            },
            sync: SyncSection {
                pacing_ms: config.pacing.as_millis() as u64,
                fetch_timeout_secs: config.fetch_timeout.as_secs(),
                parallel_fetches: config.fetch_mode.concurrency(),
                hash: config.hash_algorithm,
            },
        }
    }
}

fn parse_value<T>(
    section: &'static str,
    key: &'static str,
    value: &str,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        section,
        key,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

impl ConfigFile {
    /// Load from the default config path, or defaults if the file does not
    /// exist.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Load from `path`, or defaults if the file does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let ini = Ini::load_from_file(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ini(&ini)
    }

    /// Parse INI text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(content).map_err(|e| ConfigError::Read {
            path: PathBuf::from("<string>"),
            source: ini::Error::Parse(e),
        })?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(section) = ini.section(Some(SECTION_BUNDLES)) {
            if let Some(v) = section.get("source_root") {
                config.bundles.source_root = v.trim().to_string();
            }
            if let Some(v) = section.get("persist_root") {
                config.bundles.persist_root = expand_tilde(v.trim());
            }
            if let Some(v) = section.get("platform") {
                config.bundles.platform = parse_value(SECTION_BUNDLES, "platform", v)?;
            }
            if let Some(v) = section.get("asset_root") {
                config.bundles.asset_root = v.trim().to_string();
            }
        }

        if let Some(section) = ini.section(Some(SECTION_SYNC)) {
            if let Some(v) = section.get("pacing_ms") {
                config.sync.pacing_ms = parse_value(SECTION_SYNC, "pacing_ms", v)?;
            }
            if let Some(v) = section.get("fetch_timeout_secs") {
                let secs: u64 = parse_value(SECTION_SYNC, "fetch_timeout_secs", v)?;
                if secs == 0 {
                    return Err(ConfigError::InvalidValue {
                        section: SECTION_SYNC,
                        key: "fetch_timeout_secs",
                        value: v.to_string(),
                        reason: "timeout must be at least one second".to_string(),
                    });
                }
                config.sync.fetch_timeout_secs = secs;
            }
            if let Some(v) = section.get("parallel_fetches") {
                config.sync.parallel_fetches = parse_value(SECTION_SYNC, "parallel_fetches", v)?;
            }
            if let Some(v) = section.get("hash") {
                config.sync.hash = parse_value(SECTION_SYNC, "hash", v)?;
            }
        }

        Ok(config)
    }

    /// Save to the default config path.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    /// Save to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }

        let mut ini = Ini::new();
        ini.with_section(Some(SECTION_BUNDLES))
            .set("source_root", self.bundles.source_root.as_str())
            .set("persist_root", self.bundles.persist_root.to_string_lossy())
            .set("platform", self.bundles.platform.folder_name())
            .set("asset_root", self.bundles.asset_root.as_str());
        ini.with_section(Some(SECTION_SYNC))
            .set("pacing_ms", self.sync.pacing_ms.to_string())
            .set("fetch_timeout_secs", self.sync.fetch_timeout_secs.to_string())
            .set("parallel_fetches", self.sync.parallel_fetches.to_string())
            .set("hash", self.sync.hash.name());

        ini.write_to_file(path).map_err(write_err)
    }

    /// Convert into the runtime configuration.
    pub fn to_flow_config(&self) -> FlowConfig {
        FlowConfig {
            source_root: self.bundles.source_root.clone(),
            persist_root: self.bundles.persist_root.clone(),
            platform: self.bundles.platform,
            asset_root: self.bundles.asset_root.clone(),
            pacing: Duration::from_millis(self.sync.pacing_ms),
            fetch_timeout: Duration::from_secs(self.sync.fetch_timeout_secs),
            fetch_mode: FetchMode::from_concurrency(self.sync.parallel_fetches),
            hash_algorithm: self.sync.hash,
        }
    }
}

/// Expand a leading `~` to the home directory.
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
