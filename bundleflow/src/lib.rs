//! BundleFlow - versioned bundle synchronization and dependency-aware loading
//!
//! This library keeps a local copy of content-addressed bundles in sync with
//! a remote catalog and loads those bundles, together with their transitive
//! dependencies, into an in-memory working set addressed by asset path.
//!
//! # Modules
//!
//! - [`catalog`] - Catalog document model and bundle naming
//! - [`local`] - Persisted version and local content hashing
//! - [`sync`] - Planning, transports, fetch strategies and the run orchestrator
//! - [`store`] - Bundle store traits implemented by the host runtime
//! - [`loader`] - Asset index, loaded-bundle cache and dependency loading
//! - [`engine`] - The [`BundleFlow`](engine::BundleFlow) composition root
//! - [`config`] - Runtime configuration and the INI config file
//! - [`logging`] - Subscriber setup for binaries

pub mod catalog;
pub mod config;
pub mod engine;
pub mod loader;
pub mod local;
pub mod logging;
pub mod store;
pub mod sync;

pub use engine::{BundleFlow, FlowError, FlowResult, SyncReport};
