//! Bundle synchronization.
//!
//! This module decides which bundles need fetching and fetches them:
//! - Sync planning from catalog and local state (`planner`)
//! - Abstract byte transport with file and HTTP adapters (`transport`)
//! - Sequential and parallel fetch strategies (`strategy`)
//! - Run state machine and outcome reporting (`orchestrator`)
//!
//! # Architecture
//!
//! ```text
//! plan(catalog, local state) ──► SyncPlan
//!                                   │
//! FetchOrchestrator ◄───────────────┘
//!         │
//!         ├── FetchStrategy (trait)
//!         │       ├── SequentialStrategy (paced, default)
//!         │       └── ParallelStrategy
//!         │
//!         ├── Transport (trait)
//!         │       ├── FileTransport
//!         │       └── HttpTransport
//!         │
//!         └── SyncObserver (progress / complete / failed)
//! ```

mod error;
mod observer;
mod orchestrator;
mod planner;
mod state;
mod strategy;
mod transport;

pub use error::{SyncError, SyncResult};
pub use observer::{CallbackObserver, NoopObserver, SyncObserver};
pub use orchestrator::FetchOrchestrator;
pub use planner::{plan, PlanReason, SyncPlan};
pub use state::{FetchJob, FetchState, SyncState};
pub use strategy::{
    FetchContext, FetchStrategy, ParallelStrategy, SequentialStrategy, DEFAULT_FETCH_TIMEOUT,
    DEFAULT_PACING,
};
pub use transport::{
    is_http_location, join_location, BoxFuture, FileTransport, HttpTransport, Transport,
    TransportError,
};
