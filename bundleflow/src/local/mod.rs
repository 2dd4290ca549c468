//! Local bundle directory state.
//!
//! This module provides:
//! - Content hashing of cached bundle files (`checksum`)
//! - The persisted sync version and on-demand rehashing (`state`)

mod checksum;
mod state;

pub use checksum::{calculate_bytes_hash, calculate_file_hash, HashAlgorithm};
pub use state::{LocalStateTracker, LocalSyncState, VERSION_FILENAME};
