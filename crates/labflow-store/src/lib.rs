//! labflow Store
//!
//! Storage ports used by the confirmation engine, and a transactional
//! in-memory implementation.
//!
//! # Overview
//!
//! - **LabRead / LabWrite**: lookups and mutations the engine depends on
//! - **LabStore**: hands out transactions (explicit units of work)
//! - **MemoryStore**: snapshot-isolated store with optimistic commits
//! - **Snapshot**: JSON-serialisable store contents
//!
//! # Example
//!
//! ```rust
//! use labflow_store::{LabRead, LabStore, MemoryStore};
//!
//! let store = MemoryStore::new();
//! let tx = store.begin();
//! assert!(tx.labware_by_barcode("STAN-1").is_none());
//! store.commit(tx).unwrap();
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod memory;
pub mod ports;
pub mod snapshot;

// Re-exports
pub use error::StoreError;
pub use memory::{MemoryStore, MemoryTransaction};
pub use ports::{LabRead, LabStore, LabWrite};
pub use snapshot::Snapshot;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
