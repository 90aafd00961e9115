//! Transaction processor for txfilter
//!
//! This crate plugs the visibility filters into a host region:
//! - TransactionObserver: hooks the host drives around reads, writes,
//!   flushes and compactions
//! - TransactionProcessor: the observer giving snapshot isolation
//! - SnapshotCache / SnapshotRefresher: latest transaction snapshot, kept
//!   fresh by a background thread
//! - ProcessorConfig: `txfilter.toml` settings
//! - MemRegion: in-memory host region driving the hooks

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod config;
pub mod observer;
pub mod operation;
pub mod processor;
pub mod refresher;
pub mod region;
pub mod schema;

pub use cache::{SnapshotCache, SnapshotSource};
pub use config::{ColdCachePolicy, ProcessorConfig, CONFIG_FILE_NAME};
pub use observer::{
    CompactionKind, ObserverEnvironment, ProcessorState, StoreScanSpec, TransactionObserver,
};
pub use operation::{
    attach_transaction, transaction_from, Attributes, Get, OperationWithAttributes, Put,
    ReadOperation, Scan, TimeRange, ALL_VERSIONS,
};
pub use processor::TransactionProcessor;
pub use refresher::{SnapshotProvider, SnapshotRefresher};
pub use region::{MemRegion, TOMBSTONE_TAG_KIND};
pub use schema::{FamilyDescriptor, TableDescriptor, TTL_PROPERTY};
