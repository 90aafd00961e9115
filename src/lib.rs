//! txfilter - snapshot-isolated reads over a sorted column-family store
//!
//! Every cell version is stamped with the id of the transaction that wrote
//! it. txfilter decides, per cell, whether a version is visible to a reader
//! transaction, and what flushes and compactions may physically discard,
//! based on a published snapshot of the transaction manager's state.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use txfilter::{
//!     attach_transaction, FamilyDescriptor, Get, MemRegion, MsgPackTransactionCodec, Put,
//!     SnapshotCache, TableDescriptor, Transaction, TransactionProcessor, TransactionSnapshot,
//! };
//!
//! let cache = Arc::new(SnapshotCache::new());
//! let processor = Arc::new(TransactionProcessor::default());
//! let descriptor = TableDescriptor::new("accounts").with_family(FamilyDescriptor::new("d"));
//! let mut region = MemRegion::open(descriptor, processor, cache.clone())?;
//!
//! region.put(Put::new("acct").add_column("d", "balance", 42, "100"))?;
//!
//! let snapshot = TransactionSnapshot::new(50, [], [], 0)?;
//! let mut get = Get::new("acct");
//! attach_transaction(&mut get, &Transaction::begin(60, &snapshot), &MsgPackTransactionCodec);
//! let cells = region.get(get)?;
//! ```
//!
//! # Architecture
//!
//! - `txfilter-core`: ids, transactions, snapshots, cells, codec, errors
//! - `txfilter-visibility`: the per-cell visibility and retention filters
//! - `txfilter-processor`: the observer hooks, snapshot cache and an
//!   in-memory host region

pub use txfilter_core::*;
pub use txfilter_processor::*;
pub use txfilter_visibility::*;
