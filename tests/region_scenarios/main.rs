//! Region Scenarios
//!
//! End-to-end tests driving a MemRegion through the transaction processor:
//! - Visibility: snapshot isolation on gets and scans
//! - TTL: expiry against the wall clock on reads and compactions
//! - Deletes: delete markers across reads, flushes and compactions

#[path = "../common/mod.rs"]
mod common;

mod deletes;
mod ttl;
mod visibility;
