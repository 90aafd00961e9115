//! Visibility and retention filtering for txfilter
//!
//! This crate implements the per-cell decision logic:
//! - CellFilter / FilterChain: the per-cell seam and AND-composition
//! - ScanPurpose: user read vs. flush/minor compaction vs. major compaction
//! - TtlTable: immutable family → TTL mapping
//! - VisibilityFilter: snapshot isolation, TTL expiry, delete-marker shadowing
//! - RetentionFilter: conservative wrapper for flush and compaction
//!
//! Nothing here performs I/O or takes locks; filters sit on the hot path of
//! every scan.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod filter;
pub mod purpose;
pub mod retention;
pub mod ttl;
pub mod visibility;

pub use filter::{CellFilter, FilterChain, FilterDecision, PredicateFilter};
pub use purpose::ScanPurpose;
pub use retention::RetentionFilter;
pub use ttl::TtlTable;
pub use visibility::{FilterStats, VisibilityFilter};
