//! Region observer hooks
//!
//! The host region calls a [`TransactionObserver`] around every request and
//! before opening a flush or compaction scanner. Hooks take `&self`: one
//! observer serves all concurrent requests of a region.

use std::sync::Arc;

use txfilter_core::{Cell, Result};
use txfilter_visibility::{CellFilter, FilterDecision, RetentionFilter, ScanPurpose};

use crate::cache::SnapshotSource;
use crate::operation::{Get, Put, Scan, ALL_VERSIONS};
use crate::schema::TableDescriptor;

/// What an observer receives when its region opens
#[derive(Clone)]
pub struct ObserverEnvironment {
    /// Name of the region, for logs
    pub region_name: String,
    /// Schema of the region's table
    pub descriptor: TableDescriptor,
    /// Latest-snapshot access
    pub snapshots: Arc<dyn SnapshotSource>,
}

/// Kind of compaction about to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompactionKind {
    /// Rewrites some store files; other files may still hold shadowed data
    Minor,
    /// Rewrites every store file of the region
    Major,
}

impl CompactionKind {
    /// Scan purpose the retention filter runs with
    pub fn purpose(self) -> ScanPurpose {
        match self {
            CompactionKind::Minor => ScanPurpose::CompactRetainDeletes,
            CompactionKind::Major => ScanPurpose::CompactDropDeletes,
        }
    }

    /// Short name for logs
    pub fn name(self) -> &'static str {
        match self {
            CompactionKind::Minor => "minor_compaction",
            CompactionKind::Major => "major_compaction",
        }
    }
}

/// Scanner settings an observer hands back for a flush or compaction
pub struct StoreScanSpec {
    action: &'static str,
    purpose: ScanPurpose,
    max_versions: usize,
    filter: RetentionFilter,
}

impl StoreScanSpec {
    /// Keep every version, filtered by `filter`
    pub fn new(action: &'static str, purpose: ScanPurpose, filter: RetentionFilter) -> Self {
        StoreScanSpec {
            action,
            purpose,
            max_versions: ALL_VERSIONS,
            filter,
        }
    }

    /// Operation the scanner serves (`flush`, `minor_compaction`, ...)
    pub fn action(&self) -> &'static str {
        self.action
    }

    /// Purpose of the filter
    pub fn purpose(&self) -> ScanPurpose {
        self.purpose
    }

    /// Versions per column the scanner may keep
    pub fn max_versions(&self) -> usize {
        self.max_versions
    }

    /// The installed filter
    pub fn filter(&self) -> &RetentionFilter {
        &self.filter
    }

    /// Consume the spec once the scanner is exhausted, logging filter stats
    pub fn finish(self) {
        let stats = self.filter.inner().stats();
        tracing::debug!(
            action = self.action,
            purpose = self.purpose.name(),
            boundary = self.filter.boundary(),
            included = stats.included,
            skipped = stats.skipped,
            invalid = stats.invalid,
            expired = stats.expired,
            purged = stats.purge_eligible,
            shadowed = stats.shadowed,
            retained_unsettled = self.filter.retained_unsettled(),
            dropped_invalid = self.filter.dropped_invalid(),
            "Store scan filter finished"
        );
    }
}

impl CellFilter for StoreScanSpec {
    fn filter_cell(&mut self, cell: &Cell) -> Result<FilterDecision> {
        self.filter.filter_cell(cell)
    }
}

/// Lifecycle of an observer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ProcessorState {
    /// Created, not yet started
    Uninitialized = 0,
    /// Started, no request seen yet
    Started = 1,
    /// Serving requests
    Active = 2,
    /// Stopped; hooks pass requests through unmodified
    Stopped = 3,
}

impl ProcessorState {
    pub(crate) fn from_u8(value: u8) -> ProcessorState {
        match value {
            0 => ProcessorState::Uninitialized,
            1 => ProcessorState::Started,
            2 => ProcessorState::Active,
            _ => ProcessorState::Stopped,
        }
    }
}

/// Hooks a host region drives
pub trait TransactionObserver: Send + Sync {
    /// Called once when the region opens
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` when called more than once.
    fn start(&self, env: ObserverEnvironment) -> Result<()>;

    /// Called when the region closes
    fn stop(&self);

    /// Before a point read
    ///
    /// # Errors
    ///
    /// Returns an error when the request must be rejected.
    fn pre_get(&self, get: &mut Get) -> Result<()>;

    /// Before a range scan
    ///
    /// # Errors
    ///
    /// Returns an error when the request must be rejected.
    fn pre_scan(&self, scan: &mut Scan) -> Result<()>;

    /// Before a write
    ///
    /// # Errors
    ///
    /// Returns an error when the request must be rejected.
    fn pre_put(&self, put: &mut Put) -> Result<()>;

    /// Before the memstore flush scanner opens
    ///
    /// `None` keeps the store's default scanner.
    ///
    /// # Errors
    ///
    /// Returns an error when the flush must be deferred.
    fn pre_flush_scanner_open(&self) -> Result<Option<StoreScanSpec>>;

    /// Before a compaction scanner opens
    ///
    /// `None` keeps the store's default scanner.
    ///
    /// # Errors
    ///
    /// Returns an error when the compaction must be deferred.
    fn pre_compact_scanner_open(&self, kind: CompactionKind) -> Result<Option<StoreScanSpec>>;
}
