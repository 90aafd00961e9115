//! Retention filter for flush and compaction
//!
//! Flush and compaction are the only places data is physically discarded,
//! and they run on behalf of no particular transaction. The latest snapshot
//! only settles the fate of ids up to its visibility upper bound `B`:
//!
//! - `ts > B`: the writer may still commit. Invalid writers are dead for
//!   good and are dropped; everything else is kept unconditionally.
//! - `ts <= B`: settled, so the regular [`VisibilityFilter`] decides, for a
//!   synthetic reader positioned at `B` with no exclusions.
//!
//! The filter is therefore never stricter than the visibility filter for
//! cells above `B`.

use std::sync::Arc;

use txfilter_core::{Cell, Result, Transaction, TransactionSnapshot, TxId};

use crate::filter::{CellFilter, FilterDecision};
use crate::purpose::ScanPurpose;
use crate::ttl::TtlTable;
use crate::visibility::VisibilityFilter;

/// Keeps unsettled writes, delegates settled ones
pub struct RetentionFilter<F = VisibilityFilter> {
    boundary: TxId,
    invalid: Vec<TxId>,
    inner: F,
    retained_unsettled: u64,
    dropped_invalid: u64,
}

impl RetentionFilter<VisibilityFilter> {
    /// Build the flush/compaction filter stack for a snapshot
    ///
    /// Uses the current wall clock as TTL reference time.
    pub fn for_snapshot(
        snapshot: &TransactionSnapshot,
        ttl: Arc<TtlTable>,
        purpose: ScanPurpose,
    ) -> Self {
        let reader = Transaction::snapshot_boundary(snapshot);
        let boundary = reader.visibility_upper_bound();
        RetentionFilter::new(
            boundary,
            snapshot.invalid().iter().copied(),
            VisibilityFilter::new(reader, ttl, purpose),
        )
    }

    /// Like [`RetentionFilter::for_snapshot`] with an explicit TTL reference time
    pub fn for_snapshot_at(
        snapshot: &TransactionSnapshot,
        ttl: Arc<TtlTable>,
        purpose: ScanPurpose,
        now: TxId,
    ) -> Self {
        let reader = Transaction::snapshot_boundary(snapshot);
        let boundary = reader.visibility_upper_bound();
        RetentionFilter::new(
            boundary,
            snapshot.invalid().iter().copied(),
            VisibilityFilter::with_reference_time(reader, ttl, purpose, now),
        )
    }
}

impl<F: CellFilter> RetentionFilter<F> {
    /// Wrap `inner` with boundary `boundary` and the snapshot's invalid ids
    pub fn new(boundary: TxId, invalid: impl IntoIterator<Item = TxId>, inner: F) -> Self {
        let mut invalid: Vec<TxId> = invalid.into_iter().collect();
        invalid.sort_unstable();
        invalid.dedup();
        RetentionFilter {
            boundary,
            invalid,
            inner,
            retained_unsettled: 0,
            dropped_invalid: 0,
        }
    }

    /// Highest settled id
    pub fn boundary(&self) -> TxId {
        self.boundary
    }

    /// The wrapped filter
    pub fn inner(&self) -> &F {
        &self.inner
    }

    /// Cells above the boundary kept because their fate is unknown
    pub fn retained_unsettled(&self) -> u64 {
        self.retained_unsettled
    }

    /// Cells above the boundary dropped because their writer is invalid
    pub fn dropped_invalid(&self) -> u64 {
        self.dropped_invalid
    }
}

impl<F: CellFilter> CellFilter for RetentionFilter<F> {
    fn filter_cell(&mut self, cell: &Cell) -> Result<FilterDecision> {
        if cell.timestamp > self.boundary {
            if self.invalid.binary_search(&cell.timestamp).is_ok() {
                self.dropped_invalid += 1;
                return Ok(FilterDecision::Skip);
            }
            self.retained_unsettled += 1;
            return Ok(FilterDecision::Include);
        }
        self.inner.filter_cell(cell)
    }
}
