//! Snapshot-isolation visibility filter
//!
//! Decides, one cell at a time, whether a version is visible to a reader
//! transaction. Cells arrive in store order (column ascending, timestamp
//! descending), so every version of a column is seen newest first and the
//! filter only needs to remember the column it is currently in.
//!
//! # Decision order
//!
//! For a cell with timestamp `ts` in the current column:
//!
//! 1. A visible delete marker newer than `ts` was already seen → skip the
//!    rest of the column, whatever `ts` is.
//! 2. `ts` is the reader's own id → visible.
//! 3. `ts` belongs to an excluded (concurrently running) sibling → skip.
//! 4. `ts` is above the reader's visibility upper bound → skip.
//! 5. `ts` belongs to an invalidated transaction → skip.
//! 6. `ts` is older than the family's TTL cutoff → skip (purgeable on a
//!    dropping compaction).
//! 7. A delete marker → starts shadowing; returned only when the scan
//!    retains delete markers.
//! 8. First visible version of the column → include.
//! 9. Older visible versions → include when the scan retains versions,
//!    skip otherwise.
//!
//! Own writes come before the snapshot-wide rules because a transaction
//! always sees what it wrote. Invalidation comes before TTL because it is
//! authoritative and cheap.

use std::cmp::Ordering;
use std::sync::Arc;

use txfilter_core::{now_ticks, Cell, Error, Result, Transaction, TxId};

use crate::filter::{CellFilter, FilterDecision};
use crate::purpose::ScanPurpose;
use crate::ttl::TtlTable;

/// Counters collected over one scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    /// Cells included
    pub included: u64,
    /// Cells skipped, for any reason
    pub skipped: u64,
    /// Skipped: written by an excluded sibling
    pub excluded: u64,
    /// Skipped: written after the reader's visibility upper bound
    pub future: u64,
    /// Skipped: written by an invalidated transaction
    pub invalid: u64,
    /// Skipped: older than the family TTL
    pub expired: u64,
    /// Expired cells skipped under `CompactDropDeletes`
    ///
    /// Flushes drop expired cells too; they are counted in `expired` only.
    pub purge_eligible: u64,
    /// Skipped: shadowed by a newer delete marker
    pub shadowed: u64,
    /// Visible delete markers encountered
    pub delete_markers: u64,
}

impl FilterStats {
    fn record(&mut self, decision: FilterDecision) {
        if decision.is_include() {
            self.included += 1;
        } else {
            self.skipped += 1;
        }
    }
}

/// Per-column state, reset at every column boundary
///
/// The column key buffers are reused across columns.
#[derive(Debug, Default)]
struct ColumnState {
    started: bool,
    row: Vec<u8>,
    family: Vec<u8>,
    qualifier: Vec<u8>,
    previous_ts: TxId,
    satisfied: bool,
    deleted_at: Option<TxId>,
}

impl ColumnState {
    fn order(&self, cell: &Cell) -> Ordering {
        self.row
            .as_slice()
            .cmp(cell.row.as_slice())
            .then_with(|| self.family.as_slice().cmp(cell.family.as_slice()))
            .then_with(|| self.qualifier.as_slice().cmp(cell.qualifier.as_slice()))
    }

    fn enter(&mut self, cell: &Cell) {
        self.started = true;
        self.row.clear();
        self.row.extend_from_slice(&cell.row);
        self.family.clear();
        self.family.extend_from_slice(&cell.family);
        self.qualifier.clear();
        self.qualifier.extend_from_slice(&cell.qualifier);
        self.previous_ts = cell.timestamp;
        self.satisfied = false;
        self.deleted_at = None;
    }
}

/// Visibility filter for one scan on behalf of one reader
pub struct VisibilityFilter {
    tx: Transaction,
    ttl: Arc<TtlTable>,
    purpose: ScanPurpose,
    now: TxId,
    column: ColumnState,
    family_cutoff: Option<TxId>,
    stats: FilterStats,
}

impl VisibilityFilter {
    /// Create a filter whose TTL reference time is the current wall clock
    pub fn new(tx: Transaction, ttl: Arc<TtlTable>, purpose: ScanPurpose) -> Self {
        Self::with_reference_time(tx, ttl, purpose, now_ticks())
    }

    /// Create a filter with an explicit TTL reference time (in id space)
    pub fn with_reference_time(
        tx: Transaction,
        ttl: Arc<TtlTable>,
        purpose: ScanPurpose,
        now: TxId,
    ) -> Self {
        VisibilityFilter {
            tx,
            ttl,
            purpose,
            now,
            column: ColumnState::default(),
            family_cutoff: None,
            stats: FilterStats::default(),
        }
    }

    /// The reader this filter decides for
    pub fn transaction(&self) -> &Transaction {
        &self.tx
    }

    /// The scan purpose
    pub fn purpose(&self) -> ScanPurpose {
        self.purpose
    }

    /// TTL reference time
    pub fn reference_time(&self) -> TxId {
        self.now
    }

    /// Counters collected so far
    pub fn stats(&self) -> FilterStats {
        self.stats
    }

    /// Track column boundaries and verify store order
    fn advance(&mut self, cell: &Cell) -> Result<()> {
        if !self.column.started {
            self.enter_column(cell);
            return Ok(());
        }

        match self.column.order(cell) {
            Ordering::Less => {
                self.enter_column(cell);
                Ok(())
            }
            Ordering::Equal if cell.timestamp <= self.column.previous_ts => {
                self.column.previous_ts = cell.timestamp;
                Ok(())
            }
            Ordering::Equal => Err(Error::OutOfOrderCell {
                timestamp: cell.timestamp,
                previous: self.column.previous_ts,
                reason: "timestamp increased within column",
            }),
            Ordering::Greater => Err(Error::OutOfOrderCell {
                timestamp: cell.timestamp,
                previous: self.column.previous_ts,
                reason: "column sorts before the previous column",
            }),
        }
    }

    fn enter_column(&mut self, cell: &Cell) {
        let family_changed = !self.column.started || self.column.family != cell.family;
        self.column.enter(cell);
        if family_changed {
            self.family_cutoff = self.ttl.cutoff(&cell.family, self.now);
        }
    }

    /// Skip decision for the rest of a satisfied column
    ///
    /// An own write may still follow a satisfied version when the reader's
    /// bound lies above its own id, so the column hint is only given when
    /// that cannot happen.
    fn skip_rest_of_column(&self, ts: TxId) -> FilterDecision {
        if self.tx.id() < ts {
            FilterDecision::Skip
        } else {
            FilterDecision::SkipToNextColumn
        }
    }

    fn decide(&mut self, cell: &Cell) -> FilterDecision {
        let ts = cell.timestamp;

        if let Some(marker_ts) = self.column.deleted_at {
            if ts < marker_ts {
                self.stats.shadowed += 1;
                return FilterDecision::SkipToNextColumn;
            }
        }

        let own_write = ts == self.tx.id();
        if !own_write {
            if self.tx.is_excluded(ts) {
                self.stats.excluded += 1;
                return FilterDecision::Skip;
            }
            if ts > self.tx.visibility_upper_bound() {
                self.stats.future += 1;
                return FilterDecision::Skip;
            }
            if self.tx.is_invalid(ts) {
                self.stats.invalid += 1;
                return FilterDecision::Skip;
            }
            if matches!(self.family_cutoff, Some(cutoff) if ts < cutoff) {
                self.stats.expired += 1;
                if self.purpose.purges() {
                    self.stats.purge_eligible += 1;
                }
                return FilterDecision::Skip;
            }
        }

        if cell.is_delete_marker() {
            self.stats.delete_markers += 1;
            self.column.deleted_at = Some(ts);
            self.column.satisfied = true;
            return if self.purpose.retains_delete_markers() {
                FilterDecision::Include
            } else {
                FilterDecision::SkipToNextColumn
            };
        }

        if own_write || !self.column.satisfied {
            self.column.satisfied = true;
            return FilterDecision::Include;
        }

        if self.purpose.retains_versions() {
            FilterDecision::Include
        } else {
            self.skip_rest_of_column(ts)
        }
    }
}

impl CellFilter for VisibilityFilter {
    fn filter_cell(&mut self, cell: &Cell) -> Result<FilterDecision> {
        self.advance(cell)?;
        let decision = self.decide(cell);
        self.stats.record(decision);
        Ok(decision)
    }
}
