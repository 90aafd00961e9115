//! In-memory region host
//!
//! A small region implementation playing the host side of the observer
//! contract: a sorted memstore, a stack of immutable store files, and the
//! scan loops that apply filters cell by cell. It drives the observer hooks
//! exactly where a real region server would.
//!
//! # Store model
//!
//! - `put` writes into the memstore; `flush` turns the memstore into a new
//!   store file.
//! - `delete` is the store's own delete: it writes a tombstone that masks
//!   every version of the column at or below its timestamp. Tombstones are
//!   kept by flushes and minor compactions and applied by major compactions.
//! - Reads merge the memstore and every store file, newest source first.

use std::cmp::Ordering;
use std::sync::Arc;

use txfilter_core::{Cell, CellTag, Result, TxId};
use txfilter_visibility::{CellFilter, FilterDecision};

use crate::cache::SnapshotSource;
use crate::observer::{CompactionKind, ObserverEnvironment, StoreScanSpec, TransactionObserver};
use crate::operation::{Get, Put, Scan, TimeRange};
use crate::schema::TableDescriptor;

/// Tag kind of the store's native delete tombstones
pub const TOMBSTONE_TAG_KIND: u8 = 8;

fn is_tombstone(cell: &Cell) -> bool {
    cell.tags.iter().any(|tag| tag.kind == TOMBSTONE_TAG_KIND)
}

/// Store order, tombstones before puts of the same version
fn region_cmp(a: &Cell, b: &Cell) -> Ordering {
    a.store_cmp(b)
        .then_with(|| is_tombstone(b).cmp(&is_tombstone(a)))
}

/// Per-column bookkeeping shared by the read and rewrite loops
#[derive(Default)]
struct ColumnCursor {
    current: Option<Cell>,
    versions: usize,
    masked_at: Option<TxId>,
    skipping: bool,
}

impl ColumnCursor {
    fn advance(&mut self, cell: &Cell) {
        let same = self
            .current
            .as_ref()
            .map_or(false, |current| current.same_column(cell));
        if !same {
            self.current = Some(cell.clone());
            self.versions = 0;
            self.masked_at = None;
            self.skipping = false;
        }
    }

    fn mask(&mut self, ts: TxId) {
        self.masked_at = Some(self.masked_at.map_or(ts, |at| at.max(ts)));
    }

    fn is_masked(&self, ts: TxId) -> bool {
        matches!(self.masked_at, Some(at) if ts <= at)
    }
}

/// Read request after the observer hook ran
struct ReadPlan<'a> {
    families: &'a [Vec<u8>],
    time_range: TimeRange,
    max_versions: usize,
}

impl ReadPlan<'_> {
    fn wants_family(&self, family: &[u8]) -> bool {
        self.families.is_empty() || self.families.iter().any(|f| f == family)
    }
}

/// An in-memory region
pub struct MemRegion {
    name: String,
    descriptor: TableDescriptor,
    observer: Option<Arc<dyn TransactionObserver>>,
    memstore: Vec<Cell>,
    files: Vec<Vec<Cell>>,
}

impl MemRegion {
    /// A region without an observer
    pub fn new(descriptor: TableDescriptor) -> Self {
        MemRegion {
            name: format!("{},0", descriptor.name),
            descriptor,
            observer: None,
            memstore: Vec::new(),
            files: Vec::new(),
        }
    }

    /// Open a region and start its observer
    ///
    /// # Errors
    ///
    /// Returns the observer's start error.
    pub fn open(
        descriptor: TableDescriptor,
        observer: Arc<dyn TransactionObserver>,
        snapshots: Arc<dyn SnapshotSource>,
    ) -> Result<Self> {
        let mut region = MemRegion::new(descriptor);
        observer.start(ObserverEnvironment {
            region_name: region.name.clone(),
            descriptor: region.descriptor.clone(),
            snapshots,
        })?;
        region.observer = Some(observer);
        Ok(region)
    }

    /// Stop the observer and close the region
    pub fn close(self) {
        if let Some(observer) = &self.observer {
            observer.stop();
        }
    }

    /// Region name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Table schema
    pub fn descriptor(&self) -> &TableDescriptor {
        &self.descriptor
    }

    /// Write a row
    ///
    /// # Errors
    ///
    /// Returns the observer's rejection.
    pub fn put(&mut self, mut put: Put) -> Result<()> {
        if let Some(observer) = &self.observer {
            observer.pre_put(&mut put)?;
        }
        for cells in put.family_cells.into_values() {
            for cell in cells {
                self.insert(cell);
            }
        }
        Ok(())
    }

    /// Native store delete of every version of a column at or below `timestamp`
    pub fn delete(
        &mut self,
        row: impl Into<Vec<u8>>,
        family: impl Into<Vec<u8>>,
        qualifier: impl Into<Vec<u8>>,
        timestamp: TxId,
    ) {
        let mut tombstone = Cell::new(row, family, qualifier, timestamp, Vec::new());
        tombstone.tags.push(CellTag {
            kind: TOMBSTONE_TAG_KIND,
            value: Vec::new(),
        });
        self.insert(tombstone);
    }

    /// Point read
    ///
    /// # Errors
    ///
    /// Returns the observer's rejection or a filter failure.
    pub fn get(&self, mut get: Get) -> Result<Vec<Cell>> {
        if let Some(observer) = &self.observer {
            observer.pre_get(&mut get)?;
        }
        let plan = ReadPlan {
            families: &get.families,
            time_range: get.time_range,
            max_versions: get.max_versions,
        };
        let row = get.row.as_slice();
        self.read(&plan, |cell| cell.row == row, &mut get.filter)
    }

    /// Range read
    ///
    /// # Errors
    ///
    /// Returns the observer's rejection or a filter failure.
    pub fn scan(&self, mut scan: Scan) -> Result<Vec<Cell>> {
        if let Some(observer) = &self.observer {
            observer.pre_scan(&mut scan)?;
        }
        let mut filter = scan.filter.take();
        let plan = ReadPlan {
            families: &scan.families,
            time_range: scan.time_range,
            max_versions: scan.max_versions,
        };
        self.read(&plan, |cell| scan.contains_row(&cell.row), &mut filter)
    }

    /// Turn the memstore into a new store file
    ///
    /// # Errors
    ///
    /// Returns the observer's rejection; the memstore is kept for a retry.
    pub fn flush(&mut self) -> Result<()> {
        if self.memstore.is_empty() {
            return Ok(());
        }
        let spec = match &self.observer {
            Some(observer) => observer.pre_flush_scanner_open()?,
            None => None,
        };

        let count = self.memstore.len();
        let file = rewrite(self.memstore.clone(), spec, false)?;
        self.memstore.clear();
        tracing::debug!(region = %self.name, cells = count, kept = file.len(), "Flushed memstore");
        if !file.is_empty() {
            self.files.push(file);
        }
        Ok(())
    }

    /// Merge every store file into one
    ///
    /// # Errors
    ///
    /// Returns the observer's rejection; the files are left untouched.
    pub fn compact(&mut self, kind: CompactionKind) -> Result<()> {
        if self.files.is_empty() {
            return Ok(());
        }
        let spec = match &self.observer {
            Some(observer) => observer.pre_compact_scanner_open(kind)?,
            None => None,
        };

        let merged = merge(self.files.iter().rev().map(Vec::as_slice));
        let count = merged.len();
        let file = rewrite(merged, spec, kind == CompactionKind::Major)?;
        tracing::debug!(
            region = %self.name,
            kind = kind.name(),
            cells = count,
            kept = file.len(),
            "Compacted store files"
        );
        self.files.clear();
        if !file.is_empty() {
            self.files.push(file);
        }
        Ok(())
    }

    /// Number of store files
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Number of cells in the memstore
    pub fn memstore_len(&self) -> usize {
        self.memstore.len()
    }

    /// Native tombstones across memstore and store files
    pub fn tombstone_count(&self) -> usize {
        self.memstore
            .iter()
            .chain(self.files.iter().flatten())
            .filter(|cell| is_tombstone(cell))
            .count()
    }

    /// Every cell in the store files, merged in store order
    pub fn store_cells(&self) -> Vec<Cell> {
        merge(self.files.iter().rev().map(Vec::as_slice))
    }

    fn insert(&mut self, cell: Cell) {
        match self
            .memstore
            .binary_search_by(|probe| region_cmp(probe, &cell))
        {
            Ok(pos) => self.memstore[pos] = cell,
            Err(pos) => self.memstore.insert(pos, cell),
        }
    }

    fn read(
        &self,
        plan: &ReadPlan<'_>,
        wants_row: impl Fn(&Cell) -> bool,
        filter: &mut Option<Box<dyn CellFilter>>,
    ) -> Result<Vec<Cell>> {
        let sources = std::iter::once(self.memstore.as_slice())
            .chain(self.files.iter().rev().map(Vec::as_slice));
        let mut cursor = ColumnCursor::default();
        let mut out = Vec::new();

        for cell in merge(sources) {
            if !wants_row(&cell) || !plan.wants_family(&cell.family) {
                continue;
            }
            cursor.advance(&cell);
            if is_tombstone(&cell) {
                cursor.mask(cell.timestamp);
                continue;
            }
            if cursor.skipping
                || cursor.is_masked(cell.timestamp)
                || !plan.time_range.contains(cell.timestamp)
                || cursor.versions >= plan.max_versions
            {
                continue;
            }
            if let Some(f) = filter.as_mut() {
                match f.filter_cell(&cell)? {
                    FilterDecision::Include => {}
                    FilterDecision::Skip => continue,
                    FilterDecision::SkipToNextColumn => {
                        cursor.skipping = true;
                        continue;
                    }
                }
            }
            cursor.versions += 1;
            out.push(cell);
        }
        Ok(out)
    }
}

/// Merge sorted sources into one sorted run, newest source winning ties
fn merge<'a>(sources: impl Iterator<Item = &'a [Cell]>) -> Vec<Cell> {
    let mut cells: Vec<Cell> = sources.flat_map(|source| source.iter().cloned()).collect();
    // Stable, so the first source of equal cells stays first
    cells.sort_by(region_cmp);
    cells.dedup_by(|later, earlier| region_cmp(later, earlier) == Ordering::Equal);
    cells
}

/// Flush/compaction scanner: keep every version, apply the observer filter
fn rewrite(
    cells: Vec<Cell>,
    mut spec: Option<StoreScanSpec>,
    apply_tombstones: bool,
) -> Result<Vec<Cell>> {
    let mut cursor = ColumnCursor::default();
    let mut out = Vec::with_capacity(cells.len());

    for cell in cells {
        cursor.advance(&cell);
        if is_tombstone(&cell) {
            if apply_tombstones {
                cursor.mask(cell.timestamp);
            } else {
                out.push(cell);
            }
            continue;
        }
        if cursor.skipping || (apply_tombstones && cursor.is_masked(cell.timestamp)) {
            continue;
        }
        if let Some(spec) = spec.as_mut() {
            match spec.filter_cell(&cell)? {
                FilterDecision::Include => {}
                FilterDecision::Skip => continue,
                FilterDecision::SkipToNextColumn => {
                    cursor.skipping = true;
                    continue;
                }
            }
        }
        out.push(cell);
    }

    if let Some(spec) = spec {
        spec.finish();
    }
    Ok(out)
}
