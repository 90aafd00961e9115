//! Client requests as seen by the processor
//!
//! Reads ([`Get`], [`Scan`]) and writes ([`Put`]) carry free-form byte
//! attributes. A transactional client attaches its encoded transaction under
//! [`TX_OPERATION_ATTRIBUTE_KEY`]; a logical delete is a `Put` flagged with
//! [`DELETE_OPERATION_ATTRIBUTE_KEY`].

use std::collections::BTreeMap;

use txfilter_core::{
    Cell, Result, Transaction, TransactionCodec, TxId, DELETE_OPERATION_ATTRIBUTE_KEY,
    TX_OPERATION_ATTRIBUTE_KEY,
};
use txfilter_visibility::CellFilter;

/// Request attributes
pub type Attributes = BTreeMap<String, Vec<u8>>;

/// `max_versions` value requesting every stored version
pub const ALL_VERSIONS: usize = usize::MAX;

/// Inclusive range of cell timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    /// Oldest timestamp returned
    pub min: TxId,
    /// Newest timestamp returned
    pub max: TxId,
}

impl TimeRange {
    /// Range covering every timestamp
    pub const ALL: TimeRange = TimeRange {
        min: 0,
        max: TxId::MAX,
    };

    /// Create a range
    pub fn new(min: TxId, max: TxId) -> Self {
        TimeRange { min, max }
    }

    /// Whether `ts` lies in the range
    #[inline]
    pub fn contains(&self, ts: TxId) -> bool {
        self.min <= ts && ts <= self.max
    }
}

impl Default for TimeRange {
    fn default() -> Self {
        TimeRange::ALL
    }
}

/// Access to a request's attributes
pub trait OperationWithAttributes {
    /// All attributes
    fn attributes(&self) -> &Attributes;

    /// All attributes, mutable
    fn attributes_mut(&mut self) -> &mut Attributes;

    /// One attribute
    fn attribute(&self, key: &str) -> Option<&[u8]> {
        self.attributes().get(key).map(Vec::as_slice)
    }

    /// Set one attribute
    fn set_attribute(&mut self, key: impl Into<String>, value: Vec<u8>) {
        self.attributes_mut().insert(key.into(), value);
    }
}

/// Read settings the processor rewrites for transactional reads
pub trait ReadOperation: OperationWithAttributes {
    /// Set the time range
    fn set_time_range(&mut self, range: TimeRange);

    /// Set how many versions per column the store may return
    fn set_max_versions(&mut self, max_versions: usize);

    /// Remove and return the caller's filter
    fn take_filter(&mut self) -> Option<Box<dyn CellFilter>>;

    /// Install a filter
    fn set_filter(&mut self, filter: Box<dyn CellFilter>);
}

/// Attach an encoded transaction to a request
pub fn attach_transaction(
    op: &mut impl OperationWithAttributes,
    tx: &Transaction,
    codec: &dyn TransactionCodec,
) {
    op.set_attribute(TX_OPERATION_ATTRIBUTE_KEY, codec.encode(tx));
}

/// Decode the transaction attached to a request, if any
///
/// # Errors
///
/// Returns `Decode` if the attribute is present but not a valid transaction.
pub fn transaction_from(
    op: &impl OperationWithAttributes,
    codec: &dyn TransactionCodec,
) -> Result<Option<Transaction>> {
    op.attribute(TX_OPERATION_ATTRIBUTE_KEY)
        .map(|bytes| codec.decode(bytes))
        .transpose()
}

/// Point lookup of one row
pub struct Get {
    /// Row key
    pub row: Vec<u8>,
    /// Families to read (empty = all)
    pub families: Vec<Vec<u8>>,
    /// Timestamps to consider
    pub time_range: TimeRange,
    /// Versions per column (default 1)
    pub max_versions: usize,
    /// Caller filter
    pub filter: Option<Box<dyn CellFilter>>,
    /// Request attributes
    pub attributes: Attributes,
}

impl Get {
    /// Read the newest version of every column of `row`
    pub fn new(row: impl Into<Vec<u8>>) -> Self {
        Get {
            row: row.into(),
            families: Vec::new(),
            time_range: TimeRange::ALL,
            max_versions: 1,
            filter: None,
            attributes: Attributes::new(),
        }
    }

    /// Restrict to one family, builder style
    pub fn with_family(mut self, family: impl Into<Vec<u8>>) -> Self {
        self.families.push(family.into());
        self
    }

    /// Set a caller filter, builder style
    pub fn with_filter(mut self, filter: Box<dyn CellFilter>) -> Self {
        self.filter = Some(filter);
        self
    }
}

/// Range scan over rows `[start_row, stop_row)`
pub struct Scan {
    /// First row (inclusive)
    pub start_row: Vec<u8>,
    /// Last row (exclusive); `None` scans to the end
    pub stop_row: Option<Vec<u8>>,
    /// Families to read (empty = all)
    pub families: Vec<Vec<u8>>,
    /// Timestamps to consider
    pub time_range: TimeRange,
    /// Versions per column (default 1)
    pub max_versions: usize,
    /// Caller filter
    pub filter: Option<Box<dyn CellFilter>>,
    /// Request attributes
    pub attributes: Attributes,
}

impl Scan {
    /// Scan every row
    pub fn new() -> Self {
        Scan {
            start_row: Vec::new(),
            stop_row: None,
            families: Vec::new(),
            time_range: TimeRange::ALL,
            max_versions: 1,
            filter: None,
            attributes: Attributes::new(),
        }
    }

    /// Scan rows in `[start, stop)`
    pub fn range(start: impl Into<Vec<u8>>, stop: impl Into<Vec<u8>>) -> Self {
        Scan {
            start_row: start.into(),
            stop_row: Some(stop.into()),
            ..Scan::new()
        }
    }

    /// Set a caller filter, builder style
    pub fn with_filter(mut self, filter: Box<dyn CellFilter>) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Whether `row` lies in the scanned range
    pub fn contains_row(&self, row: &[u8]) -> bool {
        row >= self.start_row.as_slice()
            && self.stop_row.as_deref().map_or(true, |stop| row < stop)
    }
}

impl Default for Scan {
    fn default() -> Self {
        Scan::new()
    }
}

/// Write of one row's cells
#[derive(Debug, Clone, Default)]
pub struct Put {
    /// Row key
    pub row: Vec<u8>,
    /// Cells grouped by family
    pub family_cells: BTreeMap<Vec<u8>, Vec<Cell>>,
    /// Request attributes
    pub attributes: Attributes,
}

impl Put {
    /// Empty write for `row`
    pub fn new(row: impl Into<Vec<u8>>) -> Self {
        Put {
            row: row.into(),
            family_cells: BTreeMap::new(),
            attributes: Attributes::new(),
        }
    }

    /// Add one column version, builder style
    pub fn add_column(
        mut self,
        family: impl Into<Vec<u8>>,
        qualifier: impl Into<Vec<u8>>,
        timestamp: TxId,
        value: impl Into<Vec<u8>>,
    ) -> Self {
        let family = family.into();
        let cell = Cell::new(self.row.clone(), family.clone(), qualifier, timestamp, value);
        self.family_cells.entry(family).or_default().push(cell);
        self
    }

    /// Flag this write as a logical delete, builder style
    pub fn as_delete(mut self) -> Self {
        self.set_attribute(DELETE_OPERATION_ATTRIBUTE_KEY, vec![1]);
        self
    }

    /// Whether the write is flagged as a logical delete
    pub fn is_delete(&self) -> bool {
        self.attribute(DELETE_OPERATION_ATTRIBUTE_KEY).is_some()
    }

    /// All cells across families
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.family_cells.values().flatten()
    }

    /// Number of cells across families
    pub fn len(&self) -> usize {
        self.family_cells.values().map(Vec::len).sum()
    }

    /// Whether the write has no cells
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

macro_rules! impl_attributes {
    ($($op:ty),*) => {
        $(
            impl OperationWithAttributes for $op {
                fn attributes(&self) -> &Attributes {
                    &self.attributes
                }

                fn attributes_mut(&mut self) -> &mut Attributes {
                    &mut self.attributes
                }
            }
        )*
    };
}

impl_attributes!(Get, Scan, Put);

macro_rules! impl_read_operation {
    ($($op:ty),*) => {
        $(
            impl ReadOperation for $op {
                fn set_time_range(&mut self, range: TimeRange) {
                    self.time_range = range;
                }

                fn set_max_versions(&mut self, max_versions: usize) {
                    self.max_versions = max_versions;
                }

                fn take_filter(&mut self) -> Option<Box<dyn CellFilter>> {
                    self.filter.take()
                }

                fn set_filter(&mut self, filter: Box<dyn CellFilter>) {
                    self.filter = Some(filter);
                }
            }
        )*
    };
}

impl_read_operation!(Get, Scan);
