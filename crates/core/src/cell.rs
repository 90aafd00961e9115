//! Stored cell versions
//!
//! A [`Cell`] is one version of one column: `(row, family, qualifier)`
//! identifies the column, `timestamp` is the id of the transaction that
//! wrote it. Stores deliver cells sorted by column ascending and timestamp
//! descending, so all versions of a column are contiguous, newest first.
//!
//! Logical deletes are written as ordinary cells carrying a delete-marker
//! tag. Only the filtering layer interprets the tag; the store treats the
//! cell like any other put.

use smallvec::SmallVec;
use std::cmp::Ordering;

use crate::types::TxId;

/// Tag kind marking a cell as a transactional delete marker
pub const DELETE_TAG_KIND: u8 = 99;

/// A typed annotation attached to a cell
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellTag {
    /// Tag type discriminator
    pub kind: u8,
    /// Tag payload
    pub value: Vec<u8>,
}

impl CellTag {
    /// The delete-marker tag
    pub fn delete_marker() -> Self {
        CellTag {
            kind: DELETE_TAG_KIND,
            value: vec![1],
        }
    }
}

/// One stored version of a column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    /// Row key
    pub row: Vec<u8>,
    /// Column family
    pub family: Vec<u8>,
    /// Column qualifier
    pub qualifier: Vec<u8>,
    /// Version timestamp, always the writer's transaction id
    pub timestamp: TxId,
    /// Stored value
    pub value: Vec<u8>,
    /// Cell tags
    pub tags: SmallVec<[CellTag; 1]>,
}

impl Cell {
    /// Create an untagged cell
    pub fn new(
        row: impl Into<Vec<u8>>,
        family: impl Into<Vec<u8>>,
        qualifier: impl Into<Vec<u8>>,
        timestamp: TxId,
        value: impl Into<Vec<u8>>,
    ) -> Self {
        Cell {
            row: row.into(),
            family: family.into(),
            qualifier: qualifier.into(),
            timestamp,
            value: value.into(),
            tags: SmallVec::new(),
        }
    }

    /// Copy of this cell with the delete-marker tag as its only tag
    ///
    /// Row, family, qualifier, timestamp and value are preserved.
    pub fn with_delete_marker(&self) -> Self {
        let mut tags = SmallVec::new();
        tags.push(CellTag::delete_marker());
        Cell {
            row: self.row.clone(),
            family: self.family.clone(),
            qualifier: self.qualifier.clone(),
            timestamp: self.timestamp,
            value: self.value.clone(),
            tags,
        }
    }

    /// Whether the cell records a logical delete
    #[inline]
    pub fn is_delete_marker(&self) -> bool {
        self.tags.iter().any(|tag| tag.kind == DELETE_TAG_KIND)
    }

    /// Whether both cells are versions of the same column
    #[inline]
    pub fn same_column(&self, other: &Cell) -> bool {
        self.qualifier == other.qualifier && self.family == other.family && self.row == other.row
    }

    /// Compare the columns of two cells, ignoring timestamps
    pub fn column_cmp(&self, other: &Cell) -> Ordering {
        self.row
            .cmp(&other.row)
            .then_with(|| self.family.cmp(&other.family))
            .then_with(|| self.qualifier.cmp(&other.qualifier))
    }

    /// Store ordering: column ascending, then timestamp descending
    pub fn store_cmp(&self, other: &Cell) -> Ordering {
        self.column_cmp(other)
            .then_with(|| other.timestamp.cmp(&self.timestamp))
    }
}
