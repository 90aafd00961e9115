//! Per-cell filter seam and filter composition
//!
//! A store scan hands every cell to a [`CellFilter`] and acts on the
//! returned [`FilterDecision`]. Filters are composed with [`FilterChain`],
//! which ANDs independent predicates: a cell is accepted only if every
//! filter in the chain includes it.
//!
//! # Evaluation order
//!
//! Every filter in the chain sees every cell, and the chain returns the most
//! restrictive decision. Stateful filters such as the visibility filter
//! track column boundaries, so the chain never hides a cell from them and
//! the result does not depend on the order filters were added in.

use txfilter_core::{Cell, Result};

/// What a scan should do with one cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FilterDecision {
    /// Return (or, on flush/compaction, keep) the cell
    Include,
    /// Drop the cell
    Skip,
    /// Drop the cell and every remaining (older) version of its column
    ///
    /// A hint only: it never rejects a cell that `Skip` on each remaining
    /// version would have kept.
    SkipToNextColumn,
}

impl FilterDecision {
    /// Whether the cell is accepted
    #[inline]
    pub fn is_include(self) -> bool {
        self == FilterDecision::Include
    }

    /// The stricter of two decisions (`Include < Skip < SkipToNextColumn`)
    #[inline]
    pub fn most_restrictive(self, other: FilterDecision) -> FilterDecision {
        self.max(other)
    }
}

/// A per-cell predicate applied by a store scan
///
/// One instance belongs to exactly one scan and sees that scan's cells in
/// store order. Returning an error fails the scan; a partially filtered
/// result is never emitted.
pub trait CellFilter: Send {
    /// Decide the fate of one cell
    ///
    /// # Errors
    ///
    /// Returns an error on an internal inconsistency, such as cells
    /// arriving out of store order.
    fn filter_cell(&mut self, cell: &Cell) -> Result<FilterDecision>;
}

/// Stateless filter built from a boolean predicate
///
/// Typically a caller-supplied filter riding along on a transactional read.
pub struct PredicateFilter<P> {
    predicate: P,
}

impl<P> PredicateFilter<P>
where
    P: FnMut(&Cell) -> bool + Send,
{
    /// Wrap a predicate; cells for which it returns `true` are included
    pub fn new(predicate: P) -> Self {
        PredicateFilter { predicate }
    }
}

impl<P> CellFilter for PredicateFilter<P>
where
    P: FnMut(&Cell) -> bool + Send,
{
    fn filter_cell(&mut self, cell: &Cell) -> Result<FilterDecision> {
        Ok(if (self.predicate)(cell) {
            FilterDecision::Include
        } else {
            FilterDecision::Skip
        })
    }
}

/// Logical AND of filters
#[derive(Default)]
pub struct FilterChain {
    filters: Vec<Box<dyn CellFilter>>,
}

impl FilterChain {
    /// Create an empty chain (accepts everything)
    pub fn new() -> Self {
        FilterChain {
            filters: Vec::new(),
        }
    }

    /// Append a filter to the end of the chain
    pub fn push(&mut self, filter: Box<dyn CellFilter>) {
        self.filters.push(filter);
    }

    /// Append a filter, builder style
    pub fn with(mut self, filter: Box<dyn CellFilter>) -> Self {
        self.push(filter);
        self
    }

    /// Combine a transactional filter with an optional caller filter
    ///
    /// Without a caller filter the transactional filter is returned as is.
    pub fn combine(
        first: Box<dyn CellFilter>,
        second: Option<Box<dyn CellFilter>>,
    ) -> Box<dyn CellFilter> {
        match second {
            Some(second) => Box::new(FilterChain::new().with(first).with(second)),
            None => first,
        }
    }

    /// Number of filters in the chain
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Whether the chain has no filters
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl CellFilter for FilterChain {
    fn filter_cell(&mut self, cell: &Cell) -> Result<FilterDecision> {
        let mut combined = FilterDecision::Include;
        for filter in self.filters.iter_mut() {
            combined = combined.most_restrictive(filter.filter_cell(cell)?);
        }
        Ok(combined)
    }
}
