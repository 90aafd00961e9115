//! Transactions and transaction snapshots
//!
//! A [`TransactionSnapshot`] is the cluster-wide record of which ids are
//! visible, invalid or still in progress at one point in time. It is
//! published by an external transaction manager, shared read-only by every
//! filter that needs it, and replaced wholesale when a newer one appears.
//!
//! A [`Transaction`] is one reader's view: its own id, the highest id it may
//! see, and the ids it must exclude or treat as dead. A reader started with
//! [`Transaction::begin`] sees up to the read pointer and excludes the
//! in-progress ids individually.
//!
//! # Visibility upper bound
//!
//! A snapshot's visibility upper bound is the boundary flush and compaction
//! work against. An id below the read pointer may still be in progress, and
//! its fate is unknown, so the bound is capped just below the oldest
//! in-progress id. Every id at or below it is either committed or invalid:
//!
//! ```text
//! read_pointer = 100, in_progress = {90, 130}  =>  upper bound = 89
//! read_pointer = 100, in_progress = {}         =>  upper bound = 100
//! ```

use crate::error::{Error, Result};
use crate::types::{TxId, SYNTHETIC_TX_ID};

/// Immutable point-in-time record of transaction states
///
/// # Invariants
///
/// - `invalid` and `in_progress` are sorted, deduplicated and disjoint
/// - never mutated after construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionSnapshot {
    read_pointer: TxId,
    invalid: Vec<TxId>,
    in_progress: Vec<TxId>,
    timestamp_millis: u64,
}

impl TransactionSnapshot {
    /// Create a snapshot
    ///
    /// # Errors
    ///
    /// Returns `InvalidSnapshot` if an id is both invalid and in progress.
    pub fn new(
        read_pointer: TxId,
        invalid: impl IntoIterator<Item = TxId>,
        in_progress: impl IntoIterator<Item = TxId>,
        timestamp_millis: u64,
    ) -> Result<Self> {
        let invalid = sorted_ids(invalid);
        let in_progress = sorted_ids(in_progress);

        if let Some(id) = invalid
            .iter()
            .find(|id| in_progress.binary_search(id).is_ok())
        {
            return Err(Error::InvalidSnapshot(format!(
                "transaction {} is both invalid and in progress",
                id
            )));
        }

        Ok(TransactionSnapshot {
            read_pointer,
            invalid,
            in_progress,
            timestamp_millis,
        })
    }

    /// Highest committed id when the snapshot was captured
    pub fn read_pointer(&self) -> TxId {
        self.read_pointer
    }

    /// Highest id whose fate is settled (committed or invalid)
    pub fn visibility_upper_bound(&self) -> TxId {
        match self.in_progress.first() {
            Some(&first) => first.saturating_sub(1).min(self.read_pointer),
            None => self.read_pointer,
        }
    }

    /// Sorted ids of permanently dead transactions
    pub fn invalid(&self) -> &[TxId] {
        &self.invalid
    }

    /// Sorted ids of transactions neither committed nor aborted at capture
    pub fn in_progress(&self) -> &[TxId] {
        &self.in_progress
    }

    /// Wall-clock capture time in milliseconds
    pub fn timestamp_millis(&self) -> u64 {
        self.timestamp_millis
    }

    /// Whether `id` is permanently dead
    #[inline]
    pub fn is_invalid(&self, id: TxId) -> bool {
        self.invalid.binary_search(&id).is_ok()
    }

    /// Whether `id` was still running at capture
    #[inline]
    pub fn is_in_progress(&self, id: TxId) -> bool {
        self.in_progress.binary_search(&id).is_ok()
    }
}

/// One reader's view of the transaction space
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    id: TxId,
    visibility_upper_bound: TxId,
    excluded: Vec<TxId>,
    invalid: Vec<TxId>,
}

impl Transaction {
    /// Create a transaction from its parts
    ///
    /// The id sets may arrive in any order; they are sorted and deduplicated.
    pub fn new(
        id: TxId,
        visibility_upper_bound: TxId,
        excluded: impl IntoIterator<Item = TxId>,
        invalid: impl IntoIterator<Item = TxId>,
    ) -> Self {
        Transaction {
            id,
            visibility_upper_bound,
            excluded: sorted_ids(excluded),
            invalid: sorted_ids(invalid),
        }
    }

    /// A transaction `id` starting from `snapshot`
    ///
    /// Sees everything committed up to the read pointer, excludes every
    /// transaction that was still in progress, and treats the snapshot's
    /// invalid ids as dead.
    pub fn begin(id: TxId, snapshot: &TransactionSnapshot) -> Self {
        Transaction {
            id,
            visibility_upper_bound: snapshot.read_pointer(),
            excluded: snapshot.in_progress.clone(),
            invalid: snapshot.invalid.clone(),
        }
    }

    /// The synthetic reader used by flush and compaction
    ///
    /// Positioned exactly at the snapshot's visibility upper bound, with no
    /// exclusions and no own writes.
    pub fn snapshot_boundary(snapshot: &TransactionSnapshot) -> Self {
        Transaction {
            id: SYNTHETIC_TX_ID,
            visibility_upper_bound: snapshot.visibility_upper_bound(),
            excluded: Vec::new(),
            invalid: snapshot.invalid.clone(),
        }
    }

    /// Own id; cells with this timestamp are this transaction's writes
    pub fn id(&self) -> TxId {
        self.id
    }

    /// Highest writer id this transaction may see
    pub fn visibility_upper_bound(&self) -> TxId {
        self.visibility_upper_bound
    }

    /// Sorted ids hidden from this transaction's view
    pub fn excluded(&self) -> &[TxId] {
        &self.excluded
    }

    /// Sorted ids this transaction treats as dead
    pub fn invalid(&self) -> &[TxId] {
        &self.invalid
    }

    /// Whether this is the flush/compaction synthetic reader
    pub fn is_synthetic(&self) -> bool {
        self.id == SYNTHETIC_TX_ID
    }

    /// Whether `id` is a concurrently running sibling
    #[inline]
    pub fn is_excluded(&self, id: TxId) -> bool {
        self.excluded.binary_search(&id).is_ok()
    }

    /// Whether `id` is a dead writer
    #[inline]
    pub fn is_invalid(&self, id: TxId) -> bool {
        self.invalid.binary_search(&id).is_ok()
    }

    /// Largest cell timestamp a scan for this transaction can return
    ///
    /// Own writes sit above the visibility bound, so the range is widened to
    /// cover them.
    pub fn max_visible_timestamp(&self) -> TxId {
        if self.is_synthetic() {
            self.visibility_upper_bound
        } else {
            self.id.max(self.visibility_upper_bound)
        }
    }
}

fn sorted_ids(ids: impl IntoIterator<Item = TxId>) -> Vec<TxId> {
    let mut ids: Vec<TxId> = ids.into_iter().collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}
