//! Latest-snapshot cache
//!
//! Holds the most recently published [`TransactionSnapshot`]. Readers clone
//! the `Arc` under a read guard held only for the clone; publishing swaps the
//! `Arc` wholesale. Snapshots themselves are never mutated.

use parking_lot::RwLock;
use std::sync::Arc;
use txfilter_core::TransactionSnapshot;

/// Non-blocking access to the latest published snapshot
pub trait SnapshotSource: Send + Sync {
    /// The latest snapshot, or `None` before the first publication
    fn latest(&self) -> Option<Arc<TransactionSnapshot>>;
}

/// In-process snapshot cache
#[derive(Debug, Default)]
pub struct SnapshotCache {
    current: RwLock<Option<Arc<TransactionSnapshot>>>,
}

impl SnapshotCache {
    /// Create a cold cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a snapshot
    ///
    /// Successive snapshots must not lower the visibility upper bound; a
    /// regressing snapshot is logged and ignored. Returns whether the
    /// snapshot was installed.
    pub fn publish(&self, snapshot: TransactionSnapshot) -> bool {
        let mut current = self.current.write();

        if let Some(existing) = current.as_ref() {
            if snapshot.visibility_upper_bound() < existing.visibility_upper_bound() {
                tracing::warn!(
                    current = existing.visibility_upper_bound(),
                    offered = snapshot.visibility_upper_bound(),
                    "Ignoring transaction snapshot with regressing visibility upper bound"
                );
                return false;
            }
        }

        *current = Some(Arc::new(snapshot));
        true
    }

    /// Whether a snapshot has been published
    pub fn is_warm(&self) -> bool {
        self.current.read().is_some()
    }
}

impl SnapshotSource for SnapshotCache {
    fn latest(&self) -> Option<Arc<TransactionSnapshot>> {
        self.current.read().clone()
    }
}
