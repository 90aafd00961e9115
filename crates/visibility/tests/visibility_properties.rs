//! Property tests for the visibility and retention rules
//!
//! Each property is checked on single-cell decisions (a fresh filter per
//! cell), so per-column collapsing does not mask the rule under test.

use proptest::prelude::*;
use std::sync::Arc;
use txfilter_core::{Cell, Transaction, TransactionSnapshot, TxId, MAX_TX_PER_MS};
use txfilter_visibility::{CellFilter, RetentionFilter, ScanPurpose, TtlTable, VisibilityFilter};

fn decide(tx: &Transaction, ttl: &Arc<TtlTable>, purpose: ScanPurpose, now: TxId, ts: TxId) -> bool {
    let mut filter =
        VisibilityFilter::with_reference_time(tx.clone(), Arc::clone(ttl), purpose, now);
    filter
        .filter_cell(&Cell::new("row", "f", "q", ts, "v"))
        .unwrap()
        .is_include()
}

fn ids() -> impl Strategy<Value = Vec<TxId>> {
    prop::collection::vec(1u64..1_000, 0..20)
}

fn purposes() -> impl Strategy<Value = ScanPurpose> {
    prop_oneof![
        Just(ScanPurpose::UserScan),
        Just(ScanPurpose::CompactRetainDeletes),
        Just(ScanPurpose::CompactDropDeletes),
    ]
}

proptest! {
    #[test]
    fn own_writes_always_visible(
        id in 1u64..1_000,
        bound in 0u64..1_000,
        excluded in ids(),
        invalid in ids(),
        purpose in purposes(),
    ) {
        let mut excluded = excluded;
        let mut invalid = invalid;
        excluded.push(id);
        invalid.push(id);
        let tx = Transaction::new(id, bound, excluded, invalid);
        let ttl = Arc::new(TtlTable::from_millis([("f", 1)]));

        prop_assert!(decide(&tx, &ttl, purpose, 1_000 * MAX_TX_PER_MS, id));
    }

    #[test]
    fn invalid_writes_never_visible(
        ts in 1u64..1_000,
        id in 1u64..1_000,
        bound in 0u64..2_000,
        purpose in purposes(),
    ) {
        prop_assume!(ts != id);
        let tx = Transaction::new(id, bound, [], [ts]);
        let ttl = Arc::new(TtlTable::new());

        prop_assert!(!decide(&tx, &ttl, purpose, 0, ts));
    }

    #[test]
    fn raising_bound_only_reveals_newer_cells(
        ts in 1u64..1_000,
        old_bound in 0u64..1_000,
        raise in 0u64..1_000,
        invalid in ids(),
    ) {
        let new_bound = old_bound + raise;
        let ttl = Arc::new(TtlTable::new());
        let before = Transaction::new(TxId::MAX, old_bound, [], invalid.clone());
        let after = Transaction::new(TxId::MAX, new_bound, [], invalid);

        let was_visible = decide(&before, &ttl, ScanPurpose::UserScan, 0, ts);
        let is_visible = decide(&after, &ttl, ScanPurpose::UserScan, 0, ts);

        // Never SKIP after INCLUDE
        prop_assert!(!was_visible || is_visible);
        // Flips only happen above the old bound
        if !was_visible && is_visible {
            prop_assert!(ts > old_bound);
        }
    }

    #[test]
    fn ttl_cutoff_is_exact(
        now_ms in 1_000u64..10_000,
        ttl_ms in 1u64..1_000,
    ) {
        let now = now_ms * MAX_TX_PER_MS;
        let cutoff = now - ttl_ms * MAX_TX_PER_MS;
        let ttl = Arc::new(TtlTable::from_millis([("f", ttl_ms)]));
        let tx = Transaction::new(TxId::MAX, now, [], []);

        prop_assert!(!decide(&tx, &ttl, ScanPurpose::UserScan, now, cutoff - 1));
        prop_assert!(decide(&tx, &ttl, ScanPurpose::UserScan, now, cutoff + 1));
    }

    #[test]
    fn retention_keeps_unsettled_writes(
        read_pointer in 1u64..1_000,
        ahead in 1u64..1_000,
        invalid in ids(),
    ) {
        let ts = read_pointer + ahead;
        prop_assume!(!invalid.contains(&ts));
        let snapshot = TransactionSnapshot::new(read_pointer, invalid, [], 0).unwrap();
        let ttl = Arc::new(TtlTable::new());

        // A reader bound tightly at the boundary would skip the cell...
        let boundary_reader = Transaction::snapshot_boundary(&snapshot);
        prop_assert!(!decide(&boundary_reader, &ttl, ScanPurpose::CompactDropDeletes, 0, ts));

        // ...the retention filter keeps it
        let mut retention = RetentionFilter::for_snapshot_at(
            &snapshot,
            ttl,
            ScanPurpose::CompactDropDeletes,
            0,
        );
        let cell = Cell::new("row", "f", "q", ts, "v");
        prop_assert!(retention.filter_cell(&cell).unwrap().is_include());
    }

    #[test]
    fn retention_drops_invalid_writes_anywhere(
        read_pointer in 1u64..1_000,
        ts in 1u64..2_000,
    ) {
        let snapshot = TransactionSnapshot::new(read_pointer, [ts], [], 0).unwrap();
        let mut retention = RetentionFilter::for_snapshot_at(
            &snapshot,
            Arc::new(TtlTable::new()),
            ScanPurpose::CompactRetainDeletes,
            0,
        );
        let cell = Cell::new("row", "f", "q", ts, "v");
        prop_assert!(!retention.filter_cell(&cell).unwrap().is_include());
    }
}
