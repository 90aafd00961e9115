//! Transactional deletes as delete markers

use crate::common::*;
use txfilter::{CompactionKind, Transaction};

#[test]
fn committed_delete_hides_older_versions() {
    let mut t = TestRegion::open(single_family_table());
    t.write("r", "d", "q", 10, "v");
    t.delete("r", "d", "q", 20);

    let after = Transaction::begin(40, &snapshot(30, &[], &[]));
    assert!(t.get(&after, "r").is_empty());

    // A reader whose snapshot predates the delete still sees the value
    let before = Transaction::begin(16, &snapshot(15, &[], &[]));
    assert_eq!(values(&t.get(&before, "r")), vec!["v"]);

    // The store never saw a native delete
    assert_eq!(t.region.tombstone_count(), 0);
}

#[test]
fn write_after_delete_is_visible() {
    let mut t = TestRegion::open(single_family_table());
    t.write("r", "d", "q", 10, "first");
    t.delete("r", "d", "q", 20);
    t.write("r", "d", "q", 30, "second");

    let reader = Transaction::begin(50, &snapshot(40, &[], &[]));
    assert_eq!(values(&t.get(&reader, "r")), vec!["second"]);
}

#[test]
fn flush_keeps_markers_and_major_compaction_drops_them() {
    let mut t = TestRegion::open(single_family_table());
    t.write("r", "d", "q", 10, "v");
    t.write("r", "d", "other", 10, "kept");
    t.delete("r", "d", "q", 20);
    t.publish(&snapshot(30, &[], &[]));

    t.region.flush().unwrap();
    let stored = t.region.store_cells();
    assert_eq!(stored.len(), 2);
    assert!(stored[1].is_delete_marker());
    assert_eq!(stored[1].timestamp, 20);

    t.region.compact(CompactionKind::Minor).unwrap();
    assert!(t.region.store_cells().iter().any(|cell| cell.is_delete_marker()));

    t.region.compact(CompactionKind::Major).unwrap();
    assert_eq!(values(&t.region.store_cells()), vec!["kept"]);
    assert_eq!(t.region.tombstone_count(), 0);

    let reader = Transaction::begin(50, &snapshot(40, &[], &[]));
    assert_eq!(values(&t.scan(&reader)), vec!["kept"]);
}

#[test]
fn uncommitted_delete_survives_compaction_with_its_data() {
    let mut t = TestRegion::open(single_family_table());
    t.write("r", "d", "q", 10, "v");
    t.delete("r", "d", "q", 50);
    let snap = snapshot(40, &[], &[50]);
    t.publish(&snap);

    t.region.flush().unwrap();
    t.region.compact(CompactionKind::Major).unwrap();
    assert_eq!(t.region.store_cells().len(), 2);

    let reader = Transaction::begin(60, &snap);
    assert_eq!(values(&t.get(&reader, "r")), vec!["v"]);

    // Once the delete commits it takes effect
    let committed = Transaction::begin(70, &snapshot(60, &[], &[]));
    assert!(t.get(&committed, "r").is_empty());
}

#[test]
fn rolled_back_delete_is_discarded() {
    let mut t = TestRegion::open(single_family_table());
    t.write("r", "d", "q", 10, "v");
    t.delete("r", "d", "q", 20);
    let snap = snapshot(30, &[20], &[]);
    t.publish(&snap);

    let reader = Transaction::begin(40, &snap);
    assert_eq!(values(&t.get(&reader, "r")), vec!["v"]);

    t.region.flush().unwrap();
    assert_eq!(values(&t.region.store_cells()), vec!["v"]);
}
