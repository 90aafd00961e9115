//! Family TTL against the wall clock

use crate::common::*;
use txfilter::{
    now_ticks, ticks_from_millis, CompactionKind, FamilyDescriptor, Get, TableDescriptor,
    Transaction, TxId,
};

const TTL_MS: u64 = 60_000;

fn mixed_table() -> TableDescriptor {
    TableDescriptor::new("events")
        .with_family(FamilyDescriptor::new("d"))
        .with_family(FamilyDescriptor::new("h").with_ttl_millis(TTL_MS))
}

fn ago(now: TxId, millis: u64) -> TxId {
    now - ticks_from_millis(millis)
}

#[test]
fn expired_versions_are_invisible_to_readers() {
    let mut t = TestRegion::open(mixed_table());
    let now = now_ticks();
    t.write("r", "d", "a", ago(now, 2 * TTL_MS), "d-old");
    t.write("r", "h", "a", ago(now, 2 * TTL_MS), "h-old");
    t.write("r", "h", "b", ago(now, 1_000), "h-fresh");

    let reader = Transaction::begin(now + 1, &snapshot(now, &[], &[]));
    assert_eq!(values(&t.get(&reader, "r")), vec!["d-old", "h-fresh"]);

    // TTL is a transactional rule; plain reads still see everything
    let mut plain = Get::new("r");
    plain.max_versions = 10;
    assert_eq!(t.region.get(plain).unwrap().len(), 3);
}

#[test]
fn expired_versions_are_purged_by_compaction() {
    let mut t = TestRegion::open(mixed_table());
    let now = now_ticks();
    t.write("r", "d", "a", ago(now, 2 * TTL_MS), "d-old");
    t.write("r", "h", "a", ago(now, 2 * TTL_MS), "h-old");
    t.write("r", "h", "b", ago(now, 1_000), "h-fresh");
    t.publish(&snapshot(now, &[], &[]));

    t.region.flush().unwrap();
    t.region.compact(CompactionKind::Major).unwrap();
    assert_eq!(values(&t.region.store_cells()), vec!["d-old", "h-fresh"]);
}

#[test]
fn time_range_starts_at_ttl_cutoff_when_every_family_expires() {
    let table = TableDescriptor::new("metrics")
        .with_family(FamilyDescriptor::new("h").with_ttl_millis(TTL_MS));
    let mut t = TestRegion::open(table);
    let now = now_ticks();
    t.write("r", "h", "q", ago(now, 2 * TTL_MS), "old");
    t.write("r", "h", "q", ago(now, 1_000), "fresh");

    let reader = Transaction::begin(now + 1, &snapshot(now, &[], &[]));
    assert_eq!(values(&t.get(&reader, "r")), vec!["fresh"]);
}

#[test]
fn invalid_ttl_property_means_unlimited_retention() {
    let table = TableDescriptor::new("t").with_family(
        FamilyDescriptor::new("d").with_property(txfilter::TTL_PROPERTY, "one hour"),
    );
    let mut t = TestRegion::open(table);
    let now = now_ticks();
    t.write("r", "d", "q", ago(now, 10 * TTL_MS), "ancient");

    assert_eq!(t.processor.ttl_table().unwrap().ttl_millis(b"d"), 0);
    let reader = Transaction::begin(now + 1, &snapshot(now, &[], &[]));
    assert_eq!(values(&t.get(&reader, "r")), vec!["ancient"]);
}
