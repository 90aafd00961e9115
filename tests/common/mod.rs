//! Shared test utilities for the integration test suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's main.rs.

#![allow(dead_code)]

use std::sync::{Arc, Once};
use txfilter::{
    attach_transaction, Cell, FamilyDescriptor, Get, MemRegion, MsgPackTransactionCodec,
    ProcessorConfig, Put, Scan, SnapshotCache, TableDescriptor, Transaction,
    TransactionProcessor, TransactionSnapshot, TxId,
};

static INIT_TRACING: Once = Once::new();

/// Route library logs to the test harness output.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

/// A region served by a transaction processor, plus its snapshot cache.
pub struct TestRegion {
    pub region: MemRegion,
    pub processor: Arc<TransactionProcessor>,
    pub cache: Arc<SnapshotCache>,
}

impl TestRegion {
    /// Open a region over `descriptor` with the default configuration.
    pub fn open(descriptor: TableDescriptor) -> Self {
        Self::open_with(descriptor, ProcessorConfig::default())
    }

    /// Open a region over `descriptor` with `config`.
    pub fn open_with(descriptor: TableDescriptor, config: ProcessorConfig) -> Self {
        init_tracing();
        let cache = Arc::new(SnapshotCache::new());
        let processor = Arc::new(TransactionProcessor::new(config));
        let region = MemRegion::open(descriptor, processor.clone(), cache.clone()).unwrap();
        TestRegion {
            region,
            processor,
            cache,
        }
    }

    /// Publish a snapshot to the region's cache.
    pub fn publish(&self, snapshot: &TransactionSnapshot) {
        assert!(self.cache.publish(snapshot.clone()));
    }

    /// Write one column version.
    pub fn write(&mut self, row: &str, family: &str, qualifier: &str, ts: TxId, value: &str) {
        self.region
            .put(Put::new(row).add_column(family, qualifier, ts, value))
            .unwrap();
    }

    /// Transactionally delete one column as transaction `ts`.
    pub fn delete(&mut self, row: &str, family: &str, qualifier: &str, ts: TxId) {
        self.region
            .put(Put::new(row).add_column(family, qualifier, ts, "").as_delete())
            .unwrap();
    }

    /// Transactional point read.
    pub fn get(&self, tx: &Transaction, row: &str) -> Vec<Cell> {
        let mut get = Get::new(row);
        attach_transaction(&mut get, tx, &MsgPackTransactionCodec);
        self.region.get(get).unwrap()
    }

    /// Transactional full scan.
    pub fn scan(&self, tx: &Transaction) -> Vec<Cell> {
        let mut scan = Scan::new();
        attach_transaction(&mut scan, tx, &MsgPackTransactionCodec);
        self.region.scan(scan).unwrap()
    }
}

/// Table with one unlimited family `d`.
pub fn single_family_table() -> TableDescriptor {
    TableDescriptor::new("t").with_family(FamilyDescriptor::new("d"))
}

/// Snapshot shorthand; panics on inconsistent sets.
pub fn snapshot(read_pointer: TxId, invalid: &[TxId], in_progress: &[TxId]) -> TransactionSnapshot {
    TransactionSnapshot::new(
        read_pointer,
        invalid.iter().copied(),
        in_progress.iter().copied(),
        0,
    )
    .unwrap()
}

/// Timestamps of `cells`, in order.
pub fn timestamps(cells: &[Cell]) -> Vec<TxId> {
    cells.iter().map(|cell| cell.timestamp).collect()
}

/// Values of `cells` as strings, in order.
pub fn values(cells: &[Cell]) -> Vec<String> {
    cells
        .iter()
        .map(|cell| String::from_utf8_lossy(&cell.value).into_owned())
        .collect()
}
