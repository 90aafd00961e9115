//! The transaction processor
//!
//! Turns a non-transactional region into a snapshot-isolated one:
//!
//! - reads carrying a transaction get every version in the visible time
//!   range, filtered by a [`VisibilityFilter`] ahead of the caller's filter
//! - logical deletes are rewritten into delete-marker puts
//! - flush and compaction scanners get a [`RetentionFilter`] built from the
//!   latest snapshot, which drops invalid and expired data and keeps
//!   anything an in-progress transaction may still commit or read

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};

use txfilter_core::{now_ticks, Error, MsgPackTransactionCodec, Result, TransactionCodec};
use txfilter_visibility::{FilterChain, RetentionFilter, ScanPurpose, TtlTable, VisibilityFilter};

use crate::cache::SnapshotSource;
use crate::config::{ColdCachePolicy, ProcessorConfig};
use crate::observer::{
    CompactionKind, ObserverEnvironment, ProcessorState, StoreScanSpec, TransactionObserver,
};
use crate::operation::{transaction_from, Get, Put, ReadOperation, Scan, TimeRange, ALL_VERSIONS};

/// What `start` resolves once
struct ProcessorContext {
    region_name: String,
    ttl: Arc<TtlTable>,
    snapshots: Arc<dyn SnapshotSource>,
}

/// Snapshot-isolation observer for one region
pub struct TransactionProcessor {
    config: ProcessorConfig,
    codec: Box<dyn TransactionCodec>,
    state: AtomicU8,
    context: OnceLock<ProcessorContext>,
}

impl TransactionProcessor {
    /// Processor using the MessagePack transaction codec
    pub fn new(config: ProcessorConfig) -> Self {
        Self::with_codec(config, Box::new(MsgPackTransactionCodec))
    }

    /// Processor using a custom transaction codec
    pub fn with_codec(config: ProcessorConfig, codec: Box<dyn TransactionCodec>) -> Self {
        TransactionProcessor {
            config,
            codec,
            state: AtomicU8::new(ProcessorState::Uninitialized as u8),
            context: OnceLock::new(),
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> ProcessorState {
        ProcessorState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Loaded configuration
    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Resolved TTL table, once started
    pub fn ttl_table(&self) -> Option<&TtlTable> {
        self.context.get().map(|ctx| ctx.ttl.as_ref())
    }

    /// Context for a request hook; `None` means pass through
    fn context(&self) -> Result<Option<&ProcessorContext>> {
        match self.state() {
            ProcessorState::Uninitialized => Err(Error::NotStarted),
            ProcessorState::Stopped => Ok(None),
            ProcessorState::Started => {
                let ctx = self.context.get().ok_or(Error::NotStarted)?;
                if self
                    .state
                    .compare_exchange(
                        ProcessorState::Started as u8,
                        ProcessorState::Active as u8,
                        Ordering::AcqRel,
                        Ordering::Acquire,
                    )
                    .is_ok()
                {
                    tracing::info!(region = %ctx.region_name, "Transaction processor active");
                }
                Ok(Some(ctx))
            }
            ProcessorState::Active => self.context.get().ok_or(Error::NotStarted).map(Some),
        }
    }

    fn prepare_read<R: ReadOperation>(&self, op: &mut R) -> Result<()> {
        let Some(ctx) = self.context()? else {
            return Ok(());
        };
        let tx = match transaction_from(&*op, self.codec.as_ref()) {
            Ok(Some(tx)) => tx,
            Ok(None) => return Ok(()),
            Err(e) => {
                tracing::warn!(region = %ctx.region_name, error = %e, "Rejecting read with undecodable transaction");
                return Err(e);
            }
        };

        let now = now_ticks();
        op.set_max_versions(ALL_VERSIONS);
        op.set_time_range(TimeRange::new(
            ctx.ttl.oldest_visible(now),
            tx.max_visible_timestamp(),
        ));

        let visibility = VisibilityFilter::with_reference_time(
            tx,
            Arc::clone(&ctx.ttl),
            ScanPurpose::UserScan,
            now,
        );
        let caller = op.take_filter();
        op.set_filter(FilterChain::combine(Box::new(visibility), caller));
        Ok(())
    }

    fn retention_spec(
        &self,
        action: &'static str,
        purpose: ScanPurpose,
    ) -> Result<Option<StoreScanSpec>> {
        let Some(ctx) = self.context()? else {
            return Ok(None);
        };

        match ctx.snapshots.latest() {
            Some(snapshot) => {
                let filter = RetentionFilter::for_snapshot(&snapshot, Arc::clone(&ctx.ttl), purpose);
                Ok(Some(StoreScanSpec::new(action, purpose, filter)))
            }
            None => match self.config.cold_cache_policy {
                ColdCachePolicy::FailOpen => {
                    tracing::debug!(
                        region = %ctx.region_name,
                        action,
                        "No transaction snapshot available, using default scanner"
                    );
                    Ok(None)
                }
                ColdCachePolicy::Reject => Err(Error::SnapshotUnavailable),
            },
        }
    }
}

impl Default for TransactionProcessor {
    fn default() -> Self {
        Self::new(ProcessorConfig::default())
    }
}

impl TransactionObserver for TransactionProcessor {
    fn start(&self, env: ObserverEnvironment) -> Result<()> {
        if self.state() != ProcessorState::Uninitialized {
            return Err(Error::InvalidOperation(
                "transaction processor already started".to_string(),
            ));
        }

        let context = ProcessorContext {
            ttl: Arc::new(env.descriptor.ttl_table()),
            snapshots: env.snapshots,
            region_name: env.region_name,
        };
        let region = context.region_name.clone();
        let families = context.ttl.len();

        self.context.set(context).map_err(|_| {
            Error::InvalidOperation("transaction processor already started".to_string())
        })?;
        self.state
            .store(ProcessorState::Started as u8, Ordering::Release);

        tracing::info!(region = %region, families, "Transaction processor started");
        Ok(())
    }

    fn stop(&self) {
        let previous = self
            .state
            .swap(ProcessorState::Stopped as u8, Ordering::AcqRel);
        if ProcessorState::from_u8(previous) != ProcessorState::Stopped {
            if let Some(ctx) = self.context.get() {
                tracing::info!(region = %ctx.region_name, "Transaction processor stopped");
            }
        }
    }

    fn pre_get(&self, get: &mut Get) -> Result<()> {
        self.prepare_read(get)
    }

    fn pre_scan(&self, scan: &mut Scan) -> Result<()> {
        self.prepare_read(scan)
    }

    fn pre_put(&self, put: &mut Put) -> Result<()> {
        let Some(ctx) = self.context()? else {
            return Ok(());
        };
        if !put.is_delete() {
            return Ok(());
        }

        for cells in put.family_cells.values_mut() {
            for cell in cells.iter_mut() {
                *cell = cell.with_delete_marker();
            }
        }

        if self.config.log_delete_rewrites {
            tracing::info!(
                region = %ctx.region_name,
                row = %String::from_utf8_lossy(&put.row),
                families = put.family_cells.len(),
                cells = put.len(),
                "Rewrote transactional delete into delete markers"
            );
        }
        Ok(())
    }

    fn pre_flush_scanner_open(&self) -> Result<Option<StoreScanSpec>> {
        self.retention_spec("flush", ScanPurpose::CompactRetainDeletes)
    }

    fn pre_compact_scanner_open(&self, kind: CompactionKind) -> Result<Option<StoreScanSpec>> {
        self.retention_spec(kind.name(), kind.purpose())
    }
}
