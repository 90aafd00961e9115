//! Per-family time-to-live table
//!
//! Maps each column family to its retention duration in milliseconds. Built
//! once when the processor starts and never mutated afterwards, so scans
//! read it without synchronization.
//!
//! TTLs are compared against cell timestamps in id space: a family with a
//! TTL of `T` milliseconds hides every version older than
//! `now - T * MAX_TX_PER_MS`.

use rustc_hash::FxHashMap;
use txfilter_core::{ticks_from_millis, TxId};

/// Family → TTL (milliseconds); 0 means unlimited retention
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TtlTable {
    ttls: FxHashMap<Vec<u8>, u64>,
}

impl TtlTable {
    /// Create an empty table (every family unlimited)
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from already-parsed TTLs
    pub fn from_millis<I, F>(entries: I) -> Self
    where
        I: IntoIterator<Item = (F, u64)>,
        F: Into<Vec<u8>>,
    {
        TtlTable {
            ttls: entries
                .into_iter()
                .map(|(family, ttl)| (family.into(), ttl))
                .collect(),
        }
    }

    /// Build a table from raw schema property values
    ///
    /// A missing value means unlimited. A value that is not a non-negative
    /// integer is logged and also treated as unlimited; startup never fails
    /// on a bad TTL.
    pub fn from_properties<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a [u8], Option<&'a str>)>,
    {
        let mut ttls = FxHashMap::default();

        for (family, raw) in entries {
            let ttl = match raw {
                None => 0,
                Some(raw) => match raw.trim().parse::<u64>() {
                    Ok(ttl) => {
                        tracing::info!(
                            family = %String::from_utf8_lossy(family),
                            ttl_ms = ttl,
                            "Family has TTL"
                        );
                        ttl
                    }
                    Err(_) => {
                        tracing::warn!(
                            family = %String::from_utf8_lossy(family),
                            value = raw,
                            "Invalid TTL value configured for column family, using unlimited retention"
                        );
                        0
                    }
                },
            };
            ttls.insert(family.to_vec(), ttl);
        }

        TtlTable { ttls }
    }

    /// TTL of a family in milliseconds (0 = unlimited, also for unknown families)
    pub fn ttl_millis(&self, family: &[u8]) -> u64 {
        self.ttls.get(family).copied().unwrap_or(0)
    }

    /// Oldest timestamp still alive in `family` at reference time `now`
    ///
    /// `None` when the family retains data forever. Versions strictly older
    /// than the cutoff are expired.
    pub fn cutoff(&self, family: &[u8], now: TxId) -> Option<TxId> {
        match self.ttl_millis(family) {
            0 => None,
            ttl => Some(now.saturating_sub(ticks_from_millis(ttl))),
        }
    }

    /// Oldest timestamp any family may still return at `now`
    ///
    /// The lower end of a transactional read's time range: 0 as soon as one
    /// family (or no family at all) is unlimited.
    pub fn oldest_visible(&self, now: TxId) -> TxId {
        if self.ttls.is_empty() {
            return 0;
        }
        self.ttls
            .keys()
            .map(|family| self.cutoff(family, now).unwrap_or(0))
            .min()
            .unwrap_or(0)
    }

    /// Number of families in the table
    pub fn len(&self) -> usize {
        self.ttls.len()
    }

    /// Whether the table has no families
    pub fn is_empty(&self) -> bool {
        self.ttls.is_empty()
    }
}
