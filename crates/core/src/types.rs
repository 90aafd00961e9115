//! Transaction ids and the id clock
//!
//! A transaction id is a single monotonically increasing integer that serves
//! two roles: it identifies the transaction, and it is the version timestamp
//! of every cell the transaction writes.
//!
//! Ids are minted from wall-clock milliseconds scaled by [`MAX_TX_PER_MS`],
//! so the same number space can be compared against "now" when a column
//! family carries a TTL. That comparison is the only place an id is ever
//! treated as time.

use std::time::{SystemTime, UNIX_EPOCH};

/// Transaction id, equal to the version timestamp of the cells it writes
pub type TxId = u64;

/// Number of ids that can be minted per wall-clock millisecond
pub const MAX_TX_PER_MS: u64 = 1_000_000;

/// Reserved id used by the synthetic reader of flush and compaction.
///
/// Never minted for a real transaction, so no cell is ever "own write" of
/// the synthetic reader.
pub const SYNTHETIC_TX_ID: TxId = TxId::MAX;

/// Convert wall-clock milliseconds into id space
#[inline]
pub const fn ticks_from_millis(millis: u64) -> TxId {
    millis.saturating_mul(MAX_TX_PER_MS)
}

/// Convert an id back into the wall-clock millisecond it was minted in
#[inline]
pub const fn millis_from_ticks(ticks: TxId) -> u64 {
    ticks / MAX_TX_PER_MS
}

/// Current wall-clock time in id space
///
/// Returns 0 if the system clock is before the Unix epoch.
pub fn now_ticks() -> TxId {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);
    ticks_from_millis(millis)
}
