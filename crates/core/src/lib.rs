//! Core types for txfilter
//!
//! This crate defines the foundational types used throughout the system:
//! - TxId: transaction id doubling as cell version timestamp, plus the id clock
//! - Transaction: one reader's view (own id, visibility bound, exclusions)
//! - TransactionSnapshot: immutable cluster-wide transaction state
//! - Cell: one stored column version, optionally tagged as a delete marker
//! - TransactionCodec: request attribute encoding of a transaction
//! - Error: Error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cell;
pub mod codec;
pub mod error;
pub mod transaction;
pub mod types;

pub use cell::{Cell, CellTag, DELETE_TAG_KIND};
pub use codec::{
    MsgPackTransactionCodec, TransactionCodec, TransactionPayload,
    DELETE_OPERATION_ATTRIBUTE_KEY, TX_OPERATION_ATTRIBUTE_KEY,
};
pub use error::{Error, Result};
pub use transaction::{Transaction, TransactionSnapshot};
pub use types::{
    millis_from_ticks, now_ticks, ticks_from_millis, TxId, MAX_TX_PER_MS, SYNTHETIC_TX_ID,
};
