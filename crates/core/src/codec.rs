//! Transaction context codec
//!
//! Clients attach their transaction to each read and write request as an
//! opaque attribute. The codec turns a [`Transaction`] into those bytes and
//! back.
//!
//! ## Format
//!
//! The default codec serializes a [`TransactionPayload`] using MessagePack
//! (`rmp-serde`) for compact binary encoding with schema evolution support.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::transaction::Transaction;
use crate::types::TxId;

/// Request attribute carrying the encoded transaction
pub const TX_OPERATION_ATTRIBUTE_KEY: &str = "txfilter.tx";

/// Request attribute flagging a write as a logical delete
pub const DELETE_OPERATION_ATTRIBUTE_KEY: &str = "txfilter.tx.delete";

/// Encode/decode transactions to request attribute bytes
///
/// Codecs must be `Send + Sync` so one instance serves concurrent requests.
pub trait TransactionCodec: Send + Sync {
    /// Encode a transaction
    fn encode(&self, tx: &Transaction) -> Vec<u8>;

    /// Decode a transaction
    ///
    /// # Errors
    ///
    /// Returns `Decode` if the bytes are not a valid transaction.
    fn decode(&self, bytes: &[u8]) -> Result<Transaction>;
}

/// Wire form of a transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionPayload {
    /// Own write id
    pub id: TxId,
    /// Highest visible writer id
    pub visibility_upper_bound: TxId,
    /// Concurrently running siblings
    pub excluded: Vec<TxId>,
    /// Dead writers
    pub invalid: Vec<TxId>,
}

impl From<&Transaction> for TransactionPayload {
    fn from(tx: &Transaction) -> Self {
        TransactionPayload {
            id: tx.id(),
            visibility_upper_bound: tx.visibility_upper_bound(),
            excluded: tx.excluded().to_vec(),
            invalid: tx.invalid().to_vec(),
        }
    }
}

impl From<TransactionPayload> for Transaction {
    fn from(payload: TransactionPayload) -> Self {
        Transaction::new(
            payload.id,
            payload.visibility_upper_bound,
            payload.excluded,
            payload.invalid,
        )
    }
}

/// MessagePack codec (default)
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgPackTransactionCodec;

impl TransactionCodec for MsgPackTransactionCodec {
    fn encode(&self, tx: &Transaction) -> Vec<u8> {
        rmp_serde::to_vec(&TransactionPayload::from(tx))
            .expect("TransactionPayload serialization should not fail")
    }

    fn decode(&self, bytes: &[u8]) -> Result<Transaction> {
        rmp_serde::from_slice::<TransactionPayload>(bytes)
            .map(Transaction::from)
            .map_err(Error::decode)
    }
}
