//! Error types for txfilter
//!
//! This module defines all error types used throughout the filtering layer.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use crate::types::TxId;
use std::io;
use thiserror::Error;

/// Result type alias for txfilter operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the transactional filtering layer
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error (config files)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A transaction context attached to a request could not be decoded.
    ///
    /// The request must be rejected: serving it unfiltered could expose
    /// data the caller is not allowed to see.
    #[error("Transaction decode error: {0}")]
    Decode(String),

    /// The scan delivered cells out of the (row, family, qualifier,
    /// timestamp descending) order the filter relies on.
    ///
    /// Fails the owning scan; a partially filtered result is never emitted.
    #[error("Out of order cell at timestamp {timestamp} (previous {previous}): {reason}")]
    OutOfOrderCell {
        /// Timestamp of the offending cell
        timestamp: TxId,
        /// Timestamp of the cell seen just before it
        previous: TxId,
        /// What ordering rule was broken
        reason: &'static str,
    },

    /// A snapshot violated its structural invariants
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// No snapshot has been published yet and the cold cache policy
    /// forbids running the operation unfiltered
    #[error("No transaction snapshot available")]
    SnapshotUnavailable,

    /// A hook was invoked before the processor was started
    #[error("Transaction processor not started")]
    NotStarted,

    /// Invalid operation or state
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Configuration could not be parsed
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Build a decode error from any displayable cause
    pub fn decode(cause: impl std::fmt::Display) -> Self {
        Error::Decode(cause.to_string())
    }

    /// Whether this error rejects a single request rather than a scan or
    /// the whole processor
    pub fn is_request_error(&self) -> bool {
        matches!(self, Error::Decode(_))
    }
}
