//! Error handling for bibliograph operations.
//!
//! All public APIs return `Result<T, StoreError>`. Read paths treat an
//! absent key as an empty result rather than an error; `NotFound` and
//! `DuplicateKey` only surface from the raw index contract.

use std::io;
use thiserror::Error;

/// Result type for bibliograph operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur inside the storage engine.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error from the underlying filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error during serialization or deserialization of data.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A record log entry or persisted index could not be decoded.
    ///
    /// Recoverable: callers of the read paths treat the affected record
    /// as unavailable instead of aborting.
    #[error("corrupt record: {0}")]
    CorruptRecord(String),

    /// Raw index insert on a key that already exists.
    ///
    /// The catalog's fetch-or-create-append write path catches this
    /// internally; it never escapes from `Catalog::add`.
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    /// Requested resource was not found.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Invalid configuration or argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A long-running computation observed its cancellation token.
    #[error("operation cancelled")]
    Cancelled,
}
