//! # Store Errors
//!
//! [`BackendError`] is what a persistence backend may report.
//! [`StoreError`] is what the token store reports to its callers; every
//! variant means "the store cannot currently be trusted to answer" and maps
//! to 503 at the HTTP layer. A missing or empty collection is never an
//! error.

use std::time::Duration;

use thiserror::Error;

/// Failure inside a key-value backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Underlying I/O failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Key is not usable by this backend.
    #[error("invalid key {0:?}")]
    InvalidKey(String),

    /// Backend refused or could not service the call.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Failure of a token store operation.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backend call failed.
    #[error("backend {op} failed: {source}")]
    Backend {
        op: &'static str,
        #[source]
        source: BackendError,
    },

    /// The persisted collection could not be decoded.
    #[error("token collection under key {key:?} is corrupt: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The collection could not be encoded for writing.
    #[error("failed to encode token collection: {0}")]
    Encode(#[source] serde_json::Error),

    /// The backend call did not finish within the configured timeout.
    #[error("backend {op} timed out after {after:?}")]
    Timeout { op: &'static str, after: Duration },

    /// The blocking task running the backend call panicked or was cancelled.
    #[error("backend task failed: {0}")]
    Task(String),
}
