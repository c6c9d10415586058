//! # Error Types
//!
//! Construction errors for the core domain types. Rejected values never
//! reach the store or the gate.

use thiserror::Error;

/// Errors raised while constructing core domain values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Client id was empty.
    #[error("client id must not be empty")]
    EmptyClientId,

    /// Client secret was empty.
    #[error("client secret must not be empty")]
    EmptySecret,

    /// Token lifetime of zero seconds.
    #[error("token ttl must be at least one second")]
    ZeroTtl,

    /// Token value was empty or contained whitespace.
    #[error("invalid access token value: {0}")]
    InvalidToken(String),
}
