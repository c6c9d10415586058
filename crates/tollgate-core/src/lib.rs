//! # tollgate-core: Foundational Types for Tollgate
//!
//! Tollgate is a bearer-token gate placed in front of an HTTP API. A single
//! trusted client exchanges its credential for a short-lived opaque token,
//! and every protected request must present that token.
//!
//! This crate defines the types shared by the store and the HTTP layer:
//!
//! - [`TokenRecord`]: one issued token and its expiry, in the persisted
//!   `{token, tokenExpire}` shape.
//! - [`AccessToken`]: an opaque token value (random v4 UUID on issuance).
//! - [`ClientCredential`]: the trusted `(clientId, secret)` pair, compared
//!   in constant time.
//! - [`TokenTtl`]: token lifetime in seconds and expiry arithmetic.
//! - [`Clock`]: epoch-millisecond time source ([`SystemClock`] in
//!   production, [`ManualClock`] for deterministic tests).
//!
//! ## Crate Policy
//!
//! - No dependencies on other `tollgate-*` crates (leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod clock;
pub mod credential;
pub mod error;
pub mod token;

pub use clock::{Clock, ManualClock, SystemClock};
pub use credential::ClientCredential;
pub use error::CoreError;
pub use token::{AccessToken, TokenRecord, TokenTtl};
