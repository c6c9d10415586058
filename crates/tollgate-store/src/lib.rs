//! # tollgate-store: Issued Token Persistence
//!
//! The [`TokenStore`] is the single writer of the issued-token collection.
//! It persists the whole collection as one JSON array under one well-known
//! key through a [`KeyValueBackend`], and keeps an in-memory index of the
//! same records so validation is an O(1) lookup that never touches the
//! backend.
//!
//! ## Backends
//!
//! - [`MemoryBackend`]: process-local map; nothing survives a restart.
//! - [`FileBackend`]: one JSON file per key in a directory, written
//!   atomically (temp file + fsync + rename).
//!
//! Backend calls are synchronous and run on the blocking pool, each bounded
//! by [`StoreOptions::timeout`].
//!
//! ## Concurrency
//!
//! Appends, sweeps, and flushes take a single async writer lock for the whole
//! read-modify-write, so concurrent issuances never lose each other's
//! records. Validation only takes the index read lock and never waits on a
//! backend write.

pub mod backend;
pub mod error;
pub mod file;
pub mod store;

pub use backend::{KeyValueBackend, MemoryBackend};
pub use error::{BackendError, StoreError};
pub use file::FileBackend;
pub use store::{StoreOptions, TokenStatus, TokenStore, TOKEN_COLLECTION_KEY};
