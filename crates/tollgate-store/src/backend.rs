//! # Key-Value Backend Contract
//!
//! The persistence engine is an external collaborator consumed only through
//! get/set of opaque bytes under string keys.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::BackendError;

/// Minimal get/set persistence contract.
///
/// Calls are blocking; the token store runs them on the blocking pool and
/// applies its own timeout, so implementations may do ordinary file or
/// network I/O.
pub trait KeyValueBackend: Send + Sync + std::fmt::Debug + 'static {
    /// Read the value stored under `key`, or `None` if nothing is stored.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BackendError>;

    /// Durably replace the value stored under `key`.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), BackendError>;

    /// Push any buffered writes to durable storage.
    fn flush(&self) -> Result<(), BackendError> {
        Ok(())
    }
}

/// Thread-safe, cloneable in-memory backend. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    data: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether no keys are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BackendError> {
        Ok(self.data.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), BackendError> {
        self.data.write().insert(key.to_string(), value.to_vec());
        Ok(())
    }
}
