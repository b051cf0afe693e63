mod memory;
mod store;


pub use memory::MemoryBackend;
pub use store::ModelStore;

use std::{sync::Arc, time::Duration};
use thiserror::Error as ThisError;

///
/// BackendError
///
/// Failure reported by a cache backend. Carries only a message since the
/// store layer classifies every backend failure the same way.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("backend '{backend}': {message}")]
pub struct BackendError {
    pub backend: String,
    pub message: String,
}

impl BackendError {
    pub fn new(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            message: message.into(),
        }
    }
}

///
/// Backend
///
/// Byte-level key/value cache. Implementations are shared across threads
/// and must tolerate concurrent calls.
///

pub trait Backend: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BackendError>;

    /// Store `value` under `key`, replacing any previous entry. `None`
    /// means the entry never expires.
    fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<(), BackendError>;

    /// Remove `key`. Returns whether an entry was present.
    fn delete(&self, key: &str) -> Result<bool, BackendError>;
}

impl<B: Backend + ?Sized> Backend for Arc<B> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BackendError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<(), BackendError> {
        (**self).set(key, value, ttl)
    }

    fn delete(&self, key: &str) -> Result<bool, BackendError> {
        (**self).delete(key)
    }
}
