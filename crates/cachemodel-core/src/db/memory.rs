use crate::db::{Backend, BackendError};
use parking_lot::Mutex;
use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

///
/// MemoryBackend
///
/// In-process backend. Expired entries are dropped lazily on read, or in
/// bulk through [`Self::purge_expired`].
///

#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, Entry>>,
}

#[derive(Debug)]
struct Entry {
    bytes: Vec<u8>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| now < at)
    }
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, counting ones that expired but were not
    /// yet purged.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Drop expired entries and return how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));

        before - entries.len()
    }
}

impl Backend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BackendError> {
        let now = Instant::now();
        let mut entries = self.entries.lock();

        match entries.get(key) {
            Some(entry) if entry.is_live(now) => Ok(Some(entry.bytes.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<(), BackendError> {
        let expires_at = match ttl {
            Some(ttl) => Some(Instant::now().checked_add(ttl).ok_or_else(|| {
                BackendError::new("memory", format!("ttl of {ttl:?} overflows the clock"))
            })?),
            None => None,
        };

        self.entries.lock().insert(
            key.to_string(),
            Entry {
                bytes: value,
                expires_at,
            },
        );

        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool, BackendError> {
        let now = Instant::now();

        Ok(self
            .entries
            .lock()
            .remove(key)
            .is_some_and(|entry| entry.is_live(now)))
    }
}
