use crate::serialize::{
    CBOR, CborSerializer, JSON, JsonSerializer, MSGPACK, MessagePackSerializer, SerializeError,
    Serializer,
};
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::{collections::HashMap, fmt, sync::Arc};

type Snapshot = HashMap<String, Arc<dyn Serializer>>;

///
/// SerializerRegistry
///
/// Name → codec mapping. Readers load an immutable snapshot without
/// locking; writers serialise on one mutex, copy the snapshot, and publish
/// the new one atomically. A reader sees the map either before or after a
/// mutation, never in between.
///

pub struct SerializerRegistry {
    snapshot: ArcSwap<Snapshot>,
    writer: Mutex<()>,
}

impl SerializerRegistry {
    /// Empty registry, for injection into tests or isolated stores.
    #[must_use]
    pub fn new() -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(HashMap::new()),
            writer: Mutex::new(()),
        }
    }

    /// Registry holding `json`, `cbor`, and `msgpack` when compiled in.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut builtins: Snapshot = HashMap::new();
        builtins.insert(JSON.to_string(), Arc::new(JsonSerializer));
        builtins.insert(CBOR.to_string(), Arc::new(CborSerializer::new()));

        match MessagePackSerializer::new() {
            Ok(codec) => {
                builtins.insert(MSGPACK.to_string(), Arc::new(codec));
            }
            Err(err) => tracing::warn!(codec = MSGPACK, %err, "builtin serializer skipped"),
        }

        Self {
            snapshot: ArcSwap::from_pointee(builtins),
            writer: Mutex::new(()),
        }
    }

    /// Add a codec under `name`. Fails without touching the mapping if the
    /// name is taken.
    pub fn register(
        &self,
        name: impl Into<String>,
        serializer: Arc<dyn Serializer>,
    ) -> Result<(), SerializeError> {
        let name = name.into();
        let _guard = self.writer.lock();

        let current = self.snapshot.load();
        if current.contains_key(&name) {
            return Err(SerializeError::AlreadyExists(name));
        }

        let mut next = Snapshot::clone(&current);
        next.insert(name.clone(), serializer);
        self.snapshot.store(Arc::new(next));
        tracing::debug!(serializer = %name, "serializer registered");

        Ok(())
    }

    /// Remove `name`, returning the codec it held.
    pub fn unregister(&self, name: &str) -> Result<Arc<dyn Serializer>, SerializeError> {
        let _guard = self.writer.lock();

        let mut next = Snapshot::clone(&self.snapshot.load());
        let removed = next
            .remove(name)
            .ok_or_else(|| SerializeError::NotFound(name.to_string()))?;
        self.snapshot.store(Arc::new(next));
        tracing::debug!(serializer = %name, "serializer unregistered");

        Ok(removed)
    }

    pub fn unregister_all(&self) {
        let _guard = self.writer.lock();

        self.snapshot.store(Arc::new(HashMap::new()));
        tracing::debug!("all serializers unregistered");
    }

    /// Look up a codec. Never blocks on writers.
    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<Arc<dyn Serializer>> {
        self.snapshot.load().get(name).cloned()
    }

    /// Like [`Self::get_by_name`], with a not-found error.
    pub fn require(&self, name: &str) -> Result<Arc<dyn Serializer>, SerializeError> {
        self.get_by_name(name)
            .ok_or_else(|| SerializeError::NotFound(name.to_string()))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.snapshot.load().contains_key(name)
    }

    /// Registered names in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.snapshot.load().keys().cloned().collect();
        names.sort_unstable();
        names
    }
}

impl Default for SerializerRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for SerializerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializerRegistry")
            .field("names", &self.names())
            .finish()
    }
}
