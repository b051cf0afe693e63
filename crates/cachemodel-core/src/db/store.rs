use crate::{
    db::Backend,
    error::Error,
    model::{Model, ModelError, Record},
    serialize::{Serializer, SerializerRegistry},
    value::Value,
};
use std::{fmt, sync::Arc};

///
/// ModelStore
///
/// Binds one model to a backend and a resolved serializer. Every record is
/// coerced and keyed before the backend is touched.
///

pub struct ModelStore<B> {
    model: Model,
    backend: B,
    serializer: Arc<dyn Serializer>,
}

impl<B: Backend> ModelStore<B> {
    /// Resolve the model's serializer through the process-wide registry.
    pub fn new(model: Model, backend: B) -> Result<Self, Error> {
        let serializer = model.serializer()?;

        Ok(Self::with_serializer(model, backend, serializer))
    }

    /// Resolve the model's serializer through an injected registry.
    pub fn with_registry(
        model: Model,
        backend: B,
        registry: &SerializerRegistry,
    ) -> Result<Self, Error> {
        let serializer = model.serializer_from(registry)?;

        Ok(Self::with_serializer(model, backend, serializer))
    }

    pub fn with_serializer(model: Model, backend: B, serializer: Arc<dyn Serializer>) -> Self {
        Self {
            model,
            backend,
            serializer,
        }
    }

    #[must_use]
    pub const fn model(&self) -> &Model {
        &self.model
    }

    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Build a record from `(field, input)` pairs and save it.
    pub fn create<I, K, V>(&self, inputs: I) -> Result<Record, Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let record = Record::new(&self.model, inputs)?;
        self.save(&record)?;

        Ok(record)
    }

    pub fn save(&self, record: &Record) -> Result<(), Error> {
        self.check_model(record)?;

        let key = record.storage_key()?;
        let bytes = record.encode(self.serializer.as_ref())?;
        tracing::debug!(model = self.model.name(), %key, bytes = bytes.len(), "cache set");

        self.backend.set(&key, bytes, self.model.ttl())?;

        Ok(())
    }

    /// Apply `updates` to the stored record and save it. When the updates
    /// move the record to a new key the old entry is removed.
    pub fn set_by_id<I, K, V>(&self, id: impl Into<Value>, updates: I) -> Result<Record, Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let old_key = self.model.key_for_id(id)?;
        let mut record = self
            .fetch(&old_key)?
            .ok_or_else(|| Error::store_not_found(&old_key))?;

        record.update(updates)?;
        self.save(&record)?;

        let new_key = record.storage_key()?;
        if new_key != old_key {
            self.backend.delete(&old_key)?;
        }

        Ok(record)
    }

    /// Remove the record stored under `id`. Returns whether one was present.
    pub fn delete_by_id(&self, id: impl Into<Value>) -> Result<bool, Error> {
        let key = self.model.key_for_id(id)?;
        tracing::debug!(model = self.model.name(), %key, "cache delete");

        Ok(self.backend.delete(&key)?)
    }

    pub fn get_by_id(&self, id: impl Into<Value>) -> Result<Record, Error> {
        let key = self.model.key_for_id(id)?;

        self.fetch(&key)?
            .ok_or_else(|| Error::store_not_found(&key))
    }

    pub fn get_or_none(&self, id: impl Into<Value>) -> Result<Option<Record>, Error> {
        let key = self.model.key_for_id(id)?;

        self.fetch(&key)
    }

    /// Look a record up by naming every primary-key field.
    pub fn get<I, K, V>(&self, inputs: I) -> Result<Record, Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let key = self.key_from_fields(inputs)?;

        self.fetch(&key)?
            .ok_or_else(|| Error::store_not_found(&key))
    }

    /// One slot per identifier, in input order.
    pub fn get_many<I>(&self, ids: I) -> Result<Vec<Option<Record>>, Error>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        ids.into_iter().map(|id| self.get_or_none(id)).collect()
    }

    fn fetch(&self, key: &str) -> Result<Option<Record>, Error> {
        let Some(bytes) = self.backend.get(key)? else {
            tracing::debug!(model = self.model.name(), %key, "cache miss");
            return Ok(None);
        };
        tracing::debug!(model = self.model.name(), %key, bytes = bytes.len(), "cache hit");

        Record::decode(&self.model, self.serializer.as_ref(), &bytes).map(Some)
    }

    fn key_from_fields<I, K, V>(&self, inputs: I) -> Result<String, ModelError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let index = self.model.primary_key_index();
        let key_fields = index.fields();
        let mut slots: Vec<Option<Value>> = vec![None; key_fields.len()];

        for (name, input) in inputs {
            let name = name.as_ref();
            let Some(slot) = key_fields.iter().position(|f| f.name() == name) else {
                return Err(if self.model.position(name).is_some() {
                    ModelError::NotAKeyField {
                        model: self.model.name().to_string(),
                        field: name.to_string(),
                    }
                } else {
                    ModelError::UnknownField {
                        model: self.model.name().to_string(),
                        field: name.to_string(),
                    }
                });
            };
            slots[slot] = Some(key_fields[slot].coerce(input)?);
        }

        let values = slots
            .into_iter()
            .zip(key_fields)
            .map(|(slot, field)| {
                slot.ok_or_else(|| ModelError::MissingValue {
                    model: self.model.name().to_string(),
                    field: field.name().to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(index.key_for(&values)?)
    }

    fn check_model(&self, record: &Record) -> Result<(), ModelError> {
        let found = record.model();
        if found.same_layout(&self.model) {
            Ok(())
        } else {
            Err(ModelError::ModelMismatch {
                expected: self.model.name().to_string(),
                found: found.name().to_string(),
            })
        }
    }
}

impl<B> fmt::Debug for ModelStore<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelStore")
            .field("model", &self.model.name())
            .field("serializer", &self.serializer)
            .finish_non_exhaustive()
    }
}
