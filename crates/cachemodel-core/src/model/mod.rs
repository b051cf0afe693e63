//! Model metadata and records.
//!
//! A [`Model`] is declared once through [`ModelBuilder`]: its field
//! descriptors, its primary key, its serializer binding and TTL. Building
//! validates every declaration rule and generates the model's indexes.

mod config;
mod record;

#[cfg(test)]
mod tests;

use crate::{
    field::{FieldDescriptor, FieldError},
    index::{IndexError, IndexFormatter, IndexManager, PrimaryKeyIndex},
    serialize::{self, SerializeError, Serializer, SerializerRegistry},
    value::Value,
};
use std::{collections::HashMap, fmt, sync::Arc, time::Duration};
use thiserror::Error as ThisError;

// re-exports
pub use config::{CacheConfig, ConfigError, DEFAULT_SERIALIZER, ModelConfig};
pub use record::Record;

///
/// ModelError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ModelError {
    #[error("model '{model}' declares field '{field}' more than once")]
    DuplicateField { model: String, field: String },

    #[error("model '{model}' declares no primary key")]
    MissingPrimaryKey { model: String },

    #[error("model '{model}' primary key references unknown field '{field}'")]
    UnknownKeyField { model: String, field: String },

    #[error("model '{model}' composite key needs at least 2 fields, got {found}")]
    CompositeKeyTooShort { model: String, found: usize },

    #[error("model '{model}' primary key lists field '{field}' more than once")]
    DuplicateKeyField { model: String, field: String },

    #[error("model '{model}' has no field '{field}'")]
    UnknownField { model: String, field: String },

    #[error("field '{field}' is not part of the primary key of model '{model}'")]
    NotAKeyField { model: String, field: String },

    #[error("model '{model}' requires a value for field '{field}'")]
    MissingValue { model: String, field: String },

    #[error("malformed payload for model '{model}': {message}")]
    MalformedPayload { model: String, message: String },

    #[error("record belongs to model '{found}', expected '{expected}'")]
    ModelMismatch { expected: String, found: String },

    #[error(transparent)]
    Field(#[from] FieldError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

///
/// CompositeKey
///
/// Primary key made of two or more fields, in declaration order.
///

#[derive(Clone, Debug)]
pub struct CompositeKey {
    field_names: Vec<String>,
    index_formatter: Option<IndexFormatter>,
}

impl CompositeKey {
    pub fn new<I, S>(field_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            field_names: field_names.into_iter().map(Into::into).collect(),
            index_formatter: None,
        }
    }

    #[must_use]
    pub fn index_formatter(mut self, formatter: IndexFormatter) -> Self {
        self.index_formatter = Some(formatter);
        self
    }

    #[must_use]
    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }

    #[must_use]
    pub fn arity(&self) -> usize {
        self.field_names.len()
    }

    /// Coerce a composite identifier against the key's field descriptors.
    ///
    /// The identifier must be a list with exactly one value per key field;
    /// each value is coerced by its field, in order.
    pub fn coerce(&self, key_fields: &[FieldDescriptor], id: Value) -> Result<Value, FieldError> {
        let Value::List(values) = id else {
            return Err(FieldError::type_mismatch(format!(
                "composite key expects a list of {} values, found {}",
                self.arity(),
                id.kind_name()
            )));
        };
        if values.len() != key_fields.len() {
            return Err(FieldError::validation(format!(
                "composite key expects {} values, got {}",
                key_fields.len(),
                values.len()
            )));
        }

        key_fields
            .iter()
            .zip(values)
            .map(|(field, value)| field.coerce(value))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List)
    }
}

///
/// PrimaryKey
///

#[derive(Clone, Debug)]
pub enum PrimaryKey {
    Field {
        name: String,
        index_formatter: Option<IndexFormatter>,
    },
    Composite(CompositeKey),
}

impl PrimaryKey {
    pub fn field(name: impl Into<String>) -> Self {
        Self::Field {
            name: name.into(),
            index_formatter: None,
        }
    }

    #[must_use]
    pub fn with_formatter(mut self, formatter: IndexFormatter) -> Self {
        match &mut self {
            Self::Field {
                index_formatter, ..
            } => *index_formatter = Some(formatter),
            Self::Composite(key) => key.index_formatter = Some(formatter),
        }
        self
    }

    #[must_use]
    pub const fn is_composite(&self) -> bool {
        matches!(self, Self::Composite(_))
    }

    pub fn field_names(&self) -> Vec<&str> {
        match self {
            Self::Field { name, .. } => vec![name.as_str()],
            Self::Composite(key) => key.field_names.iter().map(String::as_str).collect(),
        }
    }

    #[must_use]
    pub const fn index_formatter(&self) -> Option<&IndexFormatter> {
        match self {
            Self::Field {
                index_formatter, ..
            } => index_formatter.as_ref(),
            Self::Composite(key) => key.index_formatter.as_ref(),
        }
    }
}

impl From<&str> for PrimaryKey {
    fn from(name: &str) -> Self {
        Self::field(name)
    }
}

impl From<String> for PrimaryKey {
    fn from(name: String) -> Self {
        Self::field(name)
    }
}

impl From<CompositeKey> for PrimaryKey {
    fn from(key: CompositeKey) -> Self {
        Self::Composite(key)
    }
}

///
/// SerializerBinding
///

#[derive(Clone)]
pub enum SerializerBinding {
    /// Resolved through a registry on each use.
    Named(String),
    Instance(Arc<dyn Serializer>),
}

impl fmt::Debug for SerializerBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Self::Instance(codec) => f.debug_tuple("Instance").field(codec).finish(),
        }
    }
}

///
/// Model
///
/// Immutable, cheaply cloneable handle to a declared model.
///

#[derive(Clone)]
pub struct Model {
    inner: Arc<ModelInner>,
}

#[derive(Debug)]
struct ModelInner {
    name: String,
    fields: Vec<FieldDescriptor>,
    positions: HashMap<String, usize>,
    primary_key: PrimaryKey,
    key_positions: Vec<usize>,
    indexes: IndexManager,
    serializer: SerializerBinding,
    ttl: Option<Duration>,
}

impl Model {
    pub fn builder(name: impl Into<String>) -> ModelBuilder {
        ModelBuilder {
            name: name.into(),
            fields: Vec::new(),
            primary_key: None,
            serializer: None,
            ttl: None,
            key_template: None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.inner.fields
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.position(name).map(|i| &self.inner.fields[i])
    }

    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.inner.positions.get(name).copied()
    }

    #[must_use]
    pub fn primary_key(&self) -> &PrimaryKey {
        &self.inner.primary_key
    }

    /// Field positions of the primary key, in key order.
    #[must_use]
    pub fn key_positions(&self) -> &[usize] {
        &self.inner.key_positions
    }

    #[must_use]
    pub fn indexes(&self) -> &IndexManager {
        &self.inner.indexes
    }

    #[must_use]
    pub fn primary_key_index(&self) -> &PrimaryKeyIndex {
        self.inner.indexes.primary_key_index()
    }

    #[must_use]
    pub fn ttl(&self) -> Option<Duration> {
        self.inner.ttl
    }

    #[must_use]
    pub fn serializer_binding(&self) -> &SerializerBinding {
        &self.inner.serializer
    }

    /// Resolve the bound serializer through the process-wide registry.
    pub fn serializer(&self) -> Result<Arc<dyn Serializer>, SerializeError> {
        self.serializer_from(serialize::registry())
    }

    /// Resolve the bound serializer through an injected registry.
    pub fn serializer_from(
        &self,
        registry: &SerializerRegistry,
    ) -> Result<Arc<dyn Serializer>, SerializeError> {
        match &self.inner.serializer {
            SerializerBinding::Named(name) => registry.require(name),
            SerializerBinding::Instance(codec) => Ok(Arc::clone(codec)),
        }
    }

    /// Coerce a caller-facing identifier: a scalar for a single-field key,
    /// a list of values in key order for a composite key.
    pub fn coerce_id(&self, id: impl Into<Value>) -> Result<Value, ModelError> {
        let key_fields = self.primary_key_index().fields();

        let id = match &self.inner.primary_key {
            PrimaryKey::Field { .. } => key_fields[0].coerce(id)?,
            PrimaryKey::Composite(key) => key.coerce(key_fields, id.into())?,
        };

        Ok(id)
    }

    /// Storage key for a bare identifier.
    pub fn key_for_id(&self, id: impl Into<Value>) -> Result<String, ModelError> {
        let id = self.coerce_id(id)?;

        self.key_from_canonical_id(id)
    }

    pub(crate) fn key_from_canonical_id(&self, id: Value) -> Result<String, ModelError> {
        let values = self.split_id(id);

        Ok(self.primary_key_index().key_for(&values)?)
    }

    /// Per-field key values of an already-coerced identifier.
    pub(crate) fn split_id(&self, id: Value) -> Vec<Value> {
        match (&self.inner.primary_key, id) {
            (PrimaryKey::Composite(_), Value::List(values)) => values,
            (_, id) => vec![id],
        }
    }

    /// Identity of the declared model, not structural equality.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Same name, same fields (name, kind, nullability) in the same order,
    /// and the same primary key. Separately built copies of one declaration
    /// match; an unrelated model that reuses the name does not.
    #[must_use]
    pub fn same_layout(&self, other: &Self) -> bool {
        if self.same_as(other) {
            return true;
        }

        self.name() == other.name()
            && self.key_positions() == other.key_positions()
            && self.fields().len() == other.fields().len()
            && self.fields().iter().zip(other.fields()).all(|(a, b)| {
                a.name() == b.name()
                    && a.kind().name() == b.kind().name()
                    && a.is_nullable() == b.is_nullable()
            })
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.inner.name)
            .field("fields", &self.inner.fields.len())
            .field("primary_key", &self.inner.primary_key.field_names())
            .field("serializer", &self.inner.serializer)
            .finish_non_exhaustive()
    }
}

///
/// ModelBuilder
///

#[derive(Debug)]
pub struct ModelBuilder {
    name: String,
    fields: Vec<FieldDescriptor>,
    primary_key: Option<PrimaryKey>,
    serializer: Option<SerializerBinding>,
    ttl: Option<Duration>,
    key_template: Option<String>,
}

impl ModelBuilder {
    #[must_use]
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn fields(mut self, fields: impl IntoIterator<Item = FieldDescriptor>) -> Self {
        self.fields.extend(fields);
        self
    }

    #[must_use]
    pub fn primary_key(mut self, key: impl Into<PrimaryKey>) -> Self {
        self.primary_key = Some(key.into());
        self
    }

    /// Bind a serializer by registry name. Defaults to `json`.
    #[must_use]
    pub fn serializer(mut self, name: impl Into<String>) -> Self {
        self.serializer = Some(SerializerBinding::Named(name.into()));
        self
    }

    /// Bind a serializer instance directly, bypassing the registry.
    #[must_use]
    pub fn serializer_instance(mut self, codec: Arc<dyn Serializer>) -> Self {
        self.serializer = Some(SerializerBinding::Instance(codec));
        self
    }

    #[must_use]
    pub const fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Apply operational settings. Keys absent from the config leave the
    /// builder untouched; `key_template` overrides the primary key's
    /// formatter.
    #[must_use]
    pub fn config(mut self, config: &ModelConfig) -> Self {
        if let Some(name) = &config.serializer {
            self.serializer = Some(SerializerBinding::Named(name.clone()));
        }
        if let Some(ttl) = config.ttl() {
            self.ttl = Some(ttl);
        }
        if let Some(template) = &config.key_template {
            self.key_template = Some(template.clone());
        }
        self
    }

    pub fn build(self) -> Result<Model, ModelError> {
        let name = self.name;

        let mut positions = HashMap::with_capacity(self.fields.len());
        for (i, field) in self.fields.iter().enumerate() {
            if positions.insert(field.name().to_string(), i).is_some() {
                return Err(ModelError::DuplicateField {
                    model: name,
                    field: field.name().to_string(),
                });
            }
            field.validate()?;
        }

        let primary_key = self
            .primary_key
            .ok_or_else(|| ModelError::MissingPrimaryKey { model: name.clone() })?;
        let key_names = primary_key.field_names();
        if primary_key.is_composite() && key_names.len() < 2 {
            return Err(ModelError::CompositeKeyTooShort {
                model: name,
                found: key_names.len(),
            });
        }

        let mut key_positions = Vec::with_capacity(key_names.len());
        for key in &key_names {
            let position = *positions.get(*key).ok_or_else(|| ModelError::UnknownKeyField {
                model: name.clone(),
                field: (*key).to_string(),
            })?;
            if key_positions.contains(&position) {
                return Err(ModelError::DuplicateKeyField {
                    model: name,
                    field: (*key).to_string(),
                });
            }
            key_positions.push(position);
        }

        let formatter = match self.key_template {
            Some(template) => Some(IndexFormatter::from_string_format(template)?),
            None => primary_key.index_formatter().cloned(),
        };
        let key_fields = key_positions
            .iter()
            .map(|&i| self.fields[i].clone())
            .collect();
        let indexes = IndexManager::generate_indexes(&name, key_fields, formatter)?;

        let serializer = self
            .serializer
            .unwrap_or_else(|| SerializerBinding::Named(DEFAULT_SERIALIZER.to_string()));

        tracing::debug!(
            model = %name,
            fields = self.fields.len(),
            primary_key = ?key_names,
            serializer = ?serializer,
            "model built"
        );

        Ok(Model {
            inner: Arc::new(ModelInner {
                name,
                fields: self.fields,
                positions,
                primary_key,
                key_positions,
                indexes,
                serializer,
                ttl: self.ttl,
            }),
        })
    }
}
