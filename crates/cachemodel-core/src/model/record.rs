use crate::{
    error::Error,
    field::FieldDescriptor,
    model::{Model, ModelError, PrimaryKey},
    serialize::Serializer,
    value::{Value, Wire},
};
use std::fmt;

///
/// Record
///
/// One instance of a model: a canonical value per field, in declaration
/// order. Every value has passed its field's coercion.
///

#[derive(Clone)]
pub struct Record {
    model: Model,
    values: Vec<Value>,
}

impl Record {
    /// Build a record from `(field, input)` pairs. Omitted fields take their
    /// default, or null when nullable; any other omission is an error.
    pub fn new<I, K, V>(model: &Model, inputs: I) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut slots: Vec<Option<Value>> = vec![None; model.fields().len()];
        for (name, input) in inputs {
            let position = position_of(model, name.as_ref())?;
            slots[position] = Some(model.fields()[position].coerce(input)?);
        }

        let values = fill_slots(model, slots, |field| ModelError::MissingValue {
            model: model.name().to_string(),
            field: field.name().to_string(),
        })?;

        Ok(Self {
            model: model.clone(),
            values,
        })
    }

    #[must_use]
    pub const fn model(&self) -> &Model {
        &self.model
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.model.position(name).map(|i| &self.values[i])
    }

    /// Coerce and assign one field.
    pub fn set(&mut self, name: &str, input: impl Into<Value>) -> Result<(), ModelError> {
        let position = position_of(&self.model, name)?;
        self.values[position] = self.model.fields()[position].coerce(input)?;

        Ok(())
    }

    /// Coerce and assign several fields. Nothing is assigned if any input
    /// fails.
    pub fn update<I, K, V>(&mut self, inputs: I) -> Result<(), ModelError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let staged = inputs
            .into_iter()
            .map(|(name, input)| {
                let position = position_of(&self.model, name.as_ref())?;
                let value = self.model.fields()[position].coerce(input)?;
                Ok((position, value))
            })
            .collect::<Result<Vec<_>, ModelError>>()?;

        for (position, value) in staged {
            self.values[position] = value;
        }

        Ok(())
    }

    /// `(field name, value)` pairs in declaration order.
    pub fn values(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.model
            .fields()
            .iter()
            .map(FieldDescriptor::name)
            .zip(&self.values)
    }

    /// Primary-key values in key order.
    #[must_use]
    pub fn key_values(&self) -> Vec<Value> {
        self.model
            .key_positions()
            .iter()
            .map(|&i| self.values[i].clone())
            .collect()
    }

    /// Caller-facing identifier: the key value itself for a single-field
    /// key, an ordered list for a composite key.
    #[must_use]
    pub fn id(&self) -> Value {
        let mut values = self.key_values();
        match self.model.primary_key() {
            PrimaryKey::Field { .. } => values.pop().unwrap_or(Value::Null),
            PrimaryKey::Composite(_) => Value::List(values),
        }
    }

    /// Assign the identifier. A composite identifier must be a list of
    /// exactly one value per key field.
    pub fn set_id(&mut self, id: impl Into<Value>) -> Result<(), ModelError> {
        let id = self.model.coerce_id(id)?;
        let values = self.model.split_id(id);

        for (&position, value) in self.model.key_positions().iter().zip(values) {
            self.values[position] = value;
        }

        Ok(())
    }

    pub fn storage_key(&self) -> Result<String, ModelError> {
        Ok(self
            .model
            .primary_key_index()
            .key_for(&self.key_values())?)
    }

    /// Lower into a field-name keyed map in declaration order.
    pub fn to_wire(&self) -> Result<Wire, ModelError> {
        let entries = self
            .model
            .fields()
            .iter()
            .zip(&self.values)
            .map(|(field, value)| Ok((field.name(), field.encode(value)?)))
            .collect::<Result<Vec<_>, ModelError>>()?;

        Ok(Wire::map(entries))
    }

    /// Rebuild a record from its map form. Unknown keys are ignored; fields
    /// absent from the map take their default.
    pub fn from_wire(model: &Model, wire: Wire) -> Result<Self, ModelError> {
        let malformed = |message: String| ModelError::MalformedPayload {
            model: model.name().to_string(),
            message,
        };

        let Wire::Map(entries) = wire else {
            return Err(malformed(format!("expected a map, found {}", wire.kind_name())));
        };

        let mut slots: Vec<Option<Value>> = vec![None; model.fields().len()];
        for (key, stored) in entries {
            let Wire::Text(name) = key else {
                return Err(malformed(format!("non-text key of kind {}", key.kind_name())));
            };
            match model.position(&name) {
                Some(position) => {
                    slots[position] = Some(model.fields()[position].decode(stored)?);
                }
                None => tracing::debug!(model = model.name(), field = %name, "ignoring unknown stored field"),
            }
        }

        let values = fill_slots(model, slots, |field| {
            malformed(format!("missing field '{}'", field.name()))
        })?;

        Ok(Self {
            model: model.clone(),
            values,
        })
    }

    /// Encode through `serializer`.
    pub fn encode(&self, serializer: &dyn Serializer) -> Result<Vec<u8>, Error> {
        let wire = self.to_wire()?;

        Ok(serializer.encode(&wire)?)
    }

    /// Decode bytes produced by [`Self::encode`]. Codec and shape failures
    /// are reported as corruption.
    pub fn decode(model: &Model, serializer: &dyn Serializer, bytes: &[u8]) -> Result<Self, Error> {
        let wire = serializer.decode(bytes)?;

        Self::from_wire(model, wire).map_err(|err| match err {
            ModelError::Field(inner) => {
                Error::serialize_corruption(format!("stored value rejected: {inner}"))
            }
            other => other.into(),
        })
    }
}

// Omitted slots take the field's initial value, or `missing` when it has none.
fn fill_slots(
    model: &Model,
    slots: Vec<Option<Value>>,
    missing: impl Fn(&FieldDescriptor) -> ModelError,
) -> Result<Vec<Value>, ModelError> {
    let mut values = Vec::with_capacity(slots.len());
    for (slot, field) in slots.into_iter().zip(model.fields()) {
        let value = match slot {
            Some(value) => value,
            None => field.initial_value().ok_or_else(|| missing(field))??,
        };
        values.push(value);
    }

    Ok(values)
}

fn position_of(model: &Model, name: &str) -> Result<usize, ModelError> {
    model.position(name).ok_or_else(|| ModelError::UnknownField {
        model: model.name().to_string(),
        field: name.to_string(),
    })
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.model.name() == other.model.name() && self.values == other.values
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (name, value) in self.values() {
            map.entry(&name, value);
        }
        map.finish()
    }
}
