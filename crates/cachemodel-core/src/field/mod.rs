//! Field coercion engine.
//!
//! Every field kind defines three steps:
//! - `coerce`: accepted input → canonical [`Value`]
//! - `encode`: canonical value → codec-friendly [`Wire`]
//! - `decode`: [`Wire`] → canonical value
//!
//! Coercion is idempotent and `decode(encode(v)) == v` under the kind's
//! natural equality. Null handling lives on [`FieldDescriptor`]; kind
//! functions never see `Value::Null` or `Wire::Null`.

mod numeric;
mod structured;
mod temporal;
mod text;


use crate::{
    types::{EnumDef, StructCodec},
    value::{Value, Wire},
};
use std::{fmt, sync::Arc};
use thiserror::Error as ThisError;

// re-exports
pub use numeric::{DecimalSpec, Rounding};
pub use temporal::{TemporalFormats, TimestampResolution, TimestampSpec};

///
/// FieldErrorKind
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FieldErrorKind {
    /// Input could not be parsed or matched into canonical form.
    Validation,
    /// Input has a fundamentally wrong shape for the field.
    Type,
}

impl fmt::Display for FieldErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => f.write_str("validation error"),
            Self::Type => f.write_str("type error"),
        }
    }
}

///
/// FieldError
///
/// Raised synchronously when a value is assigned, encoded or decoded.
/// `field` is attached by the descriptor that ran the kind rule.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("{kind}{}: {message}", .field.as_ref().map(|f| format!(" on field '{f}'")).unwrap_or_default())]
pub struct FieldError {
    pub kind: FieldErrorKind,
    pub field: Option<String>,
    pub message: String,
}

impl FieldError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            kind: FieldErrorKind::Validation,
            field: None,
            message: message.into(),
        }
    }

    pub fn type_mismatch(message: impl Into<String>) -> Self {
        Self {
            kind: FieldErrorKind::Type,
            field: None,
            message: message.into(),
        }
    }

    /// Type error for an input variant the kind does not accept.
    pub(crate) fn unexpected_value(expected: &str, found: &Value) -> Self {
        Self::type_mismatch(format!("expected {expected}, found {}", found.kind_name()))
    }

    /// Validation error for a stored intermediate of the wrong shape.
    pub(crate) fn unexpected_wire(expected: &str, found: &Wire) -> Self {
        Self::validation(format!(
            "cannot decode {expected} from {}",
            found.kind_name()
        ))
    }

    #[must_use]
    pub fn with_field(mut self, field: &str) -> Self {
        if self.field.is_none() {
            self.field = Some(field.to_owned());
        }
        self
    }

    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self.kind, FieldErrorKind::Validation)
    }

    #[must_use]
    pub const fn is_type(&self) -> bool {
        matches!(self.kind, FieldErrorKind::Type)
    }
}

///
/// FieldKind
///
/// Declaration-time kind plus kind-specific parameters.
///

#[derive(Clone, Debug)]
pub enum FieldKind {
    Integer,
    Float,
    Decimal(DecimalSpec),
    Boolean,
    String,
    Binary {
        /// Require text-convertible content; encodes as text when set.
        ensure_str: bool,
    },
    Uuid,
    ShortUuid,
    Enum(Arc<EnumDef>),
    Date(TemporalFormats),
    Time(TemporalFormats),
    DateTime(TemporalFormats),
    DateTimeTz,
    Timestamp(TimestampSpec),
    Struct(Arc<dyn StructCodec>),
    Json,
    List(Box<FieldDescriptor>),
}

impl FieldKind {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Decimal(_) => "decimal",
            Self::Boolean => "boolean",
            Self::String => "string",
            Self::Binary { .. } => "binary",
            Self::Uuid => "uuid",
            Self::ShortUuid => "short_uuid",
            Self::Enum(_) => "enum",
            Self::Date(_) => "date",
            Self::Time(_) => "time",
            Self::DateTime(_) => "datetime",
            Self::DateTimeTz => "datetime_tz",
            Self::Timestamp(_) => "timestamp",
            Self::Struct(_) => "struct",
            Self::Json => "json",
            Self::List(_) => "list",
        }
    }

    fn coerce(&self, input: Value) -> Result<Value, FieldError> {
        match self {
            Self::Integer => numeric::coerce_integer(input),
            Self::Float => numeric::coerce_float(input),
            Self::Decimal(spec) => numeric::coerce_decimal(spec, input),
            Self::Boolean => Ok(Value::Bool(input.is_truthy())),
            Self::String => text::coerce_string(input),
            Self::Binary { ensure_str } => text::coerce_binary(*ensure_str, input),
            Self::Uuid | Self::ShortUuid => text::coerce_uuid(input),
            Self::Enum(def) => text::coerce_enum(def, &input),
            Self::Date(formats) => temporal::coerce_date(formats, input),
            Self::Time(formats) => temporal::coerce_time(formats, input),
            Self::DateTime(formats) => temporal::coerce_datetime(formats, input),
            Self::DateTimeTz => temporal::coerce_datetime_tz(input),
            Self::Timestamp(spec) => temporal::coerce_timestamp(spec, input),
            Self::Struct(codec) => structured::coerce_struct(codec.as_ref(), input),
            Self::Json => structured::coerce_json(input),
            Self::List(element) => structured::coerce_list(element, input),
        }
    }

    fn encode(&self, value: &Value) -> Result<Wire, FieldError> {
        match self {
            Self::Integer => numeric::encode_integer(value),
            Self::Float => numeric::encode_float(value),
            Self::Decimal(_) => numeric::encode_decimal(value),
            Self::Boolean => match value {
                Value::Bool(v) => Ok(Wire::Bool(*v)),
                other => Err(FieldError::unexpected_value("bool", other)),
            },
            Self::String => text::encode_string(value),
            Self::Binary { ensure_str } => text::encode_binary(*ensure_str, value),
            Self::Uuid => text::encode_uuid(value),
            Self::ShortUuid => text::encode_short_uuid(value),
            Self::Enum(_) => text::encode_enum(value),
            Self::Date(_) => temporal::encode_date(value),
            Self::Time(_) => temporal::encode_time(value),
            Self::DateTime(_) => temporal::encode_datetime(value),
            Self::DateTimeTz => temporal::encode_datetime_tz(value),
            Self::Timestamp(spec) => temporal::encode_timestamp(spec, value),
            Self::Struct(codec) => structured::encode_struct(codec.as_ref(), value),
            Self::Json => structured::encode_json(value),
            Self::List(element) => structured::encode_list(element, value),
        }
    }

    fn decode(&self, wire: Wire) -> Result<Value, FieldError> {
        match self {
            Self::Integer => numeric::decode_integer(wire),
            Self::Float => numeric::decode_float(wire),
            Self::Decimal(spec) => numeric::decode_decimal(spec, wire),
            Self::Boolean => match wire {
                Wire::Bool(v) => Ok(Value::Bool(v)),
                Wire::Int(v) => Ok(Value::Bool(v != 0)),
                other => Err(FieldError::unexpected_wire("bool", &other)),
            },
            Self::String => text::decode_string(wire),
            Self::Binary { .. } => text::decode_binary(wire),
            Self::Uuid => text::decode_uuid(wire),
            Self::ShortUuid => text::decode_short_uuid(wire),
            Self::Enum(def) => text::decode_enum(def, &wire),
            Self::Date(formats) => temporal::decode_date(formats, wire),
            Self::Time(formats) => temporal::decode_time(formats, wire),
            Self::DateTime(formats) => temporal::decode_datetime(formats, wire),
            Self::DateTimeTz => temporal::decode_datetime_tz(wire),
            Self::Timestamp(spec) => temporal::decode_timestamp(spec, wire),
            Self::Struct(codec) => structured::decode_struct(codec.as_ref(), &wire),
            Self::Json => structured::decode_json(&wire),
            Self::List(element) => structured::decode_list(element, wire),
        }
    }
}

///
/// FieldDescriptor
///
/// A typed, named slot: kind, nullability and an optional default.
/// Built once when a model is declared and read-only afterwards.
///

#[derive(Clone, Debug)]
pub struct FieldDescriptor {
    name: String,
    kind: FieldKind,
    nullable: bool,
    default: Option<Value>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            nullable: false,
            default: None,
        }
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Integer)
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Float)
    }

    pub fn decimal(name: impl Into<String>, spec: DecimalSpec) -> Self {
        Self::new(name, FieldKind::Decimal(spec))
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::String)
    }

    /// Binary field with `ensure_str` enabled.
    pub fn binary(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Binary { ensure_str: true })
    }

    /// Binary field that keeps raw bytes; requires a bytes-capable codec.
    pub fn raw_binary(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Binary { ensure_str: false })
    }

    pub fn uuid(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Uuid)
    }

    pub fn short_uuid(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::ShortUuid)
    }

    pub fn enumeration(name: impl Into<String>, def: Arc<EnumDef>) -> Self {
        Self::new(name, FieldKind::Enum(def))
    }

    pub fn date(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Date(TemporalFormats::date()))
    }

    pub fn time(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Time(TemporalFormats::time()))
    }

    pub fn datetime(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::DateTime(TemporalFormats::datetime()))
    }

    pub fn datetime_tz(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::DateTimeTz)
    }

    pub fn timestamp(name: impl Into<String>, spec: TimestampSpec) -> Self {
        Self::new(name, FieldKind::Timestamp(spec))
    }

    pub fn structure(name: impl Into<String>, codec: Arc<dyn StructCodec>) -> Self {
        Self::new(name, FieldKind::Struct(codec))
    }

    pub fn json(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Json)
    }

    /// List whose elements follow `element`. The element's name is only
    /// used in diagnostics.
    pub fn list(name: impl Into<String>, element: Self) -> Self {
        Self::new(name, FieldKind::List(Box::new(element)))
    }

    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Static default applied when a record is created without this field.
    #[must_use]
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Replace the accepted text formats of a date/time/datetime field.
    /// Other kinds ignore formats.
    #[must_use]
    pub fn formats<I, S>(mut self, formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        match &mut self.kind {
            FieldKind::Date(f) | FieldKind::Time(f) | FieldKind::DateTime(f) => {
                *f = TemporalFormats::new(formats);
            }
            _ => {}
        }
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn kind(&self) -> &FieldKind {
        &self.kind
    }

    #[must_use]
    pub const fn is_nullable(&self) -> bool {
        self.nullable
    }

    #[must_use]
    pub const fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Check declaration-time constraints.
    ///
    /// Runs once when the owning model is built.
    pub fn validate(&self) -> Result<(), FieldError> {
        self.validate_kind().map_err(|e| e.with_field(&self.name))
    }

    fn validate_kind(&self) -> Result<(), FieldError> {
        match &self.kind {
            FieldKind::Decimal(spec) => spec.validate()?,
            FieldKind::Date(f) | FieldKind::Time(f) | FieldKind::DateTime(f) => f.validate()?,
            FieldKind::List(element) => element.validate()?,
            _ => {}
        }

        if let Some(default) = &self.default {
            let coerced = self.coerce(default.clone())?;
            self.encode(&coerced)?;
        }

        Ok(())
    }

    /// Coerce an assignment input into canonical form.
    pub fn coerce(&self, input: impl Into<Value>) -> Result<Value, FieldError> {
        match input.into() {
            Value::Null if self.nullable => Ok(Value::Null),
            Value::Null => Err(FieldError::validation("value may not be null").with_field(&self.name)),
            input => self.kind.coerce(input).map_err(|e| e.with_field(&self.name)),
        }
    }

    /// Lower a canonical value into its intermediate.
    pub fn encode(&self, value: &Value) -> Result<Wire, FieldError> {
        match value {
            Value::Null if self.nullable => Ok(Wire::Null),
            Value::Null => Err(FieldError::validation("value may not be null").with_field(&self.name)),
            value => self.kind.encode(value).map_err(|e| e.with_field(&self.name)),
        }
    }

    /// Lift an intermediate back into canonical form.
    pub fn decode(&self, wire: Wire) -> Result<Value, FieldError> {
        match wire {
            Wire::Null if self.nullable => Ok(Value::Null),
            Wire::Null => Err(
                FieldError::validation("stored value is null for a non-nullable field")
                    .with_field(&self.name),
            ),
            wire => self.kind.decode(wire).map_err(|e| e.with_field(&self.name)),
        }
    }

    /// Value used when a record omits this field, already coerced.
    pub(crate) fn initial_value(&self) -> Option<Result<Value, FieldError>> {
        match &self.default {
            Some(default) => Some(self.coerce(default.clone())),
            None if self.nullable => Some(Ok(Value::Null)),
            None => None,
        }
    }
}
