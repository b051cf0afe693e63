mod wire;


use crate::types::{EnumMember, StructValue};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use rust_decimal::Decimal;
use std::fmt::{self, Display};
use uuid::Uuid;

// re-exports
pub use wire::{Wire, WireShapeError};

///
/// CONSTANTS
///

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";
pub(crate) const TIME_FORMAT: &str = "%H:%M:%S%.f";
pub(crate) const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

///
/// Value
///
/// Dynamic in-memory value. Used both as the input handed to a field on
/// assignment and as the canonical form a field stores after coercion.
///
/// Null        → absent value; only nullable fields accept it.
/// DateTimeTz  → aware datetime; equality compares instants, not offsets.
/// List        → ordered sequence; also carries composite-key identifiers.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    Text(String),
    Blob(Vec<u8>),
    Uuid(Uuid),
    Enum(EnumMember),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    DateTimeTz(DateTime<FixedOffset>),
    Struct(StructValue),
    Json(serde_json::Value),
    List(Vec<Self>),
}

impl Value {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Short variant label used in diagnostics.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Decimal(_) => "decimal",
            Self::Text(_) => "text",
            Self::Blob(_) => "blob",
            Self::Uuid(_) => "uuid",
            Self::Enum(_) => "enum",
            Self::Date(_) => "date",
            Self::Time(_) => "time",
            Self::DateTime(_) => "datetime",
            Self::DateTimeTz(_) => "datetime_tz",
            Self::Struct(_) => "struct",
            Self::Json(_) => "json",
            Self::List(_) => "list",
        }
    }

    /// Truthiness used by boolean coercion.
    ///
    /// Zero numbers, empty text/bytes/lists and JSON null/false/empty
    /// containers are falsy; everything else is truthy.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(v) => *v,
            Self::Int(v) => *v != 0,
            Self::Float(v) => *v != 0.0,
            Self::Decimal(v) => !v.is_zero(),
            Self::Text(v) => !v.is_empty(),
            Self::Blob(v) => !v.is_empty(),
            Self::List(v) => !v.is_empty(),
            Self::Json(v) => json_is_truthy(v),
            Self::Uuid(_)
            | Self::Enum(_)
            | Self::Date(_)
            | Self::Time(_)
            | Self::DateTime(_)
            | Self::DateTimeTz(_)
            | Self::Struct(_) => true,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(v) => Some(v),
            _ => None,
        }
    }

    /// Build a list value from anything convertible.
    pub fn list<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Self>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

fn json_is_truthy(value: &serde_json::Value) -> bool {
    use serde_json::Value as Json;

    match value {
        Json::Null => false,
        Json::Bool(v) => *v,
        Json::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Json::String(s) => !s.is_empty(),
        Json::Array(a) => !a.is_empty(),
        Json::Object(o) => !o.is_empty(),
    }
}

/// Display renders the key-string form of a value.
///
/// This is the text substituted into `%s` slots of key templates.
impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Decimal(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
            Self::Blob(v) => f.write_str(&String::from_utf8_lossy(v)),
            Self::Uuid(v) => write!(f, "{}", v.hyphenated()),
            Self::Enum(v) => write!(f, "{}", v.value()),
            Self::Date(v) => write!(f, "{}", v.format(DATE_FORMAT)),
            Self::Time(v) => write!(f, "{}", v.format(TIME_FORMAT)),
            Self::DateTime(v) => write!(f, "{}", v.format(DATE_TIME_FORMAT)),
            Self::DateTimeTz(v) => write!(f, "{}", v.to_rfc3339()),
            Self::Struct(v) => write!(f, "{v:?}"),
            Self::Json(v) => write!(f, "{v}"),
            Self::List(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(")")
            }
        }
    }
}

///
/// CONVERSIONS
///

macro_rules! impl_from_for_value {
    ( $( $type:ty => $variant:ident ),* $(,)? ) => {
        $(
            impl From<$type> for Value {
                fn from(v: $type) -> Self {
                    Self::$variant(v.into())
                }
            }
        )*
    };
}

impl_from_for_value! {
    bool => Bool,
    i8 => Int,
    i16 => Int,
    i32 => Int,
    i64 => Int,
    u8 => Int,
    u16 => Int,
    u32 => Int,
    f32 => Float,
    f64 => Float,
    Decimal => Decimal,
    &str => Text,
    String => Text,
    Vec<u8> => Blob,
    &[u8] => Blob,
    Uuid => Uuid,
    EnumMember => Enum,
    NaiveDate => Date,
    NaiveTime => Time,
    NaiveDateTime => DateTime,
    StructValue => Struct,
    serde_json::Value => Json,
    Vec<Value> => List,
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Value {
    fn from(v: DateTime<Tz>) -> Self {
        Self::DateTimeTz(v.fixed_offset())
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl<A: Into<Self>, B: Into<Self>> From<(A, B)> for Value {
    fn from((a, b): (A, B)) -> Self {
        Self::List(vec![a.into(), b.into()])
    }
}

impl<A: Into<Self>, B: Into<Self>, C: Into<Self>> From<(A, B, C)> for Value {
    fn from((a, b, c): (A, B, C)) -> Self {
        Self::List(vec![a.into(), b.into(), c.into()])
    }
}
