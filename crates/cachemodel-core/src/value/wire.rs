use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{self, MapAccess, SeqAccess, Visitor},
    ser::{SerializeMap, SerializeSeq},
};
use std::fmt;
use thiserror::Error as ThisError;

///
/// Wire
///
/// Codec-friendly intermediate between field encode and a serializer.
/// Field kinds lower canonical values into this shape; serializers turn it
/// into bytes and back.
///
/// Map entries keep insertion order; a record encodes to a map keyed by
/// field name in declaration order.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Wire {
    Null,
    Bool(bool),
    Int(i64),
    /// Unsigned values that do not fit `i64`.
    Uint(u64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    List(Vec<Self>),
    Map(Vec<(Self, Self)>),
}

///
/// WireShapeError
///
/// A wire value that cannot be represented as JSON.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum WireShapeError {
    #[error("raw bytes cannot be represented as text")]
    Bytes,

    #[error("map keys must be text, found {0}")]
    NonTextKey(&'static str),

    #[error("non-finite float cannot be represented")]
    NonFiniteFloat,
}

impl Wire {
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Uint(_) => "uint",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Look up a text-keyed map entry.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Self> {
        match self {
            Self::Map(entries) => entries
                .iter()
                .find(|(k, _)| matches!(k, Self::Text(t) if t == key))
                .map(|(_, v)| v),
            _ => None,
        }
    }

    /// Build a text-keyed map.
    pub fn map<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Self)>,
        K: Into<String>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(k, v)| (Self::Text(k.into()), v))
                .collect(),
        )
    }

    /// Normalise an unsigned integer into the narrowest variant.
    #[must_use]
    pub fn from_u64(v: u64) -> Self {
        i64::try_from(v).map_or(Self::Uint(v), Self::Int)
    }

    /// Lift a JSON value. This conversion is lossless.
    #[must_use]
    pub fn from_json(value: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match value {
            Json::Null => Self::Null,
            Json::Bool(v) => Self::Bool(v),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Self::Uint(u)
                } else {
                    Self::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Json::String(s) => Self::Text(s),
            Json::Array(items) => Self::List(items.into_iter().map(Self::from_json).collect()),
            Json::Object(map) => Self::Map(
                map.into_iter()
                    .map(|(k, v)| (Self::Text(k), Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Lower into JSON.
    ///
    /// Fails on raw bytes, non-text map keys and non-finite floats: JSON has
    /// no representation for them and silently coercing would corrupt data.
    pub fn to_json(&self) -> Result<serde_json::Value, WireShapeError> {
        use serde_json::{Map, Number, Value as Json};

        Ok(match self {
            Self::Null => Json::Null,
            Self::Bool(v) => Json::Bool(*v),
            Self::Int(v) => Json::Number((*v).into()),
            Self::Uint(v) => Json::Number((*v).into()),
            Self::Float(v) => Json::Number(Number::from_f64(*v).ok_or(WireShapeError::NonFiniteFloat)?),
            Self::Text(v) => Json::String(v.clone()),
            Self::Bytes(_) => return Err(WireShapeError::Bytes),
            Self::List(items) => Json::Array(
                items
                    .iter()
                    .map(Self::to_json)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            Self::Map(entries) => {
                let mut map = Map::with_capacity(entries.len());
                for (k, v) in entries {
                    let Self::Text(key) = k else {
                        return Err(WireShapeError::NonTextKey(k.kind_name()));
                    };
                    map.insert(key.clone(), v.to_json()?);
                }
                Json::Object(map)
            }
        })
    }
}

impl Serialize for Wire {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(v) => serializer.serialize_bool(*v),
            Self::Int(v) => serializer.serialize_i64(*v),
            Self::Uint(v) => serializer.serialize_u64(*v),
            Self::Float(v) => serializer.serialize_f64(*v),
            Self::Text(v) => serializer.serialize_str(v),
            Self::Bytes(v) => serde_bytes::Bytes::new(v).serialize(serializer),
            Self::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Wire {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(WireVisitor)
    }
}

///
/// WireVisitor
/// Self-describing decode shape shared by every serde-backed codec.
///

struct WireVisitor;

impl<'de> Visitor<'de> for WireVisitor {
    type Value = Wire;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a self-describing value")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Wire, E> {
        Ok(Wire::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Wire, E> {
        Ok(Wire::Null)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Wire, D::Error>
    where
        D: Deserializer<'de>,
    {
        Wire::deserialize(deserializer)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Wire, E> {
        Ok(Wire::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Wire, E> {
        Ok(Wire::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Wire, E> {
        Ok(Wire::from_u64(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Wire, E> {
        Ok(Wire::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Wire, E> {
        Ok(Wire::Text(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Wire, E> {
        Ok(Wire::Text(v))
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Wire, E> {
        Ok(Wire::Bytes(v.to_vec()))
    }

    fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<Wire, E> {
        Ok(Wire::Bytes(v))
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Wire, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0).min(4096));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Wire::List(items))
    }

    fn visit_map<A>(self, mut map: A) -> Result<Wire, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0).min(4096));
        while let Some(entry) = map.next_entry()? {
            entries.push(entry);
        }
        Ok(Wire::Map(entries))
    }
}
