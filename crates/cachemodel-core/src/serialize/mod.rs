//! Byte codecs and the serializer registry.
//!
//! A [`Serializer`] turns a [`Wire`] intermediate into bytes and back. It is
//! stateless and carries no knowledge of models or fields. Codecs are
//! looked up by name through a [`SerializerRegistry`]; [`registry()`] is the
//! process-wide instance with the built-ins pre-registered.

mod cbor;
mod json;
mod msgpack;
#[cfg(feature = "protobuf")]
mod protobuf;
mod registry;

#[cfg(test)]
mod tests;

use crate::value::Wire;
use std::{fmt, sync::LazyLock};
use thiserror::Error as ThisError;

// re-exports
pub use cbor::{CborSerializer, from_cbor_bytes, to_cbor_bytes};
pub use json::JsonSerializer;
pub use msgpack::MessagePackSerializer;
#[cfg(feature = "protobuf")]
pub use protobuf::ProtobufSerializer;
pub use registry::SerializerRegistry;

/// Name of the JSON built-in.
pub const JSON: &str = "json";
/// Name of the MessagePack built-in.
pub const MSGPACK: &str = "msgpack";
/// Name of the CBOR built-in, the fallback for shapes the other codecs refuse.
pub const CBOR: &str = "cbor";

///
/// SerializeError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum SerializeError {
    /// The codec cannot represent this intermediate shape.
    #[error("{codec} cannot encode this value: {message}")]
    Type {
        codec: &'static str,
        message: String,
    },

    #[error("serialize error: {0}")]
    Serialize(String),

    #[error("deserialize error: {0}")]
    Deserialize(String),

    #[error("deserialize size limit exceeded: {len} bytes (limit {max_bytes})")]
    DeserializeSizeLimitExceeded { len: usize, max_bytes: usize },

    #[error("serializer '{0}' is already registered")]
    AlreadyExists(String),

    #[error("serializer '{0}' is not registered")]
    NotFound(String),

    #[error("{codec} codec is unavailable: enable the '{feature}' feature")]
    MissingCapability {
        codec: &'static str,
        feature: &'static str,
    },
}

///
/// SerializeErrorKind
///
/// Stable error-kind taxonomy for serializer failures.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SerializeErrorKind {
    Type,
    Serialize,
    Deserialize,
    DeserializeSizeLimitExceeded,
    AlreadyExists,
    NotFound,
    MissingCapability,
}

impl SerializeErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Type => "type",
            Self::Serialize => "serialize",
            Self::Deserialize => "deserialize",
            Self::DeserializeSizeLimitExceeded => "deserialize_size_limit_exceeded",
            Self::AlreadyExists => "already_exists",
            Self::NotFound => "not_found",
            Self::MissingCapability => "missing_capability",
        }
    }
}

impl fmt::Display for SerializeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SerializeError {
    /// Return a stable error kind independent of backend error-message text.
    #[must_use]
    pub const fn kind(&self) -> SerializeErrorKind {
        match self {
            Self::Type { .. } => SerializeErrorKind::Type,
            Self::Serialize(_) => SerializeErrorKind::Serialize,
            Self::Deserialize(_) => SerializeErrorKind::Deserialize,
            Self::DeserializeSizeLimitExceeded { .. } => {
                SerializeErrorKind::DeserializeSizeLimitExceeded
            }
            Self::AlreadyExists(_) => SerializeErrorKind::AlreadyExists,
            Self::NotFound(_) => SerializeErrorKind::NotFound,
            Self::MissingCapability { .. } => SerializeErrorKind::MissingCapability,
        }
    }

    pub(crate) fn type_error(codec: &'static str, message: impl fmt::Display) -> Self {
        Self::Type {
            codec,
            message: message.to_string(),
        }
    }

    pub(crate) fn check_size(len: usize, max_bytes: usize) -> Result<(), Self> {
        if len > max_bytes {
            return Err(Self::DeserializeSizeLimitExceeded { len, max_bytes });
        }

        Ok(())
    }
}

///
/// Serializer
///
/// Stateless byte codec over [`Wire`]. Implementations must be safe to
/// share across threads.
///

pub trait Serializer: fmt::Debug + Send + Sync {
    fn encode(&self, wire: &Wire) -> Result<Vec<u8>, SerializeError>;

    fn decode(&self, bytes: &[u8]) -> Result<Wire, SerializeError>;
}

static REGISTRY: LazyLock<SerializerRegistry> = LazyLock::new(SerializerRegistry::with_builtins);

/// Process-wide registry, created on first use with the built-ins.
#[must_use]
pub fn registry() -> &'static SerializerRegistry {
    &REGISTRY
}
