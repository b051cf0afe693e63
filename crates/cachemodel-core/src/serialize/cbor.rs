use crate::{
    MAX_PAYLOAD_BYTES,
    serialize::{SerializeError, Serializer},
    value::Wire,
};
use serde::{Serialize, de::DeserializeOwned};
use serde_cbor::{from_slice, to_vec};
use std::panic::{AssertUnwindSafe, catch_unwind};

/// Serialize any serde value into CBOR bytes.
pub fn to_cbor_bytes<T>(t: &T) -> Result<Vec<u8>, SerializeError>
where
    T: Serialize,
{
    to_vec(t).map_err(|e| SerializeError::Serialize(e.to_string()))
}

/// Deserialize CBOR bytes into a value, refusing payloads over `max_bytes`.
///
/// Any panic during decode is caught and reported as a deserialize error.
pub fn from_cbor_bytes<T>(bytes: &[u8], max_bytes: usize) -> Result<T, SerializeError>
where
    T: DeserializeOwned,
{
    SerializeError::check_size(bytes.len(), max_bytes)?;

    match catch_unwind(AssertUnwindSafe(|| from_slice(bytes))) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(SerializeError::Deserialize(err.to_string())),
        Err(_) => Err(SerializeError::Deserialize(
            "panic during CBOR deserialization".into(),
        )),
    }
}

///
/// CborSerializer
///
/// Carries every `Wire` shape, including raw bytes and non-text map keys.
///

#[derive(Clone, Copy, Debug)]
pub struct CborSerializer {
    max_bytes: usize,
}

impl CborSerializer {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_bytes: MAX_PAYLOAD_BYTES,
        }
    }

    #[must_use]
    pub const fn with_max_bytes(max_bytes: usize) -> Self {
        Self { max_bytes }
    }
}

impl Default for CborSerializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Serializer for CborSerializer {
    fn encode(&self, wire: &Wire) -> Result<Vec<u8>, SerializeError> {
        to_cbor_bytes(wire)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Wire, SerializeError> {
        from_cbor_bytes(bytes, self.max_bytes)
    }
}
