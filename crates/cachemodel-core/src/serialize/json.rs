use crate::{
    MAX_PAYLOAD_BYTES,
    serialize::{JSON, SerializeError, Serializer},
    value::Wire,
};

///
/// JsonSerializer
///
/// Compact JSON, non-ASCII written as-is. Raw bytes, non-text map keys and
/// non-finite floats are refused with a type error.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn encode(&self, wire: &Wire) -> Result<Vec<u8>, SerializeError> {
        let json = wire
            .to_json()
            .map_err(|e| SerializeError::type_error(JSON, e))?;

        serde_json::to_vec(&json).map_err(|e| SerializeError::Serialize(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Wire, SerializeError> {
        SerializeError::check_size(bytes.len(), MAX_PAYLOAD_BYTES)?;

        serde_json::from_slice::<serde_json::Value>(bytes)
            .map(Wire::from_json)
            .map_err(|e| SerializeError::Deserialize(e.to_string()))
    }
}
