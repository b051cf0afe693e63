use crate::{
    MAX_PAYLOAD_BYTES,
    serialize::{SerializeError, Serializer},
    value::Wire,
};
use prost::Message;
use serde::{Serialize, de::DeserializeOwned};
use std::{fmt, marker::PhantomData};

const CODEC: &str = "protobuf";

///
/// ProtobufSerializer
///
/// Codec bound to one generated message type `M`. It is never registered
/// by default since each instance only understands its own schema.
///
/// Encoding accepts a text-keyed map, matched to `M` by field name.
/// Decoding yields every declared field with defaults filled in and enum
/// fields as their integer values.
///

pub struct ProtobufSerializer<M> {
    _message: PhantomData<fn() -> M>,
}

impl<M> ProtobufSerializer<M>
where
    M: Message + Default + Serialize + DeserializeOwned,
{
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _message: PhantomData,
        }
    }

    /// Encode an already-built message.
    #[must_use]
    pub fn encode_message(&self, message: &M) -> Vec<u8> {
        message.encode_to_vec()
    }

    pub fn decode_message(&self, bytes: &[u8]) -> Result<M, SerializeError> {
        SerializeError::check_size(bytes.len(), MAX_PAYLOAD_BYTES)?;

        M::decode(bytes).map_err(|e| SerializeError::Deserialize(e.to_string()))
    }

    fn message_from_wire(wire: &Wire) -> Result<M, SerializeError> {
        if !matches!(wire, Wire::Map(_)) {
            return Err(SerializeError::type_error(
                CODEC,
                format!("expected a field map, found {}", wire.kind_name()),
            ));
        }

        let json = wire
            .to_json()
            .map_err(|e| SerializeError::type_error(CODEC, e))?;

        serde_json::from_value(json).map_err(|e| SerializeError::type_error(CODEC, e))
    }
}

impl<M> Default for ProtobufSerializer<M>
where
    M: Message + Default + Serialize + DeserializeOwned,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<M> fmt::Debug for ProtobufSerializer<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProtobufSerializer<{}>", std::any::type_name::<M>())
    }
}

impl<M> Serializer for ProtobufSerializer<M>
where
    M: Message + Default + Serialize + DeserializeOwned,
{
    fn encode(&self, wire: &Wire) -> Result<Vec<u8>, SerializeError> {
        Self::message_from_wire(wire).map(|message| self.encode_message(&message))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Wire, SerializeError> {
        let message = self.decode_message(bytes)?;
        let json =
            serde_json::to_value(&message).map_err(|e| SerializeError::Serialize(e.to_string()))?;

        Ok(Wire::from_json(json))
    }
}
