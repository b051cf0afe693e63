use crate::{
    serialize::{SerializeError, Serializer},
    value::Wire,
};

///
/// MessagePackSerializer
///
/// Binary-capable codec: raw bytes travel as native `bin` values and text
/// as `str`. Only constructible with the `msgpack` feature.
///

#[derive(Clone, Copy, Debug)]
pub struct MessagePackSerializer {
    _private: (),
}

impl MessagePackSerializer {
    #[cfg(feature = "msgpack")]
    pub fn new() -> Result<Self, SerializeError> {
        Ok(Self { _private: () })
    }

    #[cfg(not(feature = "msgpack"))]
    pub fn new() -> Result<Self, SerializeError> {
        Err(SerializeError::MissingCapability {
            codec: crate::serialize::MSGPACK,
            feature: "msgpack",
        })
    }
}

#[cfg(feature = "msgpack")]
impl Serializer for MessagePackSerializer {
    fn encode(&self, wire: &Wire) -> Result<Vec<u8>, SerializeError> {
        // named maps keep text keys as msgpack strings
        rmp_serde::to_vec(wire).map_err(|e| SerializeError::Serialize(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Wire, SerializeError> {
        SerializeError::check_size(bytes.len(), crate::MAX_PAYLOAD_BYTES)?;

        rmp_serde::from_slice(bytes).map_err(|e| SerializeError::Deserialize(e.to_string()))
    }
}

#[cfg(not(feature = "msgpack"))]
impl Serializer for MessagePackSerializer {
    fn encode(&self, _wire: &Wire) -> Result<Vec<u8>, SerializeError> {
        Self::new().map(|_| Vec::new())
    }

    fn decode(&self, _bytes: &[u8]) -> Result<Wire, SerializeError> {
        Self::new().map(|_| Wire::Null)
    }
}
