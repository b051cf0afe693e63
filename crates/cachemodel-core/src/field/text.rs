use crate::{
    field::FieldError,
    types::{EnumDef, EnumLiteral, short_uuid},
    value::{Value, Wire},
};
use uuid::Uuid;

///
/// STRING
///

pub(super) fn coerce_string(input: Value) -> Result<Value, FieldError> {
    match input {
        Value::Text(s) => Ok(Value::Text(s)),
        Value::Blob(bytes) => String::from_utf8(bytes)
            .map(Value::Text)
            .map_err(|_| FieldError::validation("bytes are not valid UTF-8")),
        scalar @ (Value::Bool(_)
        | Value::Int(_)
        | Value::Float(_)
        | Value::Decimal(_)
        | Value::Uuid(_)) => Ok(Value::Text(scalar.to_string())),
        other => Err(FieldError::unexpected_value("text", &other)),
    }
}

pub(super) fn encode_string(value: &Value) -> Result<Wire, FieldError> {
    match value {
        Value::Text(s) => Ok(Wire::Text(s.clone())),
        other => Err(FieldError::unexpected_value("text", other)),
    }
}

pub(super) fn decode_string(wire: Wire) -> Result<Value, FieldError> {
    match wire {
        Wire::Text(s) => Ok(Value::Text(s)),
        Wire::Bytes(bytes) => String::from_utf8(bytes)
            .map(Value::Text)
            .map_err(|_| FieldError::validation("stored bytes are not valid UTF-8")),
        other => Err(FieldError::unexpected_wire("text", &other)),
    }
}

///
/// BINARY
///
/// Canonical form is always a byte vector. With `ensure_str` the content must
/// be text: raw bytes that are not UTF-8 are refused on assignment and the
/// value travels as text. Without it the value travels as raw bytes and only
/// a bytes-capable codec can carry it.
///

pub(super) fn coerce_binary(ensure_str: bool, input: Value) -> Result<Value, FieldError> {
    match input {
        Value::Text(s) => Ok(Value::Blob(s.into_bytes())),
        Value::Blob(bytes) if ensure_str && std::str::from_utf8(&bytes).is_err() => Err(
            FieldError::type_mismatch("raw bytes are not text; disable ensure_str to store them"),
        ),
        Value::Blob(bytes) => Ok(Value::Blob(bytes)),
        other => Err(FieldError::unexpected_value("bytes or text", &other)),
    }
}

pub(super) fn encode_binary(ensure_str: bool, value: &Value) -> Result<Wire, FieldError> {
    let Value::Blob(bytes) = value else {
        return Err(FieldError::unexpected_value("bytes", value));
    };

    if ensure_str {
        String::from_utf8(bytes.clone())
            .map(Wire::Text)
            .map_err(|_| FieldError::type_mismatch("raw bytes are not text"))
    } else {
        Ok(Wire::Bytes(bytes.clone()))
    }
}

pub(super) fn decode_binary(wire: Wire) -> Result<Value, FieldError> {
    match wire {
        Wire::Bytes(bytes) => Ok(Value::Blob(bytes)),
        Wire::Text(s) => Ok(Value::Blob(s.into_bytes())),
        other => Err(FieldError::unexpected_wire("bytes", &other)),
    }
}

///
/// UUID
///

fn parse_uuid(text: &str) -> Result<Uuid, FieldError> {
    Uuid::parse_str(text.trim())
        .map_err(|e| FieldError::validation(format!("invalid uuid '{text}': {e}")))
}

pub(super) fn coerce_uuid(input: Value) -> Result<Value, FieldError> {
    match input {
        Value::Uuid(u) => Ok(Value::Uuid(u)),
        Value::Text(s) => parse_uuid(&s).map(Value::Uuid),
        Value::Blob(bytes) => Uuid::from_slice(&bytes)
            .map(Value::Uuid)
            .map_err(|e| FieldError::validation(format!("invalid uuid bytes: {e}"))),
        other => Err(FieldError::unexpected_value("uuid", &other)),
    }
}

pub(super) fn encode_uuid(value: &Value) -> Result<Wire, FieldError> {
    match value {
        Value::Uuid(u) => Ok(Wire::Text(u.simple().to_string())),
        other => Err(FieldError::unexpected_value("uuid", other)),
    }
}

pub(super) fn decode_uuid(wire: Wire) -> Result<Value, FieldError> {
    match wire {
        Wire::Text(s) => parse_uuid(&s).map(Value::Uuid),
        other => Err(FieldError::unexpected_wire("uuid", &other)),
    }
}

pub(super) fn encode_short_uuid(value: &Value) -> Result<Wire, FieldError> {
    match value {
        Value::Uuid(u) => Ok(Wire::Text(short_uuid::encode(u))),
        other => Err(FieldError::unexpected_value("uuid", other)),
    }
}

pub(super) fn decode_short_uuid(wire: Wire) -> Result<Value, FieldError> {
    match wire {
        Wire::Text(s) => short_uuid::decode(&s)
            .map(Value::Uuid)
            .ok_or_else(|| FieldError::validation(format!("invalid short uuid '{s}'"))),
        other => Err(FieldError::unexpected_wire("short uuid", &other)),
    }
}

///
/// ENUM
///

pub(super) fn coerce_enum(def: &EnumDef, input: &Value) -> Result<Value, FieldError> {
    def.lookup(input).map(Value::Enum).ok_or_else(|| {
        FieldError::validation(format!("{input} is not a valid {}", def.name()))
    })
}

pub(super) fn encode_enum(value: &Value) -> Result<Wire, FieldError> {
    match value {
        Value::Enum(member) => Ok(member.value().to_wire()),
        other => Err(FieldError::unexpected_value("enum member", other)),
    }
}

pub(super) fn decode_enum(def: &EnumDef, wire: &Wire) -> Result<Value, FieldError> {
    EnumLiteral::from_wire(wire)
        .and_then(|literal| def.lookup_literal(&literal))
        .map(Value::Enum)
        .ok_or_else(|| {
            FieldError::validation(format!(
                "stored {} is not a valid {}",
                wire.kind_name(),
                def.name()
            ))
        })
}
