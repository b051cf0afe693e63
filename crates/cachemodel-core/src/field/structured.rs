use crate::{
    field::{FieldDescriptor, FieldError},
    types::StructCodec,
    value::{Value, Wire},
};

///
/// STRUCT
///

pub(super) fn coerce_struct(codec: &dyn StructCodec, input: Value) -> Result<Value, FieldError> {
    match input {
        Value::Struct(value) if codec.accepts(&value) => Ok(Value::Struct(value)),
        Value::Struct(value) => Err(FieldError::type_mismatch(format!(
            "struct value {value:?} is not handled by {codec:?}"
        ))),
        other => Err(FieldError::unexpected_value("struct", &other)),
    }
}

pub(super) fn encode_struct(codec: &dyn StructCodec, value: &Value) -> Result<Wire, FieldError> {
    match value {
        Value::Struct(inner) => codec.encode(inner),
        other => Err(FieldError::unexpected_value("struct", other)),
    }
}

pub(super) fn decode_struct(codec: &dyn StructCodec, wire: &Wire) -> Result<Value, FieldError> {
    codec.decode(wire).map(Value::Struct)
}

///
/// JSON
///

fn to_json(value: Value) -> Result<serde_json::Value, FieldError> {
    use serde_json::{Number, Value as Json};

    Ok(match value {
        Value::Json(json) => json,
        Value::Null => Json::Null,
        Value::Bool(v) => Json::Bool(v),
        Value::Int(v) => Json::Number(v.into()),
        Value::Float(v) => Number::from_f64(v)
            .map(Json::Number)
            .ok_or_else(|| FieldError::validation(format!("float {v} has no JSON form")))?,
        Value::Text(v) => Json::String(v),
        Value::List(items) => Json::Array(
            items
                .into_iter()
                .map(to_json)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        other => return Err(FieldError::unexpected_value("JSON-compatible value", &other)),
    })
}

pub(super) fn coerce_json(input: Value) -> Result<Value, FieldError> {
    to_json(input).map(Value::Json)
}

pub(super) fn encode_json(value: &Value) -> Result<Wire, FieldError> {
    match value {
        Value::Json(json) => Ok(Wire::from_json(json.clone())),
        other => Err(FieldError::unexpected_value("json", other)),
    }
}

pub(super) fn decode_json(wire: &Wire) -> Result<Value, FieldError> {
    wire.to_json()
        .map(Value::Json)
        .map_err(|e| FieldError::validation(format!("stored json is malformed: {e}")))
}

///
/// LIST
///

// Element failures keep their kind but report the list's field name.
fn element_error(index: usize, err: FieldError) -> FieldError {
    FieldError {
        kind: err.kind,
        field: None,
        message: format!("element {index}: {}", err.message),
    }
}

pub(super) fn coerce_list(element: &FieldDescriptor, input: Value) -> Result<Value, FieldError> {
    let Value::List(items) = input else {
        return Err(FieldError::unexpected_value("list", &input));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| element.coerce(item).map_err(|e| element_error(i, e)))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::List)
}

pub(super) fn encode_list(element: &FieldDescriptor, value: &Value) -> Result<Wire, FieldError> {
    let Value::List(items) = value else {
        return Err(FieldError::unexpected_value("list", value));
    };

    items
        .iter()
        .enumerate()
        .map(|(i, item)| element.encode(item).map_err(|e| element_error(i, e)))
        .collect::<Result<Vec<_>, _>>()
        .map(Wire::List)
}

pub(super) fn decode_list(element: &FieldDescriptor, wire: Wire) -> Result<Value, FieldError> {
    let Wire::List(items) = wire else {
        return Err(FieldError::unexpected_wire("list", &wire));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| element.decode(item).map_err(|e| element_error(i, e)))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::List)
}
