use super::*;
use crate::{
    ErrorClass,
    field::{DecimalSpec, FieldError},
    serialize::{CborSerializer, JsonSerializer},
    value::Wire,
};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

fn user() -> Model {
    Model::builder("user")
        .field(FieldDescriptor::integer("id"))
        .field(FieldDescriptor::string("name"))
        .field(FieldDescriptor::integer("age").default(18))
        .field(FieldDescriptor::string("email").nullable())
        .primary_key("id")
        .build()
        .expect("user model")
}

fn order() -> Model {
    Model::builder("order")
        .field(FieldDescriptor::string("shop"))
        .field(FieldDescriptor::integer("number"))
        .field(FieldDescriptor::decimal("total", DecimalSpec::new(2).auto_round()))
        .primary_key(CompositeKey::new(["shop", "number"]))
        .build()
        .expect("order model")
}

///
/// DECLARATION
///

#[test]
fn single_key_model_defaults() {
    let model = user();

    assert_eq!(model.name(), "user");
    assert_eq!(model.fields().len(), 4);
    assert!(!model.primary_key().is_composite());
    assert!(matches!(model.serializer_binding(), SerializerBinding::Named(n) if n == "json"));
    assert_eq!(model.key_for_id("7"), Ok("m:user:id:7".to_string()));
}

#[test]
fn declaration_errors() {
    let dup = Model::builder("m")
        .field(FieldDescriptor::integer("a"))
        .field(FieldDescriptor::string("a"))
        .primary_key("a")
        .build();
    assert!(matches!(dup, Err(ModelError::DuplicateField { .. })));

    let no_pk = Model::builder("m").field(FieldDescriptor::integer("a")).build();
    assert!(matches!(no_pk, Err(ModelError::MissingPrimaryKey { .. })));

    let unknown = Model::builder("m")
        .field(FieldDescriptor::integer("a"))
        .primary_key("b")
        .build();
    assert!(matches!(unknown, Err(ModelError::UnknownKeyField { .. })));

    let short = Model::builder("m")
        .field(FieldDescriptor::integer("a"))
        .primary_key(CompositeKey::new(["a"]))
        .build();
    assert!(matches!(short, Err(ModelError::CompositeKeyTooShort { found: 1, .. })));

    let repeated = Model::builder("m")
        .field(FieldDescriptor::integer("a"))
        .primary_key(CompositeKey::new(["a", "a"]))
        .build();
    assert!(matches!(repeated, Err(ModelError::DuplicateKeyField { .. })));
}

#[test]
fn bad_default_fails_declaration() {
    let result = Model::builder("m")
        .field(FieldDescriptor::integer("a").default("not a number"))
        .primary_key("a")
        .build();

    assert!(matches!(result, Err(ModelError::Field(e)) if e.is_validation()));
}

#[test]
fn key_formatter_arity_is_checked_at_build() {
    let formatter = IndexFormatter::from_string_format("o:%s").unwrap();
    let result = Model::builder("order")
        .field(FieldDescriptor::string("shop"))
        .field(FieldDescriptor::integer("number"))
        .primary_key(CompositeKey::new(["shop", "number"]).index_formatter(formatter))
        .build();

    assert!(matches!(result, Err(ModelError::Index(IndexError::ArityMismatch { .. }))));
}

///
/// COMPOSITE KEYS
///

#[test]
fn composite_key_uses_declaration_order() {
    let model = order();

    assert_eq!(
        model.key_for_id(Value::list(["acme", "42"])),
        Ok("m:order:shop:acme:number:42".to_string())
    );
}

#[test]
fn composite_key_with_custom_template() {
    let model = Model::builder("order")
        .field(FieldDescriptor::string("shop"))
        .field(FieldDescriptor::integer("number"))
        .primary_key(
            CompositeKey::new(["shop", "number"])
                .index_formatter(IndexFormatter::from_string_format("o/%s/%s").unwrap()),
        )
        .build()
        .unwrap();

    assert_eq!(model.key_for_id(("acme", 1)), Ok("o/acme/1".to_string()));
}

#[test]
fn composite_id_shape_errors() {
    let model = order();

    let not_list = model.coerce_id("acme").unwrap_err();
    assert!(matches!(&not_list, ModelError::Field(e) if e.is_type()));

    let too_long = model.coerce_id(("acme", 1, 2)).unwrap_err();
    assert!(matches!(&too_long, ModelError::Field(e) if e.is_validation()));
}

#[test]
fn set_id_assigns_each_key_field() {
    let model = order();
    let mut record = Record::new(&model, [("shop", "a"), ("number", "1"), ("total", "0")]).unwrap();

    record.set_id(("b", 2)).unwrap();
    assert_eq!(record.get("shop"), Some(&Value::from("b")));
    assert_eq!(record.get("number"), Some(&Value::Int(2)));
    assert_eq!(record.id(), Value::list([Value::from("b"), Value::Int(2)]));

    assert!(record.set_id(Value::list(["c"])).is_err());
    assert_eq!(record.get("shop"), Some(&Value::from("b")));
}

///
/// RECORDS
///

#[test]
fn record_applies_defaults_and_nulls() {
    let record = Record::new(&user(), [("id", Value::from(1)), ("name", Value::from("ann"))]).unwrap();

    assert_eq!(record.get("age"), Some(&Value::Int(18)));
    assert_eq!(record.get("email"), Some(&Value::Null));
    assert_eq!(record.id(), Value::Int(1));
    assert_eq!(record.storage_key(), Ok("m:user:id:1".to_string()));
}

#[test]
fn record_requires_values_without_defaults() {
    let err = Record::new(&user(), [("id", 1)]).unwrap_err();
    assert_eq!(
        err,
        ModelError::MissingValue {
            model: "user".into(),
            field: "name".into()
        }
    );
}

#[test]
fn record_rejects_unknown_fields() {
    let err = Record::new(&user(), [("id", "1"), ("name", "a"), ("nick", "b")]).unwrap_err();
    assert!(matches!(err, ModelError::UnknownField { field, .. } if field == "nick"));
}

#[test]
fn update_is_all_or_nothing() {
    let mut record = Record::new(&user(), [("id", "1"), ("name", "a")]).unwrap();

    let err = record
        .update([("name", Value::from("b")), ("age", Value::from("old"))])
        .unwrap_err();
    assert!(matches!(err, ModelError::Field(FieldError { .. })));
    assert_eq!(record.get("name"), Some(&Value::from("a")));

    record.update([("name", "b"), ("age", "30")]).unwrap();
    assert_eq!(record.get("age"), Some(&Value::Int(30)));
}

#[test]
fn wire_map_follows_declaration_order() {
    let record = Record::new(&user(), [("name", "ann"), ("id", "3")]).unwrap();
    let Wire::Map(entries) = record.to_wire().unwrap() else {
        panic!("record encodes to a map");
    };

    let keys: Vec<_> = entries
        .iter()
        .map(|(k, _)| match k {
            Wire::Text(t) => t.as_str(),
            _ => "?",
        })
        .collect();
    assert_eq!(keys, ["id", "name", "age", "email"]);
}

#[test]
fn from_wire_fills_defaults_and_ignores_extras() {
    let model = user();
    let wire = Wire::map([
        ("id", Wire::Int(5)),
        ("name", Wire::Text("x".into())),
        ("legacy", Wire::Bool(true)),
    ]);

    let record = Record::from_wire(&model, wire).unwrap();
    assert_eq!(record.get("age"), Some(&Value::Int(18)));
}

#[test]
fn from_wire_rejects_malformed_payloads() {
    let model = user();

    let not_map = Record::from_wire(&model, Wire::List(Vec::new())).unwrap_err();
    assert!(matches!(not_map, ModelError::MalformedPayload { .. }));

    let missing = Record::from_wire(&model, Wire::map([("id", Wire::Int(1))])).unwrap_err();
    assert!(matches!(missing, ModelError::MalformedPayload { .. }));
}

#[test]
fn codec_round_trip_preserves_record() {
    let model = order();
    let record = Record::new(&model, [("shop", "a"), ("number", "9"), ("total", "6.789")]).unwrap();
    assert_eq!(
        record.get("total"),
        Some(&Value::Decimal(Decimal::from_str("6.79").unwrap()))
    );

    for codec in [&JsonSerializer as &dyn Serializer, &CborSerializer::new()] {
        let bytes = record.encode(codec).unwrap();
        assert_eq!(Record::decode(&model, codec, &bytes).unwrap(), record);
    }
}

#[test]
fn raw_bytes_refused_by_json_at_encode() {
    let model = Model::builder("blob")
        .field(FieldDescriptor::integer("id"))
        .field(FieldDescriptor::raw_binary("data"))
        .primary_key("id")
        .build()
        .unwrap();
    let record = Record::new(&model, [("id", Value::from(1)), ("data", Value::from(vec![0xff_u8]))])
        .unwrap();

    let err = record.encode(&JsonSerializer).unwrap_err();
    assert_eq!(err.class, ErrorClass::Type);

    let bytes = record.encode(&CborSerializer::new()).unwrap();
    assert_eq!(Record::decode(&model, &CborSerializer::new(), &bytes).unwrap(), record);
}

#[test]
fn decode_of_bad_stored_value_is_corruption() {
    let model = user();
    let bytes = br#"{"id":"seven","name":"x"}"#;

    let err = Record::decode(&model, &JsonSerializer, bytes).unwrap_err();
    assert_eq!(err.class, ErrorClass::Corruption);
}

///
/// SERIALIZER BINDING / CONFIG
///

#[test]
fn serializer_resolves_from_injected_registry() {
    let registry = SerializerRegistry::new();
    registry.register("house", Arc::new(CborSerializer::new())).unwrap();

    let model = Model::builder("m")
        .field(FieldDescriptor::integer("id"))
        .primary_key("id")
        .serializer("house")
        .build()
        .unwrap();

    assert!(model.serializer_from(&registry).is_ok());
    assert!(matches!(
        model.serializer_from(&SerializerRegistry::new()),
        Err(SerializeError::NotFound(name)) if name == "house"
    ));
}

#[test]
fn serializer_instance_skips_registry() {
    let model = Model::builder("m")
        .field(FieldDescriptor::integer("id"))
        .primary_key("id")
        .serializer_instance(Arc::new(JsonSerializer))
        .build()
        .unwrap();

    assert!(model.serializer_from(&SerializerRegistry::new()).is_ok());
}

#[test]
fn config_overrides_serializer_ttl_and_template() {
    let config = ModelConfig::from_toml_str(
        r#"
        serializer = "cbor"
        ttl_secs = 60
        key_template = "u:%s"
        "#,
    )
    .unwrap();

    let model = Model::builder("user")
        .field(FieldDescriptor::integer("id"))
        .primary_key("id")
        .config(&config)
        .build()
        .unwrap();

    assert!(matches!(model.serializer_binding(), SerializerBinding::Named(n) if n == "cbor"));
    assert_eq!(model.ttl(), Some(Duration::from_secs(60)));
    assert_eq!(model.key_for_id(3), Ok("u:3".to_string()));
}

#[test]
fn config_validation() {
    assert!(matches!(
        ModelConfig::from_toml_str("ttl_secs = 0"),
        Err(ConfigError::Invalid { .. })
    ));
    assert!(matches!(
        ModelConfig::from_toml_str("colour = 1"),
        Err(ConfigError::Parse(_))
    ));
    assert_eq!(ModelConfig::default().serializer_name(), DEFAULT_SERIALIZER);
}

#[test]
fn cache_config_reads_model_tables() {
    let config = CacheConfig::from_toml_str(
        r#"
        [models.user]
        serializer = "msgpack"

        [models.order]
        ttl_secs = 5
        "#,
    )
    .unwrap();

    assert_eq!(config.model("user").map(ModelConfig::serializer_name), Some("msgpack"));
    assert_eq!(config.model("order").and_then(ModelConfig::ttl), Some(Duration::from_secs(5)));
    assert!(config.model("missing").is_none());
}

proptest! {
    #[test]
    fn composite_arity_must_match(len in 0usize..6) {
        let model = order();
        let id = Value::List((0..len).map(|i| Value::Int(i as i64)).collect());

        let result = model.coerce_id(id);
        if len == 2 {
            prop_assert!(result.is_ok());
        } else {
            prop_assert!(matches!(result, Err(ModelError::Field(e)) if e.is_validation()));
        }
    }
}
