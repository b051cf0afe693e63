use super::*;
use std::sync::Arc;

fn sample() -> Wire {
    Wire::map([
        ("id", Wire::Int(7)),
        ("name", Wire::Text("café".into())),
        ("score", Wire::Float(1.5)),
        ("tags", Wire::List(vec![Wire::Text("a".into()), Wire::Null])),
        ("big", Wire::Uint(u64::MAX)),
    ])
}

///
/// REGISTRY
///

#[test]
fn builtins_are_registered() {
    let builtins = SerializerRegistry::with_builtins();

    assert!(builtins.contains(JSON));
    assert!(builtins.contains(CBOR));
    assert_eq!(builtins.contains(MSGPACK), cfg!(feature = "msgpack"));
}

#[test]
fn process_registry_starts_with_builtins() {
    let global = registry();

    assert!(global.get_by_name(JSON).is_some());
    assert!(global.get_by_name(CBOR).is_some());
    assert_eq!(global.contains(MSGPACK), cfg!(feature = "msgpack"));
}

#[test]
fn duplicate_registration_leaves_mapping_unchanged() {
    let registry = SerializerRegistry::new();
    let first: Arc<dyn Serializer> = Arc::new(JsonSerializer);
    registry.register("x", first.clone()).unwrap();

    let err = registry
        .register("x", Arc::new(CborSerializer::new()))
        .unwrap_err();
    assert_eq!(err.kind(), SerializeErrorKind::AlreadyExists);

    let held = registry.get_by_name("x").unwrap();
    assert!(Arc::ptr_eq(&held, &first));
}

#[test]
fn unregister_unknown_is_not_found() {
    let registry = SerializerRegistry::new();
    let err = registry.unregister("missing").unwrap_err();

    assert_eq!(err, SerializeError::NotFound("missing".into()));
    assert!(registry.require("missing").is_err());
}

#[test]
fn unregister_then_reregister() {
    let registry = SerializerRegistry::with_builtins();
    registry.unregister(JSON).unwrap();
    assert!(registry.get_by_name(JSON).is_none());

    registry.register(JSON, Arc::new(JsonSerializer)).unwrap();
    assert!(registry.get_by_name(JSON).is_some());

    registry.unregister_all();
    assert!(registry.names().is_empty());
}

#[test]
fn readers_see_whole_snapshots_under_concurrent_writes() {
    let registry = SerializerRegistry::new();

    std::thread::scope(|s| {
        s.spawn(|| {
            for round in 0..200 {
                let name = format!("codec-{}", round % 4);
                let _ = registry.register(name.clone(), Arc::new(JsonSerializer));
                let _ = registry.unregister(&name);
            }
        });
        s.spawn(|| {
            for _ in 0..200 {
                registry.register("pinned", Arc::new(CborSerializer::new())).ok();
            }
        });
        for _ in 0..4 {
            s.spawn(|| {
                for _ in 0..500 {
                    let names = registry.names();
                    assert!(names.len() <= 5);
                    if let Some(codec) = registry.get_by_name("pinned") {
                        assert!(codec.decode(&codec.encode(&Wire::Int(1)).unwrap()).is_ok());
                    }
                }
            });
        }
    });

    assert_eq!(registry.names(), ["pinned"]);
}

///
/// JSON
///

#[test]
fn json_is_compact_and_keeps_non_ascii() {
    let map = JsonSerializer
        .encode(&Wire::map([("name", Wire::Text("é".into()))]))
        .unwrap();
    let list = JsonSerializer
        .encode(&Wire::List(vec![Wire::Int(1), Wire::Bool(true), Wire::Null]))
        .unwrap();

    assert_eq!(String::from_utf8(map).unwrap(), r#"{"name":"é"}"#);
    assert_eq!(String::from_utf8(list).unwrap(), "[1,true,null]");
}

#[test]
fn json_round_trips_text_shapes() {
    let wire = sample();
    let back = JsonSerializer.decode(&JsonSerializer.encode(&wire).unwrap()).unwrap();

    for key in ["id", "name", "score", "tags", "big"] {
        assert_eq!(back.get(key), wire.get(key), "{key}");
    }
}

#[test]
fn json_refuses_bytes_and_odd_keys() {
    let bytes = JsonSerializer.encode(&Wire::Bytes(vec![0xff])).unwrap_err();
    assert_eq!(bytes.kind(), SerializeErrorKind::Type);

    let keyed = JsonSerializer
        .encode(&Wire::Map(vec![(Wire::Int(1), Wire::Null)]))
        .unwrap_err();
    assert_eq!(keyed.kind(), SerializeErrorKind::Type);

    let nan = JsonSerializer.encode(&Wire::Float(f64::NAN)).unwrap_err();
    assert_eq!(nan.kind(), SerializeErrorKind::Type);
}

#[test]
fn json_decode_reports_corrupt_input() {
    let err = JsonSerializer.decode(b"{not json").unwrap_err();
    assert_eq!(err.kind(), SerializeErrorKind::Deserialize);
}

///
/// MSGPACK
///

#[cfg(feature = "msgpack")]
#[test]
fn msgpack_writes_bytes_as_bin() {
    let codec = MessagePackSerializer::new().unwrap();
    let wire = Wire::List(vec![Wire::Bytes(vec![0xff, 0x00]), Wire::Text("é".into())]);

    let bytes = codec.encode(&wire).unwrap();
    // fixarray(2), bin8 marker, length 2
    assert_eq!(&bytes[..3], &[0x92, 0xc4, 0x02]);
    assert_eq!(codec.decode(&bytes).unwrap(), wire);
}

#[cfg(feature = "msgpack")]
#[test]
fn msgpack_round_trips_maps() {
    let codec = MessagePackSerializer::new().unwrap();
    let wire = sample();

    assert_eq!(codec.decode(&codec.encode(&wire).unwrap()).unwrap(), wire);
}

#[cfg(not(feature = "msgpack"))]
#[test]
fn msgpack_without_feature_is_missing_capability() {
    let err = MessagePackSerializer::new().unwrap_err();
    assert_eq!(err.kind(), SerializeErrorKind::MissingCapability);
}

///
/// CBOR
///

#[test]
fn cbor_carries_every_shape() {
    let codec = CborSerializer::new();
    let wire = Wire::Map(vec![
        (Wire::Int(1), Wire::Bytes(vec![0, 159, 146, 150])),
        (Wire::Text("nested".into()), sample()),
        (Wire::Text("nothing".into()), Wire::Null),
    ]);

    assert_eq!(codec.decode(&codec.encode(&wire).unwrap()).unwrap(), wire);
}

#[test]
fn cbor_decode_is_bounded() {
    let codec = CborSerializer::with_max_bytes(4);
    let bytes = codec.encode(&Wire::Text("longer than four".into())).unwrap();

    let err = codec.decode(&bytes).unwrap_err();
    assert_eq!(err.kind(), SerializeErrorKind::DeserializeSizeLimitExceeded);
}

#[test]
fn cbor_helpers_round_trip_serde_values() {
    let bytes = to_cbor_bytes(&vec![1_u32, 2, 3]).unwrap();
    let back: Vec<u32> = from_cbor_bytes(&bytes, 64).unwrap();

    assert_eq!(back, [1, 2, 3]);
    assert!(from_cbor_bytes::<Vec<u32>>(&[0xff, 0xff], 64).is_err());
}

///
/// PROTOBUF
///

#[cfg(feature = "protobuf")]
mod protobuf {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
    #[serde(default)]
    struct Profile {
        #[prost(string, tag = "1")]
        name: String,
        #[prost(int64, tag = "2")]
        age: i64,
        #[prost(int32, tag = "3")]
        status: i32,
    }

    #[test]
    fn encodes_maps_by_field_name() {
        let codec = ProtobufSerializer::<Profile>::new();
        let wire = Wire::map([("name", Wire::Text("ann".into())), ("age", Wire::Int(30))]);

        let bytes = codec.encode(&wire).unwrap();
        let message = codec.decode_message(&bytes).unwrap();
        assert_eq!(message.name, "ann");
        assert_eq!(message.age, 30);
    }

    #[test]
    fn decode_fills_defaults() {
        let codec = ProtobufSerializer::<Profile>::new();
        let bytes = codec.encode_message(&Profile {
            name: "bo".into(),
            ..Profile::default()
        });

        let wire = codec.decode(&bytes).unwrap();
        assert_eq!(wire.get("name"), Some(&Wire::Text("bo".into())));
        assert_eq!(wire.get("age"), Some(&Wire::Int(0)));
        assert_eq!(wire.get("status"), Some(&Wire::Int(0)));
    }

    #[test]
    fn non_map_input_is_a_type_error() {
        let codec = ProtobufSerializer::<Profile>::new();
        let err = codec.encode(&Wire::List(Vec::new())).unwrap_err();

        assert_eq!(err.kind(), SerializeErrorKind::Type);
    }
}
