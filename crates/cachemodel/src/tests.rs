use crate::{
    __reexports::{chrono, rust_decimal, uuid},
    logging::{LoggingError, build_filter, init_logging},
    prelude::*,
};

#[test]
fn version_matches_manifest() {
    assert_eq!(crate::VERSION, env!("CARGO_PKG_VERSION"));
}

#[test]
fn filters_parse_or_report() {
    assert!(build_filter("cachemodel_core=debug,warn").is_ok());
    assert!(build_filter("").is_ok());

    let err = build_filter("cachemodel_core=loud").unwrap_err();
    assert!(matches!(err, LoggingError::InvalidFilter { ref filter, .. } if filter == "cachemodel_core=loud"));
}

#[test]
fn second_init_is_refused() {
    init_logging("cachemodel_core=debug").unwrap();

    let err = init_logging("info").unwrap_err();
    assert!(matches!(err, LoggingError::AlreadyInitialized(_)));
}

#[test]
fn prelude_covers_a_full_round_trip() {
    let model = Model::builder("invoice")
        .field(FieldDescriptor::uuid("id"))
        .field(FieldDescriptor::decimal("amount", DecimalSpec::new(2).auto_round()))
        .field(FieldDescriptor::date("issued"))
        .primary_key("id")
        .build()
        .unwrap();
    let store = ModelStore::new(model, MemoryBackend::new()).unwrap();

    let id = uuid::Uuid::from_u128(42);
    let issued = chrono::NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
    store
        .create([
            ("id", Value::from(id)),
            ("amount", "10.006".into()),
            ("issued", issued.into()),
        ])
        .unwrap();

    let record = store.get_by_id(id).unwrap();
    assert_eq!(
        record.get("amount"),
        Some(&Value::Decimal(rust_decimal::Decimal::new(1001, 2)))
    );
    assert_eq!(record.get("issued"), Some(&Value::Date(issued)));
}
