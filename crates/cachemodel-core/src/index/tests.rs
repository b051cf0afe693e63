use super::*;
use uuid::Uuid;

fn key_fields(names: &[&str]) -> Vec<FieldDescriptor> {
    names.iter().map(|n| FieldDescriptor::string(*n)).collect()
}

#[test]
fn default_template_joins_fields_with_colons() {
    let formatter = IndexFormatter::from_default("user", ["id", "region"]).unwrap();
    let IndexFormatter::Template(template) = &formatter else {
        panic!("default formatter is a template");
    };

    assert_eq!(template.as_str(), "m:user:id:%s:region:%s");
    assert_eq!(formatter.arity(), Some(2));
    assert_eq!(
        formatter.format(&[Value::from(7), Value::from("eu")]),
        Ok("m:user:id:7:region:eu".to_string())
    );
}

#[test]
fn single_field_default_key() {
    let index = Index::new("user", vec![FieldDescriptor::integer("id")], None).unwrap();
    assert_eq!(index.key_for(&[Value::Int(1)]), Ok("m:user:id:1".to_string()));
}

#[test]
fn uuid_keys_use_hyphenated_form() {
    let id = Uuid::from_u128(0xabc);
    let index = Index::new("doc", vec![FieldDescriptor::uuid("id")], None).unwrap();

    assert_eq!(
        index.key_for(&[Value::Uuid(id)]),
        Ok(format!("m:doc:id:{}", id.hyphenated()))
    );
}

#[test]
fn template_escapes_percent() {
    let template = KeyTemplate::parse("100%%:%s").unwrap();
    assert_eq!(template.placeholders(), 1);
    assert_eq!(template.render(&[Value::from("x")]), Ok("100%:x".to_string()));
}

#[test]
fn template_rejects_unknown_directives() {
    assert!(matches!(
        KeyTemplate::parse("k:%d"),
        Err(IndexError::InvalidTemplate { .. })
    ));
    assert!(matches!(
        KeyTemplate::parse("k:%"),
        Err(IndexError::InvalidTemplate { .. })
    ));
}

#[test]
fn template_arity_checked_at_build_and_call() {
    let formatter = IndexFormatter::from_string_format("k:%s").unwrap();
    let err = Index::new("m", key_fields(&["a", "b"]), Some(formatter.clone())).unwrap_err();
    assert_eq!(err, IndexError::ArityMismatch { expected: 1, found: 2 });

    assert_eq!(
        formatter.format(&[Value::from(1), Value::from(2)]),
        Err(IndexError::ArityMismatch { expected: 1, found: 2 })
    );
}

#[test]
fn callable_formatter_receives_ordered_values() {
    let formatter = IndexFormatter::from_callable(|values| {
        values
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("/")
    });
    let index = Index::new("m", key_fields(&["a", "b"]), Some(formatter)).unwrap();

    assert_eq!(
        index.key_for(&[Value::from("x"), Value::from("y")]),
        Ok("x/y".to_string())
    );
    assert!(index.key_for(&[Value::from("x")]).is_err());
}

#[test]
fn empty_index_is_rejected() {
    assert!(matches!(
        Index::new("m", Vec::new(), None),
        Err(IndexError::Empty { .. })
    ));
}

#[test]
fn manager_puts_primary_key_first() {
    let manager = IndexManager::generate_indexes("user", key_fields(&["a", "b"]), None).unwrap();
    let pk = manager.primary_key_index();

    assert_eq!(manager.indexes().len(), 1);
    assert_eq!(manager.indexes()[0].field_names().collect::<Vec<_>>(), ["a", "b"]);
    assert!(pk.covers("b"));
    assert!(!pk.covers("c"));
    assert_eq!(pk.model_name(), "user");
}
