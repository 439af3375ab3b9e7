mod common;

use chrono::{TimeZone, Utc};
use modelkit_model::{
    Array, Declaration, Error, ModelType, Options, Primitive, Settings, TypeConfig, Value,
};
use pretty_assertions::assert_eq;
use serde_json::json;

use common::{address_type, record};

fn scalar_type() -> std::rc::Rc<ModelType> {
    ModelType::define(
        TypeConfig::new()
            .name("Scalars")
            .property("text", Primitive::String)
            .property("age", Primitive::Number)
            .property("count", "integer")
            .property("active", Primitive::Boolean)
            .property("born", Primitive::Date),
    )
    .unwrap()
}

// ── Numbers ──────────────────────────────────────────────────────

#[test]
fn numeric_strings_become_numbers() {
    let model = scalar_type().new_instance().unwrap();
    model.set("age", "10").unwrap();
    assert_eq!(model.get("age").unwrap(), Value::Number(10.0));

    model.set("age", " 2.5 ").unwrap();
    assert_eq!(model.get("age").unwrap(), Value::Number(2.5));

    model.set("age", true).unwrap();
    assert_eq!(model.get("age").unwrap(), Value::Number(1.0));
}

#[test]
fn unparseable_number_is_raised_with_property_name() {
    let model = scalar_type().new_instance().unwrap();
    let err = model.set("age", "asdfsadf").unwrap_err();
    assert!(matches!(err, Error::InvalidValue { .. }));
    assert_eq!(err.to_string(), "age: Invalid value: asdfsadf");

    assert!(model.set("age", "").is_err());
    assert!(model.set("age", json!({"a": 1})).is_err());
}

#[test]
fn unparseable_number_is_collected_and_left_undefined() {
    let mut errors = Vec::new();
    let model = scalar_type()
        .create(
            Some(json!({"age": "asdfsadf", "text": "ok"}).into()),
            &mut Options::collecting(&mut errors),
        )
        .unwrap();

    assert_eq!(errors, vec!["age: Invalid value: asdfsadf".to_string()]);
    assert_eq!(model.get("age").unwrap(), Value::Undefined);
    assert!(!model.record().unwrap().contains_key("age"));
    assert_eq!(model.get("text").unwrap(), Value::from("ok"));
}

#[test]
fn integers_reject_fractions() {
    let model = scalar_type().new_instance().unwrap();
    model.set("count", "42").unwrap();
    assert_eq!(model.get("count").unwrap(), Value::Number(42.0));

    let err = model.set("count", 1.5).unwrap_err();
    assert_eq!(err.to_string(), "count: Invalid value: 1.5");
    assert!(model.set("count", "abc").is_err());
}

// ── Booleans and strings ─────────────────────────────────────────

#[test]
fn booleans_follow_truthiness_rules() {
    let model = scalar_type().new_instance().unwrap();
    let cases = [
        (Value::from(1), Value::Bool(true)),
        (Value::from(0), Value::Bool(false)),
        (Value::from(-1), Value::Bool(true)),
        (Value::from("true"), Value::Bool(true)),
        (Value::from("1"), Value::Bool(true)),
        (Value::from("abc"), Value::Bool(false)),
        (Value::Null, Value::Null),
        (Value::Undefined, Value::Undefined),
    ];
    for (input, expected) in cases {
        model.set("active", input.clone()).unwrap();
        assert_eq!(model.get("active").unwrap(), expected, "input {input:?}");
    }
}

#[test]
fn scalars_render_as_strings() {
    let model = scalar_type().new_instance().unwrap();
    let cases = [
        (Value::Bool(true), "true"),
        (Value::from(42), "42"),
        (Value::from(0), "0"),
        (Value::from(0.5), "0.5"),
        (
            Value::Date(Utc.timestamp_millis_opt(0).unwrap()),
            "Thu Jan 01 1970 00:00:00 GMT+0000",
        ),
    ];
    for (input, expected) in cases {
        model.set("text", input).unwrap();
        assert_eq!(model.get("text").unwrap(), Value::from(expected));
    }
    assert!(model.set("text", json!({"a": 1})).is_err());
}

// ── Dates ────────────────────────────────────────────────────────

#[test]
fn dates_parse_from_text_and_epoch_millis() {
    let model = scalar_type().new_instance().unwrap();

    model.set("born", "1980-02-01T05:00:00.000Z").unwrap();
    assert_eq!(
        model.get("born").unwrap(),
        Value::Date(Utc.with_ymd_and_hms(1980, 2, 1, 5, 0, 0).unwrap())
    );

    model.set("born", "1980-02-01").unwrap();
    assert_eq!(
        model.get("born").unwrap(),
        Value::Date(Utc.with_ymd_and_hms(1980, 2, 1, 0, 0, 0).unwrap())
    );

    model.set("born", 86_400_000).unwrap();
    assert_eq!(
        model.get("born").unwrap(),
        Value::Date(Utc.with_ymd_and_hms(1970, 1, 2, 0, 0, 0).unwrap())
    );
}

#[test]
fn dates_reject_booleans_and_garbage() {
    let model = scalar_type().new_instance().unwrap();
    assert!(model.set("born", true).is_err());
    let err = model.set("born", "not a date").unwrap_err();
    assert_eq!(err.to_string(), "born: Invalid value: not a date");
}

// ── Strict mode ──────────────────────────────────────────────────

#[test]
fn strict_mode_rejects_every_conversion() {
    let data = json!({
        "text": 1,
        "age": "1",
        "count": "3",
        "active": "true",
        "born": "2020-01-01",
    });
    let mut errors = Vec::new();
    scalar_type()
        .create(Some(data.into()), &mut Options::collecting(&mut errors).strict(true))
        .unwrap();

    errors.sort();
    assert_eq!(
        errors,
        vec![
            "active: Invalid value: true".to_string(),
            "age: Invalid value: 1".to_string(),
            "born: Invalid value: 2020-01-01".to_string(),
            "count: Invalid value: 3".to_string(),
            "text: Invalid value: 1".to_string(),
        ]
    );
}

#[test]
fn strict_mode_accepts_exact_representations() {
    let mut errors = Vec::new();
    let model = scalar_type()
        .create(
            Some(json!({"text": "a", "age": 1.5, "count": 3, "active": false}).into()),
            &mut Options::collecting(&mut errors).strict(true),
        )
        .unwrap();
    assert!(errors.is_empty());
    assert_eq!(model.get("count").unwrap(), Value::Number(3.0));
}

#[test]
fn strict_mode_loads_from_settings() {
    let settings: Settings = serde_json::from_str(r#"{"strict": true}"#).unwrap();
    let model = scalar_type().new_instance().unwrap();
    let err = model
        .set_with("age", "1", &mut Options::new().with_settings(&settings))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidValue { .. }));

    let defaults: Settings = serde_json::from_str("{}").unwrap();
    assert_eq!(defaults, Settings::default());
    assert!(!defaults.strict);
}

// ── Arrays ───────────────────────────────────────────────────────

#[test]
fn primitive_arrays_are_coerced_in_place() {
    let ty = ModelType::define(
        TypeConfig::new().property("flags", Declaration::array_of(Primitive::Boolean)),
    )
    .unwrap();
    let flags: Array = vec![
        Value::from(0),
        Value::from(1),
        Value::from("abc"),
        Value::from(-1),
        Value::from("true"),
    ]
    .into();

    let model = ty.new_instance().unwrap();
    model.set("flags", flags.clone()).unwrap();

    assert_eq!(
        flags.to_vec(),
        vec![
            Value::Bool(false),
            Value::Bool(true),
            Value::Bool(false),
            Value::Bool(true),
            Value::Bool(true),
        ]
    );
    let stored = model.get("flags").unwrap();
    assert!(stored.as_array().unwrap().ptr_eq(&flags));
}

#[test]
fn array_element_errors_name_the_array_property() {
    let ty = ModelType::define(TypeConfig::new().property("scores", "number[]")).unwrap();
    let mut errors = Vec::new();
    let model = ty
        .create(
            Some(json!({"scores": ["1", "x", 3]}).into()),
            &mut Options::collecting(&mut errors),
        )
        .unwrap();

    assert_eq!(errors, vec!["scores: Invalid value: x".to_string()]);
    let scores = model.get("scores").unwrap();
    assert_eq!(
        scores.as_array().unwrap().to_vec(),
        vec![Value::Number(1.0), Value::Undefined, Value::Number(3.0)]
    );
}

#[test]
fn model_arrays_store_records_and_clean_by_element_type() {
    let address = address_type();
    let ty = ModelType::define(
        TypeConfig::new().property("addresses", Declaration::array_of(&address)),
    )
    .unwrap();
    let durham = address.wrap_model(json!({"city": "Durham", "state": "NC"})).unwrap();

    let addresses: Array = vec![
        Value::from(durham.clone()),
        Value::from(json!({"city": "Austin", "state": "TX"})),
    ]
    .into();

    let model = ty.new_instance().unwrap();
    model.set("addresses", addresses).unwrap();

    let stored = model.get("addresses").unwrap();
    let stored = stored.as_array().unwrap();
    assert!(stored.get(0).as_record().unwrap().ptr_eq(durham.record().unwrap()));
    assert!(stored.get(1).as_record().is_some());

    assert_eq!(
        model.clean(None).to_json().unwrap(),
        json!({"addresses": [
            {"city": "Durham", "state": "NC"},
            {"city": "Austin", "state": "TX"},
        ]})
    );
}

#[test]
fn nested_model_errors_are_collected_through_the_parent() {
    let address = address_type();
    let ty = ModelType::define(
        TypeConfig::new()
            .property("name", Primitive::String)
            .property("address", &address),
    )
    .unwrap();
    let mut errors = Vec::new();
    let model = ty
        .create(
            Some(json!({"name": "Ada", "address": {"city": "Durham", "zip": 27701}}).into()),
            &mut Options::collecting(&mut errors),
        )
        .unwrap();

    assert_eq!(errors, vec!["Unrecognized property: zip".to_string()]);
    let raw = model.record().unwrap().get("address");
    assert_eq!(raw.as_record().unwrap().get("city"), Value::from("Durham"));
}

#[test]
fn array_declared_without_items_keeps_elements() {
    let ty = ModelType::define(TypeConfig::new().property("tags", Declaration::array())).unwrap();
    let model = ty
        .create(Some(json!({"tags": ["a", 1, true]}).into()), &mut Options::new())
        .unwrap();
    let tags = model.get("tags").unwrap();
    assert_eq!(
        tags.as_array().unwrap().to_vec(),
        vec![Value::from("a"), Value::from(1), Value::Bool(true)]
    );
    assert!(model.set("tags", "not an array").is_err());
}

#[test]
fn reading_never_coerces_stored_values() {
    let ty = scalar_type();
    let raw = record(json!({"age": "12"}));
    let model = ty.wrap_model(raw.clone()).unwrap();
    assert_eq!(model.get("age").unwrap(), Value::Number(12.0));

    raw.insert("age", Value::from("raw"));
    assert_eq!(model.get("age").unwrap(), Value::from("raw"));
}
