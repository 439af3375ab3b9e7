//! Shared fixtures for model tests.

#![allow(dead_code)]

use std::rc::Rc;

use modelkit_model::{ModelType, Primitive, PropertyConfig, Record, TypeConfig, Value};
use tracing_subscriber::EnvFilter;

/// Installs a test subscriber once; `RUST_LOG=modelkit_model=debug` shows engine logs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Builds a record from a JSON object literal.
pub fn record(json: serde_json::Value) -> Record {
    match Value::from(json) {
        Value::Record(record) => record,
        other => panic!("expected a JSON object, got {other:?}"),
    }
}

/// Builds a record whose keys keep the given order.
pub fn ordered(entries: Vec<(&str, Value)>) -> Record {
    entries.into_iter().collect()
}

pub fn address_type() -> Rc<ModelType> {
    ModelType::define(
        TypeConfig::new()
            .name("Address")
            .property("city", Primitive::String)
            .property("state", Primitive::String),
    )
    .unwrap()
}

/// `Entity { id -> _id }`, the base of [`person_type`].
pub fn entity_type() -> Rc<ModelType> {
    ModelType::define(
        TypeConfig::new()
            .name("Entity")
            .property("id", PropertyConfig::new(Primitive::String).storage_key("_id")),
    )
    .unwrap()
}

pub fn person_type() -> Rc<ModelType> {
    entity_type()
        .extend(
            TypeConfig::new()
                .name("Person")
                .property("name", Primitive::String)
                .property("dateOfBirth", Primitive::Date)
                .property("address", address_type()),
        )
        .unwrap()
}
