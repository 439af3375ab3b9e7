//! Persisted-only snapshots and their JSON text.

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tracing::debug;

use crate::model_type::ModelType;
use crate::property::Property;
use crate::value::{Record, Value, is_reserved_key};
use crate::{Error, Result};

/// Canonical snapshot of `value`.
///
/// Arrays are cleaned element-wise, wrappers and records with a live wrapper
/// delegate to their model, and anything else is returned as is.
#[must_use]
pub fn clean(value: &Value, mut errors: Option<&mut Vec<String>>) -> Value {
    match value {
        Value::Array(items) => items
            .to_vec()
            .iter()
            .map(|item| clean(item, errors.as_deref_mut()))
            .collect::<crate::Array>()
            .into(),
        Value::Model(model) => model.clean(errors),
        Value::Record(record) => match record.wrapper() {
            Some(model) => model.clean(errors),
            None => value.clone(),
        },
        other => other.clone(),
    }
}

/// Renders `value` as JSON, models replaced by their clean snapshots and
/// reserved keys omitted. Pretty output indents with four spaces.
pub fn stringify(value: &Value, pretty: bool) -> Result<String> {
    if !pretty {
        return Ok(serde_json::to_string(value)?);
    }
    let mut out = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}

pub(crate) fn clean_record(ty: &ModelType, record: &Record, mut errors: Option<&mut Vec<String>>) -> Value {
    let snapshot = Record::new();
    for (key, value) in record.entries() {
        if is_reserved_key(&key) {
            continue;
        }
        match ty.property(&key) {
            Some(property) if property.is_persisted() => {
                snapshot.insert(key, clean_field(&value, &property, errors.as_deref_mut()));
            }
            Some(_) => {}
            None if ty.additional_properties() => snapshot.insert(key, value),
            None => {
                if let Some(errors) = errors.as_deref_mut() {
                    let message = Error::UnrecognizedProperty(key).to_string();
                    debug!(%message, model = %ty.name(), "recorded clean diagnostic");
                    errors.push(message);
                }
            }
        }
    }
    Value::Record(snapshot)
}

/// Cleans a stored field using its descriptor, so nested records whose
/// wrapper is gone are still cleaned by their declared type.
fn clean_field(value: &Value, property: &Property, mut errors: Option<&mut Vec<String>>) -> Value {
    match value {
        Value::Array(items) => match property.items() {
            Some(element) => items
                .to_vec()
                .iter()
                .map(|item| clean_field(item, element, errors.as_deref_mut()))
                .collect::<crate::Array>()
                .into(),
            None => clean(value, errors),
        },
        Value::Record(record) if record.wrapper().is_none() => {
            match property.ty().as_model_type() {
                Some(ty) => ty.clean_data(value, errors),
                None => value.clone(),
            }
        }
        _ => clean(value, errors),
    }
}
