//! Per-instance read and write pipelines.
//!
//! Every field access on a [`Model`] funnels through [`get`] and [`set`]; array
//! elements reuse the same steps through [`coerce_for`].

use std::rc::Rc;

use crate::model::{self, Model};
use crate::options::Options;
use crate::property::Property;
use crate::types::Type;
use crate::value::Value;
use crate::Result;

/// Reads `property` from `model`.
///
/// A custom getter's result is returned as is. Absent and null values are
/// never coerced. Values of wrapping types come back wrapped, or raw when the
/// type auto-unwraps.
pub fn get(model: &Model, property: &Property) -> Result<Value> {
    if let Some(getter) = property.getter() {
        return getter(model, property);
    }

    let value = model
        .record()
        .map_or(Value::Undefined, |record| record.get(property.storage_key()));
    if value.is_nullish() {
        return Ok(value);
    }

    let ty = property.ty();
    if !ty.is_wrapped() {
        Ok(value)
    } else if ty.is_auto_unwrapped() {
        Ok(model::unwrap(value))
    } else if let Some(model_type) = ty.as_model_type() {
        model_type.wrap_stored(value)
    } else {
        ty.wrap(value, &mut Options::new())
    }
}

/// Writes `value` to `property` on `model` after coercion.
pub fn set(model: &Model, property: &Rc<Property>, value: Value, options: &mut Options<'_>) -> Result<()> {
    let value = with_property(options, property, |options| prepare(property, value, options))?;

    if let Some(setter) = property.setter() {
        return setter(model, property, value);
    }

    let value = with_property(options, property, |options| attach(property, value, options))?;
    if let Some(record) = model.record() {
        record.insert(property.storage_key(), value);
    }
    Ok(())
}

/// Produces the stored form of `value` for `property` without writing it
/// anywhere. Used for array elements, which have no record slot of their own.
pub fn coerce_for(property: &Rc<Property>, value: Value, options: &mut Options<'_>) -> Result<Value> {
    with_property(options, property, |options| {
        let value = prepare(property, value, options)?;
        attach(property, value, options)
    })
}

/// Runs `step` with `property` as the active descriptor, restoring the
/// previous one afterwards.
fn with_property<T>(
    options: &mut Options<'_>,
    property: &Rc<Property>,
    step: impl FnOnce(&mut Options<'_>) -> Result<T>,
) -> Result<T> {
    let previous = options.replace_property(Some(property.clone()));
    let result = step(options);
    options.replace_property(previous);
    result
}

/// A compatible wrapper is unwrapped to its record; anything else goes
/// through the type's coercion.
fn prepare(property: &Property, value: Value, options: &mut Options<'_>) -> Result<Value> {
    let ty = property.ty();
    if let Value::Model(instance) = &value {
        if instance.model_type().is_compatible_with(ty) {
            return Ok(instance.data());
        }
    }
    ty.coerce(value, options)
}

/// Runs a wrapping type's factory so nested records go through their own
/// property pipeline, then returns the raw form to store. A value the
/// factory rejects in collecting mode is stored as `Undefined`.
fn attach(property: &Property, value: Value, options: &mut Options<'_>) -> Result<Value> {
    let ty = property.ty();
    if value.is_nullish() || !ty.is_wrapped() {
        return Ok(value);
    }
    if ty.wrap(value.clone(), options)?.is_undefined() {
        return Ok(Value::Undefined);
    }
    Ok(model::unwrap(value))
}
