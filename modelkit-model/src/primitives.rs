//! Built-in leaf types: `string`, `number`, `integer`, `boolean`, `date`,
//! `object` and `array`.
//!
//! Each accessor returns the same shared handle on a given thread, so handle
//! identity ([`crate::same_type`]) can be used to recognize them.

use chrono::{DateTime, NaiveDate, Utc};

use crate::marshal;
use crate::options::Options;
use crate::resolve::Primitive;
use crate::types::{Type, TypeRef};
use crate::value::{DATE_DISPLAY_FORMAT, Value, format_number};
use crate::Result;

use std::rc::Rc;

struct Builtins {
    string: TypeRef,
    number: TypeRef,
    integer: TypeRef,
    boolean: TypeRef,
    date: TypeRef,
    object: TypeRef,
    array: TypeRef,
}

impl Builtins {
    fn new() -> Self {
        Self {
            string: Rc::new(StringType),
            number: Rc::new(NumberType),
            integer: Rc::new(IntegerType),
            boolean: Rc::new(BooleanType),
            date: Rc::new(DateType),
            object: Rc::new(ObjectType),
            array: Rc::new(ArrayType),
        }
    }
}

thread_local! {
    static BUILTINS: Builtins = Builtins::new();
}

#[must_use]
pub fn string() -> TypeRef {
    BUILTINS.with(|b| b.string.clone())
}

#[must_use]
pub fn number() -> TypeRef {
    BUILTINS.with(|b| b.number.clone())
}

#[must_use]
pub fn integer() -> TypeRef {
    BUILTINS.with(|b| b.integer.clone())
}

#[must_use]
pub fn boolean() -> TypeRef {
    BUILTINS.with(|b| b.boolean.clone())
}

#[must_use]
pub fn date() -> TypeRef {
    BUILTINS.with(|b| b.date.clone())
}

#[must_use]
pub fn object() -> TypeRef {
    BUILTINS.with(|b| b.object.clone())
}

#[must_use]
pub fn array() -> TypeRef {
    BUILTINS.with(|b| b.array.clone())
}

/// The built-in type a host marker stands for.
#[must_use]
pub fn for_marker(marker: Primitive) -> TypeRef {
    match marker {
        Primitive::String => string(),
        Primitive::Number => number(),
        Primitive::Boolean => boolean(),
        Primitive::Date => date(),
        Primitive::Object => object(),
        Primitive::Array => array(),
    }
}

/// Looks a built-in type up by its registry name.
#[must_use]
pub fn by_name(name: &str) -> Option<TypeRef> {
    match name {
        "string" => Some(string()),
        "number" => Some(number()),
        "integer" => Some(integer()),
        "boolean" => Some(boolean()),
        "date" => Some(date()),
        "object" => Some(object()),
        "array" => Some(array()),
        _ => None,
    }
}

/// Every built-in type, in registry order.
#[must_use]
pub fn all() -> Vec<TypeRef> {
    vec![string(), number(), integer(), boolean(), date(), object(), array()]
}

fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    text.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(text) {
        return Some(date.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
}

fn from_epoch_millis(millis: f64) -> Option<DateTime<Utc>> {
    if !millis.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis(millis.trunc() as i64)
}

// ── string ───────────────────────────────────────────────────────

#[derive(Debug)]
struct StringType;

impl Type for StringType {
    fn name(&self) -> &str {
        "string"
    }

    fn is_wrapped(&self) -> bool {
        false
    }

    fn is_primitive(&self) -> bool {
        true
    }

    fn coerce(&self, value: Value, options: &mut Options<'_>) -> Result<Value> {
        match value {
            Value::Undefined | Value::Null | Value::String(_) => Ok(value),
            _ if options.is_strict() => options.coercion_error(&value),
            Value::Bool(b) => Ok(Value::String(b.to_string())),
            Value::Number(n) => Ok(Value::String(format_number(n))),
            Value::Date(d) => Ok(Value::String(d.format(DATE_DISPLAY_FORMAT).to_string())),
            other => options.coercion_error(&other),
        }
    }

    fn wrap(&self, value: Value, options: &mut Options<'_>) -> Result<Value> {
        self.coerce(value, options)
    }
}

// ── number / integer ─────────────────────────────────────────────

fn coerce_number(value: Value, options: &mut Options<'_>) -> Result<Value> {
    let converted = match &value {
        Value::Undefined | Value::Null | Value::Number(_) => return Ok(value),
        _ if options.is_strict() => None,
        Value::String(s) => parse_number(s),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Date(d) => Some(d.timestamp_millis() as f64),
        _ => None,
    };
    match converted {
        Some(n) => Ok(Value::Number(n)),
        None => options.coercion_error(&value),
    }
}

#[derive(Debug)]
struct NumberType;

impl Type for NumberType {
    fn name(&self) -> &str {
        "number"
    }

    fn is_wrapped(&self) -> bool {
        false
    }

    fn is_primitive(&self) -> bool {
        true
    }

    fn coerce(&self, value: Value, options: &mut Options<'_>) -> Result<Value> {
        coerce_number(value, options)
    }

    fn wrap(&self, value: Value, options: &mut Options<'_>) -> Result<Value> {
        self.coerce(value, options)
    }
}

#[derive(Debug)]
struct IntegerType;

impl Type for IntegerType {
    fn name(&self) -> &str {
        "integer"
    }

    fn is_wrapped(&self) -> bool {
        false
    }

    fn is_primitive(&self) -> bool {
        true
    }

    fn coerce(&self, value: Value, options: &mut Options<'_>) -> Result<Value> {
        let original = value.clone();
        match coerce_number(value, options)? {
            Value::Number(n) if !n.is_finite() || n.fract() != 0.0 => options.coercion_error(&original),
            coerced => Ok(coerced),
        }
    }

    fn wrap(&self, value: Value, options: &mut Options<'_>) -> Result<Value> {
        self.coerce(value, options)
    }
}

// ── boolean ──────────────────────────────────────────────────────

#[derive(Debug)]
struct BooleanType;

impl Type for BooleanType {
    fn name(&self) -> &str {
        "boolean"
    }

    fn is_wrapped(&self) -> bool {
        false
    }

    fn is_primitive(&self) -> bool {
        true
    }

    fn coerce(&self, value: Value, options: &mut Options<'_>) -> Result<Value> {
        match value {
            Value::Undefined | Value::Null | Value::Bool(_) => Ok(value),
            _ if options.is_strict() => options.coercion_error(&value),
            Value::Number(n) => Ok(Value::Bool(n != 0.0 && !n.is_nan())),
            Value::String(s) => Ok(Value::Bool(s == "true" || s == "1")),
            other => options.coercion_error(&other),
        }
    }

    fn wrap(&self, value: Value, options: &mut Options<'_>) -> Result<Value> {
        self.coerce(value, options)
    }
}

// ── date ─────────────────────────────────────────────────────────

#[derive(Debug)]
struct DateType;

impl Type for DateType {
    fn name(&self) -> &str {
        "date"
    }

    fn is_wrapped(&self) -> bool {
        false
    }

    fn is_primitive(&self) -> bool {
        true
    }

    fn coerce(&self, value: Value, options: &mut Options<'_>) -> Result<Value> {
        let converted = match &value {
            Value::Undefined | Value::Null | Value::Date(_) => return Ok(value),
            _ if options.is_strict() => None,
            Value::String(s) => parse_date(s),
            Value::Number(n) => from_epoch_millis(*n),
            _ => None,
        };
        match converted {
            Some(date) => Ok(Value::Date(date)),
            None => options.coercion_error(&value),
        }
    }

    fn wrap(&self, value: Value, options: &mut Options<'_>) -> Result<Value> {
        self.coerce(value, options)
    }
}

// ── object ───────────────────────────────────────────────────────

#[derive(Debug)]
struct ObjectType;

impl Type for ObjectType {
    fn name(&self) -> &str {
        "object"
    }

    fn is_wrapped(&self) -> bool {
        false
    }

    fn is_primitive(&self) -> bool {
        true
    }

    fn wrap(&self, value: Value, _options: &mut Options<'_>) -> Result<Value> {
        Ok(value)
    }
}

// ── array ────────────────────────────────────────────────────────

#[derive(Debug)]
struct ArrayType;

impl Type for ArrayType {
    fn name(&self) -> &str {
        "array"
    }

    fn is_wrapped(&self) -> bool {
        false
    }

    fn is_primitive(&self) -> bool {
        true
    }

    /// Elements are coerced through the active property's element
    /// descriptor and written back into the same array.
    fn coerce(&self, value: Value, options: &mut Options<'_>) -> Result<Value> {
        let array = match &value {
            Value::Undefined | Value::Null => return Ok(value),
            Value::Array(array) => array.clone(),
            _ => return options.coercion_error(&value),
        };
        let Some(items) = options.property().and_then(|p| p.items()).cloned() else {
            return Ok(value);
        };
        for index in 0..array.len() {
            let element = marshal::coerce_for(&items, array.get(index), options)?;
            array.set(index, element);
        }
        Ok(value)
    }

    fn wrap(&self, value: Value, options: &mut Options<'_>) -> Result<Value> {
        self.coerce(value, options)
    }
}
