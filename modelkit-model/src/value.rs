//! Untyped values and the shared raw records that models wrap.
//!
//! [`Record`] and [`Array`] are handles: cloning one clones the `Rc`, never
//! the data, so a wrapper and the caller that handed the record in always see
//! the same fields. Identity is [`Record::ptr_eq`].

use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::model::{Model, ModelInner};

/// Keys starting with this character are never treated as data fields.
pub const RESERVED_PREFIX: char = '$';

/// Returns true if `key` is reserved and must be skipped when enumerating data.
#[must_use]
pub fn is_reserved_key(key: &str) -> bool {
    key.starts_with(RESERVED_PREFIX)
}

/// Integral values up to 2^53 render without a fractional part.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Text form used when a date is rendered as a plain string.
pub(crate) const DATE_DISPLAY_FORMAT: &str = "%a %b %d %Y %H:%M:%S GMT%z";

/// An untyped datum.
#[derive(Clone, Default)]
pub enum Value {
    /// Absent. Storing it into a record removes the key.
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Date(DateTime<Utc>),
    Array(Array),
    Record(Record),
    /// A wrapper instance of some model type.
    Model(Model),
}

impl Value {
    /// Parses JSON text into fresh records and arrays.
    pub fn parse(text: &str) -> crate::Result<Self> {
        let json: serde_json::Value = serde_json::from_str(text)?;
        Ok(Self::from(json))
    }

    /// Returns true for `Undefined` and `Null`.
    #[must_use]
    pub fn is_nullish(&self) -> bool {
        matches!(self, Self::Undefined | Self::Null)
    }

    #[must_use]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(r) => Some(r),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_model(&self) -> Option<&Model> {
        match self {
            Self::Model(m) => Some(m),
            _ => None,
        }
    }

    /// Converts into a `serde_json::Value` through the [`Serialize`] impl.
    pub fn to_json(&self) -> crate::Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

pub(crate) fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => write!(f, "undefined"),
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{}", format_number(*n)),
            Self::String(s) => write!(f, "{s}"),
            Self::Date(d) => write!(f, "{}", d.format(DATE_DISPLAY_FORMAT)),
            Self::Array(a) => {
                let parts: Vec<String> = a.to_vec().iter().map(ToString::to_string).collect();
                write!(f, "{}", parts.join(","))
            }
            Self::Record(_) => write!(f, "[object Object]"),
            Self::Model(m) => write!(f, "{}", m.data()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => write!(f, "Undefined"),
            Self::Null => write!(f, "Null"),
            Self::Bool(b) => write!(f, "Bool({b})"),
            Self::Number(n) => write!(f, "Number({n})"),
            Self::String(s) => write!(f, "String({s:?})"),
            Self::Date(d) => write!(f, "Date({})", d.to_rfc3339()),
            Self::Array(a) => a.fmt(f),
            Self::Record(r) => r.fmt(f),
            Self::Model(m) => m.fmt(f),
        }
    }
}

/// Structural equality; models compare by wrapper identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => a == b,
            (Self::Record(a), Self::Record(b)) => a == b,
            (Self::Model(a), Self::Model(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Self {
        Self::Date(d)
    }
}

impl From<Record> for Value {
    fn from(r: Record) -> Self {
        Self::Record(r)
    }
}

impl From<Array> for Value {
    fn from(a: Array) -> Self {
        Self::Array(a)
    }
}

impl From<Model> for Value {
    fn from(m: Model) -> Self {
        Self::Model(m)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Undefined, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => Self::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::Array(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(map) => Self::Record(
                map.into_iter()
                    .map(|(key, value)| (key, Self::from(value)))
                    .collect(),
            ),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Undefined | Self::Null => serializer.serialize_none(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) => {
                if !n.is_finite() {
                    serializer.serialize_none()
                } else if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
                    serializer.serialize_i64(*n as i64)
                } else {
                    serializer.serialize_f64(*n)
                }
            }
            Self::String(s) => serializer.serialize_str(s),
            Self::Date(d) => serializer.serialize_str(&d.to_rfc3339_opts(SecondsFormat::Millis, true)),
            Self::Array(a) => a.serialize(serializer),
            Self::Record(r) => r.serialize(serializer),
            Self::Model(m) => m.clean(None).serialize(serializer),
        }
    }
}

// ── Record ───────────────────────────────────────────────────────

#[derive(Default)]
struct RecordData {
    fields: Vec<(String, Value)>,
    wrapper: Option<Weak<ModelInner>>,
}

/// A shared, insertion-ordered map of string keys to values.
///
/// The record also remembers, weakly, the wrapper currently attached to it so
/// that wrapping it again yields the same [`Model`].
///
/// Fields live in a plain vector and every key lookup is a linear scan, so
/// filling a record with `n` distinct keys costs O(n²). Records are sized like
/// hand-written documents, a few dozen fields at most.
#[derive(Clone, Default)]
pub struct Record(Rc<RefCell<RecordData>>);

impl Record {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value under `key`, or `Undefined` when absent.
    #[must_use]
    pub fn get(&self, key: &str) -> Value {
        self.0
            .borrow()
            .fields
            .iter()
            .find(|(k, _)| k == key)
            .map_or(Value::Undefined, |(_, v)| v.clone())
    }

    /// Stores `value` under `key`, keeping the key's original position.
    /// Storing `Undefined` removes the key.
    pub fn insert(&self, key: impl Into<String>, value: Value) {
        let key = key.into();
        if value.is_undefined() {
            self.remove(&key);
            return;
        }
        let mut data = self.0.borrow_mut();
        match data.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => data.fields.push((key, value)),
        }
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        let mut data = self.0.borrow_mut();
        let index = data.fields.iter().position(|(k, _)| k == key)?;
        Some(data.fields.remove(index).1)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.borrow().fields.iter().any(|(k, _)| k == key)
    }

    /// All keys in insertion order, reserved ones included.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.0.borrow().fields.iter().map(|(k, _)| k.clone()).collect()
    }

    /// Snapshot of every entry, so callers may mutate the record while iterating.
    #[must_use]
    pub fn entries(&self) -> Vec<(String, Value)> {
        self.0.borrow().fields.clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.borrow().fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.borrow().fields.is_empty()
    }

    /// Returns true if both handles point at the same record.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// The live wrapper attached to this record, if any.
    #[must_use]
    pub fn wrapper(&self) -> Option<Model> {
        let data = self.0.borrow();
        data.wrapper
            .as_ref()
            .and_then(Weak::upgrade)
            .map(Model::from_inner)
    }

    pub(crate) fn attach(&self, model: &Model) {
        self.0.borrow_mut().wrapper = Some(model.downgrade());
    }

    pub(crate) fn detach(&self) {
        self.0.borrow_mut().wrapper = None;
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let record = Self::new();
        for (key, value) in iter {
            record.insert(key, value);
        }
        record
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let ours = self.entries();
        let theirs = other.entries();
        ours.len() == theirs.len()
            && ours
                .iter()
                .all(|(key, value)| theirs.iter().any(|(k, v)| k == key && v == value))
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.0.borrow();
        f.debug_map()
            .entries(data.fields.iter().map(|(k, v)| (k, v)))
            .finish()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let entries: Vec<(String, Value)> = self
            .entries()
            .into_iter()
            .filter(|(key, value)| !is_reserved_key(key) && !value.is_undefined())
            .collect();
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (key, value) in &entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

// ── Array ────────────────────────────────────────────────────────

/// A shared, growable list of values.
#[derive(Clone, Default)]
pub struct Array(Rc<RefCell<Vec<Value>>>);

impl Array {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Returns the element at `index`, or `Undefined` when out of range.
    #[must_use]
    pub fn get(&self, index: usize) -> Value {
        self.0.borrow().get(index).cloned().unwrap_or_default()
    }

    /// Replaces the element at `index`; out-of-range writes are ignored.
    pub fn set(&self, index: usize, value: Value) {
        if let Some(slot) = self.0.borrow_mut().get_mut(index) {
            *slot = value;
        }
    }

    pub fn push(&self, value: Value) {
        self.0.borrow_mut().push(value);
    }

    /// Snapshot of the elements.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Value> {
        self.0.borrow().clone()
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl From<Vec<Value>> for Array {
    fn from(items: Vec<Value>) -> Self {
        Self(Rc::new(RefCell::new(items)))
    }
}

impl FromIterator<Value> for Array {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}

impl PartialEq for Array {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || *self.0.borrow() == *other.0.borrow()
    }
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.borrow().iter()).finish()
    }
}

impl Serialize for Array {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let items = self.to_vec();
        let mut seq = serializer.serialize_seq(Some(items.len()))?;
        for item in &items {
            seq.serialize_element(item)?;
        }
        seq.end()
    }
}
