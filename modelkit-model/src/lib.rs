//! Runtime model types over plain, untyped records.
//!
//! A program declares structured *model* types over raw [`Record`]s and gets
//! typed accessors, value coercion, validation diagnostics and canonical
//! snapshots back, without the engine ever copying the record it wraps:
//! - [`Value`] / [`Record`] / [`Array`] — the untyped data, shared by handle
//! - [`Type`] — the capability contract every primitive or model type meets
//! - [`Declaration`] — how a property's type is written down, resolved by
//!   [`resolve_declaration`] into a [`Resolved`] pair
//! - [`Property`] — the immutable descriptor of one declared field
//! - [`ModelType`] — a derived type built by [`ModelType::extend`]
//! - [`Model`] — one wrapper instance, reading and writing through the
//!   coercion pipeline in [`marshal`]
//! - [`clean`] / [`stringify`] — persisted-only snapshots and their text form
//!
//! Every failure is either raised as an [`Error`] or, when the caller hands
//! in an error list through [`Options::collecting`], recorded as a
//! diagnostic while processing continues.
//!
//! The engine is single-threaded: records, arrays and types are reference
//! counted with `Rc` and mutated through `RefCell`.

mod clean;
pub mod marshal;
mod model;
mod model_type;
mod options;
pub mod primitives;
mod property;
mod registry;
mod resolve;
mod types;
mod value;

pub use clean::{clean, stringify};
pub use model::{Model, is_model, unwrap};
pub use model_type::{
    CoerceHook, InitHook, Method, ModelType, TypeConfig, UnwrapHook, WrapHook,
};
pub use options::{Options, Settings};
pub use property::{Getter, Property, PropertyConfig, PropertyTable, Setter, to_property};
pub use registry::TypeRegistry;
pub use resolve::{Declaration, Primitive, Resolved, Resolver, resolve_declaration};
pub use types::{Type, TypeRef, same_type};
pub use value::{Array, RESERVED_PREFIX, Record, Value, is_reserved_key};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the model engine.
///
/// Only [`Error::InvalidValue`] and [`Error::UnrecognizedProperty`] describe bad
/// input data and may be collected instead of raised; every other variant is
/// a schema-authoring defect and is always raised.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A value could not be coerced into its declared type.
    #[error("{}Invalid value: {value}", property_prefix(.property))]
    InvalidValue {
        property: Option<String>,
        value: String,
    },

    /// Input data carried a key the type does not declare.
    #[error("Unrecognized property: {0}")]
    UnrecognizedProperty(String),

    /// The type was marked as not constructable.
    #[error("Instances of this type cannot be created: {0}")]
    NotConstructable(String),

    /// Arrays are stored raw and can never be wrapped by a model type.
    #[error("Wrapping Array object is not allowed.")]
    ArrayWrap,

    /// A type name could not be resolved.
    #[error("Invalid type: {0}")]
    UnknownType(String),

    /// Accessor for a property the type does not declare.
    #[error("{type_name} has no property named {property}")]
    UnknownProperty { type_name: String, property: String },

    /// Call of a method the type does not define.
    #[error("{type_name} has no method named {method}")]
    UnknownMethod { type_name: String, method: String },

    /// The type handle backing a wrapper was dropped.
    #[error("model type {0} is no longer alive")]
    TypeDropped(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Returns true for conditions that collecting mode records instead of raising.
    #[must_use]
    pub fn is_collectable(&self) -> bool {
        matches!(
            self,
            Self::InvalidValue { .. } | Self::UnrecognizedProperty(_)
        )
    }

    pub(crate) fn invalid_value(property: Option<&Property>, value: &Value) -> Self {
        Self::InvalidValue {
            property: property.map(|p| p.name().to_string()),
            value: value.to_string(),
        }
    }
}

fn property_prefix(property: &Option<String>) -> String {
    match property {
        Some(name) => format!("{name}: "),
        None => String::new(),
    }
}
