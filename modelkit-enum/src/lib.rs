//! Enumerated model types.
//!
//! An enum is a model type with no properties whose instances are a fixed set
//! of constants. It plugs into `modelkit-model` only through the public type
//! contract:
//! - values are stored raw (a name, or the record declared for it)
//! - wrapping a name, a raw value or a constant yields the shared constant
//! - coercion maps a name to its raw value and reports anything else
//!
//! Constants answer `name`, `value`, `toString`, `clean` and one `is<Name>`
//! predicate per constant through [`modelkit_model::Model::call`].

mod config;
mod enum_type;

pub use config::EnumConfig;
pub use enum_type::EnumType;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, EnumError>;

/// Errors raised while building an enum type.
#[derive(Debug, thiserror::Error)]
pub enum EnumError {
    #[error("enum declares no values")]
    Empty,

    #[error("duplicate enum constant: {0}")]
    Duplicate(String),

    #[error(transparent)]
    Model(#[from] modelkit_model::Error),
}
