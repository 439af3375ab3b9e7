//! Parses property declarations into canonical `{type, items}` pairs.
//!
//! Resolution runs when a type is defined, not per instance, so it never
//! collects: an unresolvable declaration is always an error.

use std::fmt;
use std::rc::Rc;

use crate::model_type::ModelType;
use crate::primitives;
use crate::property::PropertyConfig;
use crate::types::TypeRef;
use crate::{Error, Result};

/// Suffix marking a type name as an array of that type.
const ARRAY_SUFFIX: &str = "[]";

/// Host-level primitive markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    String,
    Number,
    Boolean,
    Date,
    Object,
    Array,
}

/// How a property's type is written down.
#[derive(Clone)]
pub enum Declaration {
    /// A type handle, used unchanged.
    Type(TypeRef),
    /// One of the fixed primitive markers.
    Primitive(Primitive),
    /// A type name, optionally suffixed with `[]`.
    Named(String),
    /// Array shorthand: empty for untyped elements, otherwise the first
    /// entry declares the element type.
    Array(Vec<Declaration>),
    /// Explicit configuration with storage key, accessors and persistence.
    Config(Box<PropertyConfig>),
}

impl Declaration {
    /// Shorthand for an array whose elements are declared by `items`.
    #[must_use]
    pub fn array_of(items: impl Into<Declaration>) -> Self {
        Self::Array(vec![items.into()])
    }

    /// Shorthand for an array of unspecified element type.
    #[must_use]
    pub fn array() -> Self {
        Self::Array(Vec::new())
    }
}

impl fmt::Debug for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type(ty) => write!(f, "Type({})", ty.name()),
            Self::Primitive(p) => write!(f, "Primitive({p:?})"),
            Self::Named(name) => write!(f, "Named({name:?})"),
            Self::Array(items) => f.debug_tuple("Array").field(items).finish(),
            Self::Config(config) => config.fmt(f),
        }
    }
}

impl From<Primitive> for Declaration {
    fn from(p: Primitive) -> Self {
        Self::Primitive(p)
    }
}

impl From<&str> for Declaration {
    fn from(name: &str) -> Self {
        Self::Named(name.to_string())
    }
}

impl From<String> for Declaration {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}

impl From<TypeRef> for Declaration {
    fn from(ty: TypeRef) -> Self {
        Self::Type(ty)
    }
}

impl From<Rc<ModelType>> for Declaration {
    fn from(ty: Rc<ModelType>) -> Self {
        Self::Type(ty)
    }
}

impl From<&Rc<ModelType>> for Declaration {
    fn from(ty: &Rc<ModelType>) -> Self {
        Self::Type(ty.clone())
    }
}

impl From<PropertyConfig> for Declaration {
    fn from(config: PropertyConfig) -> Self {
        Self::Config(Box::new(config))
    }
}

impl From<Vec<Declaration>> for Declaration {
    fn from(items: Vec<Declaration>) -> Self {
        Self::Array(items)
    }
}

/// Looks up application-defined named types.
pub trait Resolver {
    fn resolve(&self, name: &str) -> Option<TypeRef>;
}

impl<F> Resolver for F
where
    F: Fn(&str) -> Option<TypeRef>,
{
    fn resolve(&self, name: &str) -> Option<TypeRef> {
        self(name)
    }
}

/// A resolved declaration: the type, plus the element declaration for arrays.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub ty: TypeRef,
    pub items: Option<Box<Resolved>>,
}

impl Resolved {
    fn of(ty: TypeRef) -> Self {
        Self { ty, items: None }
    }

    fn array(items: Option<Resolved>) -> Self {
        Self {
            ty: primitives::array(),
            items: items.map(Box::new),
        }
    }
}

/// Resolves `declaration`, consulting `resolver` for names that are not
/// built-in primitives.
pub fn resolve_declaration(
    declaration: &Declaration,
    resolver: Option<&dyn Resolver>,
) -> Result<Resolved> {
    match declaration {
        Declaration::Type(ty) => Ok(Resolved::of(ty.clone())),
        Declaration::Primitive(p) => Ok(Resolved::of(primitives::for_marker(*p))),
        Declaration::Named(name) => resolve_name(name, resolver),
        Declaration::Array(items) => {
            let items = items
                .first()
                .map(|d| resolve_declaration(d, resolver))
                .transpose()?;
            Ok(Resolved::array(items))
        }
        Declaration::Config(config) => {
            let Some(ty) = config.declared_type() else {
                return Ok(Resolved::of(primitives::object()));
            };
            let mut resolved = resolve_declaration(ty, resolver)?;
            if resolved.items.is_none() {
                if let Some(items) = config.declared_items() {
                    resolved.items = Some(Box::new(resolve_declaration(items, resolver)?));
                }
            }
            Ok(resolved)
        }
    }
}

fn resolve_name(name: &str, resolver: Option<&dyn Resolver>) -> Result<Resolved> {
    if let Some(element) = name.strip_suffix(ARRAY_SUFFIX) {
        return Ok(Resolved::array(Some(resolve_name(element, resolver)?)));
    }
    primitives::by_name(name)
        .or_else(|| resolver.and_then(|r| r.resolve(name)))
        .map(Resolved::of)
        .ok_or_else(|| Error::UnknownType(name.to_string()))
}
