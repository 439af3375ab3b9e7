//! The capability contract shared by primitive and model types.

use std::fmt;
use std::rc::Rc;

use crate::model_type::ModelType;
use crate::options::Options;
use crate::value::Value;
use crate::Result;

/// Shared handle to a type. Type identity is handle identity.
pub type TypeRef = Rc<dyn Type>;

/// A capability bundle describing how values of one kind are represented,
/// coerced and wrapped.
///
/// Built-in primitives live in [`crate::primitives`]; model types are built by
/// [`ModelType::extend`]. Other crates plug their own kinds in by implementing
/// this trait.
pub trait Type: fmt::Debug {
    /// Human-readable name used in diagnostics and registries.
    fn name(&self) -> &str;

    /// Whether values of this type are represented by wrapper objects.
    fn is_wrapped(&self) -> bool;

    /// Whether a wrapped value is handed back raw when a field is read.
    fn is_auto_unwrapped(&self) -> bool {
        false
    }

    /// True for leaf types with no declared structure.
    fn is_primitive(&self) -> bool;

    /// Normalizes or validates `value`. Failures go through
    /// [`Options::coercion_error`] so collecting mode can continue.
    fn coerce(&self, value: Value, options: &mut Options<'_>) -> Result<Value> {
        let _ = options;
        Ok(value)
    }

    /// Produces the wrapped form of `value`, or the value itself when this
    /// type does not wrap.
    fn wrap(&self, value: Value, options: &mut Options<'_>) -> Result<Value>;

    /// Recovers the raw value behind a wrapper.
    fn unwrap(&self, value: Value) -> Value {
        crate::model::unwrap(value)
    }

    /// The type this one was derived from.
    fn super_type(&self) -> Option<TypeRef> {
        None
    }

    /// Returns true if `other` is this type or one of its ancestors.
    fn is_compatible_with(&self, other: &TypeRef) -> bool {
        if std::ptr::addr_eq(self as *const Self, Rc::as_ptr(other)) {
            return true;
        }
        let mut current = self.super_type();
        while let Some(ty) = current {
            if same_type(&ty, other) {
                return true;
            }
            current = ty.super_type();
        }
        false
    }

    /// Downcast for model types.
    fn as_model_type(&self) -> Option<&ModelType> {
        None
    }
}

/// Returns true if both handles refer to the same type.
#[must_use]
pub fn same_type(a: &TypeRef, b: &TypeRef) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}
