//! Per-call options and the throw-or-collect adapter.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;
use tracing::debug;

use crate::property::Property;
use crate::value::Value;
use crate::{Error, Result};

/// Validation behavior a host may load from its own configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Reject values that are not already in the expected representation.
    #[serde(default)]
    pub strict: bool,
}

/// Options threaded through construction, wrapping, coercion and assignment.
///
/// Without an error list every failure is raised. With one, invalid values
/// and unrecognized properties are appended as diagnostics and processing
/// continues with the offending field left undefined.
#[derive(Default)]
pub struct Options<'a> {
    errors: Option<&'a mut Vec<String>>,
    strict: bool,
    property: Option<Rc<Property>>,
}

impl<'a> Options<'a> {
    /// Throwing mode, lenient coercion.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Collecting mode: diagnostics are appended to `errors`.
    #[must_use]
    pub fn collecting(errors: &'a mut Vec<String>) -> Self {
        Self {
            errors: Some(errors),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    #[must_use]
    pub fn with_settings(mut self, settings: &Settings) -> Self {
        self.strict = settings.strict;
        self
    }

    #[must_use]
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    #[must_use]
    pub fn is_collecting(&self) -> bool {
        self.errors.is_some()
    }

    /// Diagnostics recorded so far, when collecting.
    #[must_use]
    pub fn errors(&self) -> Option<&[String]> {
        self.errors.as_deref().map(Vec::as_slice)
    }

    /// The descriptor whose value is being coerced, if any.
    #[must_use]
    pub fn property(&self) -> Option<&Rc<Property>> {
        self.property.as_ref()
    }

    pub(crate) fn replace_property(&mut self, property: Option<Rc<Property>>) -> Option<Rc<Property>> {
        std::mem::replace(&mut self.property, property)
    }

    /// Raises `err`, or records it and yields `Undefined` when collecting
    /// and the condition is collectable.
    pub fn report(&mut self, err: Error) -> Result<Value> {
        match self.errors.as_deref_mut() {
            Some(errors) if err.is_collectable() => {
                let message = err.to_string();
                debug!(%message, "recorded model diagnostic");
                errors.push(message);
                Ok(Value::Undefined)
            }
            _ => Err(err),
        }
    }

    /// Reports `value` as invalid for the active property.
    pub fn coercion_error(&mut self, value: &Value) -> Result<Value> {
        let err = Error::invalid_value(self.property.as_deref(), value);
        self.report(err)
    }
}

impl fmt::Debug for Options<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("collecting", &self.is_collecting())
            .field("strict", &self.strict)
            .field("property", &self.property.as_ref().map(|p| p.name().to_string()))
            .finish()
    }
}
