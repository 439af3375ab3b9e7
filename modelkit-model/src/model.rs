//! Wrapper instances backed by a shared raw record.

use std::fmt;
use std::rc::{Rc, Weak};

use crate::clean;
use crate::marshal;
use crate::model_type::{Dispatch, ModelType};
use crate::options::Options;
use crate::property::Property;
use crate::value::{Record, Value};
use crate::{Error, Result};

pub(crate) struct ModelInner {
    ty: Rc<ModelType>,
    data: Value,
}

/// An instance of a model type. Cloning clones the handle; two handles are
/// the same instance when [`Model::ptr_eq`] holds.
#[derive(Clone)]
pub struct Model(Rc<ModelInner>);

impl Model {
    pub(crate) fn new(ty: Rc<ModelType>, data: Value) -> Self {
        Self(Rc::new(ModelInner { ty, data }))
    }

    pub(crate) fn from_inner(inner: Rc<ModelInner>) -> Self {
        Self(inner)
    }

    pub(crate) fn downgrade(&self) -> Weak<ModelInner> {
        Rc::downgrade(&self.0)
    }

    #[must_use]
    pub fn model_type(&self) -> &Rc<ModelType> {
        &self.0.ty
    }

    /// The raw value this instance wraps. For types with properties this is
    /// always the record handed to the constructor.
    #[must_use]
    pub fn data(&self) -> Value {
        self.0.data.clone()
    }

    #[must_use]
    pub fn record(&self) -> Option<&Record> {
        self.0.data.as_record()
    }

    /// Recovers the raw form, honoring the nearest custom unwrap hook.
    #[must_use]
    pub fn unwrap(&self) -> Value {
        match self.0.ty.unwrap_hook() {
            Some(hook) => hook(self),
            None => self.data(),
        }
    }

    /// Reads a declared property through the getter pipeline.
    pub fn get(&self, name: &str) -> Result<Value> {
        let property = self.lookup(name)?;
        marshal::get(self, &property)
    }

    /// Writes a declared property in throwing mode.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        self.set_with(name, value, &mut Options::new())
    }

    /// Writes a declared property with the caller's options.
    pub fn set_with(&self, name: &str, value: impl Into<Value>, options: &mut Options<'_>) -> Result<()> {
        let property = self.lookup(name)?;
        marshal::set(self, &property, value.into(), options)
    }

    /// Invokes an accessor (`getName`, `setName`) or a declared method.
    pub fn call(&self, method: &str, args: &[Value]) -> Result<Value> {
        match self.0.ty.find_method(method) {
            Some(Dispatch::Get(property)) => marshal::get(self, &property),
            Some(Dispatch::Set(property)) => {
                let value = args.first().cloned().unwrap_or_default();
                marshal::set(self, &property, value, &mut Options::new())?;
                Ok(Value::Undefined)
            }
            Some(Dispatch::Method(method)) => method(self, args),
            None => Err(Error::UnknownMethod {
                type_name: self.0.ty.name().to_string(),
                method: method.to_string(),
            }),
        }
    }

    #[must_use]
    pub fn has_method(&self, method: &str) -> bool {
        self.0.ty.find_method(method).is_some()
    }

    /// Snapshot holding only persisted fields. Unrecognized keys are reported
    /// into `errors` when given.
    #[must_use]
    pub fn clean(&self, errors: Option<&mut Vec<String>>) -> Value {
        self.0.ty.clean_data(&self.0.data, errors)
    }

    /// Text form of [`Model::clean`].
    pub fn stringify(&self, pretty: bool) -> Result<String> {
        clean::stringify(&Value::Model(self.clone()), pretty)
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    fn lookup(&self, name: &str) -> Result<Rc<Property>> {
        self.0.ty.property(name).ok_or_else(|| Error::UnknownProperty {
            type_name: self.0.ty.name().to_string(),
            property: name.to_string(),
        })
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?})", self.0.ty.name(), self.0.data)
    }
}

/// Returns true if `value` is a wrapper instance.
#[must_use]
pub fn is_model(value: &Value) -> bool {
    matches!(value, Value::Model(_))
}

/// Replaces a wrapper by its raw data; any other value is returned unchanged.
#[must_use]
pub fn unwrap(value: Value) -> Value {
    match value {
        Value::Model(model) => model.data(),
        other => other,
    }
}
