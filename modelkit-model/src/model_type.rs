//! The type extension engine: derived model types built from a base type
//! plus a declaration config.

use std::fmt;
use std::rc::{Rc, Weak};
use tracing::{debug, trace};

use crate::clean;
use crate::marshal;
use crate::model::Model;
use crate::options::Options;
use crate::property::{Property, PropertyTable, to_property};
use crate::resolve::{Declaration, Resolver};
use crate::types::{Type, TypeRef};
use crate::value::{Record, Value, is_reserved_key};
use crate::{Error, Result};

/// Runs after base construction, once per derivation level, root first.
pub type InitHook = Rc<dyn Fn(&Model, &mut Options<'_>) -> Result<()>>;

/// Replaces the default wrap/create factory.
pub type WrapHook = Rc<dyn Fn(&ModelType, Value, &mut Options<'_>) -> Result<Value>>;

/// Replaces the default `Model::unwrap` for instances of the type.
pub type UnwrapHook = Rc<dyn Fn(&Model) -> Value>;

/// Field-level coercion for values declared with this type.
pub type CoerceHook = Rc<dyn Fn(&ModelType, Value, &mut Options<'_>) -> Result<Value>>;

/// Instance-level behavior, invoked through [`Model::call`].
pub type Method = Rc<dyn Fn(&Model, &[Value]) -> Result<Value>>;

const ROOT_NAME: &str = "Model";

thread_local! {
    static ROOT: Rc<ModelType> = ModelType::build_root();
}

#[derive(Clone, Default)]
enum WrapMode {
    #[default]
    Default,
    Disabled,
    Custom(WrapHook),
}

#[derive(Clone)]
enum Accessor {
    Get(Rc<Property>),
    Set(Rc<Property>),
}

/// What a method name dispatches to on an instance.
#[derive(Clone)]
pub(crate) enum Dispatch {
    Get(Rc<Property>),
    Set(Rc<Property>),
    Method(Method),
}

/// Declaration of a derived type, consumed by [`ModelType::extend`].
#[derive(Default)]
pub struct TypeConfig {
    name: Option<String>,
    properties: Vec<(String, Declaration)>,
    init: Option<InitHook>,
    wrap: WrapMode,
    unwrap: Option<UnwrapHook>,
    auto_unwrap: bool,
    coerce: Option<CoerceHook>,
    additional_properties: bool,
    constructable: Option<bool>,
    methods: Vec<(String, Method)>,
    metadata: Vec<(String, Value)>,
}

impl TypeConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Name used in diagnostics and registries. Defaults to the base type's.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Declares a property; declaration order is kept for enumeration.
    #[must_use]
    pub fn property(mut self, name: impl Into<String>, declaration: impl Into<Declaration>) -> Self {
        let name = name.into();
        match self.properties.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = declaration.into(),
            None => self.properties.push((name, declaration.into())),
        }
        self
    }

    #[must_use]
    pub fn init<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Model, &mut Options<'_>) -> Result<()> + 'static,
    {
        self.init = Some(Rc::new(hook));
        self
    }

    /// Values of the type are stored and returned raw.
    #[must_use]
    pub fn wrap_disabled(mut self) -> Self {
        self.wrap = WrapMode::Disabled;
        self
    }

    #[must_use]
    pub fn wrap_with<F>(mut self, factory: F) -> Self
    where
        F: Fn(&ModelType, Value, &mut Options<'_>) -> Result<Value> + 'static,
    {
        self.wrap = WrapMode::Custom(Rc::new(factory));
        self
    }

    #[must_use]
    pub fn unwrap_with<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Model) -> Value + 'static,
    {
        self.unwrap = Some(Rc::new(hook));
        self
    }

    #[must_use]
    pub fn auto_unwrap(mut self, auto_unwrap: bool) -> Self {
        self.auto_unwrap = auto_unwrap;
        self
    }

    #[must_use]
    pub fn coerce<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ModelType, Value, &mut Options<'_>) -> Result<Value> + 'static,
    {
        self.coerce = Some(Rc::new(hook));
        self
    }

    /// Tolerate raw keys that have no descriptor.
    #[must_use]
    pub fn additional_properties(mut self, allowed: bool) -> Self {
        self.additional_properties = allowed;
        self
    }

    #[must_use]
    pub fn constructable(mut self, constructable: bool) -> Self {
        self.constructable = Some(constructable);
        self
    }

    #[must_use]
    pub fn prevent_construction(self) -> Self {
        self.constructable(false)
    }

    /// Adds an instance method. Methods shadow accessors of the same name.
    #[must_use]
    pub fn method<F>(mut self, name: impl Into<String>, method: F) -> Self
    where
        F: Fn(&Model, &[Value]) -> Result<Value> + 'static,
    {
        self.methods.push((name.into(), Rc::new(method)));
        self
    }

    /// Arbitrary static metadata, readable through [`ModelType::metadata`].
    #[must_use]
    pub fn meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.push((key.into(), value.into()));
        self
    }
}

impl fmt::Debug for TypeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeConfig")
            .field("name", &self.name)
            .field("properties", &self.properties)
            .field("additional_properties", &self.additional_properties)
            .field("constructable", &self.constructable)
            .finish_non_exhaustive()
    }
}

/// A structured type with declared properties, derived from a base type.
pub struct ModelType {
    name: String,
    this: Weak<ModelType>,
    base: Option<Rc<ModelType>>,
    properties: Option<Rc<PropertyTable>>,
    accessors: Vec<(String, Accessor)>,
    methods: Vec<(String, Method)>,
    init: Option<InitHook>,
    wrap: WrapMode,
    unwrap: Option<UnwrapHook>,
    auto_unwrap: bool,
    coerce: Option<CoerceHook>,
    additional_properties: bool,
    constructable: bool,
    metadata: Vec<(String, Value)>,
}

impl ModelType {
    /// The root type every model type derives from.
    #[must_use]
    pub fn root() -> Rc<Self> {
        ROOT.with(Rc::clone)
    }

    fn build_root() -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            name: ROOT_NAME.to_string(),
            this: this.clone(),
            base: None,
            properties: None,
            accessors: Vec::new(),
            methods: Vec::new(),
            init: None,
            wrap: WrapMode::Default,
            unwrap: None,
            auto_unwrap: false,
            coerce: None,
            additional_properties: false,
            constructable: true,
            metadata: Vec::new(),
        })
    }

    /// Derives a new type directly from the root.
    pub fn define(config: TypeConfig) -> Result<Rc<Self>> {
        Self::root().extend(config)
    }

    /// Derives a new type from this one.
    pub fn extend(self: &Rc<Self>, config: TypeConfig) -> Result<Rc<Self>> {
        self.derive(config, None)
    }

    /// Derives a new type, resolving named property types through `resolver`.
    pub fn extend_with(self: &Rc<Self>, config: TypeConfig, resolver: &dyn Resolver) -> Result<Rc<Self>> {
        self.derive(config, Some(resolver))
    }

    fn derive(self: &Rc<Self>, config: TypeConfig, resolver: Option<&dyn Resolver>) -> Result<Rc<Self>> {
        let mut accessors = Vec::new();
        let properties = if config.properties.is_empty() {
            self.properties.clone()
        } else {
            let mut table = PropertyTable::new(self.properties.clone());
            for (name, declaration) in &config.properties {
                let property = Rc::new(to_property(name, declaration, resolver)?);
                let suffix = initial_upper_case(name);
                accessors.push((format!("get{suffix}"), Accessor::Get(property.clone())));
                accessors.push((format!("set{suffix}"), Accessor::Set(property.clone())));
                table.insert(property);
            }
            Some(Rc::new(table))
        };

        let name = config.name.unwrap_or_else(|| self.name.clone());
        debug!(
            name = %name,
            base = %self.name,
            properties = config.properties.len(),
            wrapped = !matches!(config.wrap, WrapMode::Disabled),
            additional_properties = config.additional_properties,
            "extended model type"
        );

        Ok(Rc::new_cyclic(|this| Self {
            name,
            this: this.clone(),
            base: Some(self.clone()),
            properties,
            accessors,
            methods: config.methods,
            init: config.init,
            wrap: config.wrap,
            unwrap: config.unwrap,
            auto_unwrap: config.auto_unwrap,
            coerce: config.coerce,
            additional_properties: config.additional_properties,
            constructable: config.constructable.unwrap_or(true),
            metadata: config.metadata,
        }))
    }

    // ── Reflection ───────────────────────────────────────────────

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn base(&self) -> Option<&Rc<ModelType>> {
        self.base.as_ref()
    }

    /// True if this type or an ancestor declares at least one property.
    #[must_use]
    pub fn has_properties(&self) -> bool {
        self.properties.is_some()
    }

    #[must_use]
    pub fn has_property(&self, name: &str) -> bool {
        self.property(name).is_some()
    }

    /// Looks a descriptor up by external name or storage key.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<Rc<Property>> {
        self.properties.as_ref()?.lookup(name)
    }

    #[must_use]
    pub fn properties(&self) -> Option<&Rc<PropertyTable>> {
        self.properties.as_ref()
    }

    /// Visits each visible descriptor once, most-derived level first.
    pub fn for_each_property(&self, callback: impl FnMut(&Rc<Property>)) {
        if let Some(table) = &self.properties {
            table.for_each(callback);
        }
    }

    #[must_use]
    pub fn additional_properties(&self) -> bool {
        self.additional_properties
    }

    #[must_use]
    pub fn is_constructable(&self) -> bool {
        self.constructable
    }

    /// Static metadata declared on this type with [`TypeConfig::meta`].
    #[must_use]
    pub fn metadata(&self, key: &str) -> Option<Value> {
        self.metadata
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    /// True if `other` is this type or one of its ancestors.
    #[must_use]
    pub fn is_subtype_of(&self, other: &ModelType) -> bool {
        self.ancestry().any(|ty| std::ptr::eq(ty, other))
    }

    fn ancestry(&self) -> impl Iterator<Item = &ModelType> {
        std::iter::successors(Some(self), |ty| ty.base.as_deref())
    }

    pub(crate) fn handle(&self) -> Result<Rc<Self>> {
        self.this
            .upgrade()
            .ok_or_else(|| Error::TypeDropped(self.name.clone()))
    }

    pub(crate) fn find_method(&self, name: &str) -> Option<Dispatch> {
        for ty in self.ancestry() {
            if let Some((_, method)) = ty.methods.iter().rev().find(|(n, _)| n == name) {
                return Some(Dispatch::Method(method.clone()));
            }
            if let Some((_, accessor)) = ty.accessors.iter().find(|(n, _)| n == name) {
                return Some(match accessor {
                    Accessor::Get(p) => Dispatch::Get(p.clone()),
                    Accessor::Set(p) => Dispatch::Set(p.clone()),
                });
            }
        }
        None
    }

    pub(crate) fn unwrap_hook(&self) -> Option<&UnwrapHook> {
        self.ancestry().find_map(|ty| ty.unwrap.as_ref())
    }

    // ── Construction ─────────────────────────────────────────────

    /// Constructs an instance around `data`.
    ///
    /// For a type with properties, each non-reserved key runs through the
    /// setter pipeline and the record is linked back to the new instance.
    /// Without properties the data is held as given.
    pub fn create(&self, data: Option<Value>, options: &mut Options<'_>) -> Result<Model> {
        if !self.constructable {
            return Err(Error::NotConstructable(self.name.clone()));
        }
        let ty = self.handle()?;

        let model = if let Some(table) = &self.properties {
            let record = match data {
                None | Some(Value::Undefined | Value::Null) => Record::new(),
                Some(Value::Record(record)) => record,
                Some(other) => {
                    options.coercion_error(&other)?;
                    Record::new()
                }
            };
            let model = Model::new(ty, Value::Record(record.clone()));
            for (key, value) in record.entries() {
                if is_reserved_key(&key) {
                    continue;
                }
                match table.lookup(&key) {
                    Some(property) => marshal::set(&model, &property, value, options)?,
                    None if !self.additional_properties => {
                        options.report(Error::UnrecognizedProperty(key))?;
                    }
                    None => {}
                }
            }
            record.attach(&model);
            model
        } else {
            Model::new(ty, data.unwrap_or_default())
        };

        let mut chain: Vec<&ModelType> = self.ancestry().collect();
        chain.reverse();
        for level in chain {
            if let Some(init) = &level.init {
                init(&model, options)?;
            }
        }
        Ok(model)
    }

    /// Constructs an empty instance in throwing mode.
    pub fn new_instance(&self) -> Result<Model> {
        self.create(None, &mut Options::new())
    }

    /// Wraps `value` in throwing mode and returns the wrapper.
    pub fn wrap_model(&self, value: impl Into<Value>) -> Result<Model> {
        match self.wrap(value.into(), &mut Options::new())? {
            Value::Model(model) => Ok(model),
            other => Err(Error::invalid_value(None, &other)),
        }
    }

    fn default_wrap(&self, value: Value, options: &mut Options<'_>) -> Result<Value> {
        if let Value::Model(model) = &value {
            if model.model_type().is_subtype_of(self) {
                return Ok(value);
            }
        }

        let value = match &self.coerce {
            Some(coerce) => coerce(self, value, options)?,
            None => value,
        };
        if value.is_nullish() {
            return Ok(value);
        }

        let value = match value {
            Value::Model(model) if model.model_type().is_subtype_of(self) => {
                return Ok(Value::Model(model));
            }
            Value::Model(model) => {
                debug!(from = %model.model_type().name(), to = %self.name, "re-wrapping incompatible model");
                let data = model.data();
                if let Value::Record(record) = &data {
                    record.detach();
                }
                data
            }
            other => other,
        };

        if matches!(self.wrap, WrapMode::Disabled) {
            return Ok(value);
        }
        if matches!(value, Value::Array(_)) {
            return Err(Error::ArrayWrap);
        }
        if self.properties.is_some() && !matches!(value, Value::Record(_)) {
            return options.coercion_error(&value);
        }
        if let Value::Record(record) = &value {
            if let Some(existing) = record.wrapper() {
                trace!(name = %self.name, "reusing attached wrapper");
                return Ok(Value::Model(existing));
            }
        }
        Ok(Value::Model(self.create(Some(value), options)?))
    }

    /// Wraps a value read back from a record. It was coerced when it was
    /// stored, so a record only gets a wrapper attached: no coercion, no
    /// unrecognized-key checks and no init hooks.
    pub(crate) fn wrap_stored(&self, value: Value) -> Result<Value> {
        let reuses_storage = matches!(self.wrap, WrapMode::Default)
            && self.constructable
            && !value.is_nullish()
            && !matches!(value, Value::Array(_) | Value::Model(_));
        if !reuses_storage {
            return self.wrap(value, &mut Options::new());
        }

        match &value {
            Value::Record(record) => {
                if let Some(existing) = record.wrapper() {
                    return Ok(Value::Model(existing));
                }
                if self.properties.is_some() {
                    let model = Model::new(self.handle()?, value.clone());
                    record.attach(&model);
                    trace!(name = %self.name, "attached wrapper to stored record");
                    return Ok(Value::Model(model));
                }
            }
            _ if self.properties.is_some() => return self.wrap(value.clone(), &mut Options::new()),
            _ => {}
        }
        Ok(Value::Model(Model::new(self.handle()?, value)))
    }

    /// Cleans a raw value held under this type.
    pub(crate) fn clean_data(&self, data: &Value, errors: Option<&mut Vec<String>>) -> Value {
        match (&self.properties, data) {
            (Some(_), Value::Record(record)) => clean::clean_record(self, record, errors),
            _ => data.clone(),
        }
    }
}

impl Type for ModelType {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_wrapped(&self) -> bool {
        !matches!(self.wrap, WrapMode::Disabled)
    }

    fn is_auto_unwrapped(&self) -> bool {
        self.auto_unwrap
    }

    fn is_primitive(&self) -> bool {
        false
    }

    fn coerce(&self, value: Value, options: &mut Options<'_>) -> Result<Value> {
        match &self.coerce {
            Some(coerce) => coerce(self, value, options),
            None => Ok(value),
        }
    }

    fn wrap(&self, value: Value, options: &mut Options<'_>) -> Result<Value> {
        match &self.wrap {
            WrapMode::Custom(factory) => factory(self, value, options),
            WrapMode::Default | WrapMode::Disabled => self.default_wrap(value, options),
        }
    }

    fn unwrap(&self, value: Value) -> Value {
        match value {
            Value::Model(model) => model.unwrap(),
            other => other,
        }
    }

    fn super_type(&self) -> Option<TypeRef> {
        self.base.clone().map(|base| base as TypeRef)
    }

    fn as_model_type(&self) -> Option<&ModelType> {
        Some(self)
    }
}

impl fmt::Debug for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelType")
            .field("name", &self.name)
            .field("base", &self.base.as_ref().map(|b| b.name.clone()))
            .field("properties", &self.properties.as_ref().map(|t| t.own_len()))
            .field("wrapped", &self.is_wrapped())
            .field("additional_properties", &self.additional_properties)
            .field("constructable", &self.constructable)
            .finish()
    }
}

fn initial_upper_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

