//! Property descriptors and the layered table a model type keeps them in.

use std::fmt;
use std::rc::Rc;

use crate::model::Model;
use crate::resolve::{Declaration, Resolved, Resolver, resolve_declaration};
use crate::types::TypeRef;
use crate::value::Value;
use crate::Result;

/// Custom read accessor; its result is returned unmodified.
pub type Getter = Rc<dyn Fn(&Model, &Property) -> Result<Value>>;

/// Custom write accessor; receives the already-coerced value.
pub type Setter = Rc<dyn Fn(&Model, &Property, Value) -> Result<()>>;

/// Explicit property configuration: `{type, items, property, get, set, persist}`.
#[derive(Clone)]
pub struct PropertyConfig {
    ty: Option<Declaration>,
    items: Option<Declaration>,
    storage_key: Option<String>,
    getter: Option<Getter>,
    setter: Option<Setter>,
    persist: bool,
}

impl PropertyConfig {
    /// A configuration declaring `ty` as the property's type.
    #[must_use]
    pub fn new(ty: impl Into<Declaration>) -> Self {
        Self {
            ty: Some(ty.into()),
            ..Self::untyped()
        }
    }

    /// A configuration with no type; it resolves to the `object` primitive.
    #[must_use]
    pub fn untyped() -> Self {
        Self {
            ty: None,
            items: None,
            storage_key: None,
            getter: None,
            setter: None,
            persist: true,
        }
    }

    /// Element declaration for array types.
    #[must_use]
    pub fn items(mut self, items: impl Into<Declaration>) -> Self {
        self.items = Some(items.into());
        self
    }

    /// Key inside the raw record, when it differs from the property name.
    #[must_use]
    pub fn storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn get<F>(mut self, getter: F) -> Self
    where
        F: Fn(&Model, &Property) -> Result<Value> + 'static,
    {
        self.getter = Some(Rc::new(getter));
        self
    }

    #[must_use]
    pub fn set<F>(mut self, setter: F) -> Self
    where
        F: Fn(&Model, &Property, Value) -> Result<()> + 'static,
    {
        self.setter = Some(Rc::new(setter));
        self
    }

    /// Whether the property is kept by `clean()`.
    #[must_use]
    pub fn persist(mut self, persist: bool) -> Self {
        self.persist = persist;
        self
    }

    pub(crate) fn declared_type(&self) -> Option<&Declaration> {
        self.ty.as_ref()
    }

    pub(crate) fn declared_items(&self) -> Option<&Declaration> {
        self.items.as_ref()
    }
}

impl fmt::Debug for PropertyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyConfig")
            .field("type", &self.ty)
            .field("items", &self.items)
            .field("storage_key", &self.storage_key)
            .field("get", &self.getter.is_some())
            .field("set", &self.setter.is_some())
            .field("persist", &self.persist)
            .finish()
    }
}

/// Immutable metadata describing one declared field.
pub struct Property {
    name: String,
    storage_key: String,
    ty: TypeRef,
    items: Option<Rc<Property>>,
    getter: Option<Getter>,
    setter: Option<Setter>,
    persisted: bool,
}

impl Property {
    /// External (accessor) name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key inside the raw record.
    #[must_use]
    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    #[must_use]
    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }

    /// Element descriptor, present only for array types with a declared element.
    /// It carries its owner's name so diagnostics point at the owning field.
    #[must_use]
    pub fn items(&self) -> Option<&Rc<Property>> {
        self.items.as_ref()
    }

    #[must_use]
    pub fn getter(&self) -> Option<&Getter> {
        self.getter.as_ref()
    }

    #[must_use]
    pub fn setter(&self) -> Option<&Setter> {
        self.setter.as_ref()
    }

    #[must_use]
    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    fn element(name: &str, storage_key: &str, resolved: Resolved) -> Self {
        Self {
            name: name.to_string(),
            storage_key: storage_key.to_string(),
            ty: resolved.ty,
            items: resolved
                .items
                .map(|items| Rc::new(Self::element(name, storage_key, *items))),
            getter: None,
            setter: None,
            persisted: true,
        }
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("storage_key", &self.storage_key)
            .field("type", &self.ty.name())
            .field("items", &self.items)
            .field("persisted", &self.persisted)
            .finish()
    }
}

/// Builds the descriptor for `name` from its declaration.
pub fn to_property(
    name: &str,
    declaration: &Declaration,
    resolver: Option<&dyn Resolver>,
) -> Result<Property> {
    let resolved = resolve_declaration(declaration, resolver)?;
    let config = match declaration {
        Declaration::Config(config) => Some(config.as_ref()),
        _ => None,
    };
    let storage_key = config
        .and_then(|c| c.storage_key.clone())
        .unwrap_or_else(|| name.to_string());
    let items = resolved
        .items
        .map(|items| Rc::new(Property::element(name, &storage_key, *items)));

    Ok(Property {
        name: name.to_string(),
        ty: resolved.ty,
        items,
        getter: config.and_then(|c| c.getter.clone()),
        setter: config.and_then(|c| c.setter.clone()),
        persisted: config.is_none_or(|c| c.persist),
        storage_key,
    })
}

/// One level of a type's property table, chained to its base type's table.
///
/// Descriptors are registered under their name and, when different, their
/// storage key. Lookups fall through to the parent level, so a derived
/// declaration shadows an ancestor's without removing it.
#[derive(Debug, Default)]
pub struct PropertyTable {
    entries: Vec<(String, Rc<Property>)>,
    parent: Option<Rc<PropertyTable>>,
}

impl PropertyTable {
    #[must_use]
    pub fn new(parent: Option<Rc<PropertyTable>>) -> Self {
        Self {
            entries: Vec::new(),
            parent,
        }
    }

    /// Registers `property` at this level under its name and storage key.
    pub fn insert(&mut self, property: Rc<Property>) {
        self.insert_key(property.name().to_string(), property.clone());
        if property.storage_key() != property.name() {
            self.insert_key(property.storage_key().to_string(), property);
        }
    }

    fn insert_key(&mut self, key: String, property: Rc<Property>) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = property,
            None => self.entries.push((key, property)),
        }
    }

    /// Finds a descriptor by name or storage key, most-derived level first.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<Rc<Property>> {
        let mut level = Some(self);
        while let Some(table) = level {
            if let Some((_, property)) = table.entries.iter().find(|(k, _)| k == key) {
                return Some(property.clone());
            }
            level = table.parent.as_deref();
        }
        None
    }

    /// Visits every visible descriptor once: most-derived level first, and
    /// declaration order within a level. Shadowed ancestors are skipped.
    pub fn for_each(&self, mut callback: impl FnMut(&Rc<Property>)) {
        let mut seen: Vec<&str> = Vec::new();
        let mut level = Some(self);
        while let Some(table) = level {
            for (key, property) in &table.entries {
                if key != property.name() || seen.contains(&key.as_str()) {
                    continue;
                }
                seen.push(key);
                callback(property);
            }
            level = table.parent.as_deref();
        }
    }

    /// Number of properties declared at this level.
    #[must_use]
    pub fn own_len(&self) -> usize {
        self.entries
            .iter()
            .filter(|(key, property)| key == property.name())
            .count()
    }

    #[must_use]
    pub fn parent(&self) -> Option<&Rc<PropertyTable>> {
        self.parent.as_ref()
    }
}
