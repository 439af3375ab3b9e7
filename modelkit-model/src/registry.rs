use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, warn};

use crate::model_type::{ModelType, TypeConfig};
use crate::resolve::Resolver;
use crate::types::TypeRef;
use crate::Result;

/// Application-defined named types, used to resolve names such as
/// `"Address"` or `"Address[]"` in property declarations.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: HashMap<String, TypeRef>,
}

impl TypeRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `ty` under `name`, replacing any earlier registration.
    pub fn register(&mut self, name: impl Into<String>, ty: TypeRef) {
        let name = name.into();
        if self.types.insert(name.clone(), ty).is_some() {
            warn!(%name, "replaced registered type");
        } else {
            debug!(%name, "registered type");
        }
    }

    /// Defines a model type whose named property types resolve against this
    /// registry, then registers it under the configured name.
    pub fn define(&mut self, name: &str, config: TypeConfig) -> Result<Rc<ModelType>> {
        let ty = ModelType::root().extend_with(config.name(name), &*self)?;
        self.register(name, ty.clone());
        Ok(ty)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<TypeRef> {
        self.types.get(name).cloned()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl Resolver for TypeRegistry {
    fn resolve(&self, name: &str) -> Option<TypeRef> {
        self.get(name)
    }
}
