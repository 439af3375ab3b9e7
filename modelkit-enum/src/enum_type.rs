use std::cell::OnceCell;
use std::fmt;
use std::rc::Rc;
use tracing::debug;

use modelkit_model::{Declaration, Model, ModelType, Options, Type, TypeConfig, TypeRef, Value};

use crate::config::EnumConfig;
use crate::{EnumError, Result};

const DEFAULT_NAME: &str = "Enum";

struct Constant {
    name: String,
    model: Model,
}

/// Constants of one enum. Filled once, right after the type is built, so the
/// hooks installed on the type can see them.
struct ConstantTable {
    constants: OnceCell<Vec<Constant>>,
    auto_upper_case: bool,
}

impl ConstantTable {
    fn constants(&self) -> &[Constant] {
        self.constants.get().map_or(&[], Vec::as_slice)
    }

    fn is_sealed(&self) -> bool {
        self.constants.get().is_some()
    }

    fn by_name(&self, name: &str) -> Option<&Constant> {
        let upper;
        let name = if self.auto_upper_case {
            upper = name.to_uppercase();
            upper.as_str()
        } else {
            name
        };
        let constants = self.constants();
        constants
            .iter()
            .find(|c| c.name == name)
            .or_else(|| constants.iter().find(|c| c.name.to_uppercase() == name))
    }

    fn by_value(&self, value: &Value) -> Option<&Constant> {
        self.constants().iter().find(|c| c.model.data() == *value)
    }

    fn of(&self, model: &Model) -> Option<&Constant> {
        self.constants()
            .iter()
            .find(|c| c.model.ptr_eq(model))
            .or_else(|| self.by_value(&model.data()))
    }

    fn lookup(&self, ty: &ModelType, value: &Value) -> Option<&Constant> {
        match value {
            Value::Model(model) if model.model_type().is_subtype_of(ty) => self.of(model),
            Value::Model(_) => None,
            Value::String(name) => self.by_name(name).or_else(|| self.by_value(value)),
            other => self.by_value(other),
        }
    }
}

/// A model type whose instances are a fixed set of named constants.
#[derive(Clone)]
pub struct EnumType {
    ty: Rc<ModelType>,
    table: Rc<ConstantTable>,
}

impl EnumType {
    /// Builds the enum type and its constants.
    pub fn create(config: EnumConfig) -> Result<Self> {
        if config.values.is_empty() {
            return Err(EnumError::Empty);
        }
        for (index, (name, _)) in config.values.iter().enumerate() {
            if config.values[..index].iter().any(|(other, _)| other == name) {
                return Err(EnumError::Duplicate(name.clone()));
            }
        }

        let name = config.name.unwrap_or_else(|| DEFAULT_NAME.to_string());
        let table = Rc::new(ConstantTable {
            constants: OnceCell::new(),
            auto_upper_case: config.auto_upper_case,
        });

        let ty = ModelType::define(Self::type_config(&name, &table, &config.values))?;

        let mut options = Options::new();
        let mut constants = Vec::with_capacity(config.values.len());
        for (constant, value) in config.values {
            let model = ty.create(Some(value), &mut options)?;
            constants.push(Constant {
                name: constant,
                model,
            });
        }
        let count = table.constants.get_or_init(|| constants).len();

        debug!(
            name = %name,
            constants = count,
            auto_upper_case = table.auto_upper_case,
            "created enum type"
        );
        Ok(Self { ty, table })
    }

    fn type_config(name: &str, table: &Rc<ConstantTable>, values: &[(String, Value)]) -> TypeConfig {
        let coerce_table = table.clone();
        let wrap_table = table.clone();
        let init_table = table.clone();
        let name_table = table.clone();
        let string_table = table.clone();

        let mut config = TypeConfig::new()
            .name(name)
            .coerce(move |ty, value, options| {
                if value.is_nullish() {
                    return Ok(value);
                }
                match coerce_table.lookup(ty, &value) {
                    Some(constant) => Ok(constant.model.data()),
                    None => options.coercion_error(&value),
                }
            })
            .wrap_with(move |ty, value, options| {
                if value.is_nullish() {
                    return Ok(value);
                }
                match wrap_table.lookup(ty, &value) {
                    Some(constant) => Ok(Value::Model(constant.model.clone())),
                    None => options.coercion_error(&value),
                }
            })
            .init(move |model, options| {
                if init_table.is_sealed() && init_table.of(model).is_none() {
                    options.coercion_error(&model.data())?;
                }
                Ok(())
            })
            .method("name", move |model, _| {
                Ok(name_table
                    .of(model)
                    .map_or(Value::Undefined, |c| Value::String(c.name.clone())))
            })
            .method("toString", move |model, _| {
                Ok(string_table
                    .of(model)
                    .map_or(Value::Undefined, |c| Value::String(c.name.clone())))
            })
            .method("value", |model, _| Ok(model.data()))
            .method("clean", |model, _| Ok(model.clean(None)));

        for (constant, _) in values {
            let table = table.clone();
            let expected = constant.clone();
            config = config.method(format!("is{}", initial_upper_case(constant)), move |model, _| {
                Ok(Value::Bool(
                    table.of(model).is_some_and(|c| c.name == expected),
                ))
            });
        }
        config
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.ty.name()
    }

    #[must_use]
    pub fn model_type(&self) -> &Rc<ModelType> {
        &self.ty
    }

    /// The enum as a type handle, for property declarations and registries.
    #[must_use]
    pub fn as_type(&self) -> TypeRef {
        self.ty.clone()
    }

    /// The constant declared as `name`, also reachable by its upper-cased name.
    #[must_use]
    pub fn constant(&self, name: &str) -> Option<Model> {
        self.table.by_name(name).map(|c| c.model.clone())
    }

    /// All constants, in declaration order.
    #[must_use]
    pub fn constants(&self) -> Vec<Model> {
        self.table.constants().iter().map(|c| c.model.clone()).collect()
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.table.constants().iter().map(|c| c.name.as_str()).collect()
    }

    /// Maps a name, a raw value or a constant to the shared constant.
    pub fn wrap(&self, value: impl Into<Value>) -> Result<Model> {
        Ok(self.ty.wrap_model(value)?)
    }

    /// Maps a name or constant to the raw value stored in records.
    pub fn coerce(&self, value: impl Into<Value>, options: &mut Options<'_>) -> Result<Value> {
        Ok(Type::coerce(&*self.ty, value.into(), options)?)
    }
}

impl From<&EnumType> for Declaration {
    fn from(ty: &EnumType) -> Self {
        Declaration::Type(ty.as_type())
    }
}

impl fmt::Debug for EnumType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnumType")
            .field("name", &self.name())
            .field("constants", &self.names())
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
