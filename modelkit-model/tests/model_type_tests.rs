mod common;

use std::cell::RefCell;
use std::rc::Rc;

use modelkit_model::{
    Error, ModelType, Options, Primitive, Type, TypeConfig, TypeRef, Value, primitives,
};
use pretty_assertions::assert_eq;

// ── Reflection ───────────────────────────────────────────────────

#[test]
fn has_properties_and_is_wrapped_across_derivations() {
    let person = ModelType::define(TypeConfig::new().property("dateOfBirth", Primitive::Date)).unwrap();
    let derived_person = person.extend(TypeConfig::new()).unwrap();
    let stub = ModelType::define(TypeConfig::new()).unwrap();
    let derived_stub = stub
        .extend(TypeConfig::new().property("name", Primitive::String))
        .unwrap();
    let simple = stub.extend(TypeConfig::new()).unwrap();
    let to_string = ModelType::define(TypeConfig::new().wrap_disabled().coerce(|_, value, _| {
        Ok(match value {
            Value::Undefined | Value::Null => value,
            other => Value::String(other.to_string()),
        })
    }))
    .unwrap();

    assert!(person.has_properties());
    assert!(person.is_wrapped());
    assert!(derived_person.has_properties());
    assert!(derived_person.is_wrapped());
    assert!(!stub.has_properties());
    assert!(stub.is_wrapped());
    assert!(derived_stub.has_properties());
    assert!(derived_stub.is_wrapped());
    assert!(!simple.has_properties());
    assert!(simple.is_wrapped());
    assert!(!to_string.has_properties());
    assert!(!to_string.is_wrapped());
}

#[test]
fn derived_type_without_properties_shares_base_table() {
    let base = ModelType::define(TypeConfig::new().property("a", Primitive::String)).unwrap();
    let derived = base.extend(TypeConfig::new()).unwrap();
    assert!(Rc::ptr_eq(
        base.properties().unwrap(),
        derived.properties().unwrap()
    ));
}

#[test]
fn property_lookup_reaches_ancestors() {
    let person = common::person_type();
    assert!(person.has_property("name"));
    assert!(person.has_property("id"));
    assert!(person.has_property("_id"));
    assert!(!person.has_property("nickname"));
    assert_eq!(person.property("_id").unwrap().name(), "id");
}

#[test]
fn unnamed_types_take_base_name() {
    let base = ModelType::define(TypeConfig::new().name("Base")).unwrap();
    let derived = base.extend(TypeConfig::new()).unwrap();
    assert_eq!(derived.name(), "Base");
    assert_eq!(ModelType::root().name(), "Model");
}

#[test]
fn metadata_is_exposed_per_type() {
    let ty = ModelType::define(
        TypeConfig::new()
            .meta("collection", "people")
            .meta("version", 2),
    )
    .unwrap();
    assert_eq!(ty.metadata("collection"), Some(Value::from("people")));
    assert_eq!(ty.metadata("version"), Some(Value::from(2)));
    assert_eq!(ty.metadata("missing"), None);
}

#[test]
fn model_types_are_not_primitive() {
    let item = ModelType::define(TypeConfig::new().property("id", Primitive::String)).unwrap();
    assert!(!item.is_primitive());
    for ty in primitives::all() {
        assert!(ty.is_primitive(), "{}", ty.name());
        assert!(!ty.is_wrapped(), "{}", ty.name());
    }
}

// ── Compatibility ────────────────────────────────────────────────

#[test]
fn compatibility_walks_the_derivation_chain() {
    let entity = common::entity_type();
    let person = entity
        .extend(TypeConfig::new().property("name", Primitive::String))
        .unwrap();
    let employee = person
        .extend(TypeConfig::new().property("salary", Primitive::Number))
        .unwrap();
    let unrelated = ModelType::define(TypeConfig::new()).unwrap();

    let entity_ref: TypeRef = entity.clone();
    let person_ref: TypeRef = person.clone();
    assert!(employee.is_compatible_with(&entity_ref));
    assert!(employee.is_compatible_with(&person_ref));
    assert!(!entity.is_compatible_with(&person_ref));
    assert!(!unrelated.is_compatible_with(&entity_ref));
    assert!(employee.is_subtype_of(&entity));
    assert!(employee.is_compatible_with(&(ModelType::root() as TypeRef)));
}

#[test]
fn super_type_is_the_base() {
    let base = ModelType::define(TypeConfig::new()).unwrap();
    let derived = base.extend(TypeConfig::new()).unwrap();
    let parent = derived.super_type().unwrap();
    assert!(modelkit_model::same_type(&parent, &(base.clone() as TypeRef)));
    assert!(Rc::ptr_eq(derived.base().unwrap(), &base));
}

// ── Construction ─────────────────────────────────────────────────

#[test]
fn prevented_construction_is_always_raised() {
    let abstract_type = ModelType::define(TypeConfig::new().prevent_construction()).unwrap();
    assert!(!abstract_type.is_constructable());

    let mut errors = Vec::new();
    let err = abstract_type
        .create(None, &mut Options::collecting(&mut errors))
        .unwrap_err();
    assert!(matches!(err, Error::NotConstructable(_)));
    assert!(errors.is_empty());
}

#[test]
fn constructability_is_not_inherited() {
    let abstract_type = ModelType::define(TypeConfig::new().constructable(false)).unwrap();
    let concrete = abstract_type.extend(TypeConfig::new()).unwrap();
    assert!(concrete.new_instance().is_ok());
}

#[test]
fn init_hooks_run_root_first_after_fields_are_set() {
    let log = Rc::new(RefCell::new(Vec::new()));

    let base_log = log.clone();
    let base = ModelType::define(
        TypeConfig::new()
            .property("name", Primitive::String)
            .init(move |model, _| {
                base_log
                    .borrow_mut()
                    .push(format!("base:{}", model.get("name")?));
                Ok(())
            }),
    )
    .unwrap();

    let derived_log = log.clone();
    let derived = base
        .extend(TypeConfig::new().init(move |_, _| {
            derived_log.borrow_mut().push("derived".to_string());
            Ok(())
        }))
        .unwrap();

    derived
        .create(Some(serde_json::json!({"name": "Ada"}).into()), &mut Options::new())
        .unwrap();
    assert_eq!(*log.borrow(), vec!["base:Ada".to_string(), "derived".to_string()]);
}

#[test]
fn init_hook_errors_abort_construction() {
    let ty = ModelType::define(
        TypeConfig::new()
            .property("name", Primitive::String)
            .init(|model, options| {
                if model.get("name")?.is_undefined() {
                    options.coercion_error(&Value::Undefined)?;
                }
                Ok(())
            }),
    )
    .unwrap();

    assert!(ty.new_instance().is_err());

    let mut errors = Vec::new();
    assert!(ty.create(None, &mut Options::collecting(&mut errors)).is_ok());
    assert_eq!(errors, vec!["Invalid value: undefined".to_string()]);
}

// ── Accessors and methods ────────────────────────────────────────

#[test]
fn accessors_are_synthesized_per_property() {
    let person = common::person_type();
    let model = person.new_instance().unwrap();
    for method in ["getName", "setName", "getDateOfBirth", "setDateOfBirth", "getId", "setId"] {
        assert!(model.has_method(method), "{method}");
    }
    assert!(!model.has_method("get_id"));
}

#[test]
fn declared_methods_shadow_accessors() {
    let ty = ModelType::define(
        TypeConfig::new()
            .property("name", Primitive::String)
            .method("getName", |_, _| Ok(Value::from("override")))
            .method("greet", |model, args| {
                let greeting = args.first().cloned().unwrap_or_else(|| Value::from("Hello"));
                Ok(Value::String(format!("{greeting}, {}", model.get("name")?)))
            }),
    )
    .unwrap();

    let model = ty.new_instance().unwrap();
    model.set("name", "Ada").unwrap();
    assert_eq!(model.call("getName", &[]).unwrap(), Value::from("override"));
    assert_eq!(model.get("name").unwrap(), Value::from("Ada"));
    assert_eq!(
        model.call("greet", &[Value::from("Hi")]).unwrap(),
        Value::from("Hi, Ada")
    );
}

#[test]
fn derived_methods_override_base_methods() {
    let base = ModelType::define(
        TypeConfig::new().method("kind", |_, _| Ok(Value::from("base"))),
    )
    .unwrap();
    let derived = base
        .extend(TypeConfig::new().method("kind", |_, _| Ok(Value::from("derived"))))
        .unwrap();

    assert_eq!(
        base.new_instance().unwrap().call("kind", &[]).unwrap(),
        Value::from("base")
    );
    assert_eq!(
        derived.new_instance().unwrap().call("kind", &[]).unwrap(),
        Value::from("derived")
    );
}

#[test]
fn unknown_method_is_reported() {
    let model = common::person_type().new_instance().unwrap();
    let err = model.call("fly", &[]).unwrap_err();
    assert!(matches!(err, Error::UnknownMethod { ref method, .. } if method == "fly"));
}
