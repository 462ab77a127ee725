use super::*;
use crate::script::value::{Lookup, Value};

#[test]
fn standard_registry_builds_without_collisions() {
    let registry = ModuleRegistry::builder().standard().build().unwrap();
    assert!(registry.len() >= 20);
    assert_eq!(registry.module_of("useState"), Some(REACT));
    assert_eq!(registry.module_of("spring"), Some(REMOTION));
    assert!(registry.resolve("AbsoluteFill").is_some_and(Export::is_callable));
    assert_eq!(registry.resolve("Easing").map(Export::kind), Some("namespace"));
}

#[test]
fn file_system_helpers_are_not_exposed() {
    let registry = ModuleRegistry::global();
    assert!(registry.resolve("staticFile").is_none());
    assert!(!registry.list_names().contains("staticFile"));
}

#[test]
fn global_is_shared() {
    assert!(std::ptr::eq(ModuleRegistry::global(), ModuleRegistry::global()));
    assert_eq!(
        ModuleRegistry::global().list_names(),
        ModuleRegistry::builder().standard().build().unwrap().list_names()
    );
}

#[test]
fn collisions_are_rejected_at_registration() {
    let err = ModuleRegistry::builder()
        .standard()
        .module("brand", [("spring", Export::constant(1))])
        .build()
        .unwrap_err();
    assert!(matches!(err, LiveError::Registry(_)));
    assert!(err.to_string().contains("collides with module \"remotion\""), "{err}");
}

#[test]
fn duplicate_modules_and_bad_names_are_rejected() {
    let dup = ModuleRegistry::builder()
        .module("a", [("X", Export::constant(1))])
        .module("a", [("Y", Export::constant(2))])
        .build();
    assert!(dup.is_err());

    let bad = ModuleRegistry::builder()
        .module("a", [("not-an-ident", Export::constant(1))])
        .build();
    assert!(bad.is_err());
}

#[test]
fn listing_follows_registration_order() {
    let registry = ModuleRegistry::builder()
        .standard()
        .module("brand", [("BRAND_RED", Export::constant("#e11d48"))])
        .build()
        .unwrap();
    let ids: Vec<&str> = registry.modules().map(|(id, _)| id).collect();
    assert_eq!(ids, vec![REACT, REMOTION, "brand"]);
    let names = registry.list_names();
    assert!(names.contains("BRAND_RED"));
    assert_eq!(names.len(), registry.len());
}

#[test]
fn every_declaration_gets_fresh_values() {
    let registry = ModuleRegistry::builder()
        .module("brand", [("Palette", Export::constant(serde_json::json!({"red": "#f00"})))])
        .build()
        .unwrap();
    let a = Scope::root();
    let b = Scope::root();
    registry.declare_into(&a);
    registry.declare_into(&b);
    let (Lookup::Found(Value::Object(pa)), Lookup::Found(Value::Object(pb))) =
        (a.lookup("Palette"), b.lookup("Palette"))
    else {
        panic!("expected objects");
    };
    pa.borrow_mut().set("red", Value::str("#000"));
    assert_eq!(pb.borrow().get("red").map(Value::to_js_string).as_deref(), Some("#f00"));
}
