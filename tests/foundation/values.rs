//! Integration tests for Value types
//!
//! Tests truthiness, equality, display, and the resolved wrapper.

use parley_foundation::{MultiDict, ObjId, Resolved, Value};

// =============================================================================
// Truthiness
// =============================================================================

#[test]
fn falsy_values() {
    for value in [
        Value::Nil,
        Value::Bool(false),
        Value::Int(0),
        Value::Float(0.0),
        Value::Float(f64::NAN),
        Value::from(""),
    ] {
        assert!(!value.is_truthy(), "{value:?} should be falsy");
    }
}

#[test]
fn truthy_values() {
    for value in [
        Value::Bool(true),
        Value::Int(-1),
        Value::Float(0.5),
        Value::from("0"),
        Value::list(Vec::<Value>::new()),
        Value::map(Vec::<(String, Value)>::new()),
        Value::Obj(ObjId::new("lamp")),
    ] {
        assert!(value.is_truthy(), "{value:?} should be truthy");
    }
}

// =============================================================================
// Equality and Display
// =============================================================================

#[test]
fn numbers_compare_across_representations() {
    assert_eq!(Value::Int(2), Value::Float(2.0));
    assert_ne!(Value::Int(2), Value::Float(2.5));
    assert_ne!(Value::Int(1), Value::from("1"));
}

#[test]
fn display_is_plain_text() {
    assert_eq!(Value::from("brass lamp").to_string(), "brass lamp");
    assert_eq!(Value::Bool(true).to_string(), "true");
    assert_eq!(Value::Nil.to_string(), "nil");
    assert_eq!(Value::list([1, 2, 3]).to_string(), "[1, 2, 3]");
}

#[test]
fn keys_of_strings_are_unquoted() {
    assert_eq!(Value::from("north").to_key(), "north");
    assert_eq!(Value::Int(3).to_key(), "3");
}

#[test]
fn obj_ids_display_bare() {
    let id = ObjId::new("kitchen");
    assert_eq!(id.to_string(), "kitchen");
    assert_eq!(id.as_str(), "kitchen");
    assert_eq!(ObjId::from("kitchen"), id);
    assert_eq!(Value::from(id.clone()).as_obj(), Some(&id));
}

// =============================================================================
// Resolved
// =============================================================================

#[test]
fn unresolved_is_not_handled() {
    let r = Resolved::unresolved();
    assert!(!r.is_resolved());
    assert!(!r.is_handled());
    assert!(r.value().is_nil());
}

#[test]
fn resolved_false_is_not_handled() {
    assert!(!Resolved::new(false).is_handled());
    assert!(Resolved::new(true).is_handled());
    assert!(Resolved::new(Value::Nil).is_handled());
}

#[test]
fn wrap_does_not_double_wrap() {
    let inner = Resolved::new(7);
    let wrapped = Resolved::wrap(inner.clone());
    assert_eq!(wrapped.value(), inner.value());
    assert!(Resolved::wrap(Resolved::unresolved()).value().is_nil());
    assert_eq!(Resolved::wrap(Value::Int(5)).into_value(), Value::Int(5));
}

// =============================================================================
// MultiDict
// =============================================================================

#[test]
fn multidict_keeps_insertion_order_per_key() {
    let dict: MultiDict<String, String> = [
        ("flavor".to_string(), "sweet".to_string()),
        ("color".to_string(), "red".to_string()),
        ("flavor".to_string(), "sour".to_string()),
    ]
    .into_iter()
    .collect();

    let flavors: Vec<_> = dict.get(&"flavor".to_string()).cloned().collect();
    assert_eq!(flavors, vec!["sweet", "sour"]);
    assert_eq!(dict.len(), 3);
    assert_eq!(dict.keys().count(), 2);
    assert!(!dict.contains_key(&"size".to_string()));
}
