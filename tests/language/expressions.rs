//! Integration tests for expression evaluation
//!
//! Tests compiled thunks against a populated store.

use parley_foundation::{Bindings, ObjId, Store, Value};
use parley_language::{Lexer, ThunkKind, TokenKind, compile};
use proptest::prelude::*;

fn eval_in(store: &mut Store, source: &str) -> Value {
    compile(source).unwrap().value(&mut store.root()).unwrap()
}

fn eval(source: &str) -> Value {
    eval_in(&mut Store::new(0), source)
}

fn cellar() -> Store {
    let mut store = Store::new(0);
    let exits: Bindings = [("up".to_string(), Value::Obj(ObjId::new("kitchen")))]
        .into_iter()
        .collect();
    store.insert_object(
        "cellar",
        [
            ("name".to_string(), Value::from("damp cellar")),
            ("exits".to_string(), Value::Map(exits)),
            ("dark".to_string(), Value::Bool(true)),
        ]
        .into_iter()
        .collect(),
    );
    store.insert_object(
        "kitchen",
        [("name".to_string(), Value::from("kitchen"))].into_iter().collect(),
    );
    store.root().def("location", Value::Obj(ObjId::new("cellar")));
    store
}

// =============================================================================
// Lexing
// =============================================================================

#[test]
fn captures_lex_as_identifiers() {
    let kinds: Vec<_> = Lexer::tokenize_all("stir($what).with(spoon)")
        .into_iter()
        .map(|t| t.kind)
        .collect();
    assert!(kinds.contains(&TokenKind::Identifier("$what".into())));
    assert_eq!(kinds.last(), Some(&TokenKind::Eof));
}

// =============================================================================
// Member Access
// =============================================================================

#[test]
fn member_chains_follow_entity_references() {
    let mut store = cellar();
    assert_eq!(eval_in(&mut store, "location.exits.up.name"), Value::from("kitchen"));
    assert_eq!(eval_in(&mut store, "location.exits['up'] == location"), Value::Bool(false));
}

#[test]
fn computed_keys_use_the_current_value() {
    let mut store = cellar();
    store.root().def("dir", "up");
    assert_eq!(eval_in(&mut store, "location.exits[dir].name"), Value::from("kitchen"));
    store.root().def("dir", "down");
    assert_eq!(eval_in(&mut store, "location.exits[dir]"), Value::Nil);
    assert_eq!(eval_in(&mut store, "location.exits[dir].name"), Value::Nil);
}

#[test]
fn identifiers_and_members_compile_as_properties() {
    assert_eq!(compile("location").unwrap().kind(), ThunkKind::Property);
    assert_eq!(compile("location.name").unwrap().kind(), ThunkKind::Property);
    assert_eq!(compile("1 + 1").unwrap().kind(), ThunkKind::Normal);
}

// =============================================================================
// Assignment
// =============================================================================

#[test]
fn assignments_through_entities_persist() {
    let mut store = cellar();
    eval_in(&mut store, "location.dark = false; location.visits += 1");
    let cellar = ObjId::new("cellar");
    assert_eq!(store.property(&cellar, "dark"), Some(&Value::Bool(false)));
    assert_eq!(store.property(&cellar, "visits"), Some(&Value::Int(1)));
}

#[test]
fn nested_map_assignment_builds_containers() {
    let mut store = Store::new(0);
    eval_in(&mut store, "flags.doors['front'] = 'open'");
    assert_eq!(
        store.root().get("flags.doors.front").unwrap(),
        Value::from("open")
    );
}

#[test]
fn assignment_yields_the_assigned_value() {
    assert_eq!(eval("n = 3; (n += 2) * 2"), Value::Int(10));
}

#[test]
fn assigning_into_a_literal_fails() {
    let err = compile("(1 + 1).x = 3")
        .unwrap()
        .value(&mut Store::new(0).root())
        .unwrap_err();
    assert!(err.to_string().contains("invalid assignment target"));
}

// =============================================================================
// Operators
// =============================================================================

#[test]
fn truthiness_drives_logic_and_conditionals() {
    assert_eq!(eval("'' ? 'yes' : 'no'"), Value::from("no"));
    assert_eq!(eval("!0"), Value::Bool(true));
    assert_eq!(eval("nil || 'default'"), Value::from("default"));
    assert_eq!(eval("'a' && 'b'"), Value::from("b"));
}

#[test]
fn lists_concatenate() {
    assert_eq!(eval("[1] + [2, 3]"), Value::list([1, 2, 3]));
}

#[test]
fn comparing_mixed_types_is_an_error() {
    let err = compile("'a' < 1").unwrap().value(&mut Store::new(0).root()).unwrap_err();
    assert!(err.to_string().contains("type mismatch"));
}

proptest! {
    #[test]
    fn integer_arithmetic_matches_rust(a in -10_000i64..10_000, b in 1i64..10_000) {
        prop_assert_eq!(eval(&format!("{a} + {b}")), Value::Int(a + b));
        prop_assert_eq!(eval(&format!("{a} - {b}")), Value::Int(a - b));
        prop_assert_eq!(eval(&format!("{a} * {b}")), Value::Int(a * b));
        prop_assert_eq!(eval(&format!("{a} % {b}")), Value::Int(a % b));
    }

    #[test]
    fn strings_round_trip_through_concatenation(s in "[a-z ]{0,12}") {
        prop_assert_eq!(eval(&format!("'' + '{s}'")), Value::from(s.as_str()));
    }
}
