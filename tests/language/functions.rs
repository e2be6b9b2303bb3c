//! Integration tests for script functions and builtins

use parley_foundation::{ErrorKind, SemanticLimit, Store, Value};
use parley_language::{ScriptFunction, compile, install_builtins};

fn store() -> Store {
    let mut store = Store::new(9).with_max_call_depth(8);
    install_builtins(&mut store.root());
    store
}

fn eval_in(store: &mut Store, source: &str) -> Value {
    compile(source).unwrap().value(&mut store.root()).unwrap()
}

fn define(store: &mut Store, name: &str, params: &[&str], source: &str) {
    let function = ScriptFunction::compile(name, params.iter().copied(), source).unwrap();
    store.root().def(name, function.into_value());
}

// =============================================================================
// Script Functions
// =============================================================================

#[test]
fn functions_see_parameters_and_arguments() {
    let mut store = store();
    define(
        &mut store,
        "describe",
        &["thing"],
        "'You see ' + thing + ' (' + arguments.length + ')'",
    );
    assert_eq!(
        eval_in(&mut store, "describe('a lamp', 'extra')"),
        Value::from("You see a lamp (2)")
    );
    assert_eq!(eval_in(&mut store, "describe()"), Value::from("You see nil (0)"));
}

#[test]
fn functions_can_call_each_other() {
    let mut store = store();
    define(&mut store, "double", &["n"], "n * 2");
    define(&mut store, "quadruple", &["n"], "double(double(n))");
    assert_eq!(eval_in(&mut store, "quadruple(3)"), Value::Int(12));
}

#[test]
fn functions_are_values() {
    let mut store = store();
    define(&mut store, "shout", &["s"], "s + '!'");
    assert_eq!(eval_in(&mut store, "f = shout; f('hey')"), Value::from("hey!"));
    assert_eq!(eval_in(&mut store, "{ say: shout }.say('ho')"), Value::from("ho!"));
}

#[test]
fn runaway_recursion_hits_the_depth_limit() {
    let mut store = store();
    define(&mut store, "forever", &["n"], "forever(n + 1)");
    let err = compile("forever(0)")
        .unwrap()
        .value(&mut store.root())
        .unwrap_err();
    assert!(matches!(
        err.root_cause().kind,
        ErrorKind::LimitExceeded(SemanticLimit::MaxCallDepth { limit: 8 })
    ));
    // The depth counter unwinds with the error.
    assert_eq!(eval_in(&mut store, "str(1)"), Value::from("1"));
}

#[test]
fn syntax_errors_carry_the_function_name() {
    let err = ScriptFunction::compile("broken", ["x"], "x +").unwrap_err();
    assert_eq!(
        err.context.and_then(|c| c.source).as_deref(),
        Some("broken")
    );
}

// =============================================================================
// Builtins
// =============================================================================

#[test]
fn write_collects_output_and_returns_true() {
    let mut store = store();
    assert_eq!(eval_in(&mut store, "write('The door ', 'creaks', '.')"), Value::Bool(true));
    eval_in(&mut store, "write(str(1 + 1))");
    assert_eq!(store.take_output(), vec!["The door creaks.", "2"]);
}

#[test]
fn collection_builtins() {
    let mut store = store();
    assert_eq!(eval_in(&mut store, "length([1, 2, 3])"), Value::Int(3));
    assert_eq!(eval_in(&mut store, "length('abc')"), Value::Int(3));
    assert_eq!(eval_in(&mut store, "includes(['a', 'b'], 'b')"), Value::Bool(true));
    assert_eq!(eval_in(&mut store, "includes('lantern', 'tern')"), Value::Bool(true));
    assert_eq!(eval_in(&mut store, "keys({ b: 1, a: 2 })"), Value::list(["a", "b"]));
    assert_eq!(eval_in(&mut store, "has({ a: 1 }, 'a') && !has({ a: 1 }, 'b')"), Value::Bool(true));
}

#[test]
fn numeric_builtins() {
    let mut store = store();
    assert_eq!(eval_in(&mut store, "min(3, 1, 2)"), Value::Int(1));
    assert_eq!(eval_in(&mut store, "max([3, 7.5, 2])"), Value::Float(7.5));
    assert_eq!(eval_in(&mut store, "floor(2.9)"), Value::Int(2));
    assert_eq!(eval_in(&mut store, "min()"), Value::Nil);
}

#[test]
fn random_builtins_stay_in_range() {
    let mut store = store();
    for _ in 0..50 {
        let n = eval_in(&mut store, "random(4)").as_int().unwrap();
        assert!((0..4).contains(&n));
        let d = eval_in(&mut store, "random(1, 6)").as_int().unwrap();
        assert!((1..=6).contains(&d));
        let u = eval_in(&mut store, "random()").as_number().unwrap();
        assert!((0.0..1.0).contains(&u));
        let p = eval_in(&mut store, "pick(['n', 's'])");
        assert!(p == Value::from("n") || p == Value::from("s"));
    }
    assert_eq!(eval_in(&mut store, "pick([])"), Value::Nil);
}

#[test]
fn same_seed_same_choices() {
    let roll = || {
        let mut store = store();
        (0..10)
            .map(|_| eval_in(&mut store, "random(100)"))
            .collect::<Vec<_>>()
    };
    assert_eq!(roll(), roll());
}

#[test]
fn builtin_arity_is_checked() {
    let mut store = store();
    let err = compile("pick(1, 2)").unwrap().value(&mut store.root()).unwrap_err();
    assert!(matches!(err.root_cause().kind, ErrorKind::ArityMismatch { .. }));
}
