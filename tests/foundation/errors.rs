//! Integration tests for error chains
//!
//! Tests wrapping, root causes, and the compile/runtime split.

use parley_foundation::{Error, ErrorContext, ErrorKind, SemanticLimit};

#[test]
fn chain_reads_outermost_first() {
    let err = Error::undefined_symbol("lantern")
        .in_expression("lantern.lit")
        .in_action("before", "cellar/before/0");

    let text = err.to_string();
    let symbol = text.find("undefined symbol: lantern").unwrap();
    let expression = text.find("`lantern.lit`").unwrap();
    let action = text.find("before action at cellar/before/0").unwrap();
    assert!(symbol < expression && expression < action);
}

#[test]
fn root_cause_skips_wrappers() {
    let err = Error::type_mismatch("number", "string")
        .in_expression("a + 1")
        .in_expression("write(a + 1)");
    assert!(matches!(
        err.root_cause().kind,
        ErrorKind::TypeMismatch {
            expected: "number",
            actual: "string"
        }
    ));
    assert!(err.cause().is_some_and(|cause| cause.cause().is_some()));
    assert!(err.root_cause().cause().is_none());
}

#[test]
fn compile_errors_are_classified_through_wrappers() {
    assert!(Error::new(ErrorKind::MissingVerb).is_compile_error());
    assert!(Error::invalid_rule("empty").in_action("main", "x").is_compile_error());
    assert!(!Error::undefined_function("frob").is_compile_error());
    assert!(!Error::limit_exceeded(SemanticLimit::MaxCallDepth { limit: 4 }).is_compile_error());
}

#[test]
fn at_path_keeps_expression_context() {
    let err = Error::invalid_match("too many arguments")
        .with_context(ErrorContext::new().with_expression("eat(a, b)"))
        .at_path("apple/actions/2");
    let context = err.context.unwrap();
    assert_eq!(context.source.as_deref(), Some("apple/actions/2"));
    assert_eq!(context.expression.as_deref(), Some("eat(a, b)"));
    assert_eq!(context.to_string(), "at apple/actions/2 in `eat(a, b)`");
}

#[test]
fn arity_message_names_the_function() {
    let err = Error::arity_mismatch("pick", "1", 3);
    assert_eq!(err.to_string(), "arity mismatch in pick: expected 1, got 3");
}
