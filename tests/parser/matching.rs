//! Integration tests for matchers
//!
//! Tests match expressions compiled against a verb table, and the scoring
//! laws of matcher composition.

use std::sync::Arc;

use parley_foundation::{ErrorKind, ObjId, Value};
use parley_parser::matcher::{
    capture_indirect_object, capture_modifier, capture_object, match_attribute,
    match_indirect_object, match_modifier, match_object, match_verb,
};
use parley_parser::{
    CAPTURE_SCORE, Command, EXACT_SCORE, Matcher, Verb, VerbMap, VerbTrait, compile_match_source,
    match_all,
};
use proptest::prelude::*;

fn verbs() -> VerbMap {
    [
        Verb::transitive("eat"),
        Verb::transitive("stir").with_attribute("with"),
        Verb::intransitive("go").with_modifier("direction"),
        Verb::transitive("throw")
            .with_attribute("at")
            .with_modifier("force")
            .with_trait(VerbTrait::IndirectOptional),
    ]
    .into_iter()
    .map(|v| (v.id.clone(), v.shared()))
    .collect()
}

fn verb(verbs: &VerbMap, id: &str) -> Arc<Verb> {
    verbs[id].clone()
}

fn compile(source: &str) -> Matcher {
    compile_match_source(source, &verbs()).unwrap()
}

// =============================================================================
// Match Expressions
// =============================================================================

#[test]
fn literal_object_matches_without_captures() {
    let verbs = verbs();
    let command = Command::new().verb(verb(&verbs, "eat")).object("apple");
    let result = compile("eat(apple)").matches(&command, "player");
    assert!(result.is_match);
    assert!(result.captures.is_empty());
}

#[test]
fn captured_object_is_bound_by_name() {
    let verbs = verbs();
    let command = Command::new().verb(verb(&verbs, "eat")).object("apple");
    let result = compile("eat($food)").matches(&command, "player");
    assert!(result.is_match);
    assert_eq!(result.captures.len(), 1);
    assert_eq!(result.captures.get("food"), Some(&Value::from("apple")));
    assert_eq!(result.captures["food"].to_string(), "apple");
}

#[test]
fn this_names_the_owner() {
    let verbs = verbs();
    let command = Command::new().verb(verb(&verbs, "eat")).object("apple");
    let matcher = compile("eat(this)");
    assert!(matcher.matches(&command, "apple").is_match);
    assert!(!matcher.matches(&command, "pear").is_match);
}

#[test]
fn attribute_clauses_match_indirect_objects() {
    let verbs = verbs();
    let stir = Command::new()
        .verb(verb(&verbs, "stir"))
        .object("soup")
        .preposition("with")
        .object("spoon");

    let with_tool = compile("stir(soup).with($tool)").matches(&stir, "soup");
    assert!(with_tool.is_match);
    assert_eq!(with_tool.captures.get("tool"), Some(&Value::Obj(ObjId::new("spoon"))));

    assert!(compile("stir(this).with(spoon)").matches(&stir, "soup").is_match);
    assert!(compile("stir(soup).with(this)").matches(&stir, "spoon").is_match);
    // Without the clause the attributed command is rejected.
    assert!(!compile("stir(soup)").matches(&stir, "soup").is_match);
    assert!(!compile("stir(soup).with(fork)").matches(&stir, "soup").is_match);
}

#[test]
fn indirect_optional_verbs_accept_bare_patterns() {
    let verbs = verbs();
    let throw = verb(&verbs, "throw");
    let at_troll = Command::new()
        .verb(throw.clone())
        .object("axe")
        .preposition("at")
        .object("troll");
    let bare = Command::new().verb(throw).object("axe");

    let general = compile("throw($thing)");
    let specific = compile("throw($thing).at(troll)");
    assert!(general.matches(&bare, "axe").is_match);
    assert!(general.matches(&at_troll, "axe").is_match);
    assert!(!specific.matches(&bare, "axe").is_match);
    assert!(specific.matches(&at_troll, "axe").score > general.matches(&at_troll, "axe").score);
}

#[test]
fn modifiers_match_by_position() {
    let verbs = verbs();
    let go_north = Command::new().verb(verb(&verbs, "go")).modifier("direction", "north");
    let go = Command::new().verb(verb(&verbs, "go"));

    assert!(compile("go(north)").matches(&go_north, "hall").is_match);
    assert!(!compile("go(south)").matches(&go_north, "hall").is_match);
    assert!(!compile("go").matches(&go_north, "hall").is_match);
    assert!(compile("go").matches(&go, "hall").is_match);

    let captured = compile("go($dir)").matches(&go_north, "hall");
    assert_eq!(captured.captures.get("dir"), Some(&Value::from("north")));

    let hard = Command::new()
        .verb(verb(&verbs, "throw"))
        .object("axe")
        .modifier("force", "hard");
    assert!(compile("throw(axe, hard)").matches(&hard, "axe").is_match);
    assert!(!compile("throw(axe, soft)").matches(&hard, "axe").is_match);
}

#[test]
fn literal_strings_name_objects() {
    let verbs = verbs();
    let command = Command::new().verb(verb(&verbs, "eat")).object("apple");
    assert!(compile("eat('apple')").matches(&command, "player").is_match);
}

#[test]
fn match_expression_errors() {
    let verbs = verbs();
    let kind = |source: &str| {
        compile_match_source(source, &verbs)
            .unwrap_err()
            .root_cause()
            .kind
            .to_string()
    };

    assert!(kind("dance(apple)").contains("unknown verb: dance"));
    assert!(kind("$verb(apple)").contains("no verb"));
    assert!(kind("eat(apple, pear, plum)").contains("invalid match expression"));
    assert!(kind("eat(").contains("parse error"));

    let err = compile_match_source("dance(apple)", &verbs).unwrap_err();
    assert!(err.is_compile_error());
    assert!(matches!(
        err.kind,
        ErrorKind::Evaluation { ref expression, .. } if expression == "dance(apple)"
    ));
}

// =============================================================================
// Scoring Laws
// =============================================================================

fn sample_command() -> Command {
    let verbs = verbs();
    Command::new()
        .verb(verb(&verbs, "throw"))
        .object("axe")
        .preposition("at")
        .object("troll")
        .modifier("force", "hard")
}

/// Primitive matchers that all accept `sample_command`, with the score each
/// earns on its own.
fn accepting_matchers() -> Vec<(Matcher, u32)> {
    vec![
        (match_verb("throw"), EXACT_SCORE),
        (match_object("axe"), EXACT_SCORE),
        (capture_object("$thing"), CAPTURE_SCORE),
        (match_attribute("at"), EXACT_SCORE),
        (match_indirect_object("troll"), EXACT_SCORE),
        (capture_indirect_object("$target"), CAPTURE_SCORE),
        (match_modifier("force", "hard"), EXACT_SCORE),
        (capture_modifier("force", "$how"), CAPTURE_SCORE),
    ]
}

#[test]
fn captures_never_outscore_literals() {
    let command = sample_command();
    let pairs = [
        (match_object("axe"), capture_object("$x")),
        (match_indirect_object("troll"), capture_indirect_object("$x")),
        (match_modifier("force", "hard"), capture_modifier("force", "$x")),
    ];
    for (literal, capture) in pairs {
        let literal = literal.matches(&command, "axe");
        let capture = capture.matches(&command, "axe");
        assert!(literal.is_match && capture.is_match);
        assert!(capture.score <= literal.score);
    }
}

#[test]
fn one_failure_fails_the_conjunction() {
    let command = sample_command();
    let matcher = match_all(vec![match_verb("throw"), match_object("sword")]);
    let result = matcher.matches(&command, "axe");
    assert!(!result.is_match);
    assert!(result.captures.is_empty());
}

proptest! {
    #[test]
    fn conjunction_scores_add(picks in prop::collection::vec(0usize..8, 0..12)) {
        let pool = accepting_matchers();
        let command = sample_command();
        let chosen: Vec<_> = picks.iter().map(|&i| pool[i].clone()).collect();
        let expected: u32 = chosen.iter().map(|(_, score)| score).sum();

        let matcher = match_all(chosen.into_iter().map(|(m, _)| m).collect());
        let result = matcher.matches(&command, "axe");
        prop_assert!(result.is_match);
        prop_assert_eq!(result.score, expected);
    }

    #[test]
    fn conjunction_is_associative(a in 0usize..8, b in 0usize..8, c in 0usize..8) {
        let pool = accepting_matchers();
        let command = sample_command();
        let m = |i: usize| pool[i].0.clone();

        let left = match_all(vec![match_all(vec![m(a), m(b)]), m(c)]).matches(&command, "axe");
        let right = match_all(vec![m(a), match_all(vec![m(b), m(c)])]).matches(&command, "axe");
        let flat = match_all(vec![m(a), m(b), m(c)]).matches(&command, "axe");
        prop_assert_eq!(&left, &right);
        prop_assert_eq!(&left, &flat);
    }

    #[test]
    fn literal_outranks_capture_for_any_object(name in "item[a-z]{0,6}") {
        let verbs = verbs();
        let command = Command::new().verb(verb(&verbs, "eat")).object(name.as_str());
        let literal = compile_match_source(&format!("eat({name})"), &verbs).unwrap();
        let capture = compile_match_source("eat($food)", &verbs).unwrap();
        let literal = literal.matches(&command, "player");
        let capture = capture.matches(&command, "player");
        prop_assert!(literal.is_match && capture.is_match);
        prop_assert!(capture.score <= literal.score);
        prop_assert_eq!(capture.captures.get("food"), Some(&Value::from(name.as_str())));
    }
}
