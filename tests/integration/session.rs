//! Session-level behavior: seeding, error propagation and limits.

use parley::engine::{EngineConfig, Interpreter, Phase};
use parley::foundation::{Bindings, Error, ErrorKind, SemanticLimit, Value};
use parley::parser::{Entity, Verb};

fn waiting_room(config: EngineConfig) -> Interpreter {
    crate::init_tracing();
    let mut game = Interpreter::new(config);
    game.add_verb(Verb::intransitive("wait"));
    game.add_entity(Entity::new("porch"), Bindings::new());
    game.set_location("porch");
    game.add_rule_action("wait", Phase::Main, "wait/actions/0", "wait", &Value::from("true"))
        .unwrap();
    game.add_every_turn(
        "weather/every/0",
        &Value::map([(
            "random",
            Value::list(["$Rain.", "$Sun.", "$Wind.", "$Snow."]),
        )]),
    )
    .unwrap();
    game
}

fn source(err: &Error) -> Option<&str> {
    err.context.as_ref().and_then(|c| c.source.as_deref())
}

fn forecast(game: &mut Interpreter, turns: usize) -> Vec<String> {
    (0..turns)
        .flat_map(|_| game.submit("wait").unwrap().output)
        .collect()
}

#[test]
fn same_seed_replays_the_same_game() {
    let config = EngineConfig::testing().with_seed(7);
    let first = forecast(&mut waiting_room(config.clone()), 20);
    let second = forecast(&mut waiting_room(config), 20);
    assert_eq!(first.len(), 20);
    assert_eq!(first, second);
}

#[test]
fn different_seeds_diverge() {
    let first = forecast(&mut waiting_room(EngineConfig::testing().with_seed(1)), 20);
    let second = forecast(&mut waiting_room(EngineConfig::testing().with_seed(2)), 20);
    assert_ne!(first, second);
}

#[test]
fn action_errors_surface_and_the_session_continues() {
    let mut game = waiting_room(EngineConfig::testing());
    game.add_verb(Verb::intransitive("sing"));
    game.store_mut().root().def("verses", 0);
    game.add_action("porch", Phase::Main, "porch/actions/0", "sing => verses += 1; chorus()")
        .unwrap();

    let err = game.submit("sing").unwrap_err();
    assert!(matches!(
        err.root_cause().kind,
        ErrorKind::UndefinedFunction(ref name) if name == "chorus"
    ));
    assert!(err.to_string().contains("in main action at porch/actions/0"));
    assert_eq!(game.store_mut().root().get("verses").unwrap(), Value::Int(1));
    assert_eq!(game.store().frame_count(), 1);

    let outcome = game.submit("wait").unwrap();
    assert!(outcome.handled);
    assert_eq!(outcome.output.len(), 1);
}

#[test]
fn runaway_recursion_hits_the_configured_limit() {
    let mut game = waiting_room(EngineConfig::testing().with_max_call_depth(5));
    game.define_function("descend", &["n"], "descend(n + 1)").unwrap();
    game.add_verb(Verb::intransitive("dig"));
    game.add_rule_action("dig", Phase::Main, "dig/actions/0", "dig", &Value::from("descend(0)"))
        .unwrap();

    let err = game.submit("dig").unwrap_err();
    assert!(matches!(
        err.root_cause().kind,
        ErrorKind::LimitExceeded(SemanticLimit::MaxCallDepth { limit: 5 })
    ));
    assert!(game.submit("wait").unwrap().handled);
}

#[test]
fn load_errors_name_their_path() {
    let mut game = waiting_room(EngineConfig::testing());

    let err = game
        .add_action("porch", Phase::Before, "porch/before/2", "fly(this) => true")
        .unwrap_err();
    assert!(err.is_compile_error());
    assert!(matches!(err.root_cause().kind, ErrorKind::UnknownVerb(ref v) if v == "fly"));
    assert_eq!(source(&err), Some("porch/before/2"));

    let err = game
        .add_every_turn("clock/every/3", &Value::map([("sometimes", Value::from("true"))]))
        .unwrap_err();
    assert!(matches!(err.root_cause().kind, ErrorKind::UnknownRuleComponent(_)));
    assert_eq!(source(&err), Some("clock/every/3"));

    let err = game.define_function("broken", &[], "1 +").unwrap_err();
    assert!(err.is_compile_error());
    assert_eq!(source(&err), Some("broken"));
}
