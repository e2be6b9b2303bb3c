//! Integration tests for command search
//!
//! Tests enumeration, autocomplete, and exact lookup over a small house, plus
//! consistency properties over generated worlds.

use std::collections::BTreeSet;

use parley_foundation::{Bindings, ObjId, Store, Value};
use parley_language::compile;
use parley_parser::{
    ContextRole, Entity, SearchContext, Verb, VerbMap, VerbMatcher, get_all_commands,
    get_next_words, search_exact, search_next,
};
use proptest::prelude::*;

fn verb_map(verbs: impl IntoIterator<Item = Verb>) -> VerbMap {
    verbs.into_iter().map(|v| (v.id.clone(), v.shared())).collect()
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| (*w).to_string()).collect()
}

fn house_verbs() -> VerbMap {
    verb_map([
        Verb::intransitive("go").with_modifier("direction"),
        Verb::intransitive("look"),
        Verb::transitive("take").with_context(ContextRole::Direct, "environment"),
        Verb::transitive("drop").with_context(ContextRole::Direct, "inventory"),
        Verb::transitive("put")
            .with_attribute("in")
            .with_attribute("on"),
    ])
}

fn house() -> SearchContext {
    SearchContext::new(house_verbs())
        .with_entity(
            "location",
            Entity::new("hall")
                .with_modifier("direction", "north")
                .with_modifier("direction", "up"),
        )
        .with_entity(
            "environment",
            Entity::new("box")
                .with_verb(VerbMatcher::parse("put.in"))
                .with_verb(VerbMatcher::parse("put.on")),
        )
        .with_entity(
            "environment",
            Entity::new("coin")
                .with_verb(VerbMatcher::new("take"))
                .with_verb(VerbMatcher::new("put")),
        )
        .with_entity(
            "inventory",
            Entity::new("key")
                .with_verb(VerbMatcher::new("drop"))
                .with_verb(VerbMatcher::new("put")),
        )
}

fn all_words(ctx: &SearchContext, store: &mut Store) -> BTreeSet<Vec<String>> {
    get_all_commands(ctx, &mut store.root())
        .unwrap()
        .iter()
        .map(|c| c.words())
        .collect()
}

// =============================================================================
// Enumeration
// =============================================================================

#[test]
fn house_commands() {
    let mut store = Store::new(0);
    let expected: BTreeSet<_> = [
        words(&["go"]),
        words(&["go", "north"]),
        words(&["go", "up"]),
        words(&["look"]),
        words(&["take", "coin"]),
        words(&["drop", "key"]),
        words(&["put", "coin"]),
        words(&["put", "coin", "in", "box"]),
        words(&["put", "coin", "on", "box"]),
        words(&["put", "key"]),
        words(&["put", "key", "in", "box"]),
        words(&["put", "key", "on", "box"]),
    ]
    .into_iter()
    .collect();
    assert_eq!(all_words(&house(), &mut store), expected);
}

#[test]
fn search_leaves_the_store_untouched() {
    let mut store = Store::new(0);
    store.insert_object("coin", Bindings::unit("shiny".to_string(), Value::Bool(true)));
    let before = store.object(&ObjId::new("coin")).cloned();
    let ctx = house();
    for _ in 0..3 {
        all_words(&ctx, &mut store);
        get_next_words(&ctx, &mut store.root(), &words(&["put"])).unwrap();
    }
    assert_eq!(store.object(&ObjId::new("coin")).cloned(), before);
    assert_eq!(store.frame_count(), 1);
    assert!(store.take_output().is_empty());
}

#[test]
fn conditions_read_entity_properties() {
    let mut store = Store::new(0);
    store.insert_object("chest", Bindings::unit("locked".to_string(), Value::Bool(true)));
    let ctx = SearchContext::new(verb_map([Verb::transitive("open"), Verb::transitive("unlock")]))
        .with_entity(
            "environment",
            Entity::new("chest")
                .with_verb(VerbMatcher::new("open").with_condition(compile("!locked").unwrap()))
                .with_verb(
                    VerbMatcher::new("unlock").with_condition(compile("this.locked").unwrap()),
                ),
        );

    assert_eq!(
        all_words(&ctx, &mut store),
        [words(&["unlock", "chest"])].into_iter().collect()
    );
    store.insert_object("chest", Bindings::unit("locked".to_string(), Value::Bool(false)));
    assert_eq!(
        all_words(&ctx, &mut store),
        [words(&["open", "chest"])].into_iter().collect()
    );
}

// =============================================================================
// Autocomplete
// =============================================================================

#[test]
fn next_words_walk_a_sentence() {
    let mut store = Store::new(0);
    let ctx = house();
    let mut env = store.root();

    let first: BTreeSet<_> = get_next_words(&ctx, &mut env, &[]).unwrap().into_iter().collect();
    let verbs: BTreeSet<_> = ["drop", "go", "look", "put", "take"].map(String::from).into();
    assert_eq!(first, verbs);

    let mut objects = get_next_words(&ctx, &mut env, &words(&["put"])).unwrap();
    objects.sort();
    assert_eq!(objects, vec!["coin", "key"]);

    let mut attributes = get_next_words(&ctx, &mut env, &words(&["put", "key"])).unwrap();
    attributes.sort();
    assert_eq!(attributes, vec!["in", "on"]);

    assert_eq!(
        get_next_words(&ctx, &mut env, &words(&["put", "key", "on"])).unwrap(),
        vec!["box"]
    );
    let complete = words(&["put", "key", "on", "box"]);
    assert!(get_next_words(&ctx, &mut env, &complete).unwrap().is_empty());
}

#[test]
fn next_words_are_deduplicated() {
    let mut store = Store::new(0);
    let ctx = house();
    let next = get_next_words(&ctx, &mut store.root(), &[]).unwrap();
    let unique: BTreeSet<_> = next.iter().collect();
    assert_eq!(next.len(), unique.len());
}

#[test]
fn search_next_returns_extended_commands() {
    let mut store = Store::new(0);
    let ctx = house();
    let extended = search_next(&ctx, &mut store.root(), &words(&["go"])).unwrap();
    let mut next: Vec<_> = extended.iter().map(|c| c.words()).collect();
    next.sort();
    assert_eq!(next, vec![words(&["go", "north"]), words(&["go", "up"])]);
}

// =============================================================================
// Exact Search
// =============================================================================

#[test]
fn exact_search_builds_full_commands() {
    let mut store = Store::new(0);
    let ctx = house();
    let command = search_exact(&ctx, &mut store.root(), &words(&["put", "coin", "in", "box"]))
        .unwrap()
        .unwrap();
    assert_eq!(command.get_verb().map(|v| v.id.as_str()), Some("put"));
    assert_eq!(command.direct_object().map(|id| id.as_str()), Some("coin"));
    assert_eq!(command.attribute(), Some("in"));
    assert_eq!(command.indirect_object().map(|id| id.as_str()), Some("box"));
    assert_eq!(command.to_string(), "put coin in box");
}

#[test]
fn exact_search_rejects_out_of_context_objects() {
    let mut store = Store::new(0);
    let ctx = house();
    let mut env = store.root();
    assert!(search_exact(&ctx, &mut env, &words(&["take", "key"])).unwrap().is_none());
    assert!(search_exact(&ctx, &mut env, &words(&["drop", "coin"])).unwrap().is_none());
    assert!(search_exact(&ctx, &mut env, &words(&["put", "box", "in", "box"])).unwrap().is_none());
    assert!(search_exact(&ctx, &mut env, &words(&["go", "west"])).unwrap().is_none());
}

// =============================================================================
// Properties
// =============================================================================

const OBJECT_VERBS: [&str; 4] = ["take", "eat", "stir", "stir.with"];
const DIRECTIONS: [&str; 4] = ["north", "south", "east", "up"];

fn generated_world(objects: &[Vec<bool>], exits: &[bool]) -> SearchContext {
    let verbs = verb_map([
        Verb::intransitive("go").with_modifier("direction"),
        Verb::intransitive("wait"),
        Verb::transitive("take"),
        Verb::transitive("eat"),
        Verb::transitive("stir").with_attribute("with"),
    ]);
    let mut room = Entity::new("room");
    for (direction, open) in DIRECTIONS.iter().zip(exits) {
        if *open {
            room = room.with_modifier("direction", *direction);
        }
    }
    let mut ctx = SearchContext::new(verbs).with_entity("location", room);
    for (i, offered) in objects.iter().enumerate() {
        let mut entity = Entity::new(format!("thing{i}"));
        for (declaration, on) in OBJECT_VERBS.iter().zip(offered) {
            if *on {
                entity = entity.with_verb(VerbMatcher::parse(declaration));
            }
        }
        ctx.add_entity(if i % 2 == 0 { "environment" } else { "inventory" }, entity);
    }
    ctx
}

fn world_strategy() -> impl Strategy<Value = (Vec<Vec<bool>>, Vec<bool>)> {
    (
        prop::collection::vec(prop::collection::vec(any::<bool>(), 4), 0..5),
        prop::collection::vec(any::<bool>(), 4),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn every_enumerated_command_is_found_exactly((objects, exits) in world_strategy()) {
        let ctx = generated_world(&objects, &exits);
        let mut store = Store::new(0);
        let mut env = store.root();
        for command in get_all_commands(&ctx, &mut env).unwrap() {
            let found = search_exact(&ctx, &mut env, &command.words()).unwrap();
            prop_assert_eq!(found.map(|c| c.words()), Some(command.words()));
        }
    }

    #[test]
    fn first_words_are_the_enumerated_first_words((objects, exits) in world_strategy()) {
        let ctx = generated_world(&objects, &exits);
        let mut store = Store::new(0);
        let mut env = store.root();
        let next: BTreeSet<String> =
            get_next_words(&ctx, &mut env, &[]).unwrap().into_iter().collect();
        let first: BTreeSet<String> = get_all_commands(&ctx, &mut env)
            .unwrap()
            .iter()
            .filter_map(|c| c.words().into_iter().next())
            .collect();
        prop_assert_eq!(next, first);
    }

    #[test]
    fn every_prefix_offers_the_next_word((objects, exits) in world_strategy()) {
        let ctx = generated_world(&objects, &exits);
        let mut store = Store::new(0);
        let mut env = store.root();
        for command in get_all_commands(&ctx, &mut env).unwrap() {
            let words = command.words();
            for split in 0..words.len() {
                let next = get_next_words(&ctx, &mut env, &words[..split]).unwrap();
                prop_assert!(
                    next.contains(&words[split]),
                    "{:?} missing after {:?}",
                    words[split],
                    &words[..split]
                );
            }
        }
    }
}
