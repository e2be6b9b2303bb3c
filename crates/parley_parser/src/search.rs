//! Grammar-tree command search.
//!
//! The grammar is fixed:
//!
//! ```text
//! intransitive-verb*
//! └── modifier*
//! transitive-verb
//! └── direct-object*
//!     ├── modifier*
//!     └── attribute
//!         └── indirect-object*
//! ```
//!
//! Nodes marked `*` are terminal: a command ending there is complete. Each
//! node expands a partial command by one word using the live
//! [`SearchContext`]. A non-terminal expansion is only offered when some
//! continuation reaches a terminal node, so `stir` is not suggested when
//! nothing can be stirred.

use std::collections::BTreeSet;
use std::sync::Arc;

use parley_foundation::{Environment, MultiDict, ObjId, Result};
use tracing::trace;

use crate::command::Command;
use crate::entity::Entity;
use crate::verb::{ContextRole, Verb, VerbMap};

/// Expands a partial command by one grammar position.
pub type SearchFn = fn(&SearchContext, &mut Environment<'_>, &Command) -> Result<Vec<Command>>;

/// In-scope entities and verbs.
#[derive(Clone, Debug, Default)]
pub struct SearchContext {
    entities: MultiDict<String, Arc<Entity>>,
    verbs: VerbMap,
}

impl SearchContext {
    /// Creates a context over the given verbs.
    #[must_use]
    pub fn new(verbs: VerbMap) -> Self {
        Self {
            entities: MultiDict::new(),
            verbs,
        }
    }

    /// Adds an entity to a named context group (`inventory`, `environment`).
    pub fn add_entity(&mut self, context: impl Into<String>, entity: impl Into<Arc<Entity>>) {
        self.entities.insert(context.into(), entity.into());
    }

    /// Returns the context with an entity added.
    #[must_use]
    pub fn with_entity(
        mut self,
        context: impl Into<String>,
        entity: impl Into<Arc<Entity>>,
    ) -> Self {
        self.add_entity(context, entity);
        self
    }

    /// The verbs in scope.
    #[must_use]
    pub fn verbs(&self) -> &VerbMap {
        &self.verbs
    }

    /// Looks up an entity by id in any context group.
    #[must_use]
    pub fn entity(&self, id: &ObjId) -> Option<&Arc<Entity>> {
        self.entities.values().find(|entity| &entity.id == id)
    }

    /// Every entity in scope, once each, in context-group order.
    #[must_use]
    pub fn all_entities(&self) -> Vec<&Arc<Entity>> {
        dedup_entities(self.entities.values())
    }

    /// Entities drawn from the verb's contexts for `role`, or every entity
    /// if the verb declares none.
    fn candidates(&self, verb: &Verb, role: ContextRole) -> Vec<&Arc<Entity>> {
        let mut contexts = verb.contexts_for(role).peekable();
        if contexts.peek().is_none() {
            return self.all_entities();
        }
        dedup_entities(contexts.flat_map(|name| self.entities.get(&name.to_string())))
    }
}

fn dedup_entities<'a>(entities: impl Iterator<Item = &'a Arc<Entity>>) -> Vec<&'a Arc<Entity>> {
    let mut seen = BTreeSet::new();
    entities
        .filter(|entity| seen.insert(entity.id.clone()))
        .collect()
}

struct GrammarNode {
    name: &'static str,
    expand: SearchFn,
    terminal: bool,
    children: &'static [GrammarNode],
}

static GRAMMAR: &[GrammarNode] = &[
    GrammarNode {
        name: "intransitive-verb",
        expand: intransitive_verbs,
        terminal: true,
        children: &[GrammarNode {
            name: "modifier",
            expand: modifiers,
            terminal: true,
            children: &[],
        }],
    },
    GrammarNode {
        name: "transitive-verb",
        expand: transitive_verbs,
        terminal: false,
        children: &[GrammarNode {
            name: "direct-object",
            expand: direct_objects,
            terminal: true,
            children: &[
                GrammarNode {
                    name: "modifier",
                    expand: modifiers,
                    terminal: true,
                    children: &[],
                },
                GrammarNode {
                    name: "attribute",
                    expand: attributes,
                    terminal: false,
                    children: &[GrammarNode {
                        name: "indirect-object",
                        expand: indirect_objects,
                        terminal: true,
                        children: &[],
                    }],
                },
            ],
        }],
    },
];

fn intransitive_verbs(
    ctx: &SearchContext,
    _env: &mut Environment<'_>,
    command: &Command,
) -> Result<Vec<Command>> {
    Ok(ctx
        .verbs
        .values()
        .filter(|verb| verb.is_intransitive())
        .map(|verb| command.verb(verb.clone()))
        .collect())
}

fn transitive_verbs(
    ctx: &SearchContext,
    _env: &mut Environment<'_>,
    command: &Command,
) -> Result<Vec<Command>> {
    Ok(ctx
        .verbs
        .values()
        .filter(|verb| verb.is_transitive())
        .map(|verb| command.verb(verb.clone()))
        .collect())
}

fn direct_objects(
    ctx: &SearchContext,
    env: &mut Environment<'_>,
    command: &Command,
) -> Result<Vec<Command>> {
    let Some(verb) = command.get_verb() else {
        return Ok(Vec::new());
    };
    let mut out = Vec::new();
    for entity in ctx.candidates(verb, ContextRole::Direct) {
        if entity.offers(env, &verb.id, None)? {
            out.push(command.object(entity.id.clone()));
        }
    }
    Ok(out)
}

fn modifiers(
    ctx: &SearchContext,
    _env: &mut Environment<'_>,
    command: &Command,
) -> Result<Vec<Command>> {
    let Some(verb) = command.get_verb() else {
        return Ok(Vec::new());
    };
    let mut out = Vec::new();
    for kind in &verb.modifiers {
        let mut seen = BTreeSet::new();
        for entity in ctx.all_entities() {
            for value in entity.verb_modifiers.get(kind) {
                if seen.insert(value.as_str()) {
                    out.push(command.modifier(kind.clone(), value.clone()));
                }
            }
        }
    }
    Ok(out)
}

fn attributes(
    _ctx: &SearchContext,
    _env: &mut Environment<'_>,
    command: &Command,
) -> Result<Vec<Command>> {
    Ok(command
        .get_verb()
        .map(|verb| {
            verb.attributes
                .iter()
                .map(|attribute| command.preposition(attribute.clone()))
                .collect()
        })
        .unwrap_or_default())
}

fn indirect_objects(
    ctx: &SearchContext,
    env: &mut Environment<'_>,
    command: &Command,
) -> Result<Vec<Command>> {
    let (Some(verb), Some(attribute)) = (command.get_verb(), command.attribute()) else {
        return Ok(Vec::new());
    };
    let direct = command.direct_object();
    let mut out = Vec::new();
    for entity in ctx.candidates(verb, ContextRole::Indirect) {
        if Some(&entity.id) == direct {
            continue;
        }
        if entity.offers(env, &verb.id, Some(attribute))? {
            out.push(command.object(entity.id.clone()));
        }
    }
    Ok(out)
}

/// Returns true if `command` (just produced by `node`) is complete or can be
/// completed.
fn is_valid(
    ctx: &SearchContext,
    env: &mut Environment<'_>,
    node: &GrammarNode,
    command: &Command,
) -> Result<bool> {
    if node.terminal {
        return Ok(true);
    }
    for child in node.children {
        for next in (child.expand)(ctx, env, command)? {
            if is_valid(ctx, env, child, &next)? {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

fn collect_all(
    ctx: &SearchContext,
    env: &mut Environment<'_>,
    nodes: &[GrammarNode],
    command: &Command,
    out: &mut Vec<Command>,
) -> Result<()> {
    for node in nodes {
        let expanded = (node.expand)(ctx, env, command)?;
        trace!(node = node.name, prefix = %command, count = expanded.len(), "expanded");
        for next in expanded {
            if node.terminal {
                out.push(next.clone());
            }
            collect_all(ctx, env, node.children, &next, out)?;
        }
    }
    Ok(())
}

/// Enumerates every complete command, depth first.
///
/// # Errors
/// Propagates errors raised by verb conditions.
pub fn get_all_commands(ctx: &SearchContext, env: &mut Environment<'_>) -> Result<Vec<Command>> {
    let mut out = Vec::new();
    collect_all(ctx, env, GRAMMAR, &Command::new(), &mut out)?;
    Ok(out)
}

/// Returns true if the command's last word equals the word the player typed
/// at the same position.
fn agrees(command: &Command, words: &[String]) -> bool {
    let Some(index) = command.len().checked_sub(1) else {
        return false;
    };
    match (command.parts().last(), words.get(index)) {
        (Some(part), Some(word)) => part.word() == word,
        _ => false,
    }
}

fn collect_next(
    ctx: &SearchContext,
    env: &mut Environment<'_>,
    nodes: &[GrammarNode],
    command: &Command,
    partial: &[String],
    out: &mut Vec<Command>,
) -> Result<()> {
    for node in nodes {
        for next in (node.expand)(ctx, env, command)? {
            if next.len() > partial.len() {
                if is_valid(ctx, env, node, &next)? {
                    out.push(next);
                }
            } else if agrees(&next, partial) {
                collect_next(ctx, env, node.children, &next, partial, out)?;
            }
        }
    }
    Ok(())
}

/// Returns every valid command exactly one word longer than `partial` whose
/// leading words equal `partial`.
///
/// # Errors
/// Propagates errors raised by verb conditions.
pub fn search_next(
    ctx: &SearchContext,
    env: &mut Environment<'_>,
    partial: &[String],
) -> Result<Vec<Command>> {
    let mut out = Vec::new();
    collect_next(ctx, env, GRAMMAR, &Command::new(), partial, &mut out)?;
    Ok(out)
}

/// Returns the distinct words that may follow `partial`, in grammar order.
///
/// # Errors
/// Propagates errors raised by verb conditions.
pub fn get_next_words(
    ctx: &SearchContext,
    env: &mut Environment<'_>,
    partial: &[String],
) -> Result<Vec<String>> {
    let mut seen = BTreeSet::new();
    Ok(search_next(ctx, env, partial)?
        .iter()
        .filter_map(|command| command.parts().last().map(|part| part.word().to_string()))
        .filter(|word| seen.insert(word.clone()))
        .collect())
}

fn find_exact(
    ctx: &SearchContext,
    env: &mut Environment<'_>,
    nodes: &[GrammarNode],
    command: &Command,
    words: &[String],
) -> Result<Option<Command>> {
    for node in nodes {
        for next in (node.expand)(ctx, env, command)? {
            if !agrees(&next, words) {
                continue;
            }
            if next.len() == words.len() {
                if node.terminal {
                    return Ok(Some(next));
                }
            } else if let Some(found) = find_exact(ctx, env, node.children, &next, words)? {
                return Ok(Some(found));
            }
        }
    }
    Ok(None)
}

/// Resolves typed words to a complete command.
///
/// Returns `None` if no grammar branch produces exactly these words.
///
/// # Errors
/// Propagates errors raised by verb conditions.
pub fn search_exact(
    ctx: &SearchContext,
    env: &mut Environment<'_>,
    words: &[String],
) -> Result<Option<Command>> {
    if words.is_empty() {
        return Ok(None);
    }
    find_exact(ctx, env, GRAMMAR, &Command::new(), words)
}
