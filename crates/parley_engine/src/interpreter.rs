//! Interpreter facade.
//!
//! [`Interpreter`] owns everything one game session needs: the store, the
//! verbs and entities, the compiled actions and the every-turn rules. Content
//! loaders fill it in; a front end calls [`commands`](Interpreter::commands),
//! [`next_words`](Interpreter::next_words) and
//! [`submit`](Interpreter::submit).

use std::collections::BTreeMap;
use std::sync::Arc;

use parley_foundation::{Bindings, ObjId, Result, Store, Value};
use parley_language::{ScriptFunction, install_builtins};
use parley_parser::{
    ContextRole, Entity, SearchContext, Verb, VerbMap, get_all_commands, get_next_words,
    search_exact,
};
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::dispatch::{ActionRegistry, DispatchOutcome, DispatchScope, Dispatcher};
use crate::phase::{Phase, PhaseActionBuilder};
use crate::rule::RuleBuilder;

/// Context group holding the player's location.
pub const LOCATION: &str = "location";

/// A game session.
#[derive(Debug)]
pub struct Interpreter {
    config: EngineConfig,
    store: Store,
    verbs: VerbMap,
    entities: BTreeMap<ObjId, Arc<Entity>>,
    placements: Vec<(String, ObjId)>,
    registry: ActionRegistry,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Interpreter {
    /// Creates an empty session with the builtins installed.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let mut store = Store::new(config.seed).with_max_call_depth(config.max_call_depth);
        install_builtins(&mut store.root());
        Self {
            config,
            store,
            verbs: VerbMap::new(),
            entities: BTreeMap::new(),
            placements: Vec::new(),
            registry: ActionRegistry::new(),
        }
    }

    /// The session configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The store holding scopes and entity properties.
    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Mutable access to the store.
    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }

    /// The registered verbs.
    #[must_use]
    pub fn verbs(&self) -> &VerbMap {
        &self.verbs
    }

    /// Registers a verb, replacing any verb with the same id.
    pub fn add_verb(&mut self, verb: Verb) {
        if !verb.attributes.is_empty() && !verb.is_transitive() {
            warn!(verb = %verb.id, "verb has attributes but takes no direct object");
        }
        if !verb.attributes.is_empty()
            && verb.contexts_for(ContextRole::Indirect).next().is_none()
        {
            debug!(verb = %verb.id, "attribute verb draws indirect objects from every entity");
        }
        self.verbs.insert(verb.id.clone(), verb.shared());
    }

    /// Registers an entity and its initial properties.
    pub fn add_entity(&mut self, entity: Entity, properties: Bindings) {
        self.store.insert_object(entity.id.clone(), properties);
        self.entities.insert(entity.id.clone(), Arc::new(entity));
    }

    /// Puts an entity into a context group (`inventory`, `environment`).
    pub fn place(&mut self, context: impl Into<String>, id: impl Into<ObjId>) {
        let placement = (context.into(), id.into());
        if !self.placements.contains(&placement) {
            self.placements.push(placement);
        }
    }

    /// Takes an entity out of a context group.
    pub fn remove_from(&mut self, context: &str, id: &ObjId) {
        self.placements.retain(|(c, i)| !(c == context && i == id));
    }

    /// Moves the player to `id`.
    pub fn set_location(&mut self, id: impl Into<ObjId>) {
        let id = id.into();
        self.placements.retain(|(c, _)| c != LOCATION);
        self.place(LOCATION, id.clone());
        self.store.root().def(LOCATION, Value::Obj(id));
    }

    /// Compiles and registers a `match => body` action.
    ///
    /// # Errors
    /// Returns a compile error carrying `path`.
    pub fn add_action(
        &mut self,
        owner: impl Into<ObjId>,
        phase: Phase,
        path: &str,
        source: &str,
    ) -> Result<()> {
        let action = PhaseActionBuilder::new(&self.verbs, phase)
            .with_path(path)
            .with_expression(source)?;
        self.registry.add(owner, action);
        Ok(())
    }

    /// Compiles and registers an action from a match expression and a rule.
    ///
    /// # Errors
    /// Returns a compile error carrying `path`.
    pub fn add_rule_action(
        &mut self,
        owner: impl Into<ObjId>,
        phase: Phase,
        path: &str,
        pattern: &str,
        rule: &Value,
    ) -> Result<()> {
        let action = PhaseActionBuilder::new(&self.verbs, phase)
            .with_path(path)
            .with_matcher_and_command(pattern, rule)?;
        self.registry.add(owner, action);
        Ok(())
    }

    /// Compiles and registers a rule resolved after every turn.
    ///
    /// # Errors
    /// Returns a compile error carrying `path`.
    pub fn add_every_turn(&mut self, path: &str, rule: &Value) -> Result<()> {
        let thunk = RuleBuilder::evaluate_rule(rule, path)?;
        self.registry.add_every_turn(path, thunk);
        Ok(())
    }

    /// Defines a script function in the root scope.
    ///
    /// # Errors
    /// Returns a compile error for a malformed body.
    pub fn define_function(&mut self, name: &str, params: &[&str], source: &str) -> Result<()> {
        let function = ScriptFunction::compile(name, params.iter().copied(), source)?;
        self.store.root().def(name, function.into_value());
        Ok(())
    }

    /// Builds the search context from the current placements.
    #[must_use]
    pub fn search_context(&self) -> SearchContext {
        let mut ctx = SearchContext::new(self.verbs.clone());
        for (context, id) in &self.placements {
            if let Some(entity) = self.entities.get(id) {
                ctx.add_entity(context.clone(), entity.clone());
            }
        }
        ctx
    }

    fn dispatch_scope(&self) -> DispatchScope {
        let mut scope = DispatchScope::default();
        for (context, id) in &self.placements {
            if context == LOCATION {
                scope.location = Some(id.clone());
            } else if !scope.context.contains(id) {
                scope.context.push(id.clone());
            }
        }
        scope
    }

    /// Every command the player could type now, as words.
    ///
    /// # Errors
    /// Propagates errors raised by verb conditions.
    pub fn commands(&mut self) -> Result<Vec<Vec<String>>> {
        let ctx = self.search_context();
        let commands = get_all_commands(&ctx, &mut self.store.root())?;
        if self.config.trace_search {
            debug!(count = commands.len(), "enumerated commands");
        }
        Ok(commands.iter().map(|command| command.words()).collect())
    }

    /// Words that may follow the (whitespace separated) partial input.
    ///
    /// # Errors
    /// Propagates errors raised by verb conditions.
    pub fn next_words(&mut self, partial: &str) -> Result<Vec<String>> {
        let ctx = self.search_context();
        let words = split_words(partial);
        let next = get_next_words(&ctx, &mut self.store.root(), &words)?;
        if self.config.trace_search {
            debug!(partial, ?next, "next words");
        }
        Ok(next)
    }

    /// Resolves and dispatches one line of input.
    ///
    /// # Errors
    /// Returns the first error raised by a condition, action or rule.
    pub fn submit(&mut self, input: &str) -> Result<DispatchOutcome> {
        let ctx = self.search_context();
        let words = split_words(input);
        let Some(command) = search_exact(&ctx, &mut self.store.root(), &words)? else {
            debug!(input, "unrecognized input");
            return Ok(DispatchOutcome::unrecognized());
        };
        if self.config.trace_search {
            debug!(input, %command, "resolved input");
        }
        let scope = self.dispatch_scope();
        Dispatcher::new(&self.registry).run(&mut self.store.root(), &command, &scope)
    }
}

fn split_words(input: &str) -> Vec<String> {
    input.split_whitespace().map(str::to_string).collect()
}
