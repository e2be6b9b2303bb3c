//! Phase actions.
//!
//! A [`PhaseAction`] pairs a compiled matcher with a compiled body for one
//! phase of command handling. Actions are built once when content loads and
//! performed every time a command matches them.
//!
//! When performed, the body resolves in this scope chain:
//!
//! ```text
//! caller ── entities ── captures ── {this} ── owner's properties
//! ```

use std::fmt;

use parley_foundation::{Bindings, Environment, Error, ObjId, Resolved, Result, Value};
use parley_language::{Expr, Thunk, compile_fragment, parse};
use parley_parser::{
    Command, MatchResult, Matcher, VerbMap, compile_match_expression, compile_match_source,
};
use tracing::debug;

use crate::rule::RuleBuilder;

/// Stage of command handling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    /// Runs first; a handled result stops the command.
    Before,
    /// The command itself.
    Main,
    /// Runs only if the main action handled the command.
    After,
}

impl Phase {
    /// All phases in execution order.
    pub const ALL: [Phase; 3] = [Phase::Before, Phase::Main, Phase::After];

    /// Lowercase phase name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::Main => "main",
            Self::After => "after",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A matcher and body bound to one phase.
#[derive(Clone, Debug)]
pub struct PhaseAction {
    phase: Phase,
    path: String,
    matcher: Matcher,
    body: Thunk,
}

impl PhaseAction {
    /// Creates an action from compiled parts.
    #[must_use]
    pub fn new(phase: Phase, path: impl Into<String>, matcher: Matcher, body: Thunk) -> Self {
        Self {
            phase,
            path: path.into(),
            matcher,
            body,
        }
    }

    /// The phase this action belongs to.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Declared source path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    fn run_matcher(&self, command: &Command, obj: &ObjId) -> MatchResult {
        self.matcher.matches(command, obj.as_str())
    }

    /// Returns true if the command matches with `obj` as the owner.
    #[must_use]
    pub fn is_match(&self, command: &Command, obj: &ObjId) -> bool {
        self.run_matcher(command, obj).is_match
    }

    /// Match score, or 0 if the command does not match.
    #[must_use]
    pub fn score(&self, command: &Command, obj: &ObjId) -> u32 {
        let result = self.run_matcher(command, obj);
        if result.is_match { result.score } else { 0 }
    }

    /// Performs the action for `obj` if the command matches.
    ///
    /// A non-matching command is not an error: the result is unresolved and
    /// the body never runs.
    ///
    /// # Errors
    /// Returns the body's error wrapped with the phase and declared path.
    pub fn perform(
        &self,
        env: &mut Environment<'_>,
        obj: &ObjId,
        command: &Command,
    ) -> Result<Resolved> {
        let result = self.run_matcher(command, obj);
        if !result.is_match {
            return Ok(Resolved::unresolved());
        }
        debug!(phase = %self.phase, path = %self.path, owner = %obj, %command, "performing action");

        let mut entities = env.new_child(Bindings::new());
        let ids: Vec<ObjId> = entities.store().object_ids().cloned().collect();
        entities.create_namespace_references(ids);
        let mut captured = entities.new_child(result.captures.into_iter().collect());
        let mut this =
            captured.new_child(Bindings::unit("this".to_string(), Value::Obj(obj.clone())));

        let resolved = if this.store().has_object(obj) {
            let mut scope = this.object_scope(obj);
            self.body.resolve(&mut scope)
        } else {
            self.body.resolve(&mut this)
        };
        resolved.map_err(|e| e.in_action(self.phase.name(), self.path.clone()))
    }
}

/// Returns the best-scoring action matching the command, preferring the
/// earliest declared on ties.
#[must_use]
pub fn best_match<'a>(
    actions: impl IntoIterator<Item = &'a PhaseAction>,
    command: &Command,
    obj: &ObjId,
) -> Option<&'a PhaseAction> {
    let mut best: Option<(u32, &PhaseAction)> = None;
    for action in actions {
        let result = action.run_matcher(command, obj);
        if !result.is_match {
            continue;
        }
        if best.is_none_or(|(score, _)| result.score > score) {
            best = Some((result.score, action));
        }
    }
    best.map(|(_, action)| action)
}

/// Compiles actions for one phase against the known verbs.
pub struct PhaseActionBuilder<'v> {
    verbs: &'v VerbMap,
    phase: Phase,
    path: String,
}

impl<'v> PhaseActionBuilder<'v> {
    /// Creates a builder for `phase`.
    #[must_use]
    pub fn new(verbs: &'v VerbMap, phase: Phase) -> Self {
        Self {
            verbs,
            phase,
            path: String::new(),
        }
    }

    /// Sets the declared source path used in error messages.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Compiles `match => body`, e.g. `eat(this) => write('Crunch.')`.
    ///
    /// # Errors
    /// Returns a compile error if the source does not parse, has no `=>`,
    /// or its match side is not a valid match expression.
    pub fn with_expression(&self, source: &str) -> Result<PhaseAction> {
        let expr = parse(source).map_err(|e| e.at_path(&self.path))?;
        let Expr::Match { pattern, body, .. } = &expr else {
            return Err(Error::invalid_match(format!(
                "expected `match => body`, found `{}`",
                source.trim()
            ))
            .at_path(&self.path));
        };
        let matcher = compile_match_expression(pattern, self.verbs)
            .map_err(|e| e.in_expression(pattern.span().text(source).trim()).at_path(&self.path))?;
        let body = compile_fragment(source, body).map_err(|e| e.at_path(&self.path))?;
        debug!(phase = %self.phase, path = %self.path, "compiled action");
        Ok(PhaseAction::new(self.phase, self.path.clone(), matcher, body))
    }

    /// Compiles a match expression and a rule value.
    ///
    /// # Errors
    /// Returns a compile error from either side.
    pub fn with_matcher_and_command(&self, pattern: &str, rule: &Value) -> Result<PhaseAction> {
        let matcher = compile_match_source(pattern, self.verbs).map_err(|e| e.at_path(&self.path))?;
        let body = RuleBuilder::evaluate_rule(rule, &self.path)?;
        debug!(phase = %self.phase, path = %self.path, "compiled action");
        Ok(PhaseAction::new(self.phase, self.path.clone(), matcher, body))
    }
}
