//! Command dispatch.
//!
//! One submitted command runs through the phases in order:
//!
//! ```text
//! before ──handled──► stop
//!   │ not handled
//!   ▼
//! main ──not handled──► stop
//!   │ handled
//!   ▼
//! after (buffered: a handled after action replaces the main output)
//!   │
//!   ▼
//! every-turn rules (skipped for instant verbs)
//! ```
//!
//! Owners are visited in scope order: indirect object, direct object,
//! location, the remaining context entities (latest first), and finally the
//! verb itself.

use std::collections::BTreeMap;

use parley_foundation::{Environment, ObjId, Result};
use parley_language::Thunk;
use parley_parser::Command;
use tracing::debug;

use crate::phase::{Phase, PhaseAction, best_match};

/// Phase actions by owner, plus the rules run after every turn.
#[derive(Clone, Debug, Default)]
pub struct ActionRegistry {
    actions: BTreeMap<ObjId, Vec<PhaseAction>>,
    every_turn: Vec<(String, Thunk)>,
}

impl ActionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an action for an entity or verb.
    pub fn add(&mut self, owner: impl Into<ObjId>, action: PhaseAction) {
        self.actions.entry(owner.into()).or_default().push(action);
    }

    /// Registers a rule resolved at the end of every turn.
    pub fn add_every_turn(&mut self, path: impl Into<String>, rule: Thunk) {
        self.every_turn.push((path.into(), rule));
    }

    /// Actions of one owner for one phase, in declaration order.
    pub fn actions(&self, owner: &ObjId, phase: Phase) -> impl Iterator<Item = &PhaseAction> {
        self.actions
            .get(owner)
            .into_iter()
            .flatten()
            .filter(move |action| action.phase() == phase)
    }

    /// The best action of one owner for a phase.
    #[must_use]
    pub fn best(&self, owner: &ObjId, phase: Phase, command: &Command) -> Option<&PhaseAction> {
        best_match(self.actions(owner, phase), command, owner)
    }

    /// Number of registered actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.values().map(Vec::len).sum()
    }

    /// Returns true if no actions are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Entities around the player when a command is dispatched.
#[derive(Clone, Debug, Default)]
pub struct DispatchScope {
    /// The player's location.
    pub location: Option<ObjId>,
    /// Other in-scope entities, in the order they came into scope.
    pub context: Vec<ObjId>,
}

impl DispatchScope {
    /// Owners in visiting order for `command`, each once.
    #[must_use]
    pub fn owners(&self, command: &Command) -> Vec<ObjId> {
        let verb = command.get_verb().map(|verb| ObjId::new(&verb.id));
        let ordered = command
            .indirect_object()
            .cloned()
            .into_iter()
            .chain(command.direct_object().cloned())
            .chain(self.location.clone())
            .chain(self.context.iter().rev().cloned())
            .chain(verb);

        let mut owners: Vec<ObjId> = Vec::new();
        for owner in ordered {
            if !owners.contains(&owner) {
                owners.push(owner);
            }
        }
        owners
    }
}

/// What happened to a dispatched command.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Whether the words formed a command at all.
    pub recognized: bool,
    /// Whether some action handled the command.
    pub handled: bool,
    /// The phase whose action handled it.
    pub phase: Option<Phase>,
    /// Whether the verb is instant (no every-turn rules ran).
    pub instant: bool,
    /// Output written while handling the command.
    pub output: Vec<String>,
}

impl DispatchOutcome {
    /// Outcome for input that matched no command.
    #[must_use]
    pub fn unrecognized() -> Self {
        Self::default()
    }
}

/// Runs submitted commands through the registered actions.
pub struct Dispatcher<'r> {
    registry: &'r ActionRegistry,
}

/// Runs `f` with output captured in a fresh buffer, which is popped even if
/// `f` fails.
fn buffered<T>(
    env: &mut Environment<'_>,
    f: impl FnOnce(&mut Environment<'_>) -> Result<T>,
) -> (Result<T>, Vec<String>) {
    env.store_mut().push_output_buffer();
    let result = f(env);
    let output = env.store_mut().pop_output_buffer();
    (result, output)
}

impl<'r> Dispatcher<'r> {
    /// Creates a dispatcher over a registry.
    #[must_use]
    pub fn new(registry: &'r ActionRegistry) -> Self {
        Self { registry }
    }

    /// Handles one command.
    ///
    /// # Errors
    /// Returns the first action or rule error. Mutations made before the
    /// error are kept.
    pub fn run(
        &self,
        env: &mut Environment<'_>,
        command: &Command,
        scope: &DispatchScope,
    ) -> Result<DispatchOutcome> {
        let owners = scope.owners(command);
        let instant = command.get_verb().is_some_and(|verb| verb.is_instant());

        let (result, output) = buffered(env, |env| {
            let phase = self.run_phases(env, command, &owners)?;
            if phase.is_some() && !instant {
                self.run_every_turn(env)?;
            }
            Ok(phase)
        });
        let phase = result?;
        debug!(%command, ?phase, instant, "dispatched command");
        Ok(DispatchOutcome {
            recognized: true,
            handled: phase.is_some(),
            phase,
            instant,
            output,
        })
    }

    fn run_phases(
        &self,
        env: &mut Environment<'_>,
        command: &Command,
        owners: &[ObjId],
    ) -> Result<Option<Phase>> {
        for owner in owners {
            if let Some(action) = self.registry.best(owner, Phase::Before, command) {
                if action.perform(env, owner, command)?.is_handled() {
                    debug!(%owner, path = action.path(), "before action handled command");
                    return Ok(Some(Phase::Before));
                }
            }
        }

        let Some((owner, main)) = self.best_main(command, owners) else {
            return Ok(None);
        };
        let (result, main_output) = buffered(env, |env| main.perform(env, owner, command));
        if !result?.is_handled() {
            env.store_mut().extend_output(main_output);
            return Ok(None);
        }

        let (result, after_output) = buffered(env, |env| {
            let mut handled = false;
            for owner in owners {
                if let Some(action) = self.registry.best(owner, Phase::After, command) {
                    handled |= action.perform(env, owner, command)?.is_handled();
                }
            }
            Ok(handled)
        });
        if result? {
            env.store_mut().extend_output(after_output);
            Ok(Some(Phase::After))
        } else {
            env.store_mut().extend_output(main_output);
            env.store_mut().extend_output(after_output);
            Ok(Some(Phase::Main))
        }
    }

    /// Highest-scoring main action across all owners; earlier owners win ties.
    fn best_main<'o>(
        &self,
        command: &Command,
        owners: &'o [ObjId],
    ) -> Option<(&'o ObjId, &'r PhaseAction)> {
        let mut best: Option<(u32, &ObjId, &PhaseAction)> = None;
        for owner in owners {
            if let Some(action) = self.registry.best(owner, Phase::Main, command) {
                let score = action.score(command, owner);
                if best.is_none_or(|(top, _, _)| score > top) {
                    best = Some((score, owner, action));
                }
            }
        }
        best.map(|(_, owner, action)| (owner, action))
    }

    fn run_every_turn(&self, env: &mut Environment<'_>) -> Result<()> {
        for (path, rule) in &self.registry.every_turn {
            rule.resolve(env).map_err(|e| e.in_action("every-turn", path.clone()))?;
        }
        Ok(())
    }
}
