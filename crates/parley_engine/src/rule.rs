//! Declarative rule compiler.
//!
//! Content authors write behavior as plain values:
//!
//! ```text
//! "lamp.lit = true"                       expression
//! "$The lamp flickers."                   text written to the output
//! ["$One.", "$Two."]                      run in order
//! { when: "lamp.lit", do: [...], otherwise: "$It is dark." }
//! { repeat: ["$Tick.", "$Tock."] }        cycles across turns
//! ```
//!
//! A rule object holds at most one component of each type:
//!
//! | Type      | Keys                                              |
//! |-----------|---------------------------------------------------|
//! | condition | `when`, `if`, `unless`                            |
//! | action    | `all`, `do`, `then`, `switch`, `repeat`, `random`, `once` |
//! | otherwise | `otherwise`, `else`                               |
//!
//! `repeat` and `once` keep their progress in the environment, keyed by the
//! rule's declared path, so a rule resumes where it left off on later turns.

use std::sync::Arc;

use parley_foundation::{
    Bindings, Environment, Error, ErrorKind, Function, Resolved, Result, Value,
};
use parley_language::{Thunk, ThunkKind, compile};
use tracing::debug;

/// Root binding holding `repeat`/`once` progress, keyed by rule path.
pub const RULE_STATE: &str = "__rule_state";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Slot {
    Condition,
    Action,
    Otherwise,
}

impl Slot {
    fn of(key: &str) -> Option<Self> {
        match key {
            "when" | "if" | "unless" => Some(Self::Condition),
            "all" | "do" | "then" | "switch" | "repeat" | "random" | "once" => Some(Self::Action),
            "otherwise" | "else" => Some(Self::Otherwise),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Condition => "condition",
            Self::Action => "action",
            Self::Otherwise => "otherwise",
        }
    }
}

/// Compiles rule values into thunks.
pub struct RuleBuilder;

impl RuleBuilder {
    /// Compiles a rule declared at `path`.
    ///
    /// Strings are expressions (or output text when they start with `$`),
    /// lists run in order, maps are rule objects, functions are called with
    /// no arguments, and anything else is a constant.
    ///
    /// # Errors
    /// Returns a compile error carrying the path of the offending value.
    pub fn evaluate_rule(value: &Value, path: &str) -> Result<Thunk> {
        let thunk = match value {
            Value::String(source) => Self::string_rule(source, path)?,
            Value::List(items) => sequence(Self::compile_items(items.iter(), path)?),
            Value::Map(map) => Self::object_rule(map, path)?,
            Value::Fn(function) => call_thunk(function.clone()),
            other => Thunk::constant(other.clone()),
        };
        debug!(path, "compiled rule");
        Ok(thunk)
    }

    fn compile_items<'a>(items: impl Iterator<Item = &'a Value>, path: &str) -> Result<Vec<Thunk>> {
        items
            .enumerate()
            .map(|(i, item)| Self::evaluate_rule(item, &format!("{path}/{i}")))
            .collect()
    }

    /// A single rule or a list of rules.
    fn compile_body(value: &Value, path: &str) -> Result<Vec<Thunk>> {
        match value {
            Value::List(items) => Self::compile_items(items.iter(), path),
            other => Ok(vec![Self::evaluate_rule(other, path)?]),
        }
    }

    fn string_rule(source: &str, path: &str) -> Result<Thunk> {
        if let Some(text) = source.strip_prefix('$') {
            let text: Arc<str> = Arc::from(text);
            return Ok(Thunk::new(ThunkKind::Builtin, move |env| {
                env.write(text.as_ref());
                Ok(Resolved::new(true))
            }));
        }
        let thunk = compile(source).map_err(|e| e.at_path(path))?;
        if thunk.kind() != ThunkKind::Property {
            return Ok(thunk);
        }
        // `lamp.toggle` names a function: call it.
        Ok(Thunk::new(ThunkKind::Normal, move |env| {
            let resolved = thunk.resolve(env)?;
            match resolved.value() {
                Value::Fn(function) => {
                    let function = function.clone();
                    Ok(Resolved::new(function.call(env, Vec::new())?))
                }
                _ => Ok(resolved),
            }
        }))
    }

    fn object_rule(map: &Bindings, path: &str) -> Result<Thunk> {
        let mut condition: Option<(&str, Thunk)> = None;
        let mut action: Option<(&str, Thunk)> = None;
        let mut otherwise: Option<(&str, Thunk)> = None;

        for (key, value) in map {
            let slot = Slot::of(key).ok_or_else(|| {
                Error::new(ErrorKind::UnknownRuleComponent(key.clone())).at_path(path)
            })?;
            let target = match slot {
                Slot::Condition => &mut condition,
                Slot::Action => &mut action,
                Slot::Otherwise => &mut otherwise,
            };
            if let Some((existing, _)) = target {
                return Err(Error::new(ErrorKind::DuplicateRuleComponent {
                    component: slot.name(),
                    existing: (*existing).to_string(),
                })
                .at_path(path));
            }
            let item_path = format!("{path}/{key}");
            let thunk = match key.as_str() {
                "switch" => switch(Self::compile_body(value, &item_path)?),
                "repeat" => {
                    let items = nonempty(Self::compile_body(value, &item_path)?, key, path)?;
                    repeat(items, item_path)
                }
                "random" => random(nonempty(Self::compile_body(value, &item_path)?, key, path)?),
                "once" => once(sequence(Self::compile_body(value, &item_path)?), item_path),
                "all" | "do" | "then" | "otherwise" | "else" => {
                    sequence(Self::compile_body(value, &item_path)?)
                }
                _ => Self::evaluate_rule(value, &item_path)?,
            };
            *target = Some((key.as_str(), thunk));
        }

        if condition.is_none() && action.is_none() {
            return Err(Error::invalid_rule("rule has no condition or action").at_path(path));
        }

        let negate = matches!(condition, Some(("unless", _)));
        let condition = condition.map(|(_, thunk)| thunk);
        let action = action.map(|(_, thunk)| thunk);
        let otherwise = otherwise.map(|(_, thunk)| thunk);

        Ok(Thunk::new(ThunkKind::Normal, move |env| {
            let pass = match &condition {
                Some(condition) => condition.resolve(env)?.is_truthy() != negate,
                None => true,
            };
            match (pass, &action, &otherwise) {
                (true, Some(action), _) => action.resolve(env),
                (true, None, _) => Ok(Resolved::new(true)),
                (false, _, Some(otherwise)) => otherwise.resolve(env),
                (false, _, None) => Ok(Resolved::unresolved()),
            }
        }))
    }
}

fn nonempty(thunks: Vec<Thunk>, key: &str, path: &str) -> Result<Vec<Thunk>> {
    if thunks.is_empty() {
        Err(Error::invalid_rule(format!("{key} needs at least one rule")).at_path(path))
    } else {
        Ok(thunks)
    }
}

fn call_thunk(function: Function) -> Thunk {
    Thunk::new(ThunkKind::Normal, move |env| {
        Ok(Resolved::new(function.call(env, Vec::new())?))
    })
}

/// Runs every thunk; the result is the last one's.
fn sequence(thunks: Vec<Thunk>) -> Thunk {
    Thunk::new(ThunkKind::Normal, move |env| {
        let mut last = Resolved::unresolved();
        for thunk in &thunks {
            last = thunk.resolve(env)?;
        }
        Ok(last)
    })
}

/// Runs thunks in order until one resolves truthy.
fn switch(thunks: Vec<Thunk>) -> Thunk {
    Thunk::new(ThunkKind::Normal, move |env| {
        for thunk in &thunks {
            let result = thunk.resolve(env)?;
            if result.is_truthy() {
                return Ok(result);
            }
        }
        Ok(Resolved::new(false))
    })
}

fn random(thunks: Vec<Thunk>) -> Thunk {
    Thunk::new(ThunkKind::Normal, move |env| {
        let index = env.random_index(thunks.len());
        match thunks.get(index) {
            Some(thunk) => thunk.resolve(env),
            None => Ok(Resolved::unresolved()),
        }
    })
}

fn repeat(thunks: Vec<Thunk>, key: String) -> Thunk {
    Thunk::new(ThunkKind::Normal, move |env| {
        let index = usize::try_from(read_state(env, &key)).unwrap_or(0) % thunks.len();
        let Some(thunk) = thunks.get(index) else {
            return Ok(Resolved::unresolved());
        };
        // A failed item is retried on the next turn.
        let result = thunk.resolve(env)?;
        write_state(env, &key, (index + 1) % thunks.len())?;
        Ok(result)
    })
}

fn once(body: Thunk, key: String) -> Thunk {
    Thunk::new(ThunkKind::Normal, move |env| {
        if read_state(env, &key) != 0 {
            return Ok(Resolved::unresolved());
        }
        write_state(env, &key, 1)?;
        body.resolve(env)
    })
}

fn read_state(env: &Environment<'_>, key: &str) -> i64 {
    match env.lookup_name(RULE_STATE) {
        Some(Value::Map(state)) => match state.get(key) {
            Some(Value::Int(n)) => *n,
            _ => 0,
        },
        _ => 0,
    }
}

fn write_state(env: &mut Environment<'_>, key: &str, n: usize) -> Result<()> {
    env.set_keys(RULE_STATE, &[key.to_string()], Value::from(n))
}
