//! Scoring command matchers.
//!
//! A [`Matcher`] inspects a command (and the id of the object whose action is
//! being considered) and returns a [`MatchResult`]. Primitive matchers each
//! look at one part of speech; [`match_all`] conjoins them and sums their
//! scores, so a more specific action outranks a more general one.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parley_foundation::{Error, ErrorKind, ObjId, Result, Value};

use crate::command::{Command, CommandPart, PartOfSpeech};
use crate::verb::Verb;

/// Score of a part matched by a literal name.
pub const EXACT_SCORE: u32 = 10;

/// Score of a part matched by a capture.
pub const CAPTURE_SCORE: u32 = 5;

/// Word in a match expression that stands for the context object.
pub const THIS: &str = "this";

/// Outcome of running a matcher.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MatchResult {
    /// Whether the command matched.
    pub is_match: bool,
    /// Specificity of the match; only meaningful when `is_match`.
    pub score: u32,
    /// Named values extracted from the command.
    pub captures: BTreeMap<String, Value>,
}

impl MatchResult {
    /// A successful match with the given score.
    #[must_use]
    pub fn hit(score: u32) -> Self {
        Self {
            is_match: true,
            score,
            captures: BTreeMap::new(),
        }
    }

    /// A failed match.
    #[must_use]
    pub fn miss() -> Self {
        Self::default()
    }

    /// Adds a capture.
    #[must_use]
    pub fn with_capture(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.captures.insert(name.into(), value.into());
        self
    }
}

type MatchFn = dyn Fn(&Command, &str) -> MatchResult + Send + Sync;

/// A pure predicate and scorer over commands.
#[derive(Clone)]
pub struct Matcher(Arc<MatchFn>);

impl Matcher {
    /// Wraps a match function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Command, &str) -> MatchResult + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Runs the matcher. `context` is the id of the object owning the action.
    #[must_use]
    pub fn matches(&self, command: &Command, context: &str) -> MatchResult {
        (self.0)(command, context)
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Matcher(..)")
    }
}

/// Strips the capture marker from a name.
fn capture_name(name: &str) -> String {
    name.strip_prefix('$').unwrap_or(name).to_string()
}

fn names_object(name: &str, id: &ObjId, context: &str) -> bool {
    if name == THIS {
        id.as_str() == context
    } else {
        id.as_str() == name
    }
}

/// Matches the verb id.
#[must_use]
pub fn match_verb(id: impl Into<String>) -> Matcher {
    let id = id.into();
    Matcher::new(move |command, _| match command.get_verb() {
        Some(verb) if verb.id == id => MatchResult::hit(EXACT_SCORE),
        _ => MatchResult::miss(),
    })
}

fn match_object_in(pos: PartOfSpeech, name: String) -> Matcher {
    Matcher::new(move |command, context| match command.find(pos) {
        Some(CommandPart::DirectObject(id) | CommandPart::IndirectObject(id))
            if names_object(&name, id, context) =>
        {
            MatchResult::hit(EXACT_SCORE)
        }
        _ => MatchResult::miss(),
    })
}

fn capture_object_in(pos: PartOfSpeech, name: String) -> Matcher {
    Matcher::new(move |command, _| match command.find(pos) {
        Some(CommandPart::DirectObject(id) | CommandPart::IndirectObject(id)) => {
            MatchResult::hit(CAPTURE_SCORE).with_capture(name.clone(), Value::Obj(id.clone()))
        }
        _ => MatchResult::miss(),
    })
}

fn fail_if_present(pos: PartOfSpeech) -> Matcher {
    Matcher::new(move |command, _| {
        if command.find(pos).is_some() {
            MatchResult::miss()
        } else {
            MatchResult::hit(0)
        }
    })
}

/// Matches a direct object by id (`this` is the context object).
#[must_use]
pub fn match_object(name: impl Into<String>) -> Matcher {
    match_object_in(PartOfSpeech::DirectObject, name.into())
}

/// Matches any direct object, capturing it.
#[must_use]
pub fn capture_object(name: &str) -> Matcher {
    capture_object_in(PartOfSpeech::DirectObject, capture_name(name))
}

/// Matches an indirect object by id (`this` is the context object).
#[must_use]
pub fn match_indirect_object(name: impl Into<String>) -> Matcher {
    match_object_in(PartOfSpeech::IndirectObject, name.into())
}

/// Matches any indirect object, capturing it.
#[must_use]
pub fn capture_indirect_object(name: &str) -> Matcher {
    capture_object_in(PartOfSpeech::IndirectObject, capture_name(name))
}

/// Matches the attribute (preposition).
#[must_use]
pub fn match_attribute(attribute: impl Into<String>) -> Matcher {
    let attribute = attribute.into();
    Matcher::new(move |command, _| match command.attribute() {
        Some(found) if found == attribute => MatchResult::hit(EXACT_SCORE),
        _ => MatchResult::miss(),
    })
}

/// Matches a modifier of `kind` with the given value.
#[must_use]
pub fn match_modifier(kind: impl Into<String>, value: impl Into<String>) -> Matcher {
    let (kind, value) = (kind.into(), value.into());
    Matcher::new(move |command, _| {
        if command
            .get_modifiers()
            .iter()
            .any(|(k, v)| *k == kind && *v == value)
        {
            MatchResult::hit(EXACT_SCORE)
        } else {
            MatchResult::miss()
        }
    })
}

/// Matches any modifier of `kind`, capturing its value as a string.
#[must_use]
pub fn capture_modifier(kind: impl Into<String>, name: &str) -> Matcher {
    let kind = kind.into();
    let name = capture_name(name);
    Matcher::new(move |command, _| {
        match command.get_modifiers().into_iter().find(|(k, _)| *k == kind) {
            Some((_, value)) => MatchResult::hit(CAPTURE_SCORE).with_capture(name.clone(), value),
            None => MatchResult::miss(),
        }
    })
}

/// Succeeds only if the command has no direct object.
#[must_use]
pub fn fail_if_object() -> Matcher {
    fail_if_present(PartOfSpeech::DirectObject)
}

/// Succeeds only if the command has no attribute.
#[must_use]
pub fn fail_if_attribute() -> Matcher {
    fail_if_present(PartOfSpeech::Preposition)
}

/// Succeeds only if the command has no modifiers.
#[must_use]
pub fn fail_if_modifiers() -> Matcher {
    fail_if_present(PartOfSpeech::Modifier)
}

/// Conjoins matchers: all must match; scores add; captures merge left to
/// right.
#[must_use]
pub fn match_all(matchers: Vec<Matcher>) -> Matcher {
    Matcher::new(move |command, context| {
        let mut total = MatchResult::hit(0);
        for matcher in &matchers {
            let result = matcher.matches(command, context);
            if !result.is_match {
                return MatchResult::miss();
            }
            total.score += result.score;
            total.captures.extend(result.captures);
        }
        total
    })
}

/// Builds the matcher for one action.
///
/// Slots left unset become "fail if present" checks, so `look` does not
/// match `look lamp`.
#[derive(Clone, Debug, Default)]
pub struct MatchBuilder {
    verb: Option<Arc<Verb>>,
    object: Option<Matcher>,
    attribute: Option<AttributeMatchBuilder>,
    modifiers: Vec<Matcher>,
}

impl MatchBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the verb.
    #[must_use]
    pub fn verb(mut self, verb: Arc<Verb>) -> Self {
        self.verb = Some(verb);
        self
    }

    /// Sets the direct object matcher.
    #[must_use]
    pub fn object(mut self, matcher: Matcher) -> Self {
        self.object = Some(matcher);
        self
    }

    /// Sets the attribute clause.
    #[must_use]
    pub fn attribute(mut self, attribute: AttributeMatchBuilder) -> Self {
        self.attribute = Some(attribute);
        self
    }

    /// Adds a modifier matcher.
    #[must_use]
    pub fn modifier(mut self, matcher: Matcher) -> Self {
        self.modifiers.push(matcher);
        self
    }

    /// Builds the matcher.
    ///
    /// # Errors
    /// Returns `MissingVerb` if no verb was set, or the attribute clause's
    /// error.
    pub fn build(self) -> Result<Matcher> {
        let verb = self.verb.ok_or_else(|| Error::new(ErrorKind::MissingVerb))?;

        let mut parts = vec![match_verb(verb.id.clone())];
        parts.push(self.object.unwrap_or_else(fail_if_object));
        match self.attribute {
            Some(attribute) => parts.push(attribute.build()?),
            None if verb.is_indirect_optional() => {}
            None => parts.push(fail_if_attribute()),
        }
        if self.modifiers.is_empty() {
            parts.push(fail_if_modifiers());
        } else {
            parts.extend(self.modifiers);
        }
        Ok(match_all(parts))
    }
}

/// Builds the `attribute(indirect)` clause of a matcher.
#[derive(Clone, Debug, Default)]
pub struct AttributeMatchBuilder {
    attribute: Option<String>,
    indirect: Option<Matcher>,
}

impl AttributeMatchBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the attribute.
    #[must_use]
    pub fn attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    /// Sets the indirect object matcher.
    #[must_use]
    pub fn indirect_object(mut self, matcher: Matcher) -> Self {
        self.indirect = Some(matcher);
        self
    }

    /// Builds the clause.
    ///
    /// # Errors
    /// Returns `InvalidMatchExpression` if no attribute was set.
    pub fn build(self) -> Result<Matcher> {
        let attribute = self
            .attribute
            .ok_or_else(|| Error::invalid_match("attribute clause has no attribute"))?;
        let mut parts = vec![match_attribute(attribute)];
        parts.extend(self.indirect);
        Ok(match_all(parts))
    }
}
