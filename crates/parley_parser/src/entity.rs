//! Grammar-facing view of an entity.

use parley_foundation::{Bindings, Environment, MultiDict, ObjId, Result, Value};
use parley_language::Thunk;

/// Declares that an entity can be the object of a verb.
///
/// Without an attribute the entity is offered as a direct object; with one
/// (`stir.with`) it is offered as the indirect object after that attribute.
#[derive(Clone, Debug)]
pub struct VerbMatcher {
    /// Verb id.
    pub verb: String,
    /// Attribute the entity follows, if any.
    pub attribute: Option<String>,
    /// Only offered while this resolves truthy in the entity's scope.
    pub condition: Option<Thunk>,
}

impl VerbMatcher {
    /// Creates a matcher for a verb.
    #[must_use]
    pub fn new(verb: impl Into<String>) -> Self {
        Self {
            verb: verb.into(),
            attribute: None,
            condition: None,
        }
    }

    /// Parses `verb` or `verb.attribute`.
    #[must_use]
    pub fn parse(declaration: &str) -> Self {
        match declaration.split_once('.') {
            Some((verb, attribute)) => Self::new(verb).with_attribute(attribute),
            None => Self::new(declaration),
        }
    }

    /// Sets the attribute.
    #[must_use]
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    /// Sets the enabling condition.
    #[must_use]
    pub fn with_condition(mut self, condition: Thunk) -> Self {
        self.condition = Some(condition);
        self
    }
}

/// An entity as seen by the command grammar.
#[derive(Clone, Debug)]
pub struct Entity {
    /// Entity id (also its property bag id and its word).
    pub id: ObjId,
    /// Verbs the entity can take part in.
    pub verbs: Vec<VerbMatcher>,
    /// Modifier values the entity contributes, by kind.
    pub verb_modifiers: MultiDict<String, String>,
}

impl Entity {
    /// Creates an entity with no verbs.
    #[must_use]
    pub fn new(id: impl Into<ObjId>) -> Self {
        Self {
            id: id.into(),
            verbs: Vec::new(),
            verb_modifiers: MultiDict::new(),
        }
    }

    /// Adds a verb matcher.
    #[must_use]
    pub fn with_verb(mut self, matcher: VerbMatcher) -> Self {
        self.verbs.push(matcher);
        self
    }

    /// Adds a modifier value.
    #[must_use]
    pub fn with_modifier(mut self, kind: impl Into<String>, value: impl Into<String>) -> Self {
        self.verb_modifiers.insert(kind.into(), value.into());
        self
    }

    /// Returns true if the entity currently offers `verb` in the given slot.
    ///
    /// Conditions are resolved with `this` bound to the entity, on top of the
    /// entity's own properties.
    ///
    /// # Errors
    /// Propagates errors raised by a condition.
    pub fn offers(
        &self,
        env: &mut Environment<'_>,
        verb: &str,
        attribute: Option<&str>,
    ) -> Result<bool> {
        for matcher in &self.verbs {
            if matcher.verb != verb || matcher.attribute.as_deref() != attribute {
                continue;
            }
            let Some(condition) = &matcher.condition else {
                return Ok(true);
            };
            let mut this = env.new_child(Bindings::unit(
                "this".to_string(),
                Value::Obj(self.id.clone()),
            ));
            let mut scope = this.object_scope(&self.id);
            if condition.resolve(&mut scope)?.is_truthy() {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
