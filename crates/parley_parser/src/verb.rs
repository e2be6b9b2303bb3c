//! Verb definitions.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Verbs by id.
pub type VerbMap = BTreeMap<String, Arc<Verb>>;

/// Grammatical behavior of a verb.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VerbTrait {
    /// Takes a direct object (`take lamp`).
    Transitive,
    /// Stands alone (`look`).
    Intransitive,
    /// Does not consume a game turn.
    Instant,
    /// Accepts modifiers (`go north`).
    Modifiable,
    /// Actions matching the bare form also accept an attributed command.
    IndirectOptional,
}

/// Which object slot a verb context applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContextRole {
    /// Direct objects.
    Direct,
    /// Indirect objects.
    Indirect,
}

/// A verb and the grammar it supports.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Verb {
    /// Verb id, also the word the player types.
    pub id: String,
    /// Grammatical traits.
    pub traits: BTreeSet<VerbTrait>,
    /// Prepositions introducing an indirect object (`with`, `on`).
    pub attributes: Vec<String>,
    /// Modifier kinds in declaration order (`direction`).
    pub modifiers: Vec<String>,
    /// Entity groups objects may be drawn from, per slot.
    pub contexts: Vec<(ContextRole, String)>,
}

impl Verb {
    /// Creates a verb with no traits.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Creates an intransitive verb.
    #[must_use]
    pub fn intransitive(id: impl Into<String>) -> Self {
        Self::new(id).with_trait(VerbTrait::Intransitive)
    }

    /// Creates a transitive verb.
    #[must_use]
    pub fn transitive(id: impl Into<String>) -> Self {
        Self::new(id).with_trait(VerbTrait::Transitive)
    }

    /// Adds a trait.
    #[must_use]
    pub fn with_trait(mut self, verb_trait: VerbTrait) -> Self {
        self.traits.insert(verb_trait);
        self
    }

    /// Adds an attribute (preposition).
    #[must_use]
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attributes.push(attribute.into());
        self
    }

    /// Adds a modifier kind; implies [`VerbTrait::Modifiable`].
    #[must_use]
    pub fn with_modifier(mut self, kind: impl Into<String>) -> Self {
        self.modifiers.push(kind.into());
        self.with_trait(VerbTrait::Modifiable)
    }

    /// Restricts a slot to an entity group.
    #[must_use]
    pub fn with_context(mut self, role: ContextRole, context: impl Into<String>) -> Self {
        self.contexts.push((role, context.into()));
        self
    }

    /// Returns true if the verb has `verb_trait`.
    #[must_use]
    pub fn has_trait(&self, verb_trait: VerbTrait) -> bool {
        self.traits.contains(&verb_trait)
    }

    /// Returns true if the verb takes a direct object.
    #[must_use]
    pub fn is_transitive(&self) -> bool {
        self.has_trait(VerbTrait::Transitive)
    }

    /// Returns true if the verb may stand alone. A verb with neither
    /// transitivity trait is intransitive.
    #[must_use]
    pub fn is_intransitive(&self) -> bool {
        self.has_trait(VerbTrait::Intransitive) || !self.is_transitive()
    }

    /// Returns true if the verb does not consume a turn.
    #[must_use]
    pub fn is_instant(&self) -> bool {
        self.has_trait(VerbTrait::Instant)
    }

    /// Returns true if the verb accepts an attribute the action did not ask for.
    #[must_use]
    pub fn is_indirect_optional(&self) -> bool {
        self.has_trait(VerbTrait::IndirectOptional)
    }

    /// Context names declared for `role`.
    pub fn contexts_for(&self, role: ContextRole) -> impl Iterator<Item = &str> {
        self.contexts
            .iter()
            .filter(move |(r, _)| *r == role)
            .map(|(_, name)| name.as_str())
    }

    /// Wraps the verb for sharing.
    #[must_use]
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}
