//! Command model.
//!
//! A [`Command`] is a sentence built one part at a time:
//!
//! ```text
//! verb(stir) → object(soup) → preposition(with) → object(spoon)
//!   Verb        DirectObject   Preposition        IndirectObject
//! ```
//!
//! Parts live in a persistent vector, so extending a command returns a new
//! command that shares its prefix with the original. The search engine relies
//! on this to branch one prefix into many continuations.

use std::fmt;
use std::sync::Arc;

use parley_foundation::ObjId;

use crate::verb::Verb;

/// Grammatical position of a command part.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PartOfSpeech {
    /// The main verb.
    Verb,
    /// The object acted on.
    DirectObject,
    /// The attribute introducing an indirect object.
    Preposition,
    /// The object after the preposition.
    IndirectObject,
    /// A modifier such as a direction.
    Modifier,
}

/// One part of a command.
#[derive(Clone, Debug, PartialEq)]
pub enum CommandPart {
    /// The main verb.
    Verb(Arc<Verb>),
    /// The object acted on.
    DirectObject(ObjId),
    /// The attribute name.
    Preposition(String),
    /// The object after the preposition.
    IndirectObject(ObjId),
    /// A modifier value of a given kind.
    Modifier {
        /// Modifier kind (`direction`).
        kind: String,
        /// Modifier value (`north`).
        value: String,
    },
}

impl CommandPart {
    /// Returns the part of speech.
    #[must_use]
    pub fn part_of_speech(&self) -> PartOfSpeech {
        match self {
            Self::Verb(_) => PartOfSpeech::Verb,
            Self::DirectObject(_) => PartOfSpeech::DirectObject,
            Self::Preposition(_) => PartOfSpeech::Preposition,
            Self::IndirectObject(_) => PartOfSpeech::IndirectObject,
            Self::Modifier { .. } => PartOfSpeech::Modifier,
        }
    }

    /// Returns the word this part contributes to the sentence.
    #[must_use]
    pub fn word(&self) -> &str {
        match self {
            Self::Verb(verb) => &verb.id,
            Self::DirectObject(id) | Self::IndirectObject(id) => id.as_str(),
            Self::Preposition(attribute) => attribute,
            Self::Modifier { value, .. } => value,
        }
    }
}

/// An immutable, cheaply branched sentence.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Command {
    parts: im::Vector<CommandPart>,
}

impl Command {
    /// Creates an empty command.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, part: CommandPart) -> Self {
        let mut parts = self.parts.clone();
        parts.push_back(part);
        Self { parts }
    }

    /// Returns a command with the verb appended.
    #[must_use]
    pub fn verb(&self, verb: Arc<Verb>) -> Self {
        self.push(CommandPart::Verb(verb))
    }

    /// Returns a command with an object appended: the indirect object if a
    /// preposition is present, otherwise the direct object.
    #[must_use]
    pub fn object(&self, id: impl Into<ObjId>) -> Self {
        let id = id.into();
        if self.find(PartOfSpeech::Preposition).is_some() {
            self.push(CommandPart::IndirectObject(id))
        } else {
            self.push(CommandPart::DirectObject(id))
        }
    }

    /// Returns a command with the preposition appended.
    #[must_use]
    pub fn preposition(&self, attribute: impl Into<String>) -> Self {
        self.push(CommandPart::Preposition(attribute.into()))
    }

    /// Returns a command with a modifier appended.
    #[must_use]
    pub fn modifier(&self, kind: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(CommandPart::Modifier {
            kind: kind.into(),
            value: value.into(),
        })
    }

    /// Part of speech of the most recent part.
    #[must_use]
    pub fn get_pos(&self) -> Option<PartOfSpeech> {
        self.parts.last().map(CommandPart::part_of_speech)
    }

    /// The main verb.
    #[must_use]
    pub fn get_verb(&self) -> Option<&Arc<Verb>> {
        match self.find(PartOfSpeech::Verb) {
            Some(CommandPart::Verb(verb)) => Some(verb),
            _ => None,
        }
    }

    /// The most recent part with this part of speech.
    #[must_use]
    pub fn find(&self, pos: PartOfSpeech) -> Option<&CommandPart> {
        self.parts
            .iter()
            .rev()
            .find(|part| part.part_of_speech() == pos)
    }

    /// Every part with this part of speech, oldest first.
    #[must_use]
    pub fn find_all(&self, pos: PartOfSpeech) -> Vec<&CommandPart> {
        self.parts
            .iter()
            .filter(|part| part.part_of_speech() == pos)
            .collect()
    }

    /// Modifiers as `(kind, value)` pairs in insertion order.
    #[must_use]
    pub fn get_modifiers(&self) -> Vec<(&str, &str)> {
        self.parts
            .iter()
            .filter_map(|part| match part {
                CommandPart::Modifier { kind, value } => Some((kind.as_str(), value.as_str())),
                _ => None,
            })
            .collect()
    }

    /// The direct object.
    #[must_use]
    pub fn direct_object(&self) -> Option<&ObjId> {
        match self.find(PartOfSpeech::DirectObject) {
            Some(CommandPart::DirectObject(id)) => Some(id),
            _ => None,
        }
    }

    /// The indirect object.
    #[must_use]
    pub fn indirect_object(&self) -> Option<&ObjId> {
        match self.find(PartOfSpeech::IndirectObject) {
            Some(CommandPart::IndirectObject(id)) => Some(id),
            _ => None,
        }
    }

    /// The attribute (preposition) name.
    #[must_use]
    pub fn attribute(&self) -> Option<&str> {
        match self.find(PartOfSpeech::Preposition) {
            Some(CommandPart::Preposition(attribute)) => Some(attribute),
            _ => None,
        }
    }

    /// Iterates over the parts.
    pub fn parts(&self) -> impl Iterator<Item = &CommandPart> {
        self.parts.iter()
    }

    /// The sentence as words.
    #[must_use]
    pub fn words(&self) -> Vec<String> {
        self.parts.iter().map(|p| p.word().to_string()).collect()
    }

    /// Number of parts (and words).
    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Returns true if no part has been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            f.write_str(part.word())?;
        }
        Ok(())
    }
}
