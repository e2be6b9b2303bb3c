//! Command grammar for Parley.
//!
//! This crate turns the in-scope verbs and entities into the set of commands
//! a player may type, and decides which scripted action a command matches.
//!
//! # Architecture
//!
//! ```text
//! verbs + entities
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ SEARCH          │  → [stir soup], [stir soup with spoon], ...
//! │ (grammar tree)  │
//! └─────────────────┘
//!          │  "stir soup with spoon"
//!          ▼
//! ┌─────────────────┐
//! │ COMMAND         │  → stir · soup · with · spoon
//! │ (parts)         │    (verb, direct, preposition, indirect)
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ MATCHER         │  → stir($pot).with(this): match, score 35, {pot: #soup}
//! └─────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`verb`] - Verb definitions and traits
//! - [`entity`] - The grammar-facing view of an entity
//! - [`command`] - Immutable, cheaply branched commands
//! - [`matcher`] - Scoring matchers and their builders
//! - [`match_expr`] - Compiling `verb(obj).attr(ind)` expressions to matchers
//! - [`search`] - Enumeration, autocomplete and exact lookup

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod command;
pub mod entity;
pub mod match_expr;
pub mod matcher;
pub mod search;
pub mod verb;

pub use command::{Command, CommandPart, PartOfSpeech};
pub use entity::{Entity, VerbMatcher};
pub use match_expr::{compile_match_expression, compile_match_source};
pub use matcher::{
    AttributeMatchBuilder, CAPTURE_SCORE, EXACT_SCORE, MatchBuilder, MatchResult, Matcher, THIS,
    match_all,
};
pub use search::{
    SearchContext, SearchFn, get_all_commands, get_next_words, search_exact, search_next,
};
pub use verb::{ContextRole, Verb, VerbMap, VerbTrait};
