//! Parley - interactive fiction command interpreter
//!
//! This crate re-exports all layers of the Parley system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 3: parley_engine     - Rules, phase actions, dispatch, interpreter
//! Layer 2: parley_parser     - Verbs, entities, command search, matchers
//! Layer 1: parley_language   - Lexer, parser, thunks, builtins
//! Layer 0: parley_foundation - Core types (Value, ObjId, Error, scopes)
//! ```

pub use parley_engine as engine;
pub use parley_foundation as foundation;
pub use parley_language as language;
pub use parley_parser as parser;
