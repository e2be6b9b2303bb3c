//! Core values, errors, collections and the scoped environment for Parley.
//!
//! This crate provides:
//! - [`Value`] - The dynamic value type shared by entities and scripts
//! - [`Resolved`] - The result of resolving a compiled expression
//! - [`Error`] - Rich, chainable error types
//! - [`MultiDict`] - Key to ordered-values map
//! - [`Store`] and [`Environment`] - The scope arena and its cursor

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod collections;
pub mod env;
pub mod error;
pub mod value;

pub use collections::MultiDict;
pub use env::{Bindings, Environment, ScopeId, Store};
pub use error::{Error, ErrorContext, ErrorKind, Result, SemanticLimit};
pub use value::{Callable, Function, NativeFn, ObjId, Resolved, Value};
