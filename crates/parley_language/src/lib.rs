//! Expression language for Parley content.
//!
//! This crate provides:
//! - `Lexer` - Tokenization of expression source
//! - `Parser` - Parsing tokens into an [`Expr`] tree
//! - `Compiler` - Compiling expressions into [`Thunk`]s resolved against an
//!   `Environment`
//! - Builtin native functions and script-defined functions

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod ast;
pub mod builtins;
pub mod function;
pub mod lexer;
pub mod parser;
pub mod span;
pub mod thunk;
pub mod token;


pub use ast::{AssignOp, BinaryOp, Expr, LogicalOp, Property, UnaryOp};
pub use builtins::install_builtins;
pub use function::{ScriptFunction, bind_params};
pub use lexer::Lexer;
pub use parser::{Parser, parse};
pub use span::Span;
pub use thunk::{Compiler, Thunk, ThunkKind, apply_binary, apply_unary, compile, compile_fragment};
pub use token::{Token, TokenKind};
