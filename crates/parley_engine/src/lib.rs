//! Rule builder, phase actions and command dispatch for Parley.
//!
//! This crate provides:
//! - [`RuleBuilder`] - Compiling declarative rule values into thunks
//! - [`PhaseAction`] - A matcher and body bound to a phase of command handling
//! - [`Dispatcher`] - Running a command through before, main and after actions
//! - [`Interpreter`] - A whole game session behind one facade
//! - [`EngineConfig`] - Session configuration

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod dispatch;
pub mod interpreter;
pub mod phase;
pub mod rule;

pub use config::EngineConfig;
pub use dispatch::{ActionRegistry, DispatchOutcome, DispatchScope, Dispatcher};
pub use interpreter::{Interpreter, LOCATION};
pub use phase::{Phase, PhaseAction, PhaseActionBuilder, best_match};
pub use rule::{RULE_STATE, RuleBuilder};
