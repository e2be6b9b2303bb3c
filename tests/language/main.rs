//! Integration tests for Layer 1: Language
//!
//! Tests for the expression language: evaluation, functions, builtins, and
//! error reporting.

mod expressions;
mod functions;
