//! Integration tests for Layer 2: Parser
//!
//! Tests for command search over verbs and entities, and for matchers
//! compiled from match expressions.

mod matching;
mod search;
