//! Integration tests for Layer 0: Foundation
//!
//! Tests for core types: Value, ObjId, Resolved, Error, and the scope store.

mod errors;
mod values;
