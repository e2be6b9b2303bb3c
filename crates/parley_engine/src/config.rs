//! Configuration for the interpreter.

use parley_foundation::env::DEFAULT_MAX_CALL_DEPTH;

/// Configuration for an [`Interpreter`](crate::Interpreter).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Seed for the store's random number generator. The same seed and the
    /// same inputs replay the same game.
    pub seed: u64,

    /// Maximum depth of nested script function calls.
    pub max_call_depth: usize,

    /// Log every search result at debug level.
    pub trace_search: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            trace_search: false,
        }
    }
}

impl EngineConfig {
    /// Creates a configuration for development with search tracing on.
    #[must_use]
    pub fn development() -> Self {
        Self {
            trace_search: true,
            ..Self::default()
        }
    }

    /// Creates a configuration for tests: fixed seed, shallow call limit.
    #[must_use]
    pub fn testing() -> Self {
        Self {
            seed: 42,
            max_call_depth: 16,
            trace_search: false,
        }
    }

    /// Builder method to set the RNG seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Builder method to set the call depth limit.
    #[must_use]
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    /// Builder method to enable/disable search tracing.
    #[must_use]
    pub fn with_trace_search(mut self, trace: bool) -> Self {
        self.trace_search = trace;
        self
    }
}
