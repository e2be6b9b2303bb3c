//! Error types for Parley.
//!
//! Uses `thiserror` for ergonomic error definition. Errors raised while
//! resolving compiled content are wrapped at each boundary (thunk or phase
//! action) so that the final error reads as a chain from the outermost
//! declaration down to the failing expression.

use std::fmt;

use thiserror::Error;

/// Result alias used throughout Parley.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for Parley operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Attaches a declared source path, keeping any existing context.
    #[must_use]
    pub fn at_path(mut self, path: impl Into<String>) -> Self {
        let context = self.context.take().unwrap_or_default();
        self.context = Some(context.with_source(path));
        self
    }

    /// Creates an undefined symbol error.
    #[must_use]
    pub fn undefined_symbol(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::UndefinedSymbol(name.into()))
    }

    /// Creates an undefined function error.
    #[must_use]
    pub fn undefined_function(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::UndefinedFunction(name.into()))
    }

    /// Creates a type mismatch error.
    #[must_use]
    pub fn type_mismatch(expected: &'static str, actual: &'static str) -> Self {
        Self::new(ErrorKind::TypeMismatch { expected, actual })
    }

    /// Creates an arity mismatch error.
    #[must_use]
    pub fn arity_mismatch(
        name: impl Into<String>,
        expected: impl Into<String>,
        actual: usize,
    ) -> Self {
        Self::new(ErrorKind::ArityMismatch {
            name: name.into(),
            expected: expected.into(),
            actual,
        })
    }

    /// Creates an invalid match expression error.
    #[must_use]
    pub fn invalid_match(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidMatchExpression(message.into()))
    }

    /// Creates an invalid rule error.
    #[must_use]
    pub fn invalid_rule(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidRule(message.into()))
    }

    /// Creates a semantic limit exceeded error.
    #[must_use]
    pub fn limit_exceeded(limit: SemanticLimit) -> Self {
        Self::new(ErrorKind::LimitExceeded(limit))
    }

    /// Wraps this error as the cause of a failed expression evaluation.
    #[must_use]
    pub fn in_expression(self, expression: impl Into<String>) -> Self {
        Self::new(ErrorKind::Evaluation {
            expression: expression.into(),
            cause: Box::new(self),
        })
    }

    /// Wraps this error as the cause of a failed phase action.
    #[must_use]
    pub fn in_action(self, phase: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(ErrorKind::Action {
            phase: phase.into(),
            path: path.into(),
            cause: Box::new(self),
        })
    }

    /// Returns the error that started the chain.
    #[must_use]
    pub fn root_cause(&self) -> &Error {
        let mut current = self;
        while let Some(cause) = current.cause() {
            current = cause;
        }
        current
    }

    /// Returns the directly wrapped error, if this is a chaining error.
    #[must_use]
    pub fn cause(&self) -> Option<&Error> {
        match &self.kind {
            ErrorKind::Evaluation { cause, .. } | ErrorKind::Action { cause, .. } => Some(cause),
            _ => None,
        }
    }

    /// Returns true if this error was raised while compiling content.
    #[must_use]
    pub fn is_compile_error(&self) -> bool {
        matches!(
            self.root_cause().kind,
            ErrorKind::ParseError { .. }
                | ErrorKind::MissingVerb
                | ErrorKind::UnknownVerb(_)
                | ErrorKind::InvalidMatchExpression(_)
                | ErrorKind::DuplicateRuleComponent { .. }
                | ErrorKind::UnknownRuleComponent(_)
                | ErrorKind::InvalidRule(_)
                | ErrorKind::MisplacedMatch
        )
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// Syntax error in expression source.
    #[error("parse error at {line}:{column}: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Line number (1-indexed).
        line: u32,
        /// Column number (1-indexed).
        column: u32,
        /// The source line where the error occurred.
        context: String,
    },

    /// A match expression or match builder has no verb.
    #[error("match expression has no verb")]
    MissingVerb,

    /// A match expression names a verb that is not defined.
    #[error("unknown verb: {0}")]
    UnknownVerb(String),

    /// A match expression has an unsupported shape.
    #[error("invalid match expression: {0}")]
    InvalidMatchExpression(String),

    /// The `=>` operator appeared outside an action definition.
    #[error("the match operator `=>` is only valid at the top of an action")]
    MisplacedMatch,

    /// A rule declares two components of the same type.
    #[error("duplicate {component} component in rule (already has {existing})")]
    DuplicateRuleComponent {
        /// Component type (condition, action, otherwise).
        component: &'static str,
        /// The key already occupying that slot.
        existing: String,
    },

    /// A rule object contains a key that is not a rule component.
    #[error("unknown rule component: {0}")]
    UnknownRuleComponent(String),

    /// A rule value has a shape that cannot be compiled.
    #[error("invalid rule: {0}")]
    InvalidRule(String),

    /// Symbol was not defined in any enclosing scope.
    #[error("undefined symbol: {0}")]
    UndefinedSymbol(String),

    /// A named function could not be resolved.
    #[error("undefined function: {0}")]
    UndefinedFunction(String),

    /// Attempted to call something that is not a function.
    #[error("not callable: {0}")]
    NotCallable(String),

    /// Type mismatch during evaluation.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// The expected type.
        expected: &'static str,
        /// The actual type encountered.
        actual: &'static str,
    },

    /// Wrong number of arguments to a function.
    #[error("arity mismatch in {name}: expected {expected}, got {actual}")]
    ArityMismatch {
        /// Function name.
        name: String,
        /// Description of expected arity.
        expected: String,
        /// Actual number of arguments.
        actual: usize,
    },

    /// Assignment to something that is not a variable or property.
    #[error("invalid assignment target: {0}")]
    InvalidAssignment(String),

    /// Semantic limit exceeded.
    #[error("limit exceeded: {0}")]
    LimitExceeded(SemanticLimit),

    /// An expression failed while being resolved.
    #[error("{cause}\n  while evaluating `{expression}`")]
    Evaluation {
        /// Source text of the failing expression.
        expression: String,
        /// The underlying error.
        cause: Box<Error>,
    },

    /// A phase action failed while being performed.
    #[error("{cause}\n  in {phase} action at {path}")]
    Action {
        /// Phase name (before, main, after).
        phase: String,
        /// Declared source path of the action.
        path: String,
        /// The underlying error.
        cause: Box<Error>,
    },
}

/// Semantic limits that can be exceeded at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SemanticLimit {
    /// Nested function calls exceeded the configured depth.
    MaxCallDepth {
        /// The configured limit.
        limit: usize,
    },
}

impl fmt::Display for SemanticLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MaxCallDepth { limit } => write!(f, "max call depth ({limit}) exceeded"),
        }
    }
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Declared source path of the content (e.g. `apple/actions/0`).
    pub source: Option<String>,
    /// Source text of the expression being compiled.
    pub expression: Option<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the source path.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Sets the expression text.
    #[must_use]
    pub fn with_expression(mut self, expression: impl Into<String>) -> Self {
        self.expression = Some(expression.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(source) = &self.source {
            write!(f, "at {source}")?;
        }
        if let Some(expression) = &self.expression {
            write!(f, " in `{expression}`")?;
        }
        Ok(())
    }
}
