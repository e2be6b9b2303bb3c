//! Abstract syntax tree for the Parley expression language.

use parley_foundation::Value;

use crate::span::Span;

/// An expression node.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Literal like `42`, `'hello'`, `true` or `nil`
    Literal(Value, Span),
    /// Identifier like `location` or `$item`
    Identifier(String, Span),
    /// Array literal like `[1, 2]`
    Array(Vec<Expr>, Span),
    /// Object literal like `{ north: 'hall' }`
    Object(Vec<(String, Expr)>, Span),
    /// Prefix operator like `!lit`
    Unary {
        /// The operator.
        op: UnaryOp,
        /// The operand.
        operand: Box<Expr>,
        /// Source span.
        span: Span,
    },
    /// Arithmetic, comparison or equality operator
    Binary {
        /// The operator.
        op: BinaryOp,
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
        /// Source span.
        span: Span,
    },
    /// Short-circuiting `&&` or `||`
    Logical {
        /// The operator.
        op: LogicalOp,
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
        /// Source span.
        span: Span,
    },
    /// `test ? consequent : alternate`
    Conditional {
        /// The condition.
        test: Box<Expr>,
        /// Value when truthy.
        consequent: Box<Expr>,
        /// Value when falsy.
        alternate: Box<Expr>,
        /// Source span.
        span: Span,
    },
    /// `target = value`, `target += value` or `target -= value`
    Assign {
        /// The operator.
        op: AssignOp,
        /// Identifier or member expression.
        target: Box<Expr>,
        /// Assigned value.
        value: Box<Expr>,
        /// Source span.
        span: Span,
    },
    /// `object.name` or `object[expr]`
    Member {
        /// The container.
        object: Box<Expr>,
        /// The key.
        property: Property,
        /// Source span.
        span: Span,
    },
    /// `callee(args...)`
    Call {
        /// The function.
        callee: Box<Expr>,
        /// Positional arguments.
        args: Vec<Expr>,
        /// Source span.
        span: Span,
    },
    /// `a; b; c`
    Sequence(Vec<Expr>, Span),
    /// `pattern => body`
    Match {
        /// Match expression (a verb call pattern).
        pattern: Box<Expr>,
        /// Action body.
        body: Box<Expr>,
        /// Source span.
        span: Span,
    },
}

/// Member key.
#[derive(Clone, Debug, PartialEq)]
pub enum Property {
    /// `.name`
    Named(String),
    /// `[expr]`
    Computed(Box<Expr>),
}

/// Prefix operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    /// `!`
    Not,
    /// `-`
    Neg,
    /// `+`
    Plus,
}

/// Binary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Rem,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `===`
    StrictEq,
    /// `!==`
    StrictNe,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

/// Short-circuit operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogicalOp {
    /// `&&`
    And,
    /// `||`
    Or,
}

/// Assignment operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssignOp {
    /// `=`
    Set,
    /// `+=`
    Add,
    /// `-=`
    Sub,
}

impl Expr {
    /// Returns the source span of this node.
    #[must_use]
    pub const fn span(&self) -> Span {
        match self {
            Self::Literal(_, s)
            | Self::Identifier(_, s)
            | Self::Array(_, s)
            | Self::Object(_, s)
            | Self::Sequence(_, s)
            | Self::Unary { span: s, .. }
            | Self::Binary { span: s, .. }
            | Self::Logical { span: s, .. }
            | Self::Conditional { span: s, .. }
            | Self::Assign { span: s, .. }
            | Self::Member { span: s, .. }
            | Self::Call { span: s, .. }
            | Self::Match { span: s, .. } => *s,
        }
    }

    /// Returns the identifier name if this is an identifier.
    #[must_use]
    pub fn as_identifier(&self) -> Option<&str> {
        match self {
            Self::Identifier(name, _) => Some(name),
            _ => None,
        }
    }

    /// Returns true if a `=>` appears anywhere in this tree.
    #[must_use]
    pub fn contains_match(&self) -> bool {
        match self {
            Self::Match { .. } => true,
            Self::Literal(..) | Self::Identifier(..) => false,
            Self::Array(items, _) | Self::Sequence(items, _) => {
                items.iter().any(Self::contains_match)
            }
            Self::Object(entries, _) => entries.iter().any(|(_, e)| e.contains_match()),
            Self::Unary { operand, .. } => operand.contains_match(),
            Self::Binary { left, right, .. } | Self::Logical { left, right, .. } => {
                left.contains_match() || right.contains_match()
            }
            Self::Conditional {
                test,
                consequent,
                alternate,
                ..
            } => test.contains_match() || consequent.contains_match() || alternate.contains_match(),
            Self::Assign { target, value, .. } => target.contains_match() || value.contains_match(),
            Self::Member {
                object, property, ..
            } => {
                object.contains_match()
                    || matches!(property, Property::Computed(key) if key.contains_match())
            }
            Self::Call { callee, args, .. } => {
                callee.contains_match() || args.iter().any(Self::contains_match)
            }
        }
    }
}
