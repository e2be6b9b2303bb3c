//! Thunk compiler and evaluator.
//!
//! An [`Expr`] tree is compiled once into a tree of [`Thunk`]s: closures that
//! resolve against whatever [`Environment`] they are handed at run time.
//! Thunks are immutable and cheap to clone, so a compiled rule can be stored
//! on an entity and resolved every turn.
//!
//! Only thunks carrying source text wrap errors (see
//! [`Thunk::with_expression`]). [`compile`] attaches the whole source to the
//! root thunk, so an execution error reads as the deepest message followed by
//! the expression that was being evaluated.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use parley_foundation::{Environment, Error, ErrorKind, Resolved, Result, Value};
use tracing::trace;

use crate::ast::{AssignOp, BinaryOp, Expr, LogicalOp, Property, UnaryOp};
use crate::parser::parse;

/// Signature of a thunk body.
pub type ResolveFn = dyn Fn(&mut Environment<'_>) -> Result<Resolved> + Send + Sync;

/// What produced a thunk; callers special-case some kinds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ThunkKind {
    /// An ordinary compiled expression.
    #[default]
    Normal,
    /// A thunk synthesized by the runtime rather than parsed from source.
    Builtin,
    /// A bare property read (identifier or member access). When such a thunk
    /// yields a function, rule evaluation calls it.
    Property,
}

/// A compiled, not-yet-executed expression.
#[derive(Clone)]
pub struct Thunk {
    resolve: Arc<ResolveFn>,
    expression: Option<Arc<str>>,
    kind: ThunkKind,
}

impl Thunk {
    /// Creates a thunk from a resolve function.
    pub fn new<F>(kind: ThunkKind, resolve: F) -> Self
    where
        F: Fn(&mut Environment<'_>) -> Result<Resolved> + Send + Sync + 'static,
    {
        Self {
            resolve: Arc::new(resolve),
            expression: None,
            kind,
        }
    }

    /// A thunk that always resolves to `value`.
    pub fn constant(value: impl Into<Value>) -> Self {
        let value = value.into();
        Self::new(ThunkKind::Normal, move |_| Ok(Resolved::new(value.clone())))
    }

    /// Attaches source text; errors raised while resolving are wrapped with it.
    #[must_use]
    pub fn with_expression(mut self, expression: impl Into<Arc<str>>) -> Self {
        self.expression = Some(expression.into());
        self
    }

    /// Returns the attached source text.
    #[must_use]
    pub fn expression(&self) -> Option<&str> {
        self.expression.as_deref()
    }

    /// Returns the thunk kind.
    #[must_use]
    pub fn kind(&self) -> ThunkKind {
        self.kind
    }

    /// Resolves the thunk against `env`.
    ///
    /// # Errors
    /// Returns any execution error, wrapped with this thunk's source text if
    /// it has any.
    pub fn resolve(&self, env: &mut Environment<'_>) -> Result<Resolved> {
        (self.resolve)(env).map_err(|err| match &self.expression {
            Some(expression) => err.in_expression(expression.as_ref()),
            None => err,
        })
    }

    /// Resolves the thunk and returns its value (nil when unresolved).
    ///
    /// # Errors
    /// Returns any execution error.
    pub fn value(&self, env: &mut Environment<'_>) -> Result<Value> {
        self.resolve(env).map(Resolved::into_value)
    }
}

impl fmt::Debug for Thunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Thunk")
            .field("kind", &self.kind)
            .field("expression", &self.expression)
            .finish_non_exhaustive()
    }
}

/// Parses and compiles `source`, attaching the trimmed source to the result.
///
/// # Errors
/// Returns a `ParseError`, or `MisplacedMatch` if the source contains `=>`.
pub fn compile(source: &str) -> Result<Thunk> {
    let expr = parse(source)?;
    let thunk = Compiler::compile(&expr)?;
    trace!(expression = source, "compiled expression");
    Ok(thunk.with_expression(source.trim()))
}

/// Compiles a sub-expression of `source`, attaching the text it spans.
///
/// # Errors
/// Returns `MisplacedMatch` if the expression contains `=>`.
pub fn compile_fragment(source: &str, expr: &Expr) -> Result<Thunk> {
    let thunk = Compiler::compile(expr)?;
    Ok(thunk.with_expression(expr.span().text(source).trim()))
}

/// Compiles expression trees into thunks.
pub struct Compiler;

impl Compiler {
    /// Compiles an expression tree.
    ///
    /// # Errors
    /// Returns `MisplacedMatch` for a `=>` node; actions split the match
    /// operator off before compiling their body.
    pub fn compile(expr: &Expr) -> Result<Thunk> {
        match expr {
            Expr::Literal(value, _) => Ok(Thunk::constant(value.clone())),
            Expr::Identifier(name, _) => {
                let name = name.clone();
                Ok(Thunk::new(ThunkKind::Property, move |env| {
                    env.get(&name).map(Resolved::new)
                }))
            }
            Expr::Array(items, _) => {
                let items = compile_all(items)?;
                Ok(Thunk::new(ThunkKind::Normal, move |env| {
                    let values = items
                        .iter()
                        .map(|item| item.value(env))
                        .collect::<Result<im::Vector<_>>>()?;
                    Ok(Resolved::new(Value::List(values)))
                }))
            }
            Expr::Object(entries, _) => {
                let entries = entries
                    .iter()
                    .map(|(key, value)| Ok((key.clone(), Self::compile(value)?)))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Thunk::new(ThunkKind::Normal, move |env| {
                    let mut map = im::OrdMap::new();
                    for (key, value) in &entries {
                        map.insert(key.clone(), value.value(env)?);
                    }
                    Ok(Resolved::new(Value::Map(map)))
                }))
            }
            Expr::Unary { op, operand, .. } => {
                let op = *op;
                let operand = Self::compile(operand)?;
                Ok(Thunk::new(ThunkKind::Normal, move |env| {
                    let value = operand.value(env)?;
                    apply_unary(op, &value).map(Resolved::new)
                }))
            }
            Expr::Binary {
                op, left, right, ..
            } => {
                let op = *op;
                let left = Self::compile(left)?;
                let right = Self::compile(right)?;
                Ok(Thunk::new(ThunkKind::Normal, move |env| {
                    let l = left.value(env)?;
                    let r = right.value(env)?;
                    apply_binary(op, &l, &r).map(Resolved::new)
                }))
            }
            Expr::Logical {
                op, left, right, ..
            } => {
                let op = *op;
                let left = Self::compile(left)?;
                let right = Self::compile(right)?;
                Ok(Thunk::new(ThunkKind::Normal, move |env| {
                    let l = left.resolve(env)?;
                    let short_circuit = match op {
                        LogicalOp::And => !l.is_truthy(),
                        LogicalOp::Or => l.is_truthy(),
                    };
                    if short_circuit { Ok(l) } else { right.resolve(env) }
                }))
            }
            Expr::Conditional {
                test,
                consequent,
                alternate,
                ..
            } => {
                let test = Self::compile(test)?;
                let consequent = Self::compile(consequent)?;
                let alternate = Self::compile(alternate)?;
                Ok(Thunk::new(ThunkKind::Normal, move |env| {
                    if test.resolve(env)?.is_truthy() {
                        consequent.resolve(env)
                    } else {
                        alternate.resolve(env)
                    }
                }))
            }
            Expr::Assign {
                op, target, value, ..
            } => compile_assignment(*op, target, value),
            Expr::Member {
                object, property, ..
            } => {
                let object = Self::compile(object)?;
                let key = compile_key(property)?;
                Ok(Thunk::new(ThunkKind::Property, move |env| {
                    let target = object.value(env)?;
                    if target.is_nil() {
                        return Ok(Resolved::new(Value::Nil));
                    }
                    let key = key.resolve(env)?;
                    Ok(Resolved::new(env.member(&target, &key).unwrap_or_default()))
                }))
            }
            Expr::Call { callee, args, .. } => compile_call(callee, args),
            Expr::Sequence(items, _) => {
                let items = compile_all(items)?;
                Ok(Thunk::new(ThunkKind::Normal, move |env| {
                    let mut last = Resolved::unresolved();
                    for item in &items {
                        last = item.resolve(env)?;
                    }
                    Ok(last)
                }))
            }
            Expr::Match { .. } => Err(Error::new(ErrorKind::MisplacedMatch)),
        }
    }
}

fn compile_all(exprs: &[Expr]) -> Result<Vec<Thunk>> {
    exprs.iter().map(Compiler::compile).collect()
}

/// A member key, fixed or computed at run time.
#[derive(Clone)]
enum Key {
    Named(String),
    Computed(Thunk),
}

impl Key {
    fn resolve(&self, env: &mut Environment<'_>) -> Result<String> {
        match self {
            Self::Named(name) => Ok(name.clone()),
            Self::Computed(thunk) => Ok(thunk.value(env)?.to_key()),
        }
    }
}

fn compile_key(property: &Property) -> Result<Key> {
    Ok(match property {
        Property::Named(name) => Key::Named(name.clone()),
        Property::Computed(expr) => Key::Computed(Compiler::compile(expr)?),
    })
}

/// Where an assignment writes.
enum Place {
    /// `name` or `name.a[b]...`: written through the scope chain.
    Path { root: String, keys: Vec<Key> },
    /// `expr.a[b]...` where `expr` is not a name: must yield an entity.
    Object { object: Thunk, keys: Vec<Key> },
}

fn compile_place(target: &Expr) -> Result<Place> {
    let mut keys = Vec::new();
    let mut base = target;
    while let Expr::Member {
        object, property, ..
    } = base
    {
        keys.push(compile_key(property)?);
        base = object;
    }
    keys.reverse();
    Ok(match base {
        Expr::Identifier(root, _) => Place::Path {
            root: root.clone(),
            keys,
        },
        other => Place::Object {
            object: Compiler::compile(other)?,
            keys,
        },
    })
}

fn compile_assignment(op: AssignOp, target: &Expr, value: &Expr) -> Result<Thunk> {
    let place = compile_place(target)?;
    let value = Compiler::compile(value)?;

    Ok(Thunk::new(ThunkKind::Normal, move |env| {
        let rhs = value.value(env)?;
        let assigned = match &place {
            Place::Path { root, keys } => {
                let keys = resolve_keys(keys, env)?;
                let base = env.lookup_name(root).unwrap_or_default();
                let assigned = combine(op, || read_path(env, base, &keys), rhs)?;
                env.set_keys(root, &keys, assigned.clone())?;
                assigned
            }
            Place::Object { object, keys } => {
                let target = object.value(env)?;
                if !matches!(target, Value::Obj(_)) || keys.is_empty() {
                    return Err(Error::new(ErrorKind::InvalidAssignment(format!(
                        "cannot assign into a {}",
                        target.type_name()
                    ))));
                }
                let keys = resolve_keys(keys, env)?;
                let assigned = combine(op, || read_path(env, target.clone(), &keys), rhs)?;
                env.store_mut().assign(target, &keys, assigned.clone())?;
                assigned
            }
        };
        Ok(Resolved::new(assigned))
    }))
}

/// Computes the value stored by an assignment. Compound operators treat a
/// missing current value as zero.
fn combine(op: AssignOp, current: impl FnOnce() -> Value, rhs: Value) -> Result<Value> {
    let op = match op {
        AssignOp::Set => return Ok(rhs),
        AssignOp::Add => BinaryOp::Add,
        AssignOp::Sub => BinaryOp::Sub,
    };
    let existing = match current() {
        Value::Nil => Value::Int(0),
        value => value,
    };
    apply_binary(op, &existing, &rhs)
}

fn read_path(env: &Environment<'_>, base: Value, keys: &[String]) -> Value {
    keys.iter().fold(base, |value, key| {
        env.member(&value, key).unwrap_or_default()
    })
}

fn resolve_keys(keys: &[Key], env: &mut Environment<'_>) -> Result<Vec<String>> {
    keys.iter().map(|key| key.resolve(env)).collect()
}

fn compile_call(callee: &Expr, args: &[Expr]) -> Result<Thunk> {
    let args = compile_all(args)?;
    let named = callee.as_identifier().map(str::to_string);
    let callee = Compiler::compile(callee)?;

    Ok(Thunk::new(ThunkKind::Normal, move |env| {
        let function = match &named {
            Some(name) => env
                .lookup_name(name)
                .ok_or_else(|| Error::undefined_function(name.as_str()))?,
            None => callee.value(env)?,
        };
        let Value::Fn(function) = function else {
            return Err(Error::new(ErrorKind::NotCallable(format!(
                "{} is a {}",
                named.as_deref().unwrap_or("value"),
                function.type_name()
            ))));
        };
        let values = args
            .iter()
            .map(|arg| arg.value(env))
            .collect::<Result<Vec<_>>>()?;
        function.call(env, values).map(Resolved::new)
    }))
}

/// Applies a prefix operator.
///
/// # Errors
/// Returns a type mismatch if `-` or `+` is applied to a non-number.
pub fn apply_unary(op: UnaryOp, value: &Value) -> Result<Value> {
    match (op, value) {
        (UnaryOp::Not, v) => Ok(Value::Bool(!v.is_truthy())),
        (UnaryOp::Neg, Value::Int(n)) => Ok(Value::Int(n.wrapping_neg())),
        (UnaryOp::Neg, Value::Float(n)) => Ok(Value::Float(-n)),
        (UnaryOp::Plus, v @ (Value::Int(_) | Value::Float(_))) => Ok(v.clone()),
        (_, other) => Err(Error::type_mismatch("number", other.type_name())),
    }
}

/// Applies a binary operator.
///
/// `+` concatenates when either side is a string (or both are lists).
/// Integer arithmetic stays integral unless a division is inexact.
///
/// # Errors
/// Returns a type mismatch for arithmetic on non-numbers or ordering of
/// values that are neither both numbers nor both strings.
pub fn apply_binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value> {
    match op {
        BinaryOp::Add => match (left, right) {
            (Value::String(_), _) | (_, Value::String(_)) => {
                Ok(Value::from(format!("{left}{right}")))
            }
            (Value::List(a), Value::List(b)) => {
                let mut joined = a.clone();
                joined.append(b.clone());
                Ok(Value::List(joined))
            }
            _ => arithmetic(op, left, right),
        },
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
            arithmetic(op, left, right)
        }
        BinaryOp::Eq => Ok(Value::Bool(left == right)),
        BinaryOp::Ne => Ok(Value::Bool(left != right)),
        BinaryOp::StrictEq => Ok(Value::Bool(strict_eq(left, right))),
        BinaryOp::StrictNe => Ok(Value::Bool(!strict_eq(left, right))),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = compare(left, right)?;
            Ok(Value::Bool(ordering.is_some_and(|o| match op {
                BinaryOp::Lt => o == Ordering::Less,
                BinaryOp::Le => o != Ordering::Greater,
                BinaryOp::Gt => o == Ordering::Greater,
                _ => o != Ordering::Less,
            })))
        }
    }
}

fn strict_eq(left: &Value, right: &Value) -> bool {
    left.type_name() == right.type_name() && left == right
}

/// Orders two numbers or two strings; `None` when a NaN is involved.
fn compare(left: &Value, right: &Value) -> Result<Option<Ordering>> {
    if let (Value::String(a), Value::String(b)) = (left, right) {
        return Ok(Some(a.cmp(b)));
    }
    match (left.as_number(), right.as_number()) {
        (Some(a), Some(b)) => Ok(a.partial_cmp(&b)),
        (None, _) => Err(Error::type_mismatch("number or string", left.type_name())),
        (_, None) => Err(Error::type_mismatch("number or string", right.type_name())),
    }
}

#[allow(clippy::cast_precision_loss)]
fn arithmetic(op: BinaryOp, left: &Value, right: &Value) -> Result<Value> {
    if let (Value::Int(a), Value::Int(b)) = (left, right) {
        let (a, b) = (*a, *b);
        let exact = match op {
            BinaryOp::Add => Some(a.wrapping_add(b)),
            BinaryOp::Sub => Some(a.wrapping_sub(b)),
            BinaryOp::Mul => Some(a.wrapping_mul(b)),
            BinaryOp::Div if a.checked_rem(b) == Some(0) => a.checked_div(b),
            BinaryOp::Rem => a.checked_rem(b),
            _ => None,
        };
        if let Some(n) = exact {
            return Ok(Value::Int(n));
        }
    }
    let a = left
        .as_number()
        .ok_or_else(|| Error::type_mismatch("number", left.type_name()))?;
    let b = right
        .as_number()
        .ok_or_else(|| Error::type_mismatch("number", right.type_name()))?;
    Ok(Value::Float(match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        _ => a % b,
    }))
}
