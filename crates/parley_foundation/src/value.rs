//! Dynamic value type shared by entity property bags and scripts.

use std::fmt;
use std::sync::Arc;

use crate::env::Environment;
use crate::error::Result;

/// Dynamic value type.
///
/// Values are immutable and cheaply cloneable. Lists and maps are persistent
/// collections, so "mutating" one produces a new value that shares structure
/// with the original. Entities are the one exception: an [`Value::Obj`] is a
/// reference to a property bag owned by the [`Store`](crate::Store), and
/// writes through it are visible to every holder of the reference.
#[derive(Clone, Default)]
pub enum Value {
    /// The nil value (absence, or a lookup miss in a member path).
    #[default]
    Nil,
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating point.
    Float(f64),
    /// String value.
    String(Arc<str>),
    /// Persistent list.
    List(im::Vector<Value>),
    /// Persistent string-keyed map, iterated in key order.
    Map(im::OrdMap<String, Value>),
    /// Reference to an entity property bag.
    Obj(ObjId),
    /// Callable function.
    Fn(Function),
}

/// Identifier of an entity property bag.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjId(Arc<str>);

impl ObjId {
    /// Creates a new object id.
    #[must_use]
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ObjId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for ObjId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ObjId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ObjId {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

/// Something that can be invoked from a script.
pub trait Callable: Send + Sync {
    /// Function name for diagnostics.
    fn name(&self) -> &str;

    /// Invokes the function with already-evaluated arguments.
    ///
    /// # Errors
    /// Returns an error if the function body fails.
    fn call(&self, env: &mut Environment<'_>, args: Vec<Value>) -> Result<Value>;
}

/// Shared handle to a [`Callable`].
#[derive(Clone)]
pub struct Function(Arc<dyn Callable>);

impl Function {
    /// Wraps a callable.
    #[must_use]
    pub fn new(callable: impl Callable + 'static) -> Self {
        Self(Arc::new(callable))
    }

    /// Function name for diagnostics.
    #[must_use]
    pub fn name(&self) -> &str {
        self.0.name()
    }

    /// Invokes the function, enforcing the environment's call-depth limit.
    ///
    /// # Errors
    /// Returns an error if the call depth is exceeded or the body fails.
    pub fn call(&self, env: &mut Environment<'_>, args: Vec<Value>) -> Result<Value> {
        env.enter_call()?;
        let result = self.0.call(env, args);
        env.exit_call();
        result
    }

    /// Returns true if both handles point at the same function.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.name())
    }
}

/// Native function implemented in Rust.
#[derive(Clone, Copy)]
pub struct NativeFn {
    /// Function name for debugging.
    pub name: &'static str,
    /// Function pointer.
    pub func: fn(&mut Environment<'_>, &[Value]) -> Result<Value>,
}

impl Callable for NativeFn {
    fn name(&self) -> &str {
        self.name
    }

    fn call(&self, env: &mut Environment<'_>, args: Vec<Value>) -> Result<Value> {
        (self.func)(env, &args)
    }
}

impl Value {
    /// Returns a human-readable type name.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Obj(_) => "object",
            Self::Fn(_) => "function",
        }
    }

    /// Builds a map value from key-value pairs.
    #[must_use]
    pub fn map<K: Into<String>, V: Into<Value>>(entries: impl IntoIterator<Item = (K, V)>) -> Self {
        Self::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Builds a list value.
    #[must_use]
    pub fn list<V: Into<Value>>(items: impl IntoIterator<Item = V>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Returns true if this value is nil.
    #[must_use]
    pub const fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    /// Returns true if this value is truthy.
    ///
    /// `nil`, `false`, zero, NaN and the empty string are falsy.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Nil | Self::Bool(false) | Self::Int(0) => false,
            Self::Float(n) => *n != 0.0 && !n.is_nan(),
            Self::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// Attempts to extract a boolean value.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Attempts to extract an integer value.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to extract a number as f64 (converts int to float).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Int(n) => Some(*n as f64),
            Self::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to extract a string reference.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Attempts to extract a list reference.
    #[must_use]
    pub const fn as_list(&self) -> Option<&im::Vector<Value>> {
        match self {
            Self::List(v) => Some(v),
            _ => None,
        }
    }

    /// Attempts to extract a map reference.
    #[must_use]
    pub const fn as_map(&self) -> Option<&im::OrdMap<String, Value>> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Attempts to extract an object reference.
    #[must_use]
    pub const fn as_obj(&self) -> Option<&ObjId> {
        match self {
            Self::Obj(id) => Some(id),
            _ => None,
        }
    }

    /// Attempts to extract a function.
    #[must_use]
    pub const fn as_fn(&self) -> Option<&Function> {
        match self {
            Self::Fn(f) => Some(f),
            _ => None,
        }
    }

    /// Returns the key used when this value indexes a map or object.
    #[must_use]
    pub fn to_key(&self) -> String {
        match self {
            Self::String(s) => s.to_string(),
            other => other.to_string(),
        }
    }
}

impl PartialEq for Value {
    #[allow(clippy::cast_precision_loss)]
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Nil, Self::Nil) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Int(a), Self::Float(b)) | (Self::Float(b), Self::Int(a)) => (*a as f64) == *b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Obj(a), Self::Obj(b)) => a == b,
            (Self::Obj(id), Self::String(s)) | (Self::String(s), Self::Obj(id)) => {
                id.as_str() == &**s
            }
            (Self::Fn(a), Self::Fn(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => write!(f, "nil"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n:?}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::List(v) => f.debug_list().entries(v.iter()).finish(),
            Self::Map(m) => f.debug_map().entries(m.iter()).finish(),
            Self::Obj(id) => write!(f, "{id:?}"),
            Self::Fn(func) => write!(f, "{func:?}"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => write!(f, "nil"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
            Self::List(v) => {
                write!(f, "[")?;
                for (i, item) in v.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Map(m) => {
                write!(f, "{{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            Self::Obj(id) => write!(f, "{id}"),
            Self::Fn(func) => write!(f, "{func:?}"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Self::Int(i64::try_from(n).unwrap_or(i64::MAX))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s.into())
    }
}

impl From<ObjId> for Value {
    fn from(id: ObjId) -> Self {
        Self::Obj(id)
    }
}

impl From<Function> for Value {
    fn from(f: Function) -> Self {
        Self::Fn(f)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Self::list(v)
    }
}

// =============================================================================
// Resolved
// =============================================================================

/// The outcome of resolving a compiled expression.
///
/// A `Resolved` is either empty ("unresolved", e.g. an action whose matcher
/// did not accept the command) or carries a value. Wrapping is idempotent:
/// [`Resolved::wrap`] accepts a `Value` or an existing `Resolved` and never
/// boxes twice.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Resolved {
    value: Value,
    resolved: bool,
}

impl Resolved {
    /// Creates a resolved result holding `value`.
    #[must_use]
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            resolved: true,
        }
    }

    /// The empty result.
    #[must_use]
    pub fn unresolved() -> Self {
        Self::default()
    }

    /// Wraps a value, or returns an existing `Resolved` unchanged.
    #[must_use]
    pub fn wrap(value: impl Into<Resolved>) -> Self {
        value.into()
    }

    /// Returns the carried value (nil when unresolved).
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Consumes the result and returns its value.
    #[must_use]
    pub fn into_value(self) -> Value {
        self.value
    }

    /// Returns true if this result carries a value.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Returns true if resolved with a truthy value.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        self.resolved && self.value.is_truthy()
    }

    /// Returns true if the result counts as having handled a command.
    ///
    /// Anything resolved counts, except an explicit `false`.
    #[must_use]
    pub fn is_handled(&self) -> bool {
        self.resolved && !matches!(self.value, Value::Bool(false))
    }
}

impl From<Value> for Resolved {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}
