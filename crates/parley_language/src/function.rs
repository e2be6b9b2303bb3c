//! Functions written in the expression language.

use parley_foundation::{Bindings, Callable, Environment, Function, Result, Value};

use crate::thunk::{Thunk, compile};

/// A named function whose body is a compiled thunk.
///
/// The body runs in a child of the *caller's* scope with the parameters
/// bound, so it sees whatever `this` and captures the caller sees.
#[derive(Clone, Debug)]
pub struct ScriptFunction {
    name: String,
    params: Vec<String>,
    body: Thunk,
}

impl ScriptFunction {
    /// Creates a function from an already compiled body.
    pub fn new(name: impl Into<String>, params: Vec<String>, body: Thunk) -> Self {
        Self {
            name: name.into(),
            params,
            body,
        }
    }

    /// Compiles `source` as the body of a function.
    ///
    /// # Errors
    /// Returns a compile error for malformed source; the error carries the
    /// function name as its source path.
    pub fn compile<P>(name: &str, params: P, source: &str) -> Result<Self>
    where
        P: IntoIterator,
        P::Item: Into<String>,
    {
        let body = compile(source).map_err(|e| e.at_path(name))?;
        Ok(Self::new(
            name,
            params.into_iter().map(Into::into).collect(),
            body,
        ))
    }

    /// Declared parameter names.
    #[must_use]
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Wraps the function as a callable value.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Fn(Function::new(self))
    }
}

impl Callable for ScriptFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn call(&self, env: &mut Environment<'_>, args: Vec<Value>) -> Result<Value> {
        let mut scope = env.new_child(bind_params(&self.params, args));
        self.body.value(&mut scope)
    }
}

/// Binds positional arguments to parameter names.
///
/// Missing arguments are nil; extras are only reachable through the
/// `arguments` list, which is always bound.
#[must_use]
pub fn bind_params(params: &[String], args: Vec<Value>) -> Bindings {
    let mut bindings: Bindings = params
        .iter()
        .enumerate()
        .map(|(i, name)| (name.clone(), args.get(i).cloned().unwrap_or_default()))
        .collect();
    bindings.insert("arguments".to_string(), Value::list(args));
    bindings
}
