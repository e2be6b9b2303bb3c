//! Native functions available to every script.

use parley_foundation::{Environment, Error, Function, NativeFn, Result, Value};

const BUILTINS: &[NativeFn] = &[
    NativeFn {
        name: "write",
        func: write,
    },
    NativeFn {
        name: "str",
        func: to_str,
    },
    NativeFn {
        name: "random",
        func: random,
    },
    NativeFn {
        name: "pick",
        func: pick,
    },
    NativeFn {
        name: "length",
        func: length,
    },
    NativeFn {
        name: "includes",
        func: includes,
    },
    NativeFn {
        name: "keys",
        func: keys,
    },
    NativeFn {
        name: "has",
        func: has,
    },
    NativeFn {
        name: "min",
        func: min,
    },
    NativeFn {
        name: "max",
        func: max,
    },
    NativeFn {
        name: "floor",
        func: floor,
    },
];

/// Defines every builtin in the environment's current scope.
pub fn install_builtins(env: &mut Environment<'_>) {
    for native in BUILTINS {
        env.def(native.name, Value::Fn(Function::new(*native)));
    }
}

fn arity(name: &str, args: &[Value], min: usize, max: usize) -> Result<()> {
    if (min..=max).contains(&args.len()) {
        Ok(())
    } else if min == max {
        Err(Error::arity_mismatch(name, min.to_string(), args.len()))
    } else {
        Err(Error::arity_mismatch(name, format!("{min} to {max}"), args.len()))
    }
}

fn concat(args: &[Value]) -> String {
    args.iter().map(ToString::to_string).collect()
}

/// `write(...)`: emits the concatenated arguments and returns true.
fn write(env: &mut Environment<'_>, args: &[Value]) -> Result<Value> {
    env.write(concat(args));
    Ok(Value::Bool(true))
}

fn to_str(_env: &mut Environment<'_>, args: &[Value]) -> Result<Value> {
    Ok(Value::from(concat(args)))
}

/// `random()` is a float in `[0, 1)`; `random(n)` an int in `0..n`;
/// `random(lo, hi)` an int in `lo..=hi`.
fn random(env: &mut Environment<'_>, args: &[Value]) -> Result<Value> {
    arity("random", args, 0, 2)?;
    let bound = |v: &Value| {
        v.as_int()
            .ok_or_else(|| Error::type_mismatch("int", v.type_name()))
    };
    match args {
        [] => Ok(Value::Float(env.random_unit())),
        [n] => {
            let n = usize::try_from(bound(n)?).unwrap_or(0);
            Ok(Value::from(env.random_index(n)))
        }
        [lo, hi, ..] => {
            let (lo, hi) = (bound(lo)?, bound(hi)?);
            let span = usize::try_from(hi.saturating_sub(lo).saturating_add(1)).unwrap_or(0);
            let offset = i64::try_from(env.random_index(span)).unwrap_or(0);
            Ok(Value::Int(lo.saturating_add(offset)))
        }
    }
}

fn pick(env: &mut Environment<'_>, args: &[Value]) -> Result<Value> {
    arity("pick", args, 1, 1)?;
    match &args[0] {
        Value::List(items) if !items.is_empty() => {
            let index = env.random_index(items.len());
            Ok(items.get(index).cloned().unwrap_or_default())
        }
        Value::List(_) | Value::Nil => Ok(Value::Nil),
        other => Err(Error::type_mismatch("list", other.type_name())),
    }
}

fn length(env: &mut Environment<'_>, args: &[Value]) -> Result<Value> {
    arity("length", args, 1, 1)?;
    let len = match &args[0] {
        Value::Nil => 0,
        Value::List(items) => items.len(),
        Value::Map(map) => map.len(),
        Value::String(s) => s.chars().count(),
        Value::Obj(id) => env.store().object(id).map_or(0, im::OrdMap::len),
        other => return Err(Error::type_mismatch("collection", other.type_name())),
    };
    Ok(Value::from(len))
}

fn includes(env: &mut Environment<'_>, args: &[Value]) -> Result<Value> {
    arity("includes", args, 2, 2)?;
    let needle = &args[1];
    let found = match &args[0] {
        Value::List(items) => items.iter().any(|item| item == needle),
        Value::String(s) => s.contains(needle.to_string().as_str()),
        Value::Map(_) | Value::Obj(_) => env.member(&args[0], &needle.to_key()).is_some(),
        Value::Nil => false,
        other => return Err(Error::type_mismatch("collection", other.type_name())),
    };
    Ok(Value::Bool(found))
}

fn keys(env: &mut Environment<'_>, args: &[Value]) -> Result<Value> {
    arity("keys", args, 1, 1)?;
    let names: Vec<Value> = match &args[0] {
        Value::Map(map) => map.keys().map(|k| Value::from(k.as_str())).collect(),
        Value::Obj(id) => env
            .store()
            .object(id)
            .map(|bag| bag.keys().map(|k| Value::from(k.as_str())).collect())
            .unwrap_or_default(),
        Value::Nil => Vec::new(),
        other => return Err(Error::type_mismatch("map or object", other.type_name())),
    };
    Ok(Value::list(names))
}

fn has(env: &mut Environment<'_>, args: &[Value]) -> Result<Value> {
    arity("has", args, 2, 2)?;
    let present = match &args[0] {
        target @ (Value::Map(_) | Value::Obj(_)) => env.member(target, &args[1].to_key()).is_some(),
        _ => false,
    };
    Ok(Value::Bool(present))
}

/// Picks the extreme number; a single list argument is searched instead.
fn extreme(args: &[Value], pick_left: fn(f64, f64) -> bool) -> Result<Value> {
    let items: Vec<Value> = match args {
        [Value::List(items)] => items.iter().cloned().collect(),
        _ => args.to_vec(),
    };
    let mut best: Option<(f64, Value)> = None;
    for item in items {
        let n = item
            .as_number()
            .ok_or_else(|| Error::type_mismatch("number", item.type_name()))?;
        if best.as_ref().is_none_or(|(b, _)| pick_left(n, *b)) {
            best = Some((n, item));
        }
    }
    Ok(best.map(|(_, v)| v).unwrap_or_default())
}

fn min(_env: &mut Environment<'_>, args: &[Value]) -> Result<Value> {
    extreme(args, |a, b| a < b)
}

fn max(_env: &mut Environment<'_>, args: &[Value]) -> Result<Value> {
    extreme(args, |a, b| a > b)
}

#[allow(clippy::cast_possible_truncation)]
fn floor(_env: &mut Environment<'_>, args: &[Value]) -> Result<Value> {
    arity("floor", args, 1, 1)?;
    match &args[0] {
        Value::Int(n) => Ok(Value::Int(*n)),
        Value::Float(n) => Ok(Value::Int(n.floor() as i64)),
        other => Err(Error::type_mismatch("number", other.type_name())),
    }
}
