//! Match expression compiler.
//!
//! Match expressions are a restricted form of call syntax:
//!
//! ```text
//! look                      intransitive verb
//! go($dir)                  verb with a captured modifier
//! eat(apple)                transitive verb, literal object
//! stir($pot).with(this)     attribute clause with an indirect object
//! ```
//!
//! Names starting with `$` capture the matched part; `this` stands for the
//! object owning the action.

use parley_foundation::{Error, ErrorKind, Result, Value};
use parley_language::{Expr, Property, parse};

use crate::matcher::{
    AttributeMatchBuilder, MatchBuilder, Matcher, capture_indirect_object, capture_modifier,
    capture_object, match_indirect_object, match_modifier, match_object,
};
use crate::verb::VerbMap;

/// One name in a match expression.
#[derive(Clone, Debug, PartialEq, Eq)]
struct MatchTerm {
    name: String,
    is_capture: bool,
}

impl MatchTerm {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            is_capture: name.starts_with('$'),
        }
    }
}

/// `name(args...)` with an optional `.member(args...)` clause.
#[derive(Clone, Debug, PartialEq, Eq)]
struct CompoundMatch {
    name: MatchTerm,
    args: Vec<MatchTerm>,
    member: Option<Box<CompoundMatch>>,
}

fn term(expr: &Expr) -> Result<MatchTerm> {
    match expr {
        Expr::Identifier(name, _) => Ok(MatchTerm::new(name)),
        Expr::Literal(Value::String(s), _) => Ok(MatchTerm {
            name: s.to_string(),
            is_capture: false,
        }),
        other => Err(Error::invalid_match(format!(
            "expected a name, found {other:?}"
        ))),
    }
}

fn terms(args: &[Expr]) -> Result<Vec<MatchTerm>> {
    args.iter().map(term).collect()
}

/// Splits `head(args)` or `head`.
fn clause(expr: &Expr) -> Result<(MatchTerm, Vec<MatchTerm>)> {
    match expr {
        Expr::Call { callee, args, .. } => Ok((term(callee)?, terms(args)?)),
        other => Ok((term(other)?, Vec::new())),
    }
}

fn analyze(expr: &Expr) -> Result<CompoundMatch> {
    // `verb(obj).attr(ind)` parses as Call(Member(Call(verb, obj), attr), ind).
    let (outer, member_args) = match expr {
        Expr::Call { callee, args, .. } if matches!(**callee, Expr::Member { .. }) => {
            (callee.as_ref(), terms(args)?)
        }
        other => (other, Vec::new()),
    };
    if let Expr::Member {
        object, property, ..
    } = outer
    {
        let Property::Named(attribute) = property else {
            return Err(Error::invalid_match("attribute must be a plain name"));
        };
        let (name, args) = clause(object)?;
        return Ok(CompoundMatch {
            name,
            args,
            member: Some(Box::new(CompoundMatch {
                name: MatchTerm::new(attribute),
                args: member_args,
                member: None,
            })),
        });
    }
    let (name, args) = clause(outer)?;
    Ok(CompoundMatch {
        name,
        args,
        member: None,
    })
}

/// Compiles a parsed match expression against the known verbs.
///
/// # Errors
/// Returns `UnknownVerb` for an undefined verb, `InvalidMatchExpression` for
/// an unsupported shape, or `MissingVerb` if the head is a capture.
pub fn compile_match_expression(expr: &Expr, verbs: &VerbMap) -> Result<Matcher> {
    let compound = analyze(expr)?;
    if compound.name.is_capture {
        return Err(Error::new(ErrorKind::MissingVerb));
    }
    let verb = verbs
        .get(&compound.name.name)
        .ok_or_else(|| Error::new(ErrorKind::UnknownVerb(compound.name.name.clone())))?;

    let mut builder = MatchBuilder::new().verb(verb.clone());
    let mut args = compound.args.iter();
    if verb.is_transitive() {
        if let Some(object) = args.next() {
            builder = builder.object(if object.is_capture {
                capture_object(&object.name)
            } else {
                match_object(object.name.clone())
            });
        }
    }
    for (i, arg) in args.enumerate() {
        let kind = verb.modifiers.get(i).ok_or_else(|| {
            Error::invalid_match(format!(
                "{} takes {} modifier(s)",
                verb.id,
                verb.modifiers.len()
            ))
        })?;
        builder = builder.modifier(if arg.is_capture {
            capture_modifier(kind.clone(), &arg.name)
        } else {
            match_modifier(kind.clone(), arg.name.clone())
        });
    }

    if let Some(member) = compound.member {
        if member.name.is_capture {
            return Err(Error::invalid_match("attribute cannot be a capture"));
        }
        let mut attribute = AttributeMatchBuilder::new().attribute(member.name.name);
        match member.args.as_slice() {
            [] => {}
            [indirect] => {
                attribute = attribute.indirect_object(if indirect.is_capture {
                    capture_indirect_object(&indirect.name)
                } else {
                    match_indirect_object(indirect.name.clone())
                });
            }
            _ => return Err(Error::invalid_match("attribute takes one indirect object")),
        }
        builder = builder.attribute(attribute);
    }

    builder.build()
}

/// Parses and compiles a match expression.
///
/// # Errors
/// Returns a parse error or any error from [`compile_match_expression`].
pub fn compile_match_source(source: &str, verbs: &VerbMap) -> Result<Matcher> {
    let expr = parse(source)?;
    compile_match_expression(&expr, verbs).map_err(|e| e.in_expression(source.trim()))
}
