//! The standard-library capability surface, grounded on SPEC_FULL §6's
//! builtin capability interface table and §4.7's "fixed set of builtins,
//! injected as record values under a top-level namespace name" rule.
//!
//! The concrete standard library is explicitly out of scope for the core
//! (spec.md's Non-goals: "the concrete text of the standard library,
//! treated as a capability surface the interpreter must expose"). What
//! lives here is the *mechanism* — a builtin descriptor `(name, is_effect,
//! impl_fn)` and a `BuiltinContext` carrying the host's ambient state —
//! plus a small, representative registry so `kirac run` has something to
//! call without a host embedding this crate and bringing its own. The
//! registry installs three namespace records (`std`, `list`, `option`)
//! rather than one, matching spec.md §8 scenario S6's `list.map(...)` /
//! `option.unwrap_or(...)` call shapes.

use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use kira_common::Span;

use crate::env::Environment;
use crate::error::RuntimeError;
use crate::interp::Interpreter;
use crate::value::{Builtin, Value};

/// Host state every builtin call receives: the allocator is implicit in
/// Rust's own heap, so this just carries the program's argument vector,
/// matching SPEC_FULL §6's `BuiltinContext { allocator, interpreter
/// back-reference, argv }` (the back-reference is threaded separately as
/// `&mut Interpreter`, not stored here, since `Interpreter` already owns
/// this context for the duration of a run).
#[derive(Debug, Default, Clone)]
pub struct BuiltinContext {
    pub argv: Vec<String>,
}

fn builtin(name: &str, is_effect: bool, arity: usize, func: impl Fn(&mut Interpreter, &mut BuiltinContext, Vec<Value>) -> Result<Value, RuntimeError> + 'static) -> Value {
    Value::Builtin(Rc::new(Builtin { name: name.to_string(), is_effect, arity, func: Rc::new(func) }))
}

fn check_arity(expected: usize, args: &[Value]) -> Result<(), RuntimeError> {
    if args.len() != expected {
        return Err(RuntimeError::ArityMismatch { expected, found: args.len(), span: Span::point(0) });
    }
    Ok(())
}

fn expect_string(value: &Value) -> Result<Rc<String>, RuntimeError> {
    match value {
        Value::Str(s) => Ok(s.clone()),
        other => Err(RuntimeError::TypeMismatch { expected: "string".into(), found: other.type_name(), span: Span::point(0) }),
    }
}

/// Elements of any value `for x in iterable` (or a builtin) can traverse:
/// arrays, lists, strings (by `char`), and ranges.
pub(crate) fn iterate(value: &Value) -> Result<Vec<Value>, RuntimeError> {
    match value {
        Value::Array(items) => Ok(items.borrow().clone()),
        Value::List(node) => Ok(Value::list_to_vec(node)),
        Value::Str(s) => Ok(s.chars().map(Value::Char).collect()),
        Value::Range { start, end, inclusive } => {
            let start = start.unwrap_or(0);
            let end = match end {
                Some(e) if *inclusive => *e + 1,
                Some(e) => *e,
                None => return Err(RuntimeError::InvalidOperation { message: "cannot iterate an unbounded range".into(), span: Span::point(0) }),
            };
            Ok((start..end).map(Value::Int).collect())
        }
        other => Err(RuntimeError::TypeMismatch { expected: "iterable".into(), found: other.type_name(), span: Span::point(0) }),
    }
}

/// Installs the fixed builtin set as a single record value bound to
/// `std` in the root environment.
pub fn install_stdlib(env: &Environment) {
    let fields = vec![
        ("print".to_string(), builtin("print", true, 1, |_, _, args| {
            check_arity(1, &args)?;
            print!("{}", args[0]);
            Ok(Value::Void)
        })),
        ("println".to_string(), builtin("println", true, 1, |_, _, args| {
            check_arity(1, &args)?;
            println!("{}", args[0]);
            Ok(Value::Void)
        })),
        ("read_line".to_string(), builtin("read_line", true, 0, |_, _, args| {
            check_arity(0, &args)?;
            let mut line = String::new();
            std::io::stdin()
                .read_line(&mut line)
                .map_err(|e| RuntimeError::InvalidOperation { message: e.to_string(), span: Span::point(0) })?;
            if line.ends_with('\n') {
                line.pop();
                if line.ends_with('\r') {
                    line.pop();
                }
            }
            Ok(Value::str(line))
        })),
        ("sleep_ms".to_string(), builtin("sleep_ms", true, 1, |_, _, args| {
            check_arity(1, &args)?;
            let Value::Int(ms) = args[0] else {
                return Err(RuntimeError::TypeMismatch { expected: "int".into(), found: args[0].type_name(), span: Span::point(0) });
            };
            std::thread::sleep(std::time::Duration::from_millis(ms.max(0) as u64));
            Ok(Value::Void)
        })),
        ("now_millis".to_string(), builtin("now_millis", true, 0, |_, _, args| {
            check_arity(0, &args)?;
            let millis = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_err(|e| RuntimeError::InvalidOperation { message: e.to_string(), span: Span::point(0) })?
                .as_millis();
            Ok(Value::Int(millis as i128))
        })),
        ("args".to_string(), builtin("args", false, 0, |_, ctx, args| {
            check_arity(0, &args)?;
            Ok(Value::list_from_vec(ctx.argv.iter().map(|a| Value::str(a.clone())).collect()))
        })),
        ("len".to_string(), builtin("len", false, 1, |_, _, args| {
            check_arity(1, &args)?;
            let n = match &args[0] {
                Value::Array(items) => items.borrow().len(),
                Value::List(node) => Value::list_to_vec(node).len(),
                Value::Str(s) => s.chars().count(),
                Value::Tuple(elems) => elems.len(),
                other => {
                    return Err(RuntimeError::TypeMismatch { expected: "array, list, string, or tuple".into(), found: other.type_name(), span: Span::point(0) })
                }
            };
            Ok(Value::Int(n as i128))
        })),
        ("push".to_string(), builtin("push", false, 2, |_, _, args| {
            check_arity(2, &args)?;
            match &args[0] {
                Value::Array(items) => {
                    items.borrow_mut().push(args[1].clone());
                    Ok(Value::Void)
                }
                other => Err(RuntimeError::TypeMismatch { expected: "array".into(), found: other.type_name(), span: Span::point(0) }),
            }
        })),
        ("to_string".to_string(), builtin("to_string", false, 1, |_, _, args| {
            check_arity(1, &args)?;
            Ok(Value::str(args[0].to_string()))
        })),
        ("assert".to_string(), builtin("assert", false, 2, |_, _, args| {
            check_arity(2, &args)?;
            let Value::Bool(cond) = args[0] else {
                return Err(RuntimeError::TypeMismatch { expected: "bool".into(), found: args[0].type_name(), span: Span::point(0) });
            };
            if cond {
                Ok(Value::Void)
            } else {
                let message = expect_string(&args[1])?;
                Err(RuntimeError::AssertionFailed { message: message.to_string(), span: Span::point(0) })
            }
        })),
    ];
    env.define("std", Value::record(Some("std".to_string()), fields));
    env.define("list", Value::record(Some("list".to_string()), list_fields()));
    env.define("option", Value::record(Some("option".to_string()), option_fields()));
}

/// `list.*`: higher-order traversal over any iterable (arrays, cons-lists,
/// strings, ranges), returning a cons-list per SPEC_FULL §4.7's "lists are
/// built from nil/cons" rule.
fn list_fields() -> Vec<(String, Value)> {
    vec![
        ("map".to_string(), builtin("map", false, 2, |interp, _, args| {
            check_arity(2, &args)?;
            let items = iterate(&args[0])?;
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(interp.call_value(&args[1], vec![item], Span::point(0))?);
            }
            Ok(Value::list_from_vec(out))
        })),
        ("filter".to_string(), builtin("filter", false, 2, |interp, _, args| {
            check_arity(2, &args)?;
            let items = iterate(&args[0])?;
            let mut out = Vec::new();
            for item in items {
                let keep = interp.call_value(&args[1], vec![item.clone()], Span::point(0))?;
                if keep.is_truthy() {
                    out.push(item);
                }
            }
            Ok(Value::list_from_vec(out))
        })),
        ("fold".to_string(), builtin("fold", false, 3, |interp, _, args| {
            check_arity(3, &args)?;
            let items = iterate(&args[0])?;
            let mut acc = args[1].clone();
            for item in items {
                acc = interp.call_value(&args[2], vec![acc, item], Span::point(0))?;
            }
            Ok(acc)
        })),
    ]
}

/// `option.*`: the handful of operations `?`/`??` don't already cover.
fn option_fields() -> Vec<(String, Value)> {
    vec![(
        "unwrap_or".to_string(),
        builtin("unwrap_or", false, 2, |_, _, args| {
            check_arity(2, &args)?;
            match &args[0] {
                Value::Option(Some(inner)) => Ok((**inner).clone()),
                Value::Option(None) => Ok(args[1].clone()),
                other => Err(RuntimeError::TypeMismatch { expected: "option".into(), found: other.type_name(), span: Span::point(0) }),
            }
        }),
    )]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::Interpreter;

    fn std_field(env: &Environment, name: &str) -> Value {
        namespace_field(env, "std", name)
    }

    fn namespace_field(env: &Environment, namespace: &str, name: &str) -> Value {
        let Some(Value::Record { fields, .. }) = env.get(namespace) else { panic!("{namespace} not installed") };
        fields.borrow().iter().find(|(n, _)| n == name).map(|(_, v)| v.clone()).unwrap()
    }

    #[test]
    fn len_counts_array_elements() {
        let env = Environment::root();
        install_stdlib(&env);
        let len = std_field(&env, "len");
        let mut interp = Interpreter::new(BuiltinContext::default());
        let result = interp.call_value(&len, vec![Value::array(vec![Value::Int(1), Value::Int(2)])], Span::point(0)).unwrap();
        assert_eq!(result, Value::Int(2));
    }

    #[test]
    fn push_mutates_array_in_place() {
        let env = Environment::root();
        install_stdlib(&env);
        let push = std_field(&env, "push");
        let mut interp = Interpreter::new(BuiltinContext::default());
        let arr = Value::array(vec![Value::Int(1)]);
        interp.call_value(&push, vec![arr.clone(), Value::Int(2)], Span::point(0)).unwrap();
        let Value::Array(items) = &arr else { unreachable!() };
        assert_eq!(items.borrow().len(), 2);
    }

    #[test]
    fn assert_false_raises_assertion_failed() {
        let env = Environment::root();
        install_stdlib(&env);
        let assert_fn = std_field(&env, "assert");
        let mut interp = Interpreter::new(BuiltinContext::default());
        let err = interp.call_value(&assert_fn, vec![Value::Bool(false), Value::str("bad")], Span::point(0)).unwrap_err();
        assert!(matches!(err, RuntimeError::AssertionFailed { .. }));
    }

    #[test]
    fn arity_mismatch_is_reported() {
        let env = Environment::root();
        install_stdlib(&env);
        let len = std_field(&env, "len");
        let mut interp = Interpreter::new(BuiltinContext::default());
        let err = interp.call_value(&len, vec![], Span::point(0)).unwrap_err();
        assert!(matches!(err, RuntimeError::ArityMismatch { .. }));
    }

    #[test]
    fn list_map_squares_each_element_into_a_cons_list() {
        let env = Environment::root();
        install_stdlib(&env);
        let map = namespace_field(&env, "list", "map");
        let mut interp = Interpreter::new(BuiltinContext::default());
        let square = builtin("square", false, 1, |_, _, args| {
            let Value::Int(n) = args[0] else { unreachable!() };
            Ok(Value::Int(n * n))
        });
        let xs = Value::array(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        let result = interp.call_value(&map, vec![xs, square], Span::point(0)).unwrap();
        assert_eq!(result, Value::list_from_vec(vec![Value::Int(1), Value::Int(4), Value::Int(9)]));
    }

    #[test]
    fn option_unwrap_or_falls_back_on_none() {
        let env = Environment::root();
        install_stdlib(&env);
        let unwrap_or = namespace_field(&env, "option", "unwrap_or");
        let mut interp = Interpreter::new(BuiltinContext::default());
        let result = interp.call_value(&unwrap_or, vec![Value::Option(None), Value::Int(7)], Span::point(0)).unwrap();
        assert_eq!(result, Value::Int(7));
    }

    #[test]
    fn option_unwrap_or_returns_the_inner_value_when_some() {
        let env = Environment::root();
        install_stdlib(&env);
        let unwrap_or = namespace_field(&env, "option", "unwrap_or");
        let mut interp = Interpreter::new(BuiltinContext::default());
        let result = interp.call_value(&unwrap_or, vec![Value::Option(Some(Box::new(Value::Int(3)))), Value::Int(7)], Span::point(0)).unwrap();
        assert_eq!(result, Value::Int(3));
    }
}
