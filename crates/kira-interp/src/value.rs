//! Runtime values, grounded on the tagged-union `Value` the spec's data
//! model lists in §3.1: void, wide integer, float, bool, char, string,
//! array, tuple, record, cons/nil list, option, result, function, builtin.
//!
//! Compound values that Kira lets you mutate in place (arrays, records)
//! are `Rc<RefCell<_>>` so an `Environment` binding and an aliased copy
//! see the same mutation, the way `H1ghBre4k3r-y-lang`'s `Scope` shares a
//! `HashMap` rather than deep-cloning on every lookup. Everything else is
//! plain or `Rc`-shared for cheap cloning.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use kira_parser::ast::item::{Param, Stmt};

use crate::env::Environment;

/// A cons-list cell. `Nil` is the empty list; `Cons` holds one element and
/// a shared pointer to the rest so sharing a tail between two lists is
/// `Rc::clone`, not a copy.
#[derive(Debug, Clone, PartialEq)]
pub enum ListNode {
    Nil,
    Cons(Value, Rc<ListNode>),
}

/// Shape of a sum-type variant's payload, mirroring
/// `kira_parser::ast::item::VariantFields`.
#[derive(Debug, Clone, PartialEq)]
pub enum VariantData {
    Unit,
    Tuple(Vec<Value>),
    Record(Vec<(String, Value)>),
}

#[derive(Clone)]
pub struct FunctionValue {
    pub name: Option<String>,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
    pub is_effect: bool,
    pub closure: Environment,
}

impl fmt::Debug for FunctionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionValue")
            .field("name", &self.name)
            .field("is_effect", &self.is_effect)
            .field("params", &self.params.len())
            .finish()
    }
}

pub type BuiltinFn = dyn Fn(&mut crate::interp::Interpreter, &mut crate::builtins::BuiltinContext, Vec<Value>) -> Result<Value, crate::error::RuntimeError>;

#[derive(Clone)]
pub struct Builtin {
    pub name: String,
    pub is_effect: bool,
    pub arity: usize,
    pub func: Rc<BuiltinFn>,
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builtin").field("name", &self.name).field("is_effect", &self.is_effect).finish()
    }
}

impl PartialEq for Builtin {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && Rc::ptr_eq(&self.func, &other.func)
    }
}

#[derive(Debug, Clone)]
pub enum Value {
    Void,
    Int(i128),
    Float(f64),
    Bool(bool),
    Char(char),
    Str(Rc<String>),
    Array(Rc<RefCell<Vec<Value>>>),
    Tuple(Rc<Vec<Value>>),
    Record { type_name: Option<String>, fields: Rc<RefCell<Vec<(String, Value)>>> },
    Variant { type_name: String, variant: String, data: VariantData },
    List(Rc<ListNode>),
    Option(Option<Box<Value>>),
    Result(Result<Box<Value>, Box<Value>>),
    /// `start..end` / `start..=end`, both bounds optional.
    Range { start: Option<i128>, end: Option<i128>, inclusive: bool },
    Function(Rc<FunctionValue>),
    Builtin(Rc<Builtin>),
}

impl Value {
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(Rc::new(s.into()))
    }

    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    pub fn record(type_name: Option<String>, fields: Vec<(String, Value)>) -> Self {
        Value::Record { type_name, fields: Rc::new(RefCell::new(fields)) }
    }

    /// A short, stable name for error messages (`TypeMismatch { expected,
    /// found, .. }` renders this, not the full value).
    pub fn type_name(&self) -> String {
        match self {
            Value::Void => "void".to_string(),
            Value::Int(_) => "int".to_string(),
            Value::Float(_) => "float".to_string(),
            Value::Bool(_) => "bool".to_string(),
            Value::Char(_) => "char".to_string(),
            Value::Str(_) => "string".to_string(),
            Value::Array(_) => "array".to_string(),
            Value::Tuple(_) => "tuple".to_string(),
            Value::Record { type_name, .. } => type_name.clone().unwrap_or_else(|| "record".to_string()),
            Value::Variant { type_name, .. } => type_name.clone(),
            Value::List(_) => "list".to_string(),
            Value::Option(_) => "option".to_string(),
            Value::Result(_) => "result".to_string(),
            Value::Range { .. } => "range".to_string(),
            Value::Function(_) => "function".to_string(),
            Value::Builtin(b) => format!("builtin `{}`", b.name),
        }
    }

    pub fn is_truthy(&self) -> bool {
        matches!(self, Value::Bool(true))
    }

    /// Builds the cons-chain for a Rust-side `Vec`, used by builtins that
    /// hand a list back to user code.
    pub fn list_from_vec(items: Vec<Value>) -> Self {
        let mut tail = Rc::new(ListNode::Nil);
        for item in items.into_iter().rev() {
            tail = Rc::new(ListNode::Cons(item, tail));
        }
        Value::List(tail)
    }

    /// Collects a cons-chain into a Rust-side `Vec`, used by builtins that
    /// traverse a list (§4.7: "all list operations in the standard library
    /// traverse cons-chains").
    pub fn list_to_vec(node: &Rc<ListNode>) -> Vec<Value> {
        let mut out = Vec::new();
        let mut cur = node.clone();
        loop {
            match cur.as_ref() {
                ListNode::Nil => break,
                ListNode::Cons(head, tail) => {
                    out.push(head.clone());
                    cur = tail.clone();
                }
            }
        }
        out
    }
}

/// Structural equality by tag and payload (§3.1). Functions and builtins
/// compare by identity, since two closures built from the same source
/// text are still distinct captures.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Void, Value::Void) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => *a.borrow() == *b.borrow(),
            (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::Record { type_name: tn1, fields: f1 }, Value::Record { type_name: tn2, fields: f2 }) => {
                tn1 == tn2 && *f1.borrow() == *f2.borrow()
            }
            (
                Value::Variant { type_name: tn1, variant: v1, data: d1 },
                Value::Variant { type_name: tn2, variant: v2, data: d2 },
            ) => tn1 == tn2 && v1 == v2 && d1 == d2,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Option(a), Value::Option(b)) => a == b,
            (Value::Result(a), Value::Result(b)) => a == b,
            (
                Value::Range { start: s1, end: e1, inclusive: i1 },
                Value::Range { start: s2, end: e2, inclusive: i2 },
            ) => s1 == s2 && e1 == e2 && i1 == i2,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => write!(f, "void"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Char(c) => write!(f, "{c}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Tuple(elems) => {
                write!(f, "(")?;
                for (i, elem) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{elem}")?;
                }
                write!(f, ")")
            }
            Value::Record { type_name, fields } => {
                if let Some(name) = type_name {
                    write!(f, "{name} ")?;
                }
                write!(f, "{{ ")?;
                for (i, (name, value)) in fields.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: {value}")?;
                }
                write!(f, " }}")
            }
            Value::Variant { variant, data, .. } => match data {
                VariantData::Unit => write!(f, "{variant}"),
                VariantData::Tuple(args) => {
                    write!(f, "{variant}(")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    write!(f, ")")
                }
                VariantData::Record(fields) => {
                    write!(f, "{variant} {{ ")?;
                    for (i, (name, value)) in fields.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{name}: {value}")?;
                    }
                    write!(f, " }}")
                }
            },
            Value::List(node) => {
                write!(f, "[")?;
                for (i, item) in Value::list_to_vec(node).iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Option(Some(inner)) => write!(f, "Some({inner})"),
            Value::Option(None) => write!(f, "None"),
            Value::Result(Ok(inner)) => write!(f, "Ok({inner})"),
            Value::Result(Err(inner)) => write!(f, "Err({inner})"),
            Value::Range { start, end, inclusive } => {
                if let Some(s) = start {
                    write!(f, "{s}")?;
                }
                write!(f, "{}", if *inclusive { "..=" } else { ".." })?;
                if let Some(e) = end {
                    write!(f, "{e}")?;
                }
                Ok(())
            }
            Value::Function(func) => write!(f, "<fn {}>", func.name.as_deref().unwrap_or("closure")),
            Value::Builtin(b) => write!(f, "<builtin {}>", b.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_round_trips_through_vec() {
        let list = Value::list_from_vec(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        let Value::List(node) = &list else { panic!("expected a list") };
        assert_eq!(Value::list_to_vec(node), vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
    }

    #[test]
    fn array_mutation_is_visible_through_aliases() {
        let arr = Value::array(vec![Value::Int(1)]);
        let alias = arr.clone();
        if let Value::Array(items) = &arr {
            items.borrow_mut().push(Value::Int(2));
        }
        if let Value::Array(items) = &alias {
            assert_eq!(items.borrow().len(), 2);
        } else {
            panic!("expected an array");
        }
    }

    #[test]
    fn display_renders_record_fields_in_order() {
        let rec = Value::record(Some("Point".into()), vec![("x".into(), Value::Int(1)), ("y".into(), Value::Int(2))]);
        assert_eq!(rec.to_string(), "Point { x: 1, y: 2 }");
    }

    #[test]
    fn type_name_is_stable_for_error_messages() {
        assert_eq!(Value::Int(1).type_name(), "int");
        assert_eq!(Value::Option(None).type_name(), "option");
    }
}
