//! The tree-walking evaluator, grounded on `H1ghBre4k3r-y-lang`'s
//! `Interpreter`: one method per AST node kind (`run_statement`,
//! `run_expression`, `run_binary_operation`, ...), each threading a scope
//! through every recursive call. Here the scope is an [`Environment`]
//! handle rather than a borrowed `&mut Scope`, since closures need to
//! outlive the call that created them.
//!
//! Control flow that isn't a plain value — `return`, `break`, and runtime
//! errors — unwinds through [`Unwind`] rather than the `Result<Value,
//! RuntimeError>` every public entry point exposes; `call_function`/
//! `call_method` are where a `return` is caught and turned back into an
//! ordinary value.

use std::rc::Rc;

use rustc_hash::FxHashMap;

use kira_common::Span;
use kira_parser::ast::expr::{BinaryOp, Expr, ExprKind, StringPart, UnaryOp};
use kira_parser::ast::item::{Decl, DeclKind, MatchArm, Param, Stmt, StmtKind};
use kira_parser::ast::pat::{ConstructorArgs, LiteralPat, Pattern};
use kira_parser::ast::ty::Type;
use kira_parser::ast::Program;

use crate::builtins::{self, install_stdlib, BuiltinContext};
use crate::env::Environment;
use crate::error::RuntimeError;
use crate::value::{FunctionValue, VariantData, Value};

enum Unwind {
    Error(RuntimeError),
    Return(Value),
    Break,
}

impl From<RuntimeError> for Unwind {
    fn from(err: RuntimeError) -> Self {
        Unwind::Error(err)
    }
}

type Flow<T> = Result<T, Unwind>;

/// Turns an `Unwind` that escaped every function/loop boundary back into a
/// `RuntimeError`: `return`/`break` reaching here means they were used
/// outside any function or loop, which the checker is expected to reject,
/// but the interpreter doesn't trust that blindly.
fn unwind_to_error(unwind: Unwind) -> RuntimeError {
    match unwind {
        Unwind::Error(e) => e,
        Unwind::Return(_) => RuntimeError::InvalidOperation { message: "return outside a function".into(), span: Span::point(0) },
        Unwind::Break => RuntimeError::InvalidOperation { message: "break outside a loop".into(), span: Span::point(0) },
    }
}

fn unwind_from_call(unwind: Unwind, span: Span) -> RuntimeError {
    match unwind {
        Unwind::Error(e) => e,
        Unwind::Return(v) => {
            let _ = v;
            unreachable!("call_function/call_method catch Unwind::Return before this point")
        }
        Unwind::Break => RuntimeError::InvalidOperation { message: "break outside a loop".into(), span },
    }
}

fn type_name_of_type(ty: &Type) -> Option<String> {
    match ty {
        Type::Named { name, .. } => Some(name.clone()),
        Type::Generic { base, .. } => Some(base.clone()),
        Type::Path { segments, .. } => Some(segments.join("::")),
        _ => None,
    }
}

/// Owns the whole running program: the global bindings, every `impl`
/// method keyed by its target type name, the map from variant name to its
/// owning sum type (built while loading `type` declarations), and the
/// host's builtin context.
pub struct Interpreter {
    ctx: BuiltinContext,
    globals: Environment,
    methods: FxHashMap<String, FxHashMap<String, Rc<FunctionValue>>>,
    variant_owner: FxHashMap<String, String>,
    tests: Vec<(String, Vec<Stmt>, Environment)>,
    /// The type name `Self` resolves to inside the `impl` block currently
    /// executing a method body; empty outside one.
    self_type_stack: Vec<String>,
}

impl Interpreter {
    pub fn new(ctx: BuiltinContext) -> Self {
        let globals = Environment::root();
        install_stdlib(&globals);
        Interpreter {
            ctx,
            globals,
            methods: FxHashMap::default(),
            variant_owner: FxHashMap::default(),
            tests: Vec::new(),
            self_type_stack: Vec::new(),
        }
    }

    pub fn globals(&self) -> &Environment {
        &self.globals
    }

    /// Registers every top-level declaration (functions, constants,
    /// methods, sum-type variant ownership) without running anything.
    pub fn load(&mut self, program: &Program) -> Result<(), RuntimeError> {
        let globals = self.globals.clone();
        self.declare_decls(&program.decls, &globals).map_err(unwind_to_error)
    }

    /// Loads `program`, then calls `main` with no arguments.
    pub fn run(&mut self, program: &Program) -> Result<Value, RuntimeError> {
        self.load(program)?;
        let main = self.globals.get("main").ok_or_else(|| RuntimeError::InvalidOperation {
            message: "no `main` function defined".into(),
            span: Span::point(0),
        })?;
        self.call_value(&main, vec![], Span::point(0))
    }

    /// Runs every stashed `test` block. Not reachable from the CLI (only
    /// `check`/`run` are real subcommands); exposed for embedders and this
    /// crate's own black-box suite.
    pub fn run_tests(&mut self) -> Vec<(String, Result<(), RuntimeError>)> {
        let tests = std::mem::take(&mut self.tests);
        tests
            .into_iter()
            .map(|(name, body, env)| {
                let outcome = match self.exec_stmts_in_scope(&body, &env.child()) {
                    Ok(_) => Ok(()),
                    Err(Unwind::Return(_)) => Ok(()),
                    Err(other) => Err(unwind_to_error(other)),
                };
                (name, outcome)
            })
            .collect()
    }

    fn declare_decls(&mut self, decls: &[Decl], env: &Environment) -> Flow<()> {
        for decl in decls {
            self.declare_decl(decl, env)?;
        }
        Ok(())
    }

    /// `Module` is flattened into the same global scope rather than a
    /// nested namespace: this interpreter has no qualified-name story, and
    /// the checker has already confirmed every name resolves uniquely.
    fn declare_decl(&mut self, decl: &Decl, env: &Environment) -> Flow<()> {
        match &decl.kind {
            DeclKind::Module { decls, .. } => self.declare_decls(decls, env)?,
            DeclKind::Import { .. } => {}
            DeclKind::Fn { name, params, body, is_effect, .. } => {
                let func = Rc::new(FunctionValue {
                    name: Some(name.clone()),
                    params: params.clone(),
                    body: body.clone(),
                    is_effect: *is_effect,
                    closure: env.clone(),
                });
                env.define(name, Value::Function(func));
            }
            DeclKind::Const { name, value, .. } => {
                let v = self.eval_expr(value, env)?;
                env.define(name, v);
            }
            DeclKind::Let { pattern, value, .. } => {
                let v = self.eval_expr(value, env)?;
                self.match_pattern(pattern, &v, env)?;
            }
            DeclKind::SumType { name, variants, .. } => {
                for v in variants {
                    self.variant_owner.insert(v.name.clone(), name.clone());
                }
            }
            DeclKind::ProductType { .. } | DeclKind::TypeAlias { .. } | DeclKind::Trait { .. } => {}
            DeclKind::Impl { target, methods, .. } => {
                let Some(target_name) = type_name_of_type(target) else { return Ok(()) };
                let entry = self.methods.entry(target_name).or_default();
                for m in methods {
                    if let DeclKind::Fn { name, params, body, is_effect, .. } = &m.kind {
                        let func = Rc::new(FunctionValue {
                            name: Some(name.clone()),
                            params: params.clone(),
                            body: body.clone(),
                            is_effect: *is_effect,
                            closure: env.clone(),
                        });
                        entry.insert(name.clone(), func);
                    }
                }
            }
            DeclKind::Test { name, body } => {
                self.tests.push((name.clone(), body.clone(), env.clone()));
            }
        }
        Ok(())
    }

    /// Calls any callable value: a closure/named function or a builtin.
    pub fn call_value(&mut self, callee: &Value, args: Vec<Value>, span: Span) -> Result<Value, RuntimeError> {
        match callee {
            Value::Function(func) => self.call_function(func.clone(), args, span),
            Value::Builtin(b) => {
                if args.len() != b.arity {
                    return Err(RuntimeError::ArityMismatch { expected: b.arity, found: args.len(), span });
                }
                let func = b.func.clone();
                let mut ctx = std::mem::take(&mut self.ctx);
                let result = func(self, &mut ctx, args);
                self.ctx = ctx;
                result
            }
            other => Err(RuntimeError::TypeMismatch { expected: "a callable value".into(), found: other.type_name(), span }),
        }
    }

    pub fn call_function(&mut self, func: Rc<FunctionValue>, args: Vec<Value>, span: Span) -> Result<Value, RuntimeError> {
        if args.len() != func.params.len() {
            return Err(RuntimeError::ArityMismatch { expected: func.params.len(), found: args.len(), span });
        }
        let call_env = func.closure.child();
        for (param, arg) in func.params.iter().zip(args) {
            call_env.define(&param.name, arg);
        }
        match self.exec_stmts_in_scope(&func.body, &call_env) {
            Ok(v) => Ok(v),
            Err(Unwind::Return(v)) => Ok(v),
            Err(other) => Err(unwind_from_call(other, span)),
        }
    }

    /// Dispatches a method call on a receiver value. A leading parameter
    /// typed `Self` (the parser's representation of a bare `self` param)
    /// binds the receiver; `Self` inside the method body resolves to the
    /// receiver's own type name for the call's duration.
    pub fn call_method(&mut self, receiver: Value, method: &str, args: Vec<Value>, span: Span) -> Result<Value, RuntimeError> {
        let type_name = receiver.type_name();
        let func = self.methods.get(&type_name).and_then(|m| m.get(method)).cloned();
        let func = match func {
            Some(f) => f,
            None => {
                return Err(RuntimeError::TypeMismatch {
                    expected: format!("a method `{method}` on `{type_name}`"),
                    found: type_name,
                    span,
                })
            }
        };
        let call_env = func.closure.child();
        let rest_params: &[Param] = match func.params.first() {
            Some(p) if matches!(p.ty, Type::SelfType { .. }) => {
                call_env.define(&p.name, receiver);
                &func.params[1..]
            }
            _ => &func.params[..],
        };
        if rest_params.len() != args.len() {
            return Err(RuntimeError::ArityMismatch { expected: rest_params.len(), found: args.len(), span });
        }
        for (param, arg) in rest_params.iter().zip(args) {
            call_env.define(&param.name, arg);
        }
        self.self_type_stack.push(type_name);
        let result = match self.exec_stmts_in_scope(&func.body, &call_env) {
            Ok(v) => Ok(v),
            Err(Unwind::Return(v)) => Ok(v),
            Err(other) => Err(unwind_from_call(other, span)),
        };
        self.self_type_stack.pop();
        result
    }

    /// Executes every statement in `stmts` within the *current* scope
    /// (the caller owns entering/leaving it), returning the tail
    /// expression's value if the last statement is a bare `Expr`, or
    /// `Void` otherwise — the same convention `check_stmts_in_scope` uses.
    fn exec_stmts_in_scope(&mut self, stmts: &[Stmt], env: &Environment) -> Flow<Value> {
        let mut result = Value::Void;
        for (i, stmt) in stmts.iter().enumerate() {
            if i + 1 == stmts.len() {
                if let StmtKind::Expr(e) = &stmt.kind {
                    result = self.eval_expr(e, env)?;
                    continue;
                }
            }
            self.exec_stmt(stmt, env)?;
        }
        Ok(result)
    }

    fn exec_block(&mut self, stmts: &[Stmt], env: &Environment) -> Flow<Value> {
        self.exec_stmts_in_scope(stmts, &env.child())
    }

    fn exec_stmt(&mut self, stmt: &Stmt, env: &Environment) -> Flow<()> {
        match &stmt.kind {
            StmtKind::Let { pattern, value, .. } => {
                let v = self.eval_expr(value, env)?;
                self.match_pattern(pattern, &v, env)?;
            }
            StmtKind::Var { name, value, .. } => {
                let v = match value {
                    Some(e) => self.eval_expr(e, env)?,
                    None => Value::Void,
                };
                env.define(name, v);
            }
            StmtKind::Assign { target, value } => {
                let v = self.eval_expr(value, env)?;
                self.assign_target(target, v, env)?;
            }
            StmtKind::If { cond, then_branch, else_branch } => {
                let c = self.eval_expr(cond, env)?;
                if c.is_truthy() {
                    self.exec_block(then_branch, env)?;
                } else if let Some(eb) = else_branch {
                    self.exec_block(eb, env)?;
                }
            }
            StmtKind::For { pattern, iterable, body } => {
                let iterable_val = self.eval_expr(iterable, env)?;
                let items = builtins::iterate(&iterable_val)?;
                for item in items {
                    let loop_env = env.child();
                    self.match_pattern(pattern, &item, &loop_env)?;
                    match self.exec_stmts_in_scope(body, &loop_env) {
                        Ok(_) => {}
                        Err(Unwind::Break) => break,
                        Err(other) => return Err(other),
                    }
                }
            }
            StmtKind::While { cond, body } => loop {
                let c = self.eval_expr(cond, env)?;
                if !c.is_truthy() {
                    break;
                }
                match self.exec_block(body, env) {
                    Ok(_) => {}
                    Err(Unwind::Break) => break,
                    Err(other) => return Err(other),
                }
            },
            StmtKind::Loop { body } => loop {
                match self.exec_block(body, env) {
                    Ok(_) => {}
                    Err(Unwind::Break) => break,
                    Err(other) => return Err(other),
                }
            },
            StmtKind::Match { subject, arms } => {
                self.eval_match(subject, arms, env, stmt.span)?;
            }
            StmtKind::Return { value } => {
                let v = match value {
                    Some(e) => self.eval_expr(e, env)?,
                    None => Value::Void,
                };
                return Err(Unwind::Return(v));
            }
            StmtKind::Break => return Err(Unwind::Break),
            StmtKind::Expr(e) => {
                self.eval_expr(e, env)?;
            }
            StmtKind::Block(stmts) => {
                self.exec_block(stmts, env)?;
            }
        }
        Ok(())
    }

    fn assign_target(&mut self, target: &Expr, value: Value, env: &Environment) -> Flow<()> {
        match &target.kind {
            ExprKind::Ident(name) => {
                if !env.assign(name, value) {
                    return Err(RuntimeError::InvalidOperation {
                        message: format!("assignment to undeclared name `{name}`"),
                        span: target.span,
                    }
                    .into());
                }
                Ok(())
            }
            ExprKind::Field { object, field } => {
                let obj = self.eval_expr(object, env)?;
                match &obj {
                    Value::Record { fields, .. } => {
                        let mut fields = fields.borrow_mut();
                        match fields.iter_mut().find(|(n, _)| n == field) {
                            Some(slot) => {
                                slot.1 = value;
                                Ok(())
                            }
                            None => Err(RuntimeError::InvalidOperation { message: format!("no field `{field}` to assign"), span: target.span }.into()),
                        }
                    }
                    other => Err(RuntimeError::TypeMismatch { expected: "a record".into(), found: other.type_name(), span: target.span }.into()),
                }
            }
            ExprKind::Index { object, index } => {
                let obj = self.eval_expr(object, env)?;
                let idx = self.eval_expr(index, env)?;
                match (&obj, &idx) {
                    (Value::Array(items), Value::Int(i)) => {
                        let mut items = items.borrow_mut();
                        let idx = normalize_index(*i, items.len(), target.span)?;
                        items[idx] = value;
                        Ok(())
                    }
                    _ => Err(RuntimeError::TypeMismatch { expected: "an array".into(), found: obj.type_name(), span: target.span }.into()),
                }
            }
            _ => Err(RuntimeError::InvalidOperation { message: "invalid assignment target".into(), span: target.span }.into()),
        }
    }

    fn eval_expr(&mut self, expr: &Expr, env: &Environment) -> Flow<Value> {
        match &expr.kind {
            ExprKind::Literal(lit) => Ok(literal_value(lit)),
            ExprKind::InterpolatedString(parts) => {
                let mut out = String::new();
                for part in parts {
                    match part {
                        StringPart::Text(s) => out.push_str(s),
                        StringPart::Expr(e) => out.push_str(&self.eval_expr(e, env)?.to_string()),
                    }
                }
                Ok(Value::str(out))
            }
            ExprKind::Ident(name) => {
                if let Some(v) = env.get(name) {
                    return Ok(v);
                }
                if let Some(owner) = self.variant_owner.get(name).cloned() {
                    return Ok(Value::Variant { type_name: owner, variant: name.clone(), data: VariantData::Unit });
                }
                Err(RuntimeError::InvalidOperation { message: format!("undefined name `{name}`"), span: expr.span }.into())
            }
            ExprKind::SelfValue => env
                .get("self")
                .ok_or_else(|| RuntimeError::InvalidOperation { message: "`self` used outside a method".into(), span: expr.span }.into()),
            ExprKind::SelfType => Ok(Value::str(self.self_type_stack.last().cloned().unwrap_or_default())),
            ExprKind::Binary { op, lhs, rhs } => self.eval_binary(*op, lhs, rhs, env, expr.span),
            ExprKind::Unary { op, operand } => self.eval_unary(*op, operand, env, expr.span),
            ExprKind::Field { object, field } => self.eval_field(object, field, env, expr.span),
            ExprKind::Index { object, index } => self.eval_index(object, index, env, expr.span),
            ExprKind::TupleIndex { object, index } => self.eval_tuple_index(object, *index, env, expr.span),
            ExprKind::Call { callee, args } => {
                let callee_val = self.eval_expr(callee, env)?;
                let mut arg_vals = Vec::with_capacity(args.len());
                for a in args {
                    arg_vals.push(self.eval_expr(a, env)?);
                }
                self.call_value(&callee_val, arg_vals, expr.span).map_err(Unwind::Error)
            }
            ExprKind::MethodCall { receiver, method, args } => {
                let recv_val = self.eval_expr(receiver, env)?;
                let mut arg_vals = Vec::with_capacity(args.len());
                for a in args {
                    arg_vals.push(self.eval_expr(a, env)?);
                }
                self.call_method(recv_val, method, arg_vals, expr.span).map_err(Unwind::Error)
            }
            ExprKind::Closure { params, is_effect, body, .. } => Ok(Value::Function(Rc::new(FunctionValue {
                name: None,
                params: params.clone(),
                body: body.clone(),
                is_effect: *is_effect,
                closure: env.clone(),
            }))),
            ExprKind::If { cond, then_branch, else_branch } => {
                let c = self.eval_expr(cond, env)?;
                if c.is_truthy() {
                    self.eval_expr(then_branch, env)
                } else if let Some(eb) = else_branch {
                    self.eval_expr(eb, env)
                } else {
                    Ok(Value::Void)
                }
            }
            ExprKind::Block(stmts) => self.exec_block(stmts, env),
            ExprKind::Match { subject, arms } => self.eval_match(subject, arms, env, expr.span),
            ExprKind::Tuple(elems) => {
                let mut vals = Vec::with_capacity(elems.len());
                for e in elems {
                    vals.push(self.eval_expr(e, env)?);
                }
                Ok(Value::Tuple(Rc::new(vals)))
            }
            ExprKind::Array(elems) => {
                let mut vals = Vec::with_capacity(elems.len());
                for e in elems {
                    vals.push(self.eval_expr(e, env)?);
                }
                Ok(Value::array(vals))
            }
            ExprKind::Record { type_name, fields } => self.eval_record(type_name.as_deref(), fields, env, expr.span),
            ExprKind::VariantConstructor { name, args } => self.eval_variant_constructor(name, args, env, expr.span),
            ExprKind::Cast { operand, target } => self.eval_cast(operand, target, env, expr.span),
            ExprKind::Range { start, end, inclusive } => {
                let start = match start {
                    Some(e) => Some(self.eval_int(e, env)?),
                    None => None,
                };
                let end = match end {
                    Some(e) => Some(self.eval_int(e, env)?),
                    None => None,
                };
                Ok(Value::Range { start, end, inclusive: *inclusive })
            }
            ExprKind::Try(inner) => self.eval_try(inner, env, expr.span),
            ExprKind::Coalesce { operand, default } => {
                let v = self.eval_expr(operand, env)?;
                match v {
                    Value::Option(Some(inner)) => Ok(*inner),
                    Value::Option(None) => self.eval_expr(default, env),
                    Value::Result(Ok(inner)) => Ok(*inner),
                    Value::Result(Err(_)) => self.eval_expr(default, env),
                    other => Ok(other),
                }
            }
            ExprKind::Group(inner) => self.eval_expr(inner, env),
        }
    }

    fn eval_int(&mut self, expr: &Expr, env: &Environment) -> Flow<i128> {
        match self.eval_expr(expr, env)? {
            Value::Int(n) => Ok(n),
            other => Err(RuntimeError::TypeMismatch { expected: "int".into(), found: other.type_name(), span: expr.span }.into()),
        }
    }

    fn eval_binary(&mut self, op: BinaryOp, lhs: &Expr, rhs: &Expr, env: &Environment, span: Span) -> Flow<Value> {
        match op {
            BinaryOp::And => {
                let l = self.eval_expr(lhs, env)?;
                if !l.is_truthy() {
                    return Ok(Value::Bool(false));
                }
                Ok(Value::Bool(self.eval_expr(rhs, env)?.is_truthy()))
            }
            BinaryOp::Or => {
                let l = self.eval_expr(lhs, env)?;
                if l.is_truthy() {
                    return Ok(Value::Bool(true));
                }
                Ok(Value::Bool(self.eval_expr(rhs, env)?.is_truthy()))
            }
            BinaryOp::Is => {
                let l = self.eval_expr(lhs, env)?;
                let name = match &rhs.kind {
                    ExprKind::Ident(n) => n.clone(),
                    _ => {
                        return Err(RuntimeError::InvalidOperation {
                            message: "right side of `is` must be a type or variant name".into(),
                            span,
                        }
                        .into())
                    }
                };
                Ok(Value::Bool(value_is(&l, &name)))
            }
            BinaryOp::In => {
                let l = self.eval_expr(lhs, env)?;
                let r = self.eval_expr(rhs, env)?;
                let items = builtins::iterate(&r)?;
                Ok(Value::Bool(items.contains(&l)))
            }
            _ => {
                let l = self.eval_expr(lhs, env)?;
                let r = self.eval_expr(rhs, env)?;
                apply_binary(op, l, r, span).map_err(Unwind::from)
            }
        }
    }

    fn eval_unary(&mut self, op: UnaryOp, operand: &Expr, env: &Environment, span: Span) -> Flow<Value> {
        let v = self.eval_expr(operand, env)?;
        match (op, v) {
            (UnaryOp::Neg, Value::Int(n)) => Ok(Value::Int(-n)),
            (UnaryOp::Neg, Value::Float(n)) => Ok(Value::Float(-n)),
            (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
            (_, v) => Err(RuntimeError::InvalidOperation { message: format!("unary operator cannot apply to `{}`", v.type_name()), span }.into()),
        }
    }

    fn eval_field(&mut self, object: &Expr, field: &str, env: &Environment, span: Span) -> Flow<Value> {
        let obj = self.eval_expr(object, env)?;
        match &obj {
            Value::Record { fields, .. } => fields
                .borrow()
                .iter()
                .find(|(n, _)| n == field)
                .map(|(_, v)| v.clone())
                .ok_or_else(|| RuntimeError::InvalidOperation { message: format!("no field `{field}` on `{}`", obj.type_name()), span }.into()),
            Value::Variant { data: VariantData::Record(fields), .. } => fields
                .iter()
                .find(|(n, _)| n == field)
                .map(|(_, v)| v.clone())
                .ok_or_else(|| RuntimeError::InvalidOperation { message: format!("no field `{field}` on `{}`", obj.type_name()), span }.into()),
            other => Err(RuntimeError::TypeMismatch { expected: "a record".into(), found: other.type_name(), span }.into()),
        }
    }

    fn eval_index(&mut self, object: &Expr, index: &Expr, env: &Environment, span: Span) -> Flow<Value> {
        let obj = self.eval_expr(object, env)?;
        let idx = self.eval_expr(index, env)?;
        match (&obj, &idx) {
            (Value::Array(items), Value::Int(i)) => {
                let items = items.borrow();
                let idx = normalize_index(*i, items.len(), span)?;
                Ok(items[idx].clone())
            }
            (Value::Str(s), Value::Int(i)) => {
                let chars: Vec<char> = s.chars().collect();
                let idx = normalize_index(*i, chars.len(), span)?;
                Ok(Value::Char(chars[idx]))
            }
            _ => Err(RuntimeError::TypeMismatch { expected: "an array or string".into(), found: obj.type_name(), span }.into()),
        }
    }

    fn eval_tuple_index(&mut self, object: &Expr, index: u32, env: &Environment, span: Span) -> Flow<Value> {
        let obj = self.eval_expr(object, env)?;
        match &obj {
            Value::Tuple(elems) => elems
                .get(index as usize)
                .cloned()
                .ok_or_else(|| RuntimeError::InvalidOperation { message: format!("tuple index {index} out of bounds"), span }.into()),
            other => Err(RuntimeError::TypeMismatch { expected: "a tuple".into(), found: other.type_name(), span }.into()),
        }
    }

    /// `Self { .. }` inside an `impl` block resolves through
    /// `self_type_stack`; a record-shaped sum-type variant resolves
    /// through `variant_owner` to decide whether to build a
    /// [`Value::Record`] or a [`Value::Variant`], mirroring
    /// `check_record_literal`'s product-type-then-variant fallback.
    fn eval_record(&mut self, type_name: Option<&str>, fields: &[(String, Expr)], env: &Environment, _span: Span) -> Flow<Value> {
        let mut vals = Vec::with_capacity(fields.len());
        for (name, fexpr) in fields {
            vals.push((name.clone(), self.eval_expr(fexpr, env)?));
        }
        let resolved_name = type_name.map(|n| {
            if n == "Self" {
                self.self_type_stack.last().cloned().unwrap_or_else(|| n.to_string())
            } else {
                n.to_string()
            }
        });
        match resolved_name {
            Some(tn) => match self.variant_owner.get(&tn).cloned() {
                Some(owner) => Ok(Value::Variant { type_name: owner, variant: tn, data: VariantData::Record(vals) }),
                None => Ok(Value::record(Some(tn), vals)),
            },
            None => Ok(Value::record(None, vals)),
        }
    }

    fn eval_variant_constructor(&mut self, name: &str, args: &[Expr], env: &Environment, _span: Span) -> Flow<Value> {
        match name {
            "Some" => Ok(Value::Option(Some(Box::new(self.eval_expr(&args[0], env)?)))),
            "None" => Ok(Value::Option(None)),
            "Ok" => Ok(Value::Result(Ok(Box::new(self.eval_expr(&args[0], env)?)))),
            "Err" => Ok(Value::Result(Err(Box::new(self.eval_expr(&args[0], env)?)))),
            _ => {
                let mut vals = Vec::with_capacity(args.len());
                for a in args {
                    vals.push(self.eval_expr(a, env)?);
                }
                let owner = self.variant_owner.get(name).cloned().unwrap_or_else(|| name.to_string());
                let data = if vals.is_empty() { VariantData::Unit } else { VariantData::Tuple(vals) };
                Ok(Value::Variant { type_name: owner, variant: name.to_string(), data })
            }
        }
    }

    fn eval_cast(&mut self, operand: &Expr, target: &Type, env: &Environment, span: Span) -> Flow<Value> {
        let v = self.eval_expr(operand, env)?;
        let target_name = type_name_of_type(target).unwrap_or_default();
        cast_value(v, &target_name, span).map_err(Unwind::from)
    }

    fn eval_try(&mut self, inner: &Expr, env: &Environment, span: Span) -> Flow<Value> {
        match self.eval_expr(inner, env)? {
            Value::Option(Some(inner)) => Ok(*inner),
            Value::Option(None) => Err(Unwind::Return(Value::Option(None))),
            Value::Result(Ok(inner)) => Ok(*inner),
            err @ Value::Result(Err(_)) => Err(Unwind::Return(err)),
            other => Err(RuntimeError::TypeMismatch { expected: "option or result".into(), found: other.type_name(), span }.into()),
        }
    }

    fn eval_match(&mut self, subject: &Expr, arms: &[MatchArm], env: &Environment, span: Span) -> Flow<Value> {
        let subject_val = self.eval_expr(subject, env)?;
        for arm in arms {
            let arm_env = env.child();
            if self.match_pattern(&arm.pattern, &subject_val, &arm_env)? {
                if let Some(guard) = &arm.guard {
                    if !self.eval_expr(guard, &arm_env)?.is_truthy() {
                        continue;
                    }
                }
                return self.exec_stmts_in_scope(&arm.body, &arm_env);
            }
        }
        Err(RuntimeError::InvalidOperation { message: "no match arm matched a checker-verified exhaustive match".into(), span }.into())
    }

    /// Tries `pattern` against `value`, binding names into `env` as it
    /// goes. Guard evaluation happens in `eval_match` once the base
    /// pattern (without its own `if`) has already matched, matching
    /// `Pattern::Guarded`'s shape.
    fn match_pattern(&mut self, pattern: &Pattern, value: &Value, env: &Environment) -> Flow<bool> {
        match pattern {
            Pattern::Wildcard { .. } => Ok(true),
            Pattern::Ident { name, .. } => {
                env.define(name, value.clone());
                Ok(true)
            }
            Pattern::Literal { kind, .. } => Ok(literal_matches(kind, value)),
            Pattern::Constructor { name, args, .. } => self.match_constructor_pattern(name, args, value, env),
            Pattern::Record { fields, .. } => self.match_record_pattern(fields, value, env),
            Pattern::Tuple { elements, .. } => {
                let Value::Tuple(elems) = value else { return Ok(false) };
                if elems.len() != elements.len() {
                    return Ok(false);
                }
                for (p, v) in elements.iter().zip(elems.iter()) {
                    if !self.match_pattern(p, v, env)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Pattern::Or { alternatives, .. } => {
                for alt in alternatives {
                    if self.match_pattern(alt, value, env)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Pattern::Guarded { pattern, guard, .. } => {
                if !self.match_pattern(pattern, value, env)? {
                    return Ok(false);
                }
                Ok(self.eval_expr(guard, env)?.is_truthy())
            }
            Pattern::Range { start, end, inclusive, .. } => Ok(range_pattern_matches(start.as_deref(), end.as_deref(), *inclusive, value)),
            Pattern::Rest { .. } => Ok(true),
            Pattern::Typed { pattern, .. } => self.match_pattern(pattern, value, env),
        }
    }

    fn match_constructor_pattern(&mut self, name: &str, args: &ConstructorArgs, value: &Value, env: &Environment) -> Flow<bool> {
        match name {
            "Some" => match (value, args) {
                (Value::Option(Some(inner)), ConstructorArgs::Positional(pats)) if pats.len() == 1 => self.match_pattern(&pats[0], inner, env),
                (Value::Option(Some(_)), _) => Ok(true),
                _ => Ok(false),
            },
            "None" => Ok(matches!(value, Value::Option(None))),
            "Ok" => match (value, args) {
                (Value::Result(Ok(inner)), ConstructorArgs::Positional(pats)) if pats.len() == 1 => self.match_pattern(&pats[0], inner, env),
                (Value::Result(Ok(_)), _) => Ok(true),
                _ => Ok(false),
            },
            "Err" => match (value, args) {
                (Value::Result(Err(inner)), ConstructorArgs::Positional(pats)) if pats.len() == 1 => self.match_pattern(&pats[0], inner, env),
                (Value::Result(Err(_)), _) => Ok(true),
                _ => Ok(false),
            },
            _ => {
                let Value::Variant { variant, data, .. } = value else { return Ok(false) };
                if variant != name {
                    return Ok(false);
                }
                match (args, data) {
                    (ConstructorArgs::None, VariantData::Unit) => Ok(true),
                    (ConstructorArgs::Positional(pats), VariantData::Tuple(vals)) => {
                        if pats.len() != vals.len() {
                            return Ok(false);
                        }
                        for (p, v) in pats.iter().zip(vals.iter()) {
                            if !self.match_pattern(p, v, env)? {
                                return Ok(false);
                            }
                        }
                        Ok(true)
                    }
                    (ConstructorArgs::Named(pairs), VariantData::Record(fields)) => {
                        for (fname, fpat) in pairs {
                            let Some((_, fval)) = fields.iter().find(|(n, _)| n == fname) else { return Ok(false) };
                            if !self.match_pattern(fpat, fval, env)? {
                                return Ok(false);
                            }
                        }
                        Ok(true)
                    }
                    _ => Ok(false),
                }
            }
        }
    }

    fn match_record_pattern(&mut self, fields: &[(String, Pattern)], value: &Value, env: &Environment) -> Flow<bool> {
        let Value::Record { fields: rec_fields, .. } = value else { return Ok(false) };
        let rec_fields = rec_fields.borrow();
        for (fname, fpat) in fields {
            let Some((_, fval)) = rec_fields.iter().find(|(n, _)| n == fname) else { return Ok(false) };
            if !self.match_pattern(fpat, fval, env)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

fn normalize_index(i: i128, len: usize, span: Span) -> Result<usize, RuntimeError> {
    if i < 0 || i as usize >= len {
        return Err(RuntimeError::InvalidOperation { message: format!("index {i} out of bounds (length {len})"), span });
    }
    Ok(i as usize)
}

fn literal_value(lit: &LiteralPat) -> Value {
    match lit {
        LiteralPat::Int(v) => Value::Int(*v),
        LiteralPat::Float(v) => Value::Float(*v),
        LiteralPat::Bool(v) => Value::Bool(*v),
        LiteralPat::Char(v) => Value::Char(*v),
        LiteralPat::String(v) => Value::str(v.clone()),
    }
}

fn literal_matches(lit: &LiteralPat, value: &Value) -> bool {
    match (lit, value) {
        (LiteralPat::Int(a), Value::Int(b)) => a == b,
        (LiteralPat::Float(a), Value::Float(b)) => a == b,
        (LiteralPat::Bool(a), Value::Bool(b)) => a == b,
        (LiteralPat::Char(a), Value::Char(b)) => a == b,
        (LiteralPat::String(a), Value::Str(b)) => a.as_str() == b.as_str(),
        _ => false,
    }
}

fn pattern_int_literal(pattern: &Pattern) -> Option<i128> {
    match pattern {
        Pattern::Literal { kind: LiteralPat::Int(v), .. } => Some(*v),
        _ => None,
    }
}

fn range_pattern_matches(start: Option<&Pattern>, end: Option<&Pattern>, inclusive: bool, value: &Value) -> bool {
    let Value::Int(n) = value else { return false };
    if let Some(lo) = start.and_then(pattern_int_literal) {
        if *n < lo {
            return false;
        }
    }
    if let Some(hi) = end.and_then(pattern_int_literal) {
        if inclusive {
            if *n > hi {
                return false;
            }
        } else if *n >= hi {
            return false;
        }
    }
    true
}

/// `x is TypeOrVariantName`, matching a sum-type variant tag, an
/// `Option`/`Result` case name, or a primitive type's short name.
fn value_is(value: &Value, name: &str) -> bool {
    match value {
        Value::Variant { type_name, variant, .. } => variant == name || type_name == name,
        Value::Option(Some(_)) => name == "Some",
        Value::Option(None) => name == "None",
        Value::Result(Ok(_)) => name == "Ok",
        Value::Result(Err(_)) => name == "Err",
        other => other.type_name() == name,
    }
}

fn apply_binary(op: BinaryOp, l: Value, r: Value, span: Span) -> Result<Value, RuntimeError> {
    match op {
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => numeric_op(op, l, r, span),
        BinaryOp::Eq => Ok(Value::Bool(l == r)),
        BinaryOp::NotEq => Ok(Value::Bool(l != r)),
        BinaryOp::Lt | BinaryOp::Gt | BinaryOp::LtEq | BinaryOp::GtEq => compare_op(op, l, r, span),
        BinaryOp::And | BinaryOp::Or | BinaryOp::Is | BinaryOp::In => unreachable!("handled in eval_binary before values are computed"),
    }
}

fn numeric_op(op: BinaryOp, l: Value, r: Value, span: Span) -> Result<Value, RuntimeError> {
    match (l, r) {
        (Value::Int(a), Value::Int(b)) => match op {
            BinaryOp::Add => Ok(Value::Int(a.wrapping_add(b))),
            BinaryOp::Sub => Ok(Value::Int(a.wrapping_sub(b))),
            BinaryOp::Mul => Ok(Value::Int(a.wrapping_mul(b))),
            BinaryOp::Div if b == 0 => Err(RuntimeError::InvalidOperation { message: "division by zero".into(), span }),
            BinaryOp::Div => Ok(Value::Int(a.wrapping_div(b))),
            BinaryOp::Rem if b == 0 => Err(RuntimeError::InvalidOperation { message: "division by zero".into(), span }),
            BinaryOp::Rem => Ok(Value::Int(a.wrapping_rem(b))),
            _ => unreachable!(),
        },
        (Value::Float(a), Value::Float(b)) => match op {
            BinaryOp::Add => Ok(Value::Float(a + b)),
            BinaryOp::Sub => Ok(Value::Float(a - b)),
            BinaryOp::Mul => Ok(Value::Float(a * b)),
            BinaryOp::Div => Ok(Value::Float(a / b)),
            BinaryOp::Rem => Ok(Value::Float(a % b)),
            _ => unreachable!(),
        },
        (l, r) => Err(RuntimeError::TypeMismatch {
            expected: "two numbers of the same type".into(),
            found: format!("{} and {}", l.type_name(), r.type_name()),
            span,
        }),
    }
}

fn compare_op(op: BinaryOp, l: Value, r: Value, span: Span) -> Result<Value, RuntimeError> {
    let ordering = match (&l, &r) {
        (Value::Int(a), Value::Int(b)) => a.cmp(b),
        (Value::Float(a), Value::Float(b)) => {
            a.partial_cmp(b).ok_or_else(|| RuntimeError::InvalidOperation { message: "comparison produced NaN".into(), span })?
        }
        (Value::Char(a), Value::Char(b)) => a.cmp(b),
        (Value::Str(a), Value::Str(b)) => a.cmp(b),
        _ => {
            return Err(RuntimeError::TypeMismatch {
                expected: "two comparable values of the same type".into(),
                found: format!("{} and {}", l.type_name(), r.type_name()),
                span,
            })
        }
    };
    let result = match op {
        BinaryOp::Lt => ordering.is_lt(),
        BinaryOp::Gt => ordering.is_gt(),
        BinaryOp::LtEq => ordering.is_le(),
        BinaryOp::GtEq => ordering.is_ge(),
        _ => unreachable!(),
    };
    Ok(Value::Bool(result))
}

fn cast_value(v: Value, target_name: &str, span: Span) -> Result<Value, RuntimeError> {
    let result = match (&v, target_name) {
        (Value::Int(n), "f32" | "f64") => Value::Float(*n as f64),
        (Value::Int(n), "i8") => Value::Int(*n as i8 as i128),
        (Value::Int(n), "i16") => Value::Int(*n as i16 as i128),
        (Value::Int(n), "i32") => Value::Int(*n as i32 as i128),
        (Value::Int(n), "i64") => Value::Int(*n as i64 as i128),
        (Value::Int(n), "i128") => Value::Int(*n),
        (Value::Int(n), "u8") => Value::Int(*n as u8 as i128),
        (Value::Int(n), "u16") => Value::Int(*n as u16 as i128),
        (Value::Int(n), "u32") => Value::Int(*n as u32 as i128),
        (Value::Int(n), "u64") => Value::Int(*n as u64 as i128),
        (Value::Int(n), "u128") => Value::Int(*n as u128 as i128),
        (Value::Int(n), "char") => {
            char::from_u32(*n as u32).map(Value::Char).ok_or_else(|| RuntimeError::InvalidCast { message: format!("{n} is not a valid char"), span })?
        }
        (Value::Float(n), "f32" | "f64") => Value::Float(*n),
        (Value::Float(n), "i8") => Value::Int(*n as i8 as i128),
        (Value::Float(n), "i16") => Value::Int(*n as i16 as i128),
        (Value::Float(n), "i32") => Value::Int(*n as i32 as i128),
        (Value::Float(n), "i64") => Value::Int(*n as i64 as i128),
        (Value::Float(n), "i128") => Value::Int(*n as i128),
        (Value::Float(n), "u8") => Value::Int(*n as u8 as i128),
        (Value::Float(n), "u16") => Value::Int(*n as u16 as i128),
        (Value::Float(n), "u32") => Value::Int(*n as u32 as i128),
        (Value::Float(n), "u64") => Value::Int(*n as u64 as i128),
        (Value::Float(n), "u128") => Value::Int(*n as u128 as i128),
        (Value::Char(c), "i8") => Value::Int(*c as i8 as i128),
        (Value::Char(c), "i16") => Value::Int(*c as i16 as i128),
        (Value::Char(c), "i32" | "i64" | "i128" | "u32" | "u64" | "u128") => Value::Int(*c as i128),
        (Value::Char(c), "u8") => Value::Int(*c as u8 as i128),
        (Value::Char(c), "u16") => Value::Int(*c as u16 as i128),
        (other, _) => return Err(RuntimeError::InvalidCast { message: format!("cannot cast `{}` as `{target_name}`", other.type_name()), span }),
    };
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(src: &str) -> (Program, Interpreter) {
        let parsed = kira_parser::parse(src);
        assert!(parsed.errors.is_empty(), "parse errors: {:?}", parsed.errors);
        (parsed.program, Interpreter::new(BuiltinContext::default()))
    }

    #[test]
    fn arithmetic_function_call_returns_the_sum() {
        let (program, mut interp) = load("fn add(a: i32, b: i32) -> i32 {\n  return a + b\n}\n\neffect fn main() -> i32 {\n  return add(2, 3)\n}\n");
        assert_eq!(interp.run(&program).unwrap(), Value::Int(5));
    }

    #[test]
    fn closures_capture_their_defining_scope() {
        let (program, mut interp) = load(
            "fn make_adder(n: i32) -> fn(i32) -> i32 {\n  return fn(x: i32) -> i32 { return x + n }\n}\n\neffect fn main() -> i32 {\n  let add5: fn(i32) -> i32 = make_adder(5)\n  return add5(10)\n}\n",
        );
        assert_eq!(interp.run(&program).unwrap(), Value::Int(15));
    }

    #[test]
    fn record_field_access_reads_the_bound_value() {
        let (program, mut interp) = load(
            "type Point {\n  x: f64,\n  y: f64\n}\n\neffect fn main() -> f64 {\n  let p: Point = Point { x: 1.0, y: 2.0 }\n  return p.x + p.y\n}\n",
        );
        assert_eq!(interp.run(&program).unwrap(), Value::Float(3.0));
    }

    #[test]
    fn match_dispatches_on_sum_type_variants() {
        let (program, mut interp) = load(
            "type Shape =\n  Circle(f64)\n  | Point { x: f64, y: f64 }\n  | Nil\n\nfn area(s: Shape) -> f64 {\n  return match s {\n    Circle(r) => { r * r }\n    Point { x, y } => { x * y }\n    Nil => { 0.0 }\n  }\n}\n\neffect fn main() -> f64 {\n  return area(Circle(2.0)) + area(Point { x: 2.0, y: 3.0 }) + area(Nil)\n}\n",
        );
        assert_eq!(interp.run(&program).unwrap(), Value::Float(10.0));
    }

    #[test]
    fn for_loop_accumulates_over_an_array() {
        let (program, mut interp) = load(
            "effect fn main() -> i32 {\n  var total: i32 = 0\n  for n in [1, 2, 3] {\n    total = total + n\n  }\n  return total\n}\n",
        );
        assert_eq!(interp.run(&program).unwrap(), Value::Int(6));
    }

    #[test]
    fn try_operator_short_circuits_on_none() {
        let (program, mut interp) = load(
            "fn first(xs: [i32]) -> option[i32] {\n  return None\n}\n\nfn describe(xs: [i32]) -> option[i32] {\n  let head: i32 = first(xs)?\n  return Some(head)\n}\n\neffect fn main() -> option[i32] {\n  return describe([1, 2])\n}\n",
        );
        assert_eq!(interp.run(&program).unwrap(), Value::Option(None));
    }

    #[test]
    fn method_call_binds_self_to_the_receiver() {
        let (program, mut interp) = load(
            "type Point {\n  x: f64,\n  y: f64\n}\n\nimpl Point {\n  fn sum(self) -> f64 {\n    return self.x + self.y\n  }\n}\n\neffect fn main() -> f64 {\n  let p: Point = Point { x: 4.0, y: 6.0 }\n  return p.sum()\n}\n",
        );
        assert_eq!(interp.run(&program).unwrap(), Value::Float(10.0));
    }

    #[test]
    fn undefined_main_is_reported_as_a_runtime_error() {
        let (program, mut interp) = load("fn helper() -> i32 {\n  return 1\n}\n");
        let err = interp.run(&program).unwrap_err();
        assert!(matches!(err, RuntimeError::InvalidOperation { .. }));
    }

    #[test]
    fn division_by_zero_raises_invalid_operation() {
        let (program, mut interp) = load("effect fn main() -> i32 {\n  return 1 / 0\n}\n");
        let err = interp.run(&program).unwrap_err();
        assert!(matches!(err, RuntimeError::InvalidOperation { .. }));
    }
}
