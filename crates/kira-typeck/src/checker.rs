//! Walks the resolved AST once, top-down, assigning a [`ResolvedType`] to
//! every expression and enforcing the effect-discipline contract. Grounded
//! on `snow-typeck/src/infer.rs`'s dispatcher shape (`infer_expr` matching
//! every `Expr` variant, an explicit environment threaded through every
//! call) with the constraint-solving machinery removed: there are no fresh
//! type variables or a union-find to resolve through, since every binding
//! already carries an explicit, fully [`kira_resolve`]-resolved annotation.
//!
//! The symbol table handed in has already been built by
//! [`kira_resolve::resolve_program`]; this module re-walks the same
//! declarations to check bodies the resolver never visits. Module- and
//! type-level scopes the resolver created are re-entered with
//! [`kira_resolve::SymbolTable::enter_existing_scope`]; function and impl
//! bodies get fresh scopes of their own, since the resolver's per-function
//! scope existed only to hold type parameters and was discarded once the
//! signature was resolved.

use rustc_hash::FxHashMap;

use kira_common::{Diagnostic, Span};
use kira_parser::ast::expr::{BinaryOp, Expr, ExprKind, StringPart, UnaryOp};
use kira_parser::ast::item::{Decl, DeclKind, MatchArm, Param, Stmt, StmtKind};
use kira_parser::ast::pat::{ConstructorArgs, LiteralPat, Pattern};
use kira_parser::ast::ty::Type;
use kira_parser::ast::Program;

use kira_resolve::resolve::resolve_type_in_scope;
use kira_resolve::{
    FunctionSig, PrimitiveType, ResolveError, ResolvedType, ScopeKind, Substitution, Symbol, SymbolId, SymbolKind,
    SymbolTable, TypeDefKind, VariantFieldsSig, VariantSig, instantiate,
};

use crate::error::TypeError;
use crate::pattern::{check_exhaustiveness, check_redundancy, PatternSpace, SubjectType};
use crate::unify::{get_iterable_element, is_assignable, is_comparable, is_equatable, is_iterable, is_valid_cast, types_equal};

/// Checks an entire program against a symbol table the resolver already
/// populated, returning that same table (mutated with body-local scopes
/// that only existed for the duration of the check) and every diagnostic
/// raised along the way.
pub fn check_program(table: SymbolTable, program: &Program) -> (SymbolTable, Vec<Diagnostic>) {
    let mut checker = Checker::new(table);
    checker.index_variants();
    checker.index_impls(&program.decls);
    checker.check_decls(&program.decls);
    (checker.table, checker.diagnostics)
}

struct Checker {
    table: SymbolTable,
    diagnostics: Vec<Diagnostic>,
    /// Whether the function/closure currently being checked is `effect`.
    effect_stack: Vec<bool>,
    /// The declared return type of the function/closure currently being
    /// checked, consulted by `return` and `?`.
    return_stack: Vec<ResolvedType>,
    /// The concrete type `Self` refers to, pushed on entering an `impl`.
    self_type_stack: Vec<ResolvedType>,
    /// Every sum-type variant name in the program, for constructor and
    /// pattern lookups that aren't qualified by their parent type.
    variants: FxHashMap<String, (SymbolId, VariantSig)>,
    /// `target type name -> method name -> signature`, built by scanning
    /// `impl` blocks once up front; the table itself has no such index
    /// since an impl's scope is entered and left without being kept.
    methods: FxHashMap<String, FxHashMap<String, FunctionSig>>,
}

impl Checker {
    fn new(table: SymbolTable) -> Self {
        Self {
            table,
            diagnostics: Vec::new(),
            effect_stack: Vec::new(),
            return_stack: Vec::new(),
            self_type_stack: Vec::new(),
            variants: FxHashMap::default(),
            methods: FxHashMap::default(),
        }
    }

    fn error(&mut self, err: TypeError) {
        self.diagnostics.push(err.to_diagnostic());
    }

    fn resolve_error(&mut self, err: ResolveError) {
        self.diagnostics.push(err.to_diagnostic());
    }

    fn current_is_effect(&self) -> bool {
        *self.effect_stack.last().unwrap_or(&false)
    }

    fn index_variants(&mut self) {
        for sym in self.table.all_symbols().to_vec() {
            if let SymbolKind::TypeDef { kind: TypeDefKind::Sum { variants }, .. } = &sym.kind {
                for v in variants {
                    self.variants.insert(v.name.clone(), (sym.id, v.clone()));
                }
            }
        }
    }

    /// Scans every `impl` block (including ones nested in modules) up front
    /// so method calls can be resolved regardless of declaration order.
    /// Resolution errors surfacing here are discarded; the main walk visits
    /// the same signatures again and reports them once.
    fn index_impls(&mut self, decls: &[Decl]) {
        for decl in decls {
            match &decl.kind {
                DeclKind::Module { decls, .. } => self.index_impls(decls),
                DeclKind::Impl { type_params, target, methods, .. } => {
                    let Some(target_name) = type_name_of_type(target) else { continue };
                    self.table.enter_scope(ScopeKind::Impl);
                    for tp in type_params {
                        let _ =
                            self.table.define(&tp.name, SymbolKind::TypeParam { constraints: tp.constraints.clone() }, tp.span, false);
                    }
                    let entry = self.methods.entry(target_name).or_default();
                    for m in methods {
                        if let DeclKind::Fn { name, type_params: fn_type_params, params, ret, is_effect, .. } = &m.kind {
                            self.table.enter_scope(ScopeKind::Function);
                            for tp in fn_type_params {
                                let _ = self.table.define(
                                    &tp.name,
                                    SymbolKind::TypeParam { constraints: tp.constraints.clone() },
                                    tp.span,
                                    false,
                                );
                            }
                            let param_tys: Vec<ResolvedType> =
                                params.iter().map(|p| resolve_type_in_scope(&self.table, &p.ty).0).collect();
                            let ret_ty = resolve_type_in_scope(&self.table, ret).0;
                            self.table.leave_scope();
                            entry.insert(
                                name.clone(),
                                FunctionSig {
                                    params: param_tys,
                                    ret: ret_ty,
                                    is_effect: *is_effect,
                                    type_params: fn_type_params.iter().map(|t| t.name.clone()).collect(),
                                },
                            );
                        }
                    }
                    self.table.leave_scope();
                }
                _ => {}
            }
        }
    }

    fn check_decls(&mut self, decls: &[Decl]) {
        for decl in decls {
            self.check_decl(decl);
        }
    }

    fn check_decl(&mut self, decl: &Decl) {
        match &decl.kind {
            DeclKind::Module { name, decls } => {
                let scope_id = match self.table.lookup(name) {
                    Some(Symbol { kind: SymbolKind::Module { scope_id }, .. }) => *scope_id,
                    _ => return,
                };
                self.table.enter_existing_scope(scope_id);
                self.check_decls(decls);
                self.table.leave_scope();
            }
            DeclKind::Import { .. } => {}
            DeclKind::SumType { .. } | DeclKind::ProductType { .. } | DeclKind::TypeAlias { .. } | DeclKind::Trait { .. } => {
                // Already fully resolved; no executable body to check.
            }
            DeclKind::Fn { name, type_params, params, ret, is_effect, body } => {
                self.table.enter_scope(ScopeKind::Function);
                for tp in type_params {
                    let _ =
                        self.table.define(&tp.name, SymbolKind::TypeParam { constraints: tp.constraints.clone() }, tp.span, false);
                }
                let mut param_tys = Vec::new();
                for p in params {
                    let (t, errs) = resolve_type_in_scope(&self.table, &p.ty);
                    for e in errs {
                        self.resolve_error(e);
                    }
                    let bound = substitute_self(&t, self.self_type_stack.last());
                    let _ = self.table.define(&p.name, SymbolKind::Variable { ty: bound.clone(), is_mut: false }, p.span, false);
                    param_tys.push(bound);
                }
                let (ret_raw, errs) = resolve_type_in_scope(&self.table, ret);
                for e in errs {
                    self.resolve_error(e);
                }
                let ret_ty = substitute_self(&ret_raw, self.self_type_stack.last());

                if name == "main" && !*is_effect {
                    self.error(TypeError::EffectViolation { message: "`main` must be declared `effect`".into(), span: decl.span });
                }

                self.effect_stack.push(*is_effect);
                self.return_stack.push(ret_ty.clone());
                let body_ty = self.check_stmts_in_scope(body);
                self.return_stack.pop();
                self.effect_stack.pop();
                self.table.leave_scope();

                if !matches!(ret_ty, ResolvedType::Void) && !is_assignable(&ret_ty, &body_ty) {
                    self.error(TypeError::Mismatch { expected: ret_ty, found: body_ty, span: decl.span });
                }
            }
            DeclKind::Const { ty, value, .. } => {
                let (resolved, errs) = resolve_type_in_scope(&self.table, ty);
                for e in errs {
                    self.resolve_error(e);
                }
                let value_ty = self.check_expr(value);
                if !is_assignable(&resolved, &value_ty) {
                    self.error(TypeError::Mismatch { expected: resolved, found: value_ty, span: decl.span });
                }
            }
            DeclKind::Let { pattern, ty, value } => {
                let (resolved, errs) = resolve_type_in_scope(&self.table, ty);
                for e in errs {
                    self.resolve_error(e);
                }
                let value_ty = self.check_expr(value);
                if !is_assignable(&resolved, &value_ty) {
                    self.error(TypeError::Mismatch { expected: resolved.clone(), found: value_ty, span: decl.span });
                }
                // A bare `Ident` pattern was already bound by the resolver;
                // anything more structured (tuple/record destructuring) was
                // not, so bind it here.
                if !matches!(pattern, Pattern::Ident { .. }) {
                    let _ = self.check_pattern(pattern, &resolved);
                }
            }
            DeclKind::Impl { type_params, target, methods, .. } => {
                self.table.enter_scope(ScopeKind::Impl);
                for tp in type_params {
                    let _ =
                        self.table.define(&tp.name, SymbolKind::TypeParam { constraints: tp.constraints.clone() }, tp.span, false);
                }
                let (target_ty, errs) = resolve_type_in_scope(&self.table, target);
                for e in errs {
                    self.resolve_error(e);
                }
                self.self_type_stack.push(target_ty);
                self.check_decls(methods);
                self.self_type_stack.pop();
                self.table.leave_scope();
            }
            DeclKind::Test { body, .. } => {
                self.table.enter_scope(ScopeKind::Function);
                self.effect_stack.push(true);
                self.return_stack.push(ResolvedType::Void);
                self.check_stmts_in_scope(body);
                self.return_stack.pop();
                self.effect_stack.pop();
                self.table.leave_scope();
            }
        }
    }

    fn check_block(&mut self, stmts: &[Stmt]) -> ResolvedType {
        self.table.enter_scope(ScopeKind::Block);
        let ty = self.check_stmts_in_scope(stmts);
        self.table.leave_scope();
        ty
    }

    /// Checks every statement in the *current* scope (the caller owns
    /// entering/leaving it), returning the tail expression's type if the
    /// last statement is a bare `Expr`, or `Void` otherwise.
    fn check_stmts_in_scope(&mut self, stmts: &[Stmt]) -> ResolvedType {
        let mut result = ResolvedType::Void;
        for (i, stmt) in stmts.iter().enumerate() {
            if i + 1 == stmts.len() {
                if let StmtKind::Expr(e) = &stmt.kind {
                    result = self.check_expr(e);
                    continue;
                }
            }
            self.check_stmt(stmt);
        }
        result
    }

    fn check_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Let { pattern, ty, value } => {
                let (resolved, errs) = resolve_type_in_scope(&self.table, ty);
                for e in errs {
                    self.resolve_error(e);
                }
                let value_ty = self.check_expr(value);
                if !is_assignable(&resolved, &value_ty) {
                    self.error(TypeError::Mismatch { expected: resolved.clone(), found: value_ty, span: stmt.span });
                }
                let _ = self.check_pattern(pattern, &resolved);
            }
            StmtKind::Var { name, ty, value } => {
                let declared = ty.as_ref().map(|t| {
                    let (r, errs) = resolve_type_in_scope(&self.table, t);
                    for e in errs {
                        self.resolve_error(e);
                    }
                    r
                });
                let value_ty = value.as_ref().map(|v| self.check_expr(v));
                let bound_ty = match (&declared, &value_ty) {
                    (Some(d), Some(v)) => {
                        if !is_assignable(d, v) {
                            self.error(TypeError::Mismatch { expected: d.clone(), found: v.clone(), span: stmt.span });
                        }
                        d.clone()
                    }
                    (Some(d), None) => d.clone(),
                    (None, Some(v)) => v.clone(),
                    (None, None) => ResolvedType::Error,
                };
                let _ = self.table.define(name, SymbolKind::Variable { ty: bound_ty, is_mut: true }, stmt.span, false);
            }
            StmtKind::Assign { target, value } => {
                let target_ty = self.check_expr(target);
                let value_ty = self.check_expr(value);
                if !is_assignable(&target_ty, &value_ty) {
                    self.error(TypeError::Mismatch { expected: target_ty, found: value_ty, span: stmt.span });
                }
            }
            StmtKind::If { cond, then_branch, else_branch } => {
                let cond_ty = self.check_expr(cond);
                if !types_equal(&cond_ty, &ResolvedType::Primitive(PrimitiveType::Bool)) {
                    self.error(TypeError::Mismatch {
                        expected: ResolvedType::Primitive(PrimitiveType::Bool),
                        found: cond_ty,
                        span: cond.span,
                    });
                }
                self.check_block(then_branch);
                if let Some(else_b) = else_branch {
                    self.check_block(else_b);
                }
            }
            StmtKind::For { pattern, iterable, body } => {
                let iterable_ty = self.check_expr(iterable);
                let elem_ty = match get_iterable_element(&iterable_ty) {
                    Some(t) => t,
                    None => {
                        if !matches!(iterable_ty, ResolvedType::Error) {
                            self.error(TypeError::InvalidBinaryOperand { op: "in".into(), ty: iterable_ty, span: iterable.span });
                        }
                        ResolvedType::Error
                    }
                };
                self.table.enter_scope(ScopeKind::Block);
                let _ = self.check_pattern(pattern, &elem_ty);
                self.check_stmts_in_scope(body);
                self.table.leave_scope();
            }
            StmtKind::While { cond, body } => {
                let cond_ty = self.check_expr(cond);
                if !types_equal(&cond_ty, &ResolvedType::Primitive(PrimitiveType::Bool)) {
                    self.error(TypeError::Mismatch {
                        expected: ResolvedType::Primitive(PrimitiveType::Bool),
                        found: cond_ty,
                        span: cond.span,
                    });
                }
                self.check_block(body);
            }
            StmtKind::Loop { body } => {
                self.check_block(body);
            }
            StmtKind::Match { subject, arms } => {
                self.check_match(subject, arms, stmt.span);
            }
            StmtKind::Return { value } => {
                let expected = self.return_stack.last().cloned().unwrap_or(ResolvedType::Void);
                match value {
                    Some(v) => {
                        let vty = self.check_expr(v);
                        if !is_assignable(&expected, &vty) {
                            self.error(TypeError::Mismatch { expected, found: vty, span: stmt.span });
                        }
                    }
                    None if !matches!(expected, ResolvedType::Void) => {
                        self.error(TypeError::Mismatch { expected, found: ResolvedType::Void, span: stmt.span });
                    }
                    None => {}
                }
            }
            StmtKind::Break => {}
            StmtKind::Expr(e) => {
                self.check_expr(e);
            }
            StmtKind::Block(stmts) => {
                self.check_block(stmts);
            }
        }
    }

    fn check_expr(&mut self, expr: &Expr) -> ResolvedType {
        match &expr.kind {
            ExprKind::Literal(lit) => literal_type(lit),
            ExprKind::InterpolatedString(parts) => {
                for part in parts {
                    if let StringPart::Expr(e) = part {
                        self.check_expr(e);
                    }
                }
                ResolvedType::Primitive(PrimitiveType::String)
            }
            ExprKind::Ident(name) => self.check_ident(name, expr.span),
            ExprKind::SelfValue => self.check_ident("self", expr.span),
            ExprKind::SelfType => self.self_type_stack.last().cloned().unwrap_or(ResolvedType::SelfType),
            ExprKind::Binary { op, lhs, rhs } => self.check_binary(*op, lhs, rhs, expr.span),
            ExprKind::Unary { op, operand } => self.check_unary(*op, operand, expr.span),
            ExprKind::Field { object, field } => self.check_field_access(object, field, expr.span),
            ExprKind::Index { object, index } => self.check_index(object, index, expr.span),
            ExprKind::TupleIndex { object, index } => self.check_tuple_index(object, *index, expr.span),
            ExprKind::Call { callee, args } => self.check_call(callee, args, expr.span),
            ExprKind::MethodCall { receiver, method, args } => self.check_method_call(receiver, method, args, expr.span),
            ExprKind::Closure { params, ret, is_effect, body } => self.check_closure(params, ret.as_ref(), *is_effect, body),
            ExprKind::If { cond, then_branch, else_branch } => {
                self.check_if_expr(cond, then_branch, else_branch.as_deref(), expr.span)
            }
            ExprKind::Block(stmts) => self.check_block(stmts),
            ExprKind::Match { subject, arms } => self.check_match(subject, arms, expr.span),
            ExprKind::Tuple(elems) => ResolvedType::Tuple(elems.iter().map(|e| self.check_expr(e)).collect()),
            ExprKind::Array(elems) => self.check_array(elems),
            ExprKind::Record { type_name, fields } => self.check_record_literal(type_name.as_deref(), fields, expr.span),
            ExprKind::VariantConstructor { name, args } => self.check_variant_constructor(name, args, expr.span),
            ExprKind::Cast { operand, target } => self.check_cast(operand, target, expr.span),
            ExprKind::Range { start, end, inclusive: _ } => {
                if let Some(s) = start {
                    self.check_expr(s);
                }
                if let Some(e) = end {
                    self.check_expr(e);
                }
                ResolvedType::Array { element: Box::new(ResolvedType::Primitive(PrimitiveType::I32)), size: None }
            }
            ExprKind::Try(inner) => self.check_try(inner, expr.span),
            ExprKind::Coalesce { operand, default } => self.check_coalesce(operand, default, expr.span),
            ExprKind::Group(inner) => self.check_expr(inner),
        }
    }

    fn check_ident(&mut self, name: &str, span: Span) -> ResolvedType {
        let sym = if name.contains("::") {
            let segments: Vec<String> = name.split("::").map(|s| s.to_string()).collect();
            self.table.lookup_path(&segments).cloned()
        } else {
            self.table.lookup(name).cloned()
        };
        match sym {
            Some(Symbol { kind: SymbolKind::Variable { ty, .. }, .. }) => ty,
            Some(Symbol { kind: SymbolKind::Function(sig), .. }) => {
                ResolvedType::Function { params: sig.params, ret: Box::new(sig.ret), is_effect: sig.is_effect }
            }
            Some(_) => {
                self.error(TypeError::UndefinedSymbol { name: name.to_string(), span });
                ResolvedType::Error
            }
            // A bare capitalized name with no `(...)`/`{...}` parses as
            // `ExprKind::Ident`, same as `Nil` in `Circle(f64) | Nil` — the
            // parser can't tell a unit variant from a regular identifier
            // by shape alone. A non-unit variant referenced this way is
            // missing its constructor arguments.
            None => match self.variants.get(name).cloned() {
                Some((sum_symbol, sig)) => {
                    let expected = match &sig.fields {
                        VariantFieldsSig::Unit => 0,
                        VariantFieldsSig::Tuple(tys) => tys.len(),
                        VariantFieldsSig::Record(fields) => fields.len(),
                    };
                    if expected != 0 {
                        self.error(TypeError::WrongArgumentCount { expected, found: 0, span });
                    }
                    ResolvedType::Named { symbol: sum_symbol, name: name.to_string() }
                }
                None => {
                    self.error(TypeError::UndefinedSymbol { name: name.to_string(), span });
                    ResolvedType::Error
                }
            },
        }
    }

    fn check_binary(&mut self, op: BinaryOp, lhs: &Expr, rhs: &Expr, span: Span) -> ResolvedType {
        if op == BinaryOp::Is {
            self.check_expr(lhs);
            match type_name_of_expr(rhs) {
                Some(name) if self.table.lookup(&name).is_some() || PrimitiveType::from_name(&name).is_some() => {}
                _ => self.error(TypeError::UndefinedType { name: "<type>".into(), span: rhs.span }),
            }
            return ResolvedType::Primitive(PrimitiveType::Bool);
        }

        let lhs_ty = self.check_expr(lhs);
        let rhs_ty = self.check_expr(rhs);
        match op {
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
                if !is_numeric(&lhs_ty) || !types_equal(&lhs_ty, &rhs_ty) {
                    self.error(TypeError::InvalidBinaryOperand { op: binary_op_str(op).into(), ty: lhs_ty.clone(), span });
                }
                lhs_ty
            }
            BinaryOp::Eq | BinaryOp::NotEq => {
                if !is_equatable(&lhs_ty) || !types_equal(&lhs_ty, &rhs_ty) {
                    self.error(TypeError::InvalidBinaryOperand { op: binary_op_str(op).into(), ty: lhs_ty, span });
                }
                ResolvedType::Primitive(PrimitiveType::Bool)
            }
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::LtEq | BinaryOp::GtEq => {
                if !is_comparable(&lhs_ty) || !types_equal(&lhs_ty, &rhs_ty) {
                    self.error(TypeError::InvalidBinaryOperand { op: binary_op_str(op).into(), ty: lhs_ty, span });
                }
                ResolvedType::Primitive(PrimitiveType::Bool)
            }
            BinaryOp::And | BinaryOp::Or => {
                let bool_ty = ResolvedType::Primitive(PrimitiveType::Bool);
                if !types_equal(&lhs_ty, &bool_ty) || !types_equal(&rhs_ty, &bool_ty) {
                    self.error(TypeError::InvalidBinaryOperand { op: binary_op_str(op).into(), ty: lhs_ty, span });
                }
                bool_ty
            }
            BinaryOp::In => {
                if !is_iterable(&rhs_ty) {
                    self.error(TypeError::InvalidBinaryOperand { op: "in".into(), ty: rhs_ty, span });
                }
                ResolvedType::Primitive(PrimitiveType::Bool)
            }
            BinaryOp::Is => unreachable!("handled above"),
        }
    }

    fn check_unary(&mut self, op: UnaryOp, operand: &Expr, span: Span) -> ResolvedType {
        let ty = self.check_expr(operand);
        match op {
            UnaryOp::Neg => {
                if !is_numeric(&ty) {
                    self.error(TypeError::InvalidUnaryOperand { op: "-".into(), ty: ty.clone(), span });
                }
                ty
            }
            UnaryOp::Not => {
                if !types_equal(&ty, &ResolvedType::Primitive(PrimitiveType::Bool)) {
                    self.error(TypeError::InvalidUnaryOperand { op: "not".into(), ty, span });
                }
                ResolvedType::Primitive(PrimitiveType::Bool)
            }
        }
    }

    fn check_field_access(&mut self, object: &Expr, field: &str, span: Span) -> ResolvedType {
        let object_ty = self.check_expr(object);
        let resolved_object = substitute_self(&object_ty, self.self_type_stack.last());
        match &resolved_object {
            ResolvedType::Named { symbol, .. } => match &self.table.symbol(*symbol).kind {
                SymbolKind::TypeDef { kind: TypeDefKind::Product { fields }, .. } => match fields.iter().find(|(n, _)| n == field) {
                    Some((_, t)) => t.clone(),
                    None => {
                        self.error(TypeError::NoSuchField { ty: resolved_object.clone(), field: field.to_string(), span });
                        ResolvedType::Error
                    }
                },
                _ => {
                    self.error(TypeError::NoSuchField { ty: resolved_object.clone(), field: field.to_string(), span });
                    ResolvedType::Error
                }
            },
            ResolvedType::Instantiated { symbol, args, .. } => match &self.table.symbol(*symbol).kind {
                SymbolKind::TypeDef { kind: TypeDefKind::Product { fields }, type_params } => {
                    match fields.iter().find(|(n, _)| n == field) {
                        Some((_, t)) => {
                            let subst: Substitution = type_params.iter().cloned().zip(args.iter().cloned()).collect();
                            instantiate(t, &subst)
                        }
                        None => {
                            self.error(TypeError::NoSuchField { ty: resolved_object.clone(), field: field.to_string(), span });
                            ResolvedType::Error
                        }
                    }
                }
                _ => {
                    self.error(TypeError::NoSuchField { ty: resolved_object.clone(), field: field.to_string(), span });
                    ResolvedType::Error
                }
            },
            ResolvedType::Error => ResolvedType::Error,
            _ => {
                self.error(TypeError::NoSuchField { ty: resolved_object.clone(), field: field.to_string(), span });
                ResolvedType::Error
            }
        }
    }

    fn check_index(&mut self, object: &Expr, index: &Expr, span: Span) -> ResolvedType {
        let object_ty = self.check_expr(object);
        let index_ty = self.check_expr(index);
        if !is_numeric(&index_ty) {
            self.error(TypeError::Mismatch { expected: ResolvedType::Primitive(PrimitiveType::I32), found: index_ty, span: index.span });
        }
        match get_iterable_element(&object_ty) {
            Some(t) => t,
            None => {
                if !matches!(object_ty, ResolvedType::Error) {
                    self.error(TypeError::NoSuchField { ty: object_ty, field: "[]".into(), span });
                }
                ResolvedType::Error
            }
        }
    }

    fn check_tuple_index(&mut self, object: &Expr, index: u32, span: Span) -> ResolvedType {
        let object_ty = self.check_expr(object);
        match &object_ty {
            ResolvedType::Tuple(elems) => match elems.get(index as usize) {
                Some(t) => t.clone(),
                None => {
                    self.error(TypeError::NoSuchField { ty: object_ty.clone(), field: index.to_string(), span });
                    ResolvedType::Error
                }
            },
            ResolvedType::Error => ResolvedType::Error,
            _ => {
                self.error(TypeError::NoSuchField { ty: object_ty.clone(), field: index.to_string(), span });
                ResolvedType::Error
            }
        }
    }

    fn check_call(&mut self, callee: &Expr, args: &[Expr], span: Span) -> ResolvedType {
        let callee_ty = self.check_expr(callee);
        match callee_ty {
            ResolvedType::Function { params, ret, is_effect } => {
                if is_effect && !self.current_is_effect() {
                    self.error(TypeError::EffectViolation {
                        message: "calling an effect function from a pure context".into(),
                        span,
                    });
                }
                if params.len() != args.len() {
                    self.error(TypeError::WrongArgumentCount { expected: params.len(), found: args.len(), span });
                }
                for (p, a) in params.iter().zip(args.iter()) {
                    let a_ty = self.check_expr(a);
                    if !is_assignable(p, &a_ty) {
                        self.error(TypeError::Mismatch { expected: p.clone(), found: a_ty, span: a.span });
                    }
                }
                if args.len() > params.len() {
                    for a in &args[params.len()..] {
                        self.check_expr(a);
                    }
                }
                *ret
            }
            ResolvedType::Error => {
                for a in args {
                    self.check_expr(a);
                }
                ResolvedType::Error
            }
            other => {
                for a in args {
                    self.check_expr(a);
                }
                self.error(TypeError::NotCallable { ty: other, span });
                ResolvedType::Error
            }
        }
    }

    fn check_method_call(&mut self, receiver: &Expr, method: &str, args: &[Expr], span: Span) -> ResolvedType {
        let receiver_ty = self.check_expr(receiver);
        let resolved_receiver = substitute_self(&receiver_ty, self.self_type_stack.last());
        let target_name = type_name_for_methods(&resolved_receiver);
        let sig = target_name.as_ref().and_then(|n| self.methods.get(n)).and_then(|m| m.get(method)).cloned();
        match sig {
            Some(sig) => {
                if sig.is_effect && !self.current_is_effect() {
                    self.error(TypeError::EffectViolation {
                        message: format!("calling effect method `{method}` from a pure context"),
                        span,
                    });
                }
                let expected_params: &[ResolvedType] = if matches!(sig.params.first(), Some(ResolvedType::SelfType)) {
                    &sig.params[1..]
                } else {
                    &sig.params[..]
                };
                if expected_params.len() != args.len() {
                    self.error(TypeError::WrongArgumentCount { expected: expected_params.len(), found: args.len(), span });
                }
                for (p, a) in expected_params.iter().zip(args.iter()) {
                    let a_ty = self.check_expr(a);
                    let expected = substitute_self(p, Some(&resolved_receiver));
                    if !is_assignable(&expected, &a_ty) {
                        self.error(TypeError::Mismatch { expected, found: a_ty, span: a.span });
                    }
                }
                if args.len() > expected_params.len() {
                    for a in &args[expected_params.len()..] {
                        self.check_expr(a);
                    }
                }
                substitute_self(&sig.ret, Some(&resolved_receiver))
            }
            None => {
                for a in args {
                    self.check_expr(a);
                }
                if !matches!(resolved_receiver, ResolvedType::Error) {
                    self.error(TypeError::NoSuchField { ty: resolved_receiver, field: method.to_string(), span });
                }
                ResolvedType::Error
            }
        }
    }

    fn check_closure(&mut self, params: &[Param], ret: Option<&Type>, is_effect: bool, body: &[Stmt]) -> ResolvedType {
        self.table.enter_scope(ScopeKind::Function);
        let mut param_tys = Vec::new();
        for p in params {
            let (t, errs) = resolve_type_in_scope(&self.table, &p.ty);
            for e in errs {
                self.resolve_error(e);
            }
            let bound = substitute_self(&t, self.self_type_stack.last());
            let _ = self.table.define(&p.name, SymbolKind::Variable { ty: bound.clone(), is_mut: false }, p.span, false);
            param_tys.push(bound);
        }
        let annotated_ret = ret.map(|t| {
            let (r, errs) = resolve_type_in_scope(&self.table, t);
            for e in errs {
                self.resolve_error(e);
            }
            substitute_self(&r, self.self_type_stack.last())
        });
        self.effect_stack.push(is_effect);
        self.return_stack.push(annotated_ret.clone().unwrap_or(ResolvedType::Void));
        let body_ty = self.check_stmts_in_scope(body);
        self.return_stack.pop();
        self.effect_stack.pop();
        self.table.leave_scope();

        if let Some(annotated) = &annotated_ret {
            if !is_assignable(annotated, &body_ty) {
                self.error(TypeError::Mismatch { expected: annotated.clone(), found: body_ty.clone(), span: body.last().map(|s| s.span).unwrap_or(Span::new(0, 0)) });
            }
        }
        let result_ret = annotated_ret.unwrap_or(body_ty);
        ResolvedType::Function { params: param_tys, ret: Box::new(result_ret), is_effect }
    }

    fn check_if_expr(&mut self, cond: &Expr, then_branch: &Expr, else_branch: Option<&Expr>, span: Span) -> ResolvedType {
        let cond_ty = self.check_expr(cond);
        if !types_equal(&cond_ty, &ResolvedType::Primitive(PrimitiveType::Bool)) {
            self.error(TypeError::Mismatch { expected: ResolvedType::Primitive(PrimitiveType::Bool), found: cond_ty, span: cond.span });
        }
        let then_ty = self.check_expr(then_branch);
        match else_branch {
            Some(else_e) => {
                let else_ty = self.check_expr(else_e);
                if !is_assignable(&then_ty, &else_ty) && !is_assignable(&else_ty, &then_ty) {
                    self.error(TypeError::Mismatch { expected: then_ty.clone(), found: else_ty, span });
                }
                then_ty
            }
            None => ResolvedType::Void,
        }
    }

    fn check_match(&mut self, subject: &Expr, arms: &[MatchArm], span: Span) -> ResolvedType {
        let subject_ty = self.check_expr(subject);
        if arms.is_empty() {
            self.error(TypeError::NonExhaustiveMatch { scrutinee_type: subject_ty.to_string(), missing: vec!["at least one arm".into()], span });
            return ResolvedType::Void;
        }

        let mut spaces = Vec::with_capacity(arms.len());
        let mut result_ty: Option<ResolvedType> = None;
        for arm in arms {
            self.table.enter_scope(ScopeKind::Block);
            let space = self.check_pattern(&arm.pattern, &subject_ty);
            if let Some(guard) = &arm.guard {
                let gty = self.check_expr(guard);
                if !types_equal(&gty, &ResolvedType::Primitive(PrimitiveType::Bool)) {
                    self.error(TypeError::Mismatch { expected: ResolvedType::Primitive(PrimitiveType::Bool), found: gty, span: guard.span });
                }
            }
            let body_ty = self.check_stmts_in_scope(&arm.body);
            self.table.leave_scope();

            spaces.push(if arm.guard.is_some() { PatternSpace::Empty } else { space });
            match &result_ty {
                None => result_ty = Some(body_ty),
                Some(prev) => {
                    if !is_assignable(prev, &body_ty) && !is_assignable(&body_ty, prev) {
                        self.error(TypeError::Mismatch { expected: prev.clone(), found: body_ty, span: arm.span });
                    }
                }
            }
        }

        for idx in check_redundancy(&spaces) {
            self.diagnostics.push(TypeError::UnreachablePattern { arm_index: idx, span: arms[idx].span }.to_diagnostic());
        }

        let subject_kind = self.subject_type(&subject_ty);
        let missing = check_exhaustiveness(&spaces, &subject_kind);
        if !missing.is_empty() {
            self.error(TypeError::NonExhaustiveMatch {
                scrutinee_type: subject_ty.to_string(),
                missing: missing.into_iter().map(|m| m.description).collect(),
                span,
            });
        }

        result_ty.unwrap_or(ResolvedType::Void)
    }

    fn subject_type(&self, ty: &ResolvedType) -> SubjectType {
        match ty {
            ResolvedType::Primitive(PrimitiveType::Bool) => SubjectType::Bool,
            ResolvedType::Option(_) => SubjectType::Option,
            ResolvedType::Result { .. } => SubjectType::Result,
            ResolvedType::Tuple(_) => SubjectType::Tuple,
            ResolvedType::Named { symbol, .. } | ResolvedType::Instantiated { symbol, .. } => match &self.table.symbol(*symbol).kind {
                SymbolKind::TypeDef { kind: TypeDefKind::Sum { variants }, .. } => {
                    SubjectType::Sum { variants: variants.iter().map(|v| v.name.clone()).collect() }
                }
                SymbolKind::TypeDef { kind: TypeDefKind::Product { .. }, .. } => SubjectType::Product,
                _ => SubjectType::Other,
            },
            _ => SubjectType::Other,
        }
    }

    fn check_array(&mut self, elems: &[Expr]) -> ResolvedType {
        if elems.is_empty() {
            return ResolvedType::Array { element: Box::new(ResolvedType::Error), size: Some(0) };
        }
        let first_ty = self.check_expr(&elems[0]);
        for e in &elems[1..] {
            let ty = self.check_expr(e);
            if !is_assignable(&first_ty, &ty) {
                self.error(TypeError::Mismatch { expected: first_ty.clone(), found: ty, span: e.span });
            }
        }
        ResolvedType::Array { element: Box::new(first_ty), size: Some(elems.len() as u64) }
    }

    fn check_record_literal(&mut self, type_name: Option<&str>, fields: &[(String, Expr)], span: Span) -> ResolvedType {
        match type_name {
            Some(tn) => match self.table.lookup(tn).cloned() {
                Some(Symbol { id, kind: SymbolKind::TypeDef { kind: TypeDefKind::Product { fields: decl_fields }, .. }, .. }) => {
                    let mut seen = std::collections::HashSet::new();
                    for (fname, fexpr) in fields {
                        seen.insert(fname.clone());
                        match decl_fields.iter().find(|(n, _)| n == fname) {
                            Some((_, fty)) => {
                                let vty = self.check_expr(fexpr);
                                if !is_assignable(fty, &vty) {
                                    self.error(TypeError::Mismatch { expected: fty.clone(), found: vty, span: fexpr.span });
                                }
                            }
                            None => {
                                self.check_expr(fexpr);
                                self.error(TypeError::UnknownField { type_name: tn.to_string(), field: fname.clone(), span });
                            }
                        }
                    }
                    for (fname, _) in &decl_fields {
                        if !seen.contains(fname) {
                            self.error(TypeError::MissingField { type_name: tn.to_string(), field: fname.clone(), span });
                        }
                    }
                    ResolvedType::Named { symbol: id, name: tn.to_string() }
                }
                _ => match self.variants.get(tn).cloned() {
                    Some((sum_symbol, sig)) => self.check_record_variant(tn, sum_symbol, &sig, fields, span),
                    None => {
                        for (_, fexpr) in fields {
                            self.check_expr(fexpr);
                        }
                        self.error(TypeError::UndefinedType { name: tn.to_string(), span });
                        ResolvedType::Error
                    }
                },
            },
            None => {
                // No resolved representation exists for an anonymous record;
                // each field is still checked for internal well-formedness.
                for (_, fexpr) in fields {
                    self.check_expr(fexpr);
                }
                ResolvedType::Error
            }
        }
    }

    /// `Circle { radius: 2.0 }`-style construction of a record-shaped sum
    /// variant. Parses to the same `ExprKind::Record` node as a product-type
    /// literal (see `check_record_literal`), so it's only reachable once a
    /// plain product-type lookup by that name has already failed.
    fn check_record_variant(&mut self, name: &str, sum_symbol: SymbolId, sig: &VariantSig, fields: &[(String, Expr)], span: Span) -> ResolvedType {
        match &sig.fields {
            VariantFieldsSig::Record(decl_fields) => {
                let mut seen = std::collections::HashSet::new();
                for (fname, fexpr) in fields {
                    seen.insert(fname.clone());
                    match decl_fields.iter().find(|(n, _)| n == fname) {
                        Some((_, fty)) => {
                            let vty = self.check_expr(fexpr);
                            if !is_assignable(fty, &vty) {
                                self.error(TypeError::Mismatch { expected: fty.clone(), found: vty, span: fexpr.span });
                            }
                        }
                        None => {
                            self.check_expr(fexpr);
                            self.error(TypeError::UnknownField { type_name: name.to_string(), field: fname.clone(), span });
                        }
                    }
                }
                for (fname, _) in decl_fields {
                    if !seen.contains(fname) {
                        self.error(TypeError::MissingField { type_name: name.to_string(), field: fname.clone(), span });
                    }
                }
            }
            VariantFieldsSig::Unit | VariantFieldsSig::Tuple(_) => {
                for (_, fexpr) in fields {
                    self.check_expr(fexpr);
                }
                self.error(TypeError::NotCallable { ty: ResolvedType::Named { symbol: sum_symbol, name: name.to_string() }, span });
            }
        }
        ResolvedType::Named { symbol: sum_symbol, name: name.to_string() }
    }

    fn check_variant_constructor(&mut self, name: &str, args: &[Expr], span: Span) -> ResolvedType {
        match name {
            "Some" => {
                if args.len() != 1 {
                    self.error(TypeError::WrongArgumentCount { expected: 1, found: args.len(), span });
                    for a in args {
                        self.check_expr(a);
                    }
                    return ResolvedType::Option(Box::new(ResolvedType::Error));
                }
                ResolvedType::Option(Box::new(self.check_expr(&args[0])))
            }
            "None" => {
                if !args.is_empty() {
                    self.error(TypeError::WrongArgumentCount { expected: 0, found: args.len(), span });
                    for a in args {
                        self.check_expr(a);
                    }
                }
                ResolvedType::Option(Box::new(ResolvedType::Error))
            }
            "Ok" | "Err" => {
                if args.len() != 1 {
                    self.error(TypeError::WrongArgumentCount { expected: 1, found: args.len(), span });
                    for a in args {
                        self.check_expr(a);
                    }
                    return ResolvedType::Result { ok: Box::new(ResolvedType::Error), err: Box::new(ResolvedType::Error) };
                }
                let inner = self.check_expr(&args[0]);
                if name == "Ok" {
                    ResolvedType::Result { ok: Box::new(inner), err: Box::new(ResolvedType::Error) }
                } else {
                    ResolvedType::Result { ok: Box::new(ResolvedType::Error), err: Box::new(inner) }
                }
            }
            _ => match self.variants.get(name).cloned() {
                Some((sum_symbol, sig)) => {
                    match &sig.fields {
                        VariantFieldsSig::Unit => {
                            if !args.is_empty() {
                                self.error(TypeError::WrongArgumentCount { expected: 0, found: args.len(), span });
                            }
                            for a in args {
                                self.check_expr(a);
                            }
                        }
                        VariantFieldsSig::Tuple(tys) => {
                            if tys.len() != args.len() {
                                self.error(TypeError::WrongArgumentCount { expected: tys.len(), found: args.len(), span });
                            }
                            for (t, a) in tys.iter().zip(args.iter()) {
                                let a_ty = self.check_expr(a);
                                if !is_assignable(t, &a_ty) {
                                    self.error(TypeError::Mismatch { expected: t.clone(), found: a_ty, span: a.span });
                                }
                            }
                            if args.len() > tys.len() {
                                for a in &args[tys.len()..] {
                                    self.check_expr(a);
                                }
                            }
                        }
                        VariantFieldsSig::Record(_) => {
                            for a in args {
                                self.check_expr(a);
                            }
                            self.error(TypeError::NotCallable {
                                ty: ResolvedType::Named { symbol: sum_symbol, name: name.to_string() },
                                span,
                            });
                        }
                    }
                    ResolvedType::Named { symbol: sum_symbol, name: name.to_string() }
                }
                None => {
                    for a in args {
                        self.check_expr(a);
                    }
                    self.error(TypeError::UnknownVariant { name: name.to_string(), span });
                    ResolvedType::Error
                }
            },
        }
    }

    fn check_cast(&mut self, operand: &Expr, target: &Type, span: Span) -> ResolvedType {
        let operand_ty = self.check_expr(operand);
        let (target_ty, errs) = resolve_type_in_scope(&self.table, target);
        for e in errs {
            self.resolve_error(e);
        }
        if !is_valid_cast(&operand_ty, &target_ty) {
            self.error(TypeError::InvalidCast { source: operand_ty, target: target_ty.clone(), span });
        }
        target_ty
    }

    fn check_try(&mut self, inner: &Expr, span: Span) -> ResolvedType {
        if !self.current_is_effect() {
            self.error(TypeError::EffectViolation { message: "the `?` operator requires an effect function".into(), span });
        }
        let inner_ty = self.check_expr(inner);
        match inner_ty {
            ResolvedType::Result { ok, .. } => {
                if let Some(ret) = self.return_stack.last() {
                    if !matches!(ret, ResolvedType::Result { .. }) {
                        self.error(TypeError::EffectViolation {
                            message: "`?` on a `result` requires the enclosing function to return `result`".into(),
                            span,
                        });
                    }
                }
                *ok
            }
            ResolvedType::Option(inner_t) => *inner_t,
            ResolvedType::Error => ResolvedType::Error,
            other => {
                self.error(TypeError::InvalidUnaryOperand { op: "?".into(), ty: other, span });
                ResolvedType::Error
            }
        }
    }

    fn check_coalesce(&mut self, operand: &Expr, default: &Expr, span: Span) -> ResolvedType {
        let operand_ty = self.check_expr(operand);
        let inner = match &operand_ty {
            ResolvedType::Option(t) => (**t).clone(),
            ResolvedType::Result { ok, .. } => (**ok).clone(),
            ResolvedType::Error => ResolvedType::Error,
            other => {
                self.error(TypeError::InvalidBinaryOperand { op: "??".into(), ty: other.clone(), span });
                ResolvedType::Error
            }
        };
        let default_ty = self.check_expr(default);
        if !is_assignable(&inner, &default_ty) {
            self.error(TypeError::Mismatch { expected: inner.clone(), found: default_ty, span });
        }
        inner
    }

    fn check_pattern(&mut self, pattern: &Pattern, scrutinee: &ResolvedType) -> PatternSpace {
        match pattern {
            Pattern::Wildcard { .. } => PatternSpace::Any,
            Pattern::Ident { name, is_mut, span } => {
                let _ = self.table.define(name, SymbolKind::Variable { ty: scrutinee.clone(), is_mut: *is_mut }, *span, false);
                PatternSpace::Any
            }
            Pattern::Literal { kind, span } => {
                let (space, lit_ty) = match kind {
                    LiteralPat::Int(v) => (PatternSpace::IntValue(*v), ResolvedType::Primitive(PrimitiveType::I32)),
                    LiteralPat::Float(v) => (PatternSpace::float(*v), ResolvedType::Primitive(PrimitiveType::F64)),
                    LiteralPat::Bool(v) => (PatternSpace::BoolValue(*v), ResolvedType::Primitive(PrimitiveType::Bool)),
                    LiteralPat::Char(v) => (PatternSpace::CharValue(*v), ResolvedType::Primitive(PrimitiveType::Char)),
                    LiteralPat::String(v) => (PatternSpace::StringValue(v.clone()), ResolvedType::Primitive(PrimitiveType::String)),
                };
                if !types_equal(scrutinee, &lit_ty) {
                    self.error(TypeError::Mismatch { expected: scrutinee.clone(), found: lit_ty, span: *span });
                }
                space
            }
            Pattern::Constructor { name, args, span } => self.check_constructor_pattern(name, args, scrutinee, *span),
            Pattern::Record { type_name, fields, has_rest, span } => {
                self.check_record_pattern(type_name.as_deref(), fields, *has_rest, scrutinee, *span)
            }
            Pattern::Tuple { elements, span } => {
                let elem_tys: Vec<ResolvedType> = match scrutinee {
                    ResolvedType::Tuple(tys) if tys.len() == elements.len() => tys.clone(),
                    ResolvedType::Error => vec![ResolvedType::Error; elements.len()],
                    _ => {
                        self.error(TypeError::Mismatch { expected: scrutinee.clone(), found: ResolvedType::Tuple(vec![]), span: *span });
                        vec![ResolvedType::Error; elements.len()]
                    }
                };
                let spaces = elements.iter().zip(elem_tys.iter()).map(|(p, t)| self.check_pattern(p, t)).collect();
                PatternSpace::Tuple(spaces)
            }
            Pattern::Or { alternatives, .. } => {
                PatternSpace::Union(alternatives.iter().map(|p| self.check_pattern(p, scrutinee)).collect())
            }
            Pattern::Guarded { pattern, guard, .. } => {
                let space = self.check_pattern(pattern, scrutinee);
                let guard_ty = self.check_expr(guard);
                if !types_equal(&guard_ty, &ResolvedType::Primitive(PrimitiveType::Bool)) {
                    self.error(TypeError::Mismatch { expected: ResolvedType::Primitive(PrimitiveType::Bool), found: guard_ty, span: guard.span });
                }
                space
            }
            Pattern::Range { start, end, inclusive, .. } => PatternSpace::Range {
                start: start.as_deref().and_then(int_literal_value),
                end: end.as_deref().and_then(int_literal_value),
                inclusive: *inclusive,
            },
            Pattern::Rest { .. } => PatternSpace::Any,
            Pattern::Typed { pattern, type_name, span } => {
                if self.table.lookup(type_name).is_none() && PrimitiveType::from_name(type_name).is_none() {
                    self.error(TypeError::UndefinedType { name: type_name.clone(), span: *span });
                }
                self.check_pattern(pattern, scrutinee)
            }
        }
    }

    fn check_constructor_pattern(&mut self, name: &str, args: &ConstructorArgs, scrutinee: &ResolvedType, span: Span) -> PatternSpace {
        match name {
            "Some" | "None" => {
                let inner = match scrutinee {
                    ResolvedType::Option(t) => (**t).clone(),
                    ResolvedType::Error => ResolvedType::Error,
                    _ => {
                        self.error(TypeError::Mismatch { expected: scrutinee.clone(), found: ResolvedType::Option(Box::new(ResolvedType::Error)), span });
                        ResolvedType::Error
                    }
                };
                if name == "Some" {
                    match args {
                        ConstructorArgs::Positional(pats) if pats.len() == 1 => {
                            PatternSpace::Constructor { variant: "Some".into(), arg_spaces: vec![self.check_pattern(&pats[0], &inner)] }
                        }
                        _ => {
                            self.error(TypeError::WrongArgumentCount { expected: 1, found: arg_count(args), span });
                            PatternSpace::Constructor { variant: "Some".into(), arg_spaces: vec![PatternSpace::Any] }
                        }
                    }
                } else {
                    if !matches!(args, ConstructorArgs::None) {
                        self.error(TypeError::WrongArgumentCount { expected: 0, found: arg_count(args), span });
                    }
                    PatternSpace::Constructor { variant: "None".into(), arg_spaces: vec![] }
                }
            }
            "Ok" | "Err" => {
                let (ok_t, err_t) = match scrutinee {
                    ResolvedType::Result { ok, err } => ((**ok).clone(), (**err).clone()),
                    ResolvedType::Error => (ResolvedType::Error, ResolvedType::Error),
                    _ => {
                        self.error(TypeError::Mismatch {
                            expected: scrutinee.clone(),
                            found: ResolvedType::Result { ok: Box::new(ResolvedType::Error), err: Box::new(ResolvedType::Error) },
                            span,
                        });
                        (ResolvedType::Error, ResolvedType::Error)
                    }
                };
                let inner = if name == "Ok" { ok_t } else { err_t };
                match args {
                    ConstructorArgs::Positional(pats) if pats.len() == 1 => {
                        PatternSpace::Constructor { variant: name.to_string(), arg_spaces: vec![self.check_pattern(&pats[0], &inner)] }
                    }
                    _ => {
                        self.error(TypeError::WrongArgumentCount { expected: 1, found: arg_count(args), span });
                        PatternSpace::Constructor { variant: name.to_string(), arg_spaces: vec![PatternSpace::Any] }
                    }
                }
            }
            _ => match self.variants.get(name).cloned() {
                Some((sum_symbol, sig)) => {
                    let matches_scrutinee = match scrutinee {
                        ResolvedType::Named { symbol, .. } | ResolvedType::Instantiated { symbol, .. } => *symbol == sum_symbol,
                        ResolvedType::Error => true,
                        _ => false,
                    };
                    if !matches_scrutinee {
                        self.error(TypeError::Mismatch {
                            expected: scrutinee.clone(),
                            found: ResolvedType::Named { symbol: sum_symbol, name: name.to_string() },
                            span,
                        });
                    }
                    match &sig.fields {
                        VariantFieldsSig::Unit => {
                            if !matches!(args, ConstructorArgs::None) {
                                self.error(TypeError::WrongArgumentCount { expected: 0, found: arg_count(args), span });
                            }
                            PatternSpace::Constructor { variant: name.to_string(), arg_spaces: vec![] }
                        }
                        VariantFieldsSig::Tuple(tys) => match args {
                            ConstructorArgs::Positional(pats) => {
                                if pats.len() != tys.len() {
                                    self.error(TypeError::WrongArgumentCount { expected: tys.len(), found: pats.len(), span });
                                }
                                let spaces = pats.iter().zip(tys.iter()).map(|(p, t)| self.check_pattern(p, t)).collect();
                                PatternSpace::Constructor { variant: name.to_string(), arg_spaces: spaces }
                            }
                            _ => {
                                self.error(TypeError::WrongArgumentCount { expected: tys.len(), found: arg_count(args), span });
                                PatternSpace::Constructor { variant: name.to_string(), arg_spaces: vec![PatternSpace::Any; tys.len()] }
                            }
                        },
                        VariantFieldsSig::Record(fields) => match args {
                            ConstructorArgs::Named(pairs) => {
                                let mut field_spaces = Vec::new();
                                for (fname, fpat) in pairs {
                                    match fields.iter().find(|(n, _)| n == fname) {
                                        Some((_, fty)) => field_spaces.push((fname.clone(), self.check_pattern(fpat, fty))),
                                        None => {
                                            self.error(TypeError::UnknownField { type_name: name.to_string(), field: fname.clone(), span });
                                            field_spaces.push((fname.clone(), self.check_pattern(fpat, &ResolvedType::Error)));
                                        }
                                    }
                                }
                                PatternSpace::Constructor { variant: name.to_string(), arg_spaces: vec![PatternSpace::Record { field_spaces }] }
                            }
                            _ => {
                                self.error(TypeError::WrongArgumentCount { expected: fields.len(), found: arg_count(args), span });
                                PatternSpace::Constructor { variant: name.to_string(), arg_spaces: vec![PatternSpace::Any] }
                            }
                        },
                    }
                }
                None => {
                    self.error(TypeError::UnknownVariant { name: name.to_string(), span });
                    PatternSpace::Any
                }
            },
        }
    }

    fn check_record_pattern(
        &mut self,
        type_name: Option<&str>,
        fields: &[(String, Pattern)],
        has_rest: bool,
        scrutinee: &ResolvedType,
        span: Span,
    ) -> PatternSpace {
        let decl_fields: Option<Vec<(String, ResolvedType)>> = match type_name {
            Some(tn) => match self.table.lookup(tn).cloned() {
                Some(Symbol { kind: SymbolKind::TypeDef { kind: TypeDefKind::Product { fields: df }, .. }, .. }) => Some(df),
                _ => {
                    self.error(TypeError::UndefinedType { name: tn.to_string(), span });
                    None
                }
            },
            None => match scrutinee {
                ResolvedType::Named { symbol, .. } => match &self.table.symbol(*symbol).kind {
                    SymbolKind::TypeDef { kind: TypeDefKind::Product { fields: df }, .. } => Some(df.clone()),
                    _ => None,
                },
                _ => None,
            },
        };

        let mut field_spaces = Vec::new();
        let mut seen = std::collections::HashSet::new();
        for (fname, fpat) in fields {
            seen.insert(fname.clone());
            let fty = decl_fields.as_ref().and_then(|df| df.iter().find(|(n, _)| n == fname).map(|(_, t)| t.clone()));
            if decl_fields.is_some() && fty.is_none() {
                self.error(TypeError::UnknownField { type_name: type_name.unwrap_or_default().to_string(), field: fname.clone(), span });
            }
            field_spaces.push((fname.clone(), self.check_pattern(fpat, &fty.unwrap_or(ResolvedType::Error))));
        }
        if !has_rest {
            if let Some(df) = &decl_fields {
                for (fname, _) in df {
                    if !seen.contains(fname) {
                        self.error(TypeError::MissingField { type_name: type_name.unwrap_or_default().to_string(), field: fname.clone(), span });
                    }
                }
            }
        }
        PatternSpace::Record { field_spaces }
    }
}

fn is_numeric(ty: &ResolvedType) -> bool {
    matches!(ty, ResolvedType::Error) || matches!(ty, ResolvedType::Primitive(p) if p.is_numeric())
}

fn binary_op_str(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Rem => "%",
        BinaryOp::Eq => "==",
        BinaryOp::NotEq => "!=",
        BinaryOp::Lt => "<",
        BinaryOp::Gt => ">",
        BinaryOp::LtEq => "<=",
        BinaryOp::GtEq => ">=",
        BinaryOp::And => "and",
        BinaryOp::Or => "or",
        BinaryOp::Is => "is",
        BinaryOp::In => "in",
    }
}

fn literal_type(lit: &LiteralPat) -> ResolvedType {
    match lit {
        LiteralPat::Int(_) => ResolvedType::Primitive(PrimitiveType::I32),
        LiteralPat::Float(_) => ResolvedType::Primitive(PrimitiveType::F64),
        LiteralPat::Bool(_) => ResolvedType::Primitive(PrimitiveType::Bool),
        LiteralPat::Char(_) => ResolvedType::Primitive(PrimitiveType::Char),
        LiteralPat::String(_) => ResolvedType::Primitive(PrimitiveType::String),
    }
}

fn int_literal_value(p: &Pattern) -> Option<i128> {
    match p {
        Pattern::Literal { kind: LiteralPat::Int(v), .. } => Some(*v),
        _ => None,
    }
}

fn arg_count(args: &ConstructorArgs) -> usize {
    match args {
        ConstructorArgs::Positional(v) => v.len(),
        ConstructorArgs::Named(v) => v.len(),
        ConstructorArgs::None => 0,
    }
}

fn type_name_of_expr(expr: &Expr) -> Option<String> {
    match &expr.kind {
        ExprKind::Ident(name) => Some(name.clone()),
        ExprKind::VariantConstructor { name, args } if args.is_empty() => Some(name.clone()),
        _ => None,
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

fn type_name_for_methods(ty: &ResolvedType) -> Option<String> {
    match ty {
        ResolvedType::Named { name, .. } | ResolvedType::Instantiated { name, .. } => Some(name.clone()),
        _ => None,
    }
}

/// Replaces every `SelfType` node in `ty` with `self_ty`, recursing through
/// compound shapes the way [`kira_resolve::instantiate`] does for
/// `TypeVar`. Used when binding `self`'s type and a method's parameter/
/// return types inside an `impl` block, where the resolver leaves `Self`
/// as a literal marker rather than the concrete target type.
fn substitute_self(ty: &ResolvedType, self_ty: Option<&ResolvedType>) -> ResolvedType {
    let Some(target) = self_ty else { return ty.clone() };
    match ty {
        ResolvedType::SelfType => target.clone(),
        ResolvedType::Instantiated { symbol, name, args } => ResolvedType::Instantiated {
            symbol: *symbol,
            name: name.clone(),
            args: args.iter().map(|a| substitute_self(a, self_ty)).collect(),
        },
        ResolvedType::Function { params, ret, is_effect } => ResolvedType::Function {
            params: params.iter().map(|p| substitute_self(p, self_ty)).collect(),
            ret: Box::new(substitute_self(ret, self_ty)),
            is_effect: *is_effect,
        },
        ResolvedType::Tuple(elems) => ResolvedType::Tuple(elems.iter().map(|e| substitute_self(e, self_ty)).collect()),
        ResolvedType::Array { element, size } => ResolvedType::Array { element: Box::new(substitute_self(element, self_ty)), size: *size },
        ResolvedType::Io(inner) => ResolvedType::Io(Box::new(substitute_self(inner, self_ty))),
        ResolvedType::Result { ok, err } => {
            ResolvedType::Result { ok: Box::new(substitute_self(ok, self_ty)), err: Box::new(substitute_self(err, self_ty)) }
        }
        ResolvedType::Option(inner) => ResolvedType::Option(Box::new(substitute_self(inner, self_ty))),
        _ => ty.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(src: &str) -> Vec<Diagnostic> {
        let parsed = kira_parser::parse(src);
        assert!(parsed.errors.is_empty(), "parse errors: {:?}", parsed.errors);
        let (table, resolve_diags) = kira_resolve::resolve_program(&parsed.program);
        assert!(resolve_diags.is_empty(), "resolve errors: {resolve_diags:?}");
        let (_table, diags) = check_program(table, &parsed.program);
        diags
    }

    fn has_code(diags: &[Diagnostic], code: &str) -> bool {
        diags.iter().any(|d| d.code == code)
    }

    #[test]
    fn well_typed_arithmetic_function_has_no_diagnostics() {
        let diags = check("fn add(a: i32, b: i32) -> i32 {\n  return a + b\n}\n\neffect fn main() {\n  let x: i32 = add(1, 2)\n}\n");
        assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
    }

    #[test]
    fn mismatched_return_type_is_reported() {
        let diags = check("fn f() -> i32 {\n  return true\n}\n\neffect fn main() {\n}\n");
        assert!(has_code(&diags, "E0301"));
    }

    #[test]
    fn calling_effect_function_from_pure_context_is_rejected() {
        let diags = check("effect fn write() -> i32 {\n  return 1\n}\n\nfn pure_caller() -> i32 {\n  return write()\n}\n\neffect fn main() {\n}\n");
        assert!(has_code(&diags, "E0313"));
    }

    #[test]
    fn try_operator_outside_effect_function_is_rejected() {
        let diags = check(
            "fn f() -> result[i32, string] {\n  let r: result[i32, string] = Ok(1)\n  let v: i32 = r?\n  return Ok(v)\n}\n\neffect fn main() {\n}\n",
        );
        assert!(has_code(&diags, "E0313"));
    }

    #[test]
    fn main_without_effect_is_rejected() {
        let diags = check("fn main() {\n}\n");
        assert!(has_code(&diags, "E0313"));
    }

    #[test]
    fn non_exhaustive_bool_match_is_reported() {
        let diags = check(
            "effect fn main() {\n  let b: bool = true\n  let r: i32 = match b {\n    true => { 1 }\n  }\n}\n",
        );
        assert!(has_code(&diags, "E0314"));
    }

    #[test]
    fn redundant_arm_after_wildcard_is_a_warning() {
        let diags = check(
            "effect fn main() {\n  let n: i32 = 1\n  let r: i32 = match n {\n    _ => { 0 }\n    1 => { 1 }\n  }\n}\n",
        );
        assert!(has_code(&diags, "W0001"));
    }

    #[test]
    fn field_access_on_product_type_resolves() {
        let diags = check(
            "type Point {\n  x: f64,\n  y: f64\n}\n\nfn magnitude(p: Point) -> f64 {\n  return p.x\n}\n\neffect fn main() {\n}\n",
        );
        assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
    }

    #[test]
    fn unknown_field_is_reported() {
        let diags = check(
            "type Point {\n  x: f64,\n  y: f64\n}\n\nfn bad(p: Point) -> f64 {\n  return p.z\n}\n\neffect fn main() {\n}\n",
        );
        assert!(has_code(&diags, "E0307"));
    }

    #[test]
    fn sum_type_constructor_and_match_are_exhaustive() {
        let diags = check(
            "type Shape = Circle(f64) | Point\n\nfn area(s: Shape) -> f64 {\n  return match s {\n    Circle(r) => { r }\n    Point => { 0.0 }\n  }\n}\n\neffect fn main() {\n  let s: Shape = Circle(1.0)\n}\n",
        );
        assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
    }

    #[test]
    fn record_shaped_variant_construction_and_match_are_well_typed() {
        let diags = check(
            "type Shape =\n  Circle(f64)\n  | Point { x: f64, y: f64 }\n\nfn describe(s: Shape) -> f64 {\n  return match s {\n    Circle(r) => { r }\n    Point { x, y } => { x + y }\n  }\n}\n\neffect fn main() {\n  let s: Shape = Point { x: 1.0, y: 2.0 }\n}\n",
        );
        assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
    }

    #[test]
    fn record_shaped_variant_construction_rejects_unknown_field() {
        let diags = check(
            "type Shape =\n  Circle(f64)\n  | Point { x: f64, y: f64 }\n\neffect fn main() {\n  let s: Shape = Point { x: 1.0, z: 2.0 }\n}\n",
        );
        assert!(has_code(&diags, "E0309"));
    }

    #[test]
    fn bare_unit_variant_identifier_resolves() {
        let diags = check(
            "type Shape =\n  Circle(f64)\n  | Nil\n\nfn area(s: Shape) -> f64 {\n  return match s {\n    Circle(r) => { r }\n    Nil => { 0.0 }\n  }\n}\n\neffect fn main() {\n  let s: Shape = Nil\n}\n",
        );
        assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
    }

    #[test]
    fn wrong_argument_count_is_reported() {
        let diags = check("fn add(a: i32, b: i32) -> i32 {\n  return a + b\n}\n\neffect fn main() {\n  let x: i32 = add(1)\n}\n");
        assert!(has_code(&diags, "E0304"));
    }
}
