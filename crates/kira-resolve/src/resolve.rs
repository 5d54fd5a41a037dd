//! Builds a [`SymbolTable`] from a parsed [`kira_parser::ast::Program`] and
//! resolves every syntactic [`kira_parser::ast::ty::Type`] it contains into a
//! [`ResolvedType`].
//!
//! Declarations are processed in two sub-passes per scope so that mutually
//! referring type definitions (`type A = B`, `type B { next: A }`) and
//! forward-referenced functions resolve regardless of declaration order:
//! the first sub-pass defines a placeholder symbol for every name introduced
//! in that scope, the second fills in the resolved signature/fields now that
//! every sibling name is already in the table.

use kira_common::{Diagnostic, Span};
use kira_parser::ast::item::{Decl, DeclKind, Param, TraitMethod, Variant, VariantFields};
use kira_parser::ast::ty::Type;
use kira_parser::ast::Program;

use crate::symbol::{
    FunctionSig, ResolveError, ScopeKind, Symbol, SymbolId, SymbolKind, SymbolTable, TypeDefKind, VariantFieldsSig,
    VariantSig,
};
use crate::ty::{PrimitiveType, ResolvedType};

pub struct Resolver {
    table: SymbolTable,
    diagnostics: Vec<Diagnostic>,
}

impl Resolver {
    pub fn new() -> Self {
        Self { table: SymbolTable::new(), diagnostics: Vec::new() }
    }

    fn error(&mut self, err: ResolveError) {
        self.diagnostics.push(err.to_diagnostic());
    }

    pub fn resolve_program(mut self, program: &Program) -> (SymbolTable, Vec<Diagnostic>) {
        self.declare_decls(&program.decls);
        (self.table, self.diagnostics)
    }

    /// Two-pass walk over one lexical block of declarations: placeholders
    /// first, then full bodies.
    fn declare_decls(&mut self, decls: &[Decl]) {
        for decl in decls {
            self.predeclare(decl);
        }
        for decl in decls {
            self.define_body(decl);
        }
    }

    /// First sub-pass: reserves a name in the current scope so later
    /// siblings (and this declaration's own body) can refer to it.
    fn predeclare(&mut self, decl: &Decl) {
        match &decl.kind {
            DeclKind::Module { name, .. } => {
                // The scope is created in `define_body`, once, when the
                // module's own declarations are walked; until then the
                // placeholder points at a sentinel that is always
                // overwritten before anything can look inside it.
                let _ = self.define(name, SymbolKind::Module { scope_id: crate::symbol::ScopeId(u32::MAX) }, decl.span, decl.is_pub);
            }
            DeclKind::SumType { name, .. } => {
                let _ = self.define(
                    name,
                    SymbolKind::TypeDef { type_params: Vec::new(), kind: TypeDefKind::Sum { variants: Vec::new() } },
                    decl.span,
                    decl.is_pub,
                );
            }
            DeclKind::ProductType { name, .. } => {
                let _ = self.define(
                    name,
                    SymbolKind::TypeDef {
                        type_params: Vec::new(),
                        kind: TypeDefKind::Product { fields: Vec::new() },
                    },
                    decl.span,
                    decl.is_pub,
                );
            }
            DeclKind::TypeAlias { name, .. } => {
                let _ = self.define(
                    name,
                    SymbolKind::TypeDef { type_params: Vec::new(), kind: TypeDefKind::Alias { target: ResolvedType::Error } },
                    decl.span,
                    decl.is_pub,
                );
            }
            DeclKind::Trait { name, .. } => {
                let _ = self.define(name, SymbolKind::TraitDef { methods: Vec::new() }, decl.span, decl.is_pub);
            }
            DeclKind::Fn { name, .. } => {
                let placeholder = FunctionSig { params: Vec::new(), ret: ResolvedType::Error, is_effect: false, type_params: Vec::new() };
                let _ = self.define(name, SymbolKind::Function(placeholder), decl.span, decl.is_pub);
            }
            DeclKind::Const { name, .. } => {
                let _ = self.define(name, SymbolKind::Variable { ty: ResolvedType::Error, is_mut: false }, decl.span, decl.is_pub);
            }
            // `let`, `import`, `impl`, and `test` introduce no scope-visible
            // name that siblings could forward-reference.
            DeclKind::Let { .. } | DeclKind::Import { .. } | DeclKind::Impl { .. } | DeclKind::Test { .. } => {}
        }
    }

    fn define(&mut self, name: &str, kind: SymbolKind, span: Span, is_pub: bool) -> Option<SymbolId> {
        match self.table.define(name, kind, span, is_pub) {
            Ok(id) => Some(id),
            Err(err) => {
                self.error(err);
                None
            }
        }
    }

    /// Second sub-pass: fills in the placeholder defined by `predeclare`
    /// with the fully resolved signature, and recurses into bodies that
    /// introduce their own nested scope.
    fn define_body(&mut self, decl: &Decl) {
        match &decl.kind {
            DeclKind::Module { name, decls } => {
                let scope_id = self.table.enter_scope(ScopeKind::Module);
                self.declare_decls(decls);
                self.table.leave_scope();
                if let Some(sym) = self.table.lookup(name) {
                    let id = sym.id;
                    self.table.symbol_mut(id).kind = SymbolKind::Module { scope_id };
                }
            }
            DeclKind::Import { path, alias } => {
                let resolved = self.table.lookup_path(path).map(|s| s.id);
                if resolved.is_none() {
                    self.error(ResolveError::UndefinedSymbol { name: path.join("::"), span: decl.span });
                }
                let bound_name = alias.clone().unwrap_or_else(|| path.last().cloned().unwrap_or_default());
                let _ = self.define(&bound_name, SymbolKind::ImportAlias { resolved }, decl.span, decl.is_pub);
            }
            DeclKind::SumType { name, type_params, variants } => {
                self.table.enter_scope(ScopeKind::Block);
                for tp in type_params {
                    let _ = self.define(&tp.name, SymbolKind::TypeParam { constraints: tp.constraints.clone() }, tp.span, false);
                }
                let resolved_variants: Vec<VariantSig> = variants.iter().map(|v| self.resolve_variant(v)).collect();
                self.table.leave_scope();
                self.overwrite_type_def(
                    name,
                    type_params.iter().map(|t| t.name.clone()).collect(),
                    TypeDefKind::Sum { variants: resolved_variants },
                );
            }
            DeclKind::ProductType { name, type_params, fields } => {
                self.table.enter_scope(ScopeKind::Block);
                for tp in type_params {
                    let _ = self.define(&tp.name, SymbolKind::TypeParam { constraints: tp.constraints.clone() }, tp.span, false);
                }
                let resolved_fields: Vec<(String, ResolvedType)> = fields
                    .iter()
                    .map(|(n, ty)| (n.clone(), self.resolve_type(ty)))
                    .collect();
                self.table.leave_scope();
                self.overwrite_type_def(
                    name,
                    type_params.iter().map(|t| t.name.clone()).collect(),
                    TypeDefKind::Product { fields: resolved_fields },
                );
            }
            DeclKind::TypeAlias { name, type_params, target } => {
                self.table.enter_scope(ScopeKind::Block);
                for tp in type_params {
                    let _ = self.define(&tp.name, SymbolKind::TypeParam { constraints: tp.constraints.clone() }, tp.span, false);
                }
                let resolved_target = self.resolve_type(target);
                self.table.leave_scope();
                self.overwrite_type_def(name, type_params.iter().map(|t| t.name.clone()).collect(), TypeDefKind::Alias { target: resolved_target });
            }
            DeclKind::Trait { name, type_params, methods } => {
                self.table.enter_scope(ScopeKind::Trait);
                for tp in type_params {
                    let _ = self.define(&tp.name, SymbolKind::TypeParam { constraints: tp.constraints.clone() }, tp.span, false);
                }
                let resolved_methods: Vec<(String, FunctionSig)> =
                    methods.iter().map(|m| (m.name.clone(), self.resolve_trait_method(m))).collect();
                self.table.leave_scope();
                if let Some(sym) = self.table.lookup(name) {
                    let id = sym.id;
                    self.table.symbol_mut(id).kind = SymbolKind::TraitDef { methods: resolved_methods };
                }
            }
            DeclKind::Impl { trait_name, type_params, target, methods } => {
                if let Some(trait_name) = trait_name {
                    if self.table.lookup(trait_name).is_none() {
                        self.error(ResolveError::UndefinedSymbol { name: trait_name.clone(), span: decl.span });
                    }
                }
                self.table.enter_scope(ScopeKind::Impl);
                for tp in type_params {
                    let _ = self.define(&tp.name, SymbolKind::TypeParam { constraints: tp.constraints.clone() }, tp.span, false);
                }
                let _ = self.resolve_type(target);
                self.declare_decls(methods);
                self.table.leave_scope();
            }
            DeclKind::Fn { name, type_params, params, ret, is_effect, .. } => {
                let sig = self.resolve_fn_signature(type_params, params, ret, *is_effect);
                if let Some(sym) = self.table.lookup(name) {
                    let id = sym.id;
                    self.table.symbol_mut(id).kind = SymbolKind::Function(sig);
                }
                // Statement bodies are walked by the type checker, which
                // owns expression/pattern resolution against this table.
            }
            DeclKind::Const { name, ty, .. } => {
                let resolved = self.resolve_type(ty);
                if let Some(sym) = self.table.lookup(name) {
                    let id = sym.id;
                    self.table.symbol_mut(id).kind = SymbolKind::Variable { ty: resolved, is_mut: false };
                }
            }
            DeclKind::Let { pattern, ty, .. } => {
                let resolved = self.resolve_type(ty);
                if let kira_parser::ast::pat::Pattern::Ident { name, is_mut, span } = pattern {
                    let _ = self.define(name, SymbolKind::Variable { ty: resolved, is_mut: *is_mut }, *span, decl.is_pub);
                }
            }
            DeclKind::Test { .. } => {
                // A test body is an ordinary statement block checked in its
                // own isolated scope by the type checker; no symbol of its
                // own to define at this level.
            }
        }
    }

    fn overwrite_type_def(&mut self, name: &str, type_params: Vec<String>, kind: TypeDefKind) {
        if let Some(sym) = self.table.lookup(name) {
            let id = sym.id;
            self.table.symbol_mut(id).kind = SymbolKind::TypeDef { type_params, kind };
        }
    }

    fn resolve_variant(&mut self, variant: &Variant) -> VariantSig {
        let fields = match &variant.fields {
            VariantFields::Unit => VariantFieldsSig::Unit,
            VariantFields::Tuple(tys) => VariantFieldsSig::Tuple(tys.iter().map(|t| self.resolve_type(t)).collect()),
            VariantFields::Record(fields) => {
                VariantFieldsSig::Record(fields.iter().map(|(n, t)| (n.clone(), self.resolve_type(t))).collect())
            }
        };
        VariantSig { name: variant.name.clone(), fields }
    }

    fn resolve_trait_method(&mut self, method: &TraitMethod) -> FunctionSig {
        FunctionSig {
            params: method.params.iter().map(|p| self.resolve_param(p)).collect(),
            ret: self.resolve_type(&method.ret),
            is_effect: method.is_effect,
            type_params: Vec::new(),
        }
    }

    fn resolve_fn_signature(
        &mut self,
        type_params: &[kira_parser::ast::item::TypeParam],
        params: &[Param],
        ret: &Type,
        is_effect: bool,
    ) -> FunctionSig {
        self.table.enter_scope(ScopeKind::Function);
        for tp in type_params {
            let _ = self.define(&tp.name, SymbolKind::TypeParam { constraints: tp.constraints.clone() }, tp.span, false);
        }
        let resolved_params: Vec<ResolvedType> = params.iter().map(|p| self.resolve_param(p)).collect();
        let resolved_ret = self.resolve_type(ret);
        self.table.leave_scope();
        FunctionSig {
            params: resolved_params,
            ret: resolved_ret,
            is_effect,
            type_params: type_params.iter().map(|t| t.name.clone()).collect(),
        }
    }

    fn resolve_param(&mut self, param: &Param) -> ResolvedType {
        self.resolve_type(&param.ty)
    }

    /// Maps a syntactic [`Type`] to a [`ResolvedType`], reporting and
    /// recovering from undefined names, wrong-arity applications, and the
    /// disallowed `_` inferred-type placeholder.
    pub fn resolve_type(&mut self, ty: &Type) -> ResolvedType {
        let (resolved, errors) = resolve_type_in_scope(&self.table, ty);
        for err in errors {
            self.error(err);
        }
        resolved
    }
}

/// Stand-alone counterpart to [`Resolver::resolve_type`] that takes a shared
/// [`SymbolTable`] reference instead of an owned `Resolver`. `Type` lookups
/// never mutate the table, so the type checker can resolve body-internal
/// annotations (a `let`'s type, a closure's return type) against whatever
/// scope it has already entered, without constructing a full `Resolver`.
pub fn resolve_type_in_scope(table: &SymbolTable, ty: &Type) -> (ResolvedType, Vec<ResolveError>) {
    let mut errors = Vec::new();
    let resolved = resolve_type_rec(table, ty, &mut errors);
    (resolved, errors)
}

fn resolve_type_rec(table: &SymbolTable, ty: &Type, errors: &mut Vec<ResolveError>) -> ResolvedType {
    match ty {
        Type::Named { name, span } => {
            if let Some(prim) = PrimitiveType::from_name(name) {
                return ResolvedType::Primitive(prim);
            }
            match table.lookup(name) {
                Some(Symbol { kind: SymbolKind::TypeParam { constraints }, .. }) => {
                    ResolvedType::TypeVar { name: name.clone(), constraints: constraints.clone() }
                }
                Some(Symbol { id, kind: SymbolKind::TypeDef { type_params, .. }, .. }) => {
                    if !type_params.is_empty() {
                        errors.push(ResolveError::WrongArity { name: name.clone(), expected: type_params.len(), found: 0, span: *span });
                        return ResolvedType::Error;
                    }
                    ResolvedType::Named { symbol: *id, name: name.clone() }
                }
                Some(_) | None => {
                    errors.push(ResolveError::UndefinedType { name: name.clone(), span: *span });
                    ResolvedType::Error
                }
            }
        }
        Type::Generic { base, args, span } => {
            let resolved_args: Vec<ResolvedType> = args.iter().map(|a| resolve_type_rec(table, a, errors)).collect();
            match table.lookup(base) {
                Some(Symbol { id, kind: SymbolKind::TypeDef { type_params, .. }, .. }) => {
                    if type_params.len() != resolved_args.len() {
                        errors.push(ResolveError::WrongArity {
                            name: base.clone(),
                            expected: type_params.len(),
                            found: resolved_args.len(),
                            span: *span,
                        });
                        return ResolvedType::Error;
                    }
                    ResolvedType::Instantiated { symbol: *id, name: base.clone(), args: resolved_args }
                }
                _ => {
                    errors.push(ResolveError::UndefinedType { name: base.clone(), span: *span });
                    ResolvedType::Error
                }
            }
        }
        Type::Function { params, ret, is_effect, .. } => ResolvedType::Function {
            params: params.iter().map(|p| resolve_type_rec(table, p, errors)).collect(),
            ret: Box::new(resolve_type_rec(table, ret, errors)),
            is_effect: *is_effect,
        },
        Type::Tuple { elements, .. } => {
            ResolvedType::Tuple(elements.iter().map(|e| resolve_type_rec(table, e, errors)).collect())
        }
        Type::Array { element, size, .. } => {
            ResolvedType::Array { element: Box::new(resolve_type_rec(table, element, errors)), size: *size }
        }
        Type::Io { inner, .. } => ResolvedType::Io(Box::new(resolve_type_rec(table, inner, errors))),
        Type::Result { ok, err, .. } => ResolvedType::Result {
            ok: Box::new(resolve_type_rec(table, ok, errors)),
            err: Box::new(resolve_type_rec(table, err, errors)),
        },
        Type::Option { inner, .. } => ResolvedType::Option(Box::new(resolve_type_rec(table, inner, errors))),
        Type::SelfType { .. } => ResolvedType::SelfType,
        Type::Path { segments, span } => match table.lookup_path(segments) {
            Some(sym) if matches!(sym.kind, SymbolKind::TypeDef { .. }) => {
                ResolvedType::Named { symbol: sym.id, name: segments.join("::") }
            }
            _ => {
                errors.push(ResolveError::UndefinedType { name: segments.join("::"), span: *span });
                ResolvedType::Error
            }
        },
        Type::Inferred { span } => {
            errors.push(ResolveError::InferredTypeNotAllowed { span: *span });
            ResolvedType::Error
        }
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves an entire program, returning the populated symbol table and any
/// diagnostics raised along the way. Resolution never stops at the first
/// error: every remaining declaration is still visited so a single check
/// pass reports as much as it can.
pub fn resolve_program(program: &Program) -> (SymbolTable, Vec<Diagnostic>) {
    Resolver::new().resolve_program(program)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kira_parser::parse;

    fn resolve_source(src: &str) -> (SymbolTable, Vec<Diagnostic>) {
        let parsed = parse(src);
        assert!(parsed.errors.is_empty(), "parse errors: {:?}", parsed.errors);
        resolve_program(&parsed.program)
    }

    #[test]
    fn resolves_simple_function_signature() {
        let (table, diags) = resolve_source("fn add(a: i32, b: i32) -> i32 {\n  return a + b\n}\n");
        assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
        let sym = table.lookup("add").unwrap();
        match &sym.kind {
            SymbolKind::Function(sig) => {
                assert_eq!(sig.params.len(), 2);
                assert_eq!(sig.ret, ResolvedType::Primitive(PrimitiveType::I32));
            }
            other => panic!("expected function symbol, got {other:?}"),
        }
    }

    #[test]
    fn mutually_referring_product_types_resolve_regardless_of_order() {
        let src = "type A {\n  next: B\n}\n\ntype B {\n  prev: A\n}\n";
        let (table, diags) = resolve_source(src);
        assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
        let a = table.lookup("A").unwrap();
        match &a.kind {
            SymbolKind::TypeDef { kind: TypeDefKind::Product { fields }, .. } => {
                assert_eq!(fields[0].0, "next");
                assert!(matches!(fields[0].1, ResolvedType::Named { .. }));
            }
            other => panic!("expected product type, got {other:?}"),
        }
    }

    #[test]
    fn generic_type_with_wrong_arity_is_reported() {
        let src = "type Box[T] {\n  value: T\n}\n\nconst X: Box = 0\n";
        let (_table, diags) = resolve_source(src);
        assert!(diags.iter().any(|d| d.code == "E0204"));
    }

    #[test]
    fn undefined_type_is_reported() {
        let (_table, diags) = resolve_source("fn f(x: Nonexistent) -> void {\n}\n");
        assert!(diags.iter().any(|d| d.code == "E0203"));
    }

    #[test]
    fn module_members_are_reachable_by_path() {
        let src = "module shapes {\n  pub fn area(r: f64) -> f64 {\n    return r * r\n  }\n}\n";
        let (table, diags) = resolve_source(src);
        assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
        let sym = table.lookup_path(&["shapes".to_string(), "area".to_string()]).unwrap();
        assert_eq!(sym.name, "area");
    }

    #[test]
    fn sum_type_variants_resolve_field_types() {
        let src = "type Shape =\n  Circle(f64)\n  | Point { x: f64, y: f64 }\n  | Nil\n";
        let (table, diags) = resolve_source(src);
        assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
        let sym = table.lookup("Shape").unwrap();
        match &sym.kind {
            SymbolKind::TypeDef { kind: TypeDefKind::Sum { variants }, .. } => {
                assert_eq!(variants.len(), 3);
                assert!(matches!(&variants[0].fields, VariantFieldsSig::Tuple(tys) if tys.len() == 1));
                assert!(matches!(&variants[1].fields, VariantFieldsSig::Record(fields) if fields.len() == 2));
                assert!(matches!(&variants[2].fields, VariantFieldsSig::Unit));
            }
            other => panic!("expected sum type, got {other:?}"),
        }
    }

    #[test]
    fn inferred_type_placeholder_is_rejected() {
        let parsed = parse("fn f(x: _) -> void {\n}\n");
        // The parser accepts `_` syntactically; resolution is where
        // annotations become mandatory.
        let (_table, diags) = resolve_program(&parsed.program);
        assert!(diags.iter().any(|d| d.code == "E0205"));
    }
}
