//! Lexical scopes and symbols.
//!
//! Scopes form a tree rooted at the module scope, generalizing the
//! teacher's flat scope stack (`snow_typeck::env::TypeEnv`) into a
//! parent-linked tree so that `lookupPath` can descend into a named
//! module's exported members rather than only searching outward.

use rustc_hash::FxHashMap;

use kira_common::{Diagnostic, Span};

use crate::ty::ResolvedType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Module,
    Function,
    Block,
    Impl,
    Trait,
}

/// One variant of a resolved sum type.
#[derive(Debug, Clone)]
pub struct VariantSig {
    pub name: String,
    pub fields: VariantFieldsSig,
}

#[derive(Debug, Clone)]
pub enum VariantFieldsSig {
    Unit,
    Tuple(Vec<ResolvedType>),
    Record(Vec<(String, ResolvedType)>),
}

#[derive(Debug, Clone)]
pub enum TypeDefKind {
    Sum { variants: Vec<VariantSig> },
    Product { fields: Vec<(String, ResolvedType)> },
    Alias { target: ResolvedType },
}

/// A function signature, stored on `SymbolKind::Function` so call sites can
/// check arity and argument/return types without re-walking the AST.
#[derive(Debug, Clone)]
pub struct FunctionSig {
    pub params: Vec<ResolvedType>,
    pub ret: ResolvedType,
    pub is_effect: bool,
    pub type_params: Vec<String>,
}

#[derive(Debug, Clone)]
pub enum SymbolKind {
    Variable { ty: ResolvedType, is_mut: bool },
    Function(FunctionSig),
    TypeDef { type_params: Vec<String>, kind: TypeDefKind },
    TraitDef { methods: Vec<(String, FunctionSig)> },
    TypeParam { constraints: Vec<String> },
    /// `import a::b as c`; `resolved` is filled in once the path resolves.
    ImportAlias { resolved: Option<SymbolId> },
    /// A `module name { .. }` declaration; its body lives in `scope_id`.
    Module { scope_id: ScopeId },
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub id: SymbolId,
    pub name: String,
    pub kind: SymbolKind,
    pub scope_id: ScopeId,
    pub span: Span,
    pub is_pub: bool,
}

struct Scope {
    kind: ScopeKind,
    parent: Option<ScopeId>,
    names: FxHashMap<String, SymbolId>,
}

/// Errors raised while defining or resolving names. These are distinct
/// from `kira_parser::ParseError` because they carry no recovery-retry
/// state of their own; the checker decides whether to keep walking.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolveError {
    DuplicateDefinition { name: String, span: Span, first_span: Span },
    UndefinedSymbol { name: String, span: Span },
    UndefinedType { name: String, span: Span },
    WrongArity { name: String, expected: usize, found: usize, span: Span },
    InferredTypeNotAllowed { span: Span },
}

impl ResolveError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ResolveError::DuplicateDefinition { name, span, first_span } => {
                Diagnostic::error("E0201", *span, format!("'{name}' is already defined in this scope"))
                    .with_related(*first_span, "first defined here")
            }
            ResolveError::UndefinedSymbol { name, span } => {
                Diagnostic::error("E0202", *span, format!("undefined symbol '{name}'"))
            }
            ResolveError::UndefinedType { name, span } => {
                Diagnostic::error("E0203", *span, format!("undefined type '{name}'"))
            }
            ResolveError::WrongArity { name, expected, found, span } => Diagnostic::error(
                "E0204",
                *span,
                format!("'{name}' expects {expected} type argument(s), found {found}"),
            ),
            ResolveError::InferredTypeNotAllowed { span } => {
                Diagnostic::error("E0205", *span, "a type annotation is required here; `_` is not allowed")
            }
        }
    }
}

/// Scope tree plus the flat symbol arena it references by id.
///
/// Scope enter/leave must balance: every `enter_scope` call has exactly one
/// matching `leave_scope` on every control-flow exit, mirroring the
/// invariant the type checker asserts while walking the AST.
pub struct SymbolTable {
    scopes: Vec<Scope>,
    symbols: Vec<Symbol>,
    current: ScopeId,
}

impl SymbolTable {
    pub fn new() -> Self {
        let root = Scope { kind: ScopeKind::Module, parent: None, names: FxHashMap::default() };
        Self { scopes: vec![root], symbols: Vec::new(), current: ScopeId(0) }
    }

    pub fn current_scope(&self) -> ScopeId {
        self.current
    }

    pub fn enter_scope(&mut self, kind: ScopeKind) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope { kind, parent: Some(self.current), names: FxHashMap::default() });
        self.current = id;
        id
    }

    /// Re-enters a scope created earlier by [`enter_scope`](Self::enter_scope),
    /// without creating a new one. Used by the type checker to walk back
    /// into a module or type scope the resolver already built, so that
    /// sibling top-level symbols stay reachable by ordinary outward lookup.
    /// The matching [`leave_scope`](Self::leave_scope) call returns to
    /// whatever scope was current when `id` was first created, not to the
    /// scope that was current just before this call.
    pub fn enter_existing_scope(&mut self, id: ScopeId) {
        self.current = id;
    }

    /// Pops the current scope, returning to its parent.
    ///
    /// # Panics
    /// Panics if called on the root module scope — an unbalanced
    /// enter/leave pair is an invariant violation, not a recoverable error.
    pub fn leave_scope(&mut self) {
        let parent = self.scopes[self.current.0 as usize]
            .parent
            .expect("cannot leave the root module scope");
        self.current = parent;
    }

    pub fn scope_kind(&self, id: ScopeId) -> ScopeKind {
        self.scopes[id.0 as usize].kind
    }

    /// Defines `name` in the current scope. Fails if the name is already
    /// bound in this exact scope; shadowing an outer scope's binding is
    /// always allowed.
    pub fn define(&mut self, name: &str, kind: SymbolKind, span: Span, is_pub: bool) -> Result<SymbolId, ResolveError> {
        let scope = &self.scopes[self.current.0 as usize];
        if let Some(existing) = scope.names.get(name) {
            let first_span = self.symbols[existing.0 as usize].span;
            return Err(ResolveError::DuplicateDefinition { name: name.to_string(), span, first_span });
        }
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(Symbol { id, name: name.to_string(), kind, scope_id: self.current, span, is_pub });
        self.scopes[self.current.0 as usize].names.insert(name.to_string(), id);
        Ok(id)
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0 as usize]
    }

    /// Every symbol defined anywhere in the table, in definition order.
    /// Used by the checker to build lookup indexes (sum-type variant names,
    /// impl method tables) that this tree doesn't index directly.
    pub fn all_symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn symbol_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.0 as usize]
    }

    /// Walks outward from the given scope through its parents, returning
    /// the first symbol bound to `name`.
    pub fn lookup_from(&self, scope: ScopeId, name: &str) -> Option<&Symbol> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let s = &self.scopes[id.0 as usize];
            if let Some(sym_id) = s.names.get(name) {
                return Some(&self.symbols[sym_id.0 as usize]);
            }
            current = s.parent;
        }
        None
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.lookup_from(self.current, name)
    }

    /// Resolves a `::`-qualified path: the first segment is looked up by
    /// ordinary scoped lookup, then each subsequent segment descends into
    /// the current symbol's exported members (a `Module`'s scope, or a
    /// sum type's variants treated as members). `ImportAlias` symbols are
    /// followed transparently through their `resolved` id.
    pub fn lookup_path(&self, segments: &[String]) -> Option<&Symbol> {
        let (first, rest) = segments.split_first()?;
        let mut sym = self.lookup(first)?;
        if let SymbolKind::ImportAlias { resolved: Some(id) } = &sym.kind {
            sym = self.symbol(*id);
        }
        for seg in rest {
            match &sym.kind {
                SymbolKind::Module { scope_id } => {
                    let next_id = self.scopes[scope_id.0 as usize].names.get(seg)?;
                    sym = self.symbol(*next_id);
                }
                _ => return None,
            }
            if let SymbolKind::ImportAlias { resolved: Some(id) } = &sym.kind {
                sym = self.symbol(*id);
            }
        }
        Some(sym)
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty::ResolvedType;

    fn dummy_span() -> Span {
        Span::new(0, 1)
    }

    #[test]
    fn define_and_lookup_in_same_scope() {
        let mut table = SymbolTable::new();
        table
            .define("x", SymbolKind::Variable { ty: ResolvedType::Void, is_mut: false }, dummy_span(), false)
            .unwrap();
        assert!(table.lookup("x").is_some());
        assert!(table.lookup("y").is_none());
    }

    #[test]
    fn duplicate_definition_in_same_scope_fails() {
        let mut table = SymbolTable::new();
        table
            .define("x", SymbolKind::Variable { ty: ResolvedType::Void, is_mut: false }, dummy_span(), false)
            .unwrap();
        let err = table
            .define("x", SymbolKind::Variable { ty: ResolvedType::Void, is_mut: false }, dummy_span(), false)
            .unwrap_err();
        assert!(matches!(err, ResolveError::DuplicateDefinition { .. }));
    }

    #[test]
    fn shadowing_across_scopes_is_allowed() {
        let mut table = SymbolTable::new();
        table
            .define("x", SymbolKind::Variable { ty: ResolvedType::Void, is_mut: false }, dummy_span(), false)
            .unwrap();
        table.enter_scope(ScopeKind::Block);
        table
            .define("x", SymbolKind::Variable { ty: ResolvedType::Error, is_mut: true }, dummy_span(), false)
            .unwrap();
        let sym = table.lookup("x").unwrap();
        assert!(matches!(sym.kind, SymbolKind::Variable { ty: ResolvedType::Error, is_mut: true }));
        table.leave_scope();
        let sym = table.lookup("x").unwrap();
        assert!(matches!(sym.kind, SymbolKind::Variable { ty: ResolvedType::Void, .. }));
    }

    #[test]
    fn lookup_walks_outward_through_nested_scopes() {
        let mut table = SymbolTable::new();
        table
            .define("outer", SymbolKind::Variable { ty: ResolvedType::Void, is_mut: false }, dummy_span(), false)
            .unwrap();
        table.enter_scope(ScopeKind::Function);
        table.enter_scope(ScopeKind::Block);
        assert!(table.lookup("outer").is_some());
    }

    #[test]
    #[should_panic(expected = "cannot leave the root module scope")]
    fn leaving_root_scope_panics() {
        let mut table = SymbolTable::new();
        table.leave_scope();
    }

    #[test]
    fn lookup_path_descends_into_module_members() {
        let mut table = SymbolTable::new();
        let module_scope = table.enter_scope(ScopeKind::Module);
        table
            .define("area", SymbolKind::Function(FunctionSig {
                params: vec![],
                ret: ResolvedType::Void,
                is_effect: false,
                type_params: vec![],
            }), dummy_span(), true)
            .unwrap();
        table.leave_scope();
        table
            .define("shapes", SymbolKind::Module { scope_id: module_scope }, dummy_span(), true)
            .unwrap();

        let path = vec!["shapes".to_string(), "area".to_string()];
        let sym = table.lookup_path(&path).unwrap();
        assert_eq!(sym.name, "area");
    }

    #[test]
    fn enter_existing_scope_reaches_names_bound_there() {
        let mut table = SymbolTable::new();
        let module_scope = table.enter_scope(ScopeKind::Module);
        table
            .define("area", SymbolKind::Variable { ty: ResolvedType::Void, is_mut: false }, dummy_span(), true)
            .unwrap();
        table.leave_scope();
        assert!(table.lookup("area").is_none());

        table.enter_existing_scope(module_scope);
        assert!(table.lookup("area").is_some());
        table.leave_scope();
        assert!(table.lookup("area").is_none());
    }

    #[test]
    fn lookup_path_follows_import_alias() {
        let mut table = SymbolTable::new();
        table
            .define("real", SymbolKind::Variable { ty: ResolvedType::Void, is_mut: false }, dummy_span(), true)
            .unwrap();
        let real_id = table.lookup("real").unwrap().id;
        table.define("alias", SymbolKind::ImportAlias { resolved: Some(real_id) }, dummy_span(), false).unwrap();

        let sym = table.lookup_path(&["alias".to_string()]).unwrap();
        assert_eq!(sym.name, "real");
    }
}
