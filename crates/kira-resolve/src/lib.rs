//! Symbol tables and resolved types for the Kira language.
//!
//! This crate sits between `kira-parser` and `kira-typeck`: it turns the
//! syntactic AST's names and type annotations into a [`SymbolTable`] of
//! fully qualified symbols and [`ResolvedType`] trees the checker and
//! interpreter can both consume without re-parsing a `Type`.

pub mod resolve;
pub mod symbol;
pub mod ty;

pub use resolve::{resolve_program, resolve_type_in_scope, Resolver};
pub use symbol::{
    FunctionSig, ResolveError, ScopeId, ScopeKind, Symbol, SymbolId, SymbolKind, SymbolTable, TypeDefKind,
    VariantFieldsSig, VariantSig,
};
pub use ty::{instantiate, PrimitiveType, ResolvedType, Substitution};
