//! Typed AST nodes for Kira source files.
//!
//! Unlike a lossless concrete syntax tree, these are plain owned enums built
//! directly by the parser: there is no green/red tree indirection and no
//! token trivia preserved. Every node still carries a [`Span`] so
//! diagnostics can point back at source text.

pub mod expr;
pub mod item;
pub mod pat;
pub mod ty;

pub use expr::{Expr, ExprKind, StringPart};
pub use item::{Decl, DeclKind, Param, Stmt, StmtKind, TypeParam, Variant};
pub use pat::{Pattern, PatternKind};
pub use ty::Type;

use kira_common::Span;

/// The root of a parsed source file: an ordered list of top-level
/// declarations.
#[derive(Debug, Clone)]
pub struct Program {
    pub decls: Vec<Decl>,
    pub span: Span,
}
