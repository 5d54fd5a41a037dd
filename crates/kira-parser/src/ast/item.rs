use kira_common::Span;

use super::expr::Expr;
use super::pat::Pattern;
use super::ty::Type;

/// A function parameter: `name: Type`.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub ty: Type,
    pub span: Span,
}

/// A generic type parameter, with optional trait constraints: `T: Ord`.
#[derive(Debug, Clone)]
pub struct TypeParam {
    pub name: String,
    pub constraints: Vec<String>,
    pub span: Span,
}

/// One variant of a sum type: `Circle(f64)`, `Point { x: f64, y: f64 }`, `Nil`.
#[derive(Debug, Clone)]
pub struct Variant {
    pub name: String,
    pub fields: VariantFields,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum VariantFields {
    Unit,
    Tuple(Vec<Type>),
    Record(Vec<(String, Type)>),
}

/// A top-level declaration.
#[derive(Debug, Clone)]
pub struct Decl {
    pub kind: DeclKind,
    pub is_pub: bool,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum DeclKind {
    Module { name: String, decls: Vec<Decl> },
    Import { path: Vec<String>, alias: Option<String> },
    Fn {
        name: String,
        type_params: Vec<TypeParam>,
        params: Vec<Param>,
        ret: Type,
        is_effect: bool,
        body: Vec<Stmt>,
    },
    Const { name: String, ty: Type, value: Expr },
    Let { pattern: Pattern, ty: Type, value: Expr },
    /// A sum type: `type Shape = Circle(f64) | Point { x: f64, y: f64 }`.
    SumType { name: String, type_params: Vec<TypeParam>, variants: Vec<Variant> },
    /// A product type: `type Point { x: f64, y: f64 }`.
    ProductType { name: String, type_params: Vec<TypeParam>, fields: Vec<(String, Type)> },
    /// A type alias: `type UserId = i64`.
    TypeAlias { name: String, type_params: Vec<TypeParam>, target: Type },
    Trait {
        name: String,
        type_params: Vec<TypeParam>,
        methods: Vec<TraitMethod>,
    },
    Impl {
        trait_name: Option<String>,
        type_params: Vec<TypeParam>,
        target: Type,
        methods: Vec<Decl>,
    },
    /// A `test "description" { ... }` block.
    Test { name: String, body: Vec<Stmt> },
}

/// A method signature declared inside a `trait` body (no body, just the
/// contract other `impl`s must satisfy).
#[derive(Debug, Clone)]
pub struct TraitMethod {
    pub name: String,
    pub params: Vec<Param>,
    pub ret: Type,
    pub is_effect: bool,
    pub span: Span,
}

/// A statement inside a block.
#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    Let { pattern: Pattern, ty: Type, value: Expr },
    Var { name: String, ty: Option<Type>, value: Option<Expr> },
    Assign { target: Expr, value: Expr },
    If { cond: Expr, then_branch: Vec<Stmt>, else_branch: Option<Vec<Stmt>> },
    For { pattern: Pattern, iterable: Expr, body: Vec<Stmt> },
    While { cond: Expr, body: Vec<Stmt> },
    Loop { body: Vec<Stmt> },
    Match { subject: Expr, arms: Vec<MatchArm> },
    Return { value: Option<Expr> },
    Break,
    Expr(Expr),
    Block(Vec<Stmt>),
}

#[derive(Debug, Clone)]
pub struct MatchArm {
    pub pattern: Pattern,
    pub guard: Option<Expr>,
    pub body: Vec<Stmt>,
    pub span: Span,
}
