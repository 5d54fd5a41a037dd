use kira_common::Span;

use super::item::{MatchArm, Param};
use super::pat::LiteralPat;
use super::ty::Type;

/// An expression node.
#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Literal(LiteralPat),
    /// An interpolated string: `"hello ${name}!"`.
    InterpolatedString(Vec<StringPart>),
    Ident(String),
    SelfValue,
    SelfType,
    Binary { op: BinaryOp, lhs: Box<Expr>, rhs: Box<Expr> },
    Unary { op: UnaryOp, operand: Box<Expr> },
    Field { object: Box<Expr>, field: String },
    Index { object: Box<Expr>, index: Box<Expr> },
    /// `(a, b).1` — tuple element access.
    TupleIndex { object: Box<Expr>, index: u32 },
    Call { callee: Box<Expr>, args: Vec<Expr> },
    MethodCall { receiver: Box<Expr>, method: String, args: Vec<Expr> },
    Closure { params: Vec<Param>, ret: Option<Type>, is_effect: bool, body: Vec<super::item::Stmt> },
    If { cond: Box<Expr>, then_branch: Box<Expr>, else_branch: Option<Box<Expr>> },
    /// An `if` used as a statement-shaped block expression rather than a
    /// value-producing ternary; the checker unifies the branch types for
    /// both forms (see SPEC_FULL.md §4.5).
    Block(Vec<super::item::Stmt>),
    Match { subject: Box<Expr>, arms: Vec<MatchArm> },
    Tuple(Vec<Expr>),
    Array(Vec<Expr>),
    /// `{ x: 1, y: 2 }` or `Point { x: 1, y: 2 }`.
    Record { type_name: Option<String>, fields: Vec<(String, Expr)> },
    /// A variant constructor call: `Some(1)`, `Circle(2.0)`, `Ok(x)`.
    VariantConstructor { name: String, args: Vec<Expr> },
    Cast { operand: Box<Expr>, target: Type },
    Range { start: Option<Box<Expr>>, end: Option<Box<Expr>>, inclusive: bool },
    /// `e?`.
    Try(Box<Expr>),
    /// `e ?? default`.
    Coalesce { operand: Box<Expr>, default: Box<Expr> },
    Group(Box<Expr>),
}

/// One segment of an interpolated string literal.
#[derive(Debug, Clone)]
pub enum StringPart {
    Text(String),
    Expr(Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    And,
    Or,
    Is,
    In,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}
