//! Kira type checker: explicit-signature checking with effect discipline.
//!
//! Every binding in Kira carries its own type annotation, so this crate
//! has no unifier in the Hindley-Milner sense; it walks the resolved AST
//! checking each expression against the type its context demands. It
//! builds on [`kira_resolve`]'s symbol table and resolved types to assign
//! a type to every expression, enforce the effect/pure split, and check
//! `match` exhaustiveness and redundancy.
//!
//! # Architecture
//!
//! - [`unify`]: structural type predicates (equality, assignability, cast
//!   validity, comparable/equatable/iterable capability contracts)
//! - [`pattern`]: pattern spaces and the usefulness-based exhaustiveness
//!   and redundancy check
//! - [`error`]: type errors with diagnostic rendering
//! - [`checker`]: the AST walk that ties the above together

pub mod checker;
pub mod error;
pub mod pattern;
pub mod unify;

pub use checker::check_program;
pub use error::TypeError;
pub use pattern::{check_exhaustiveness, check_redundancy, MissingPattern, PatternSpace, SubjectType};
