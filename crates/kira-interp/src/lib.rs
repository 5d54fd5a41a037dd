//! Tree-walking evaluator and builtin registry for Kira programs that have
//! already passed [`kira_typeck`] checking.
//!
//! This crate trusts its input: it does not re-derive types or effect
//! discipline, and a program the checker rejected is not a program this
//! crate promises to run correctly. What it adds on top of the AST is
//! purely runtime: environments, values, and the control-flow machinery
//! (`return`, `break`, `?`) a checked program still needs at execution
//! time.

pub mod builtins;
pub mod env;
pub mod error;
pub mod interp;
pub mod value;

pub use builtins::BuiltinContext;
pub use env::Environment;
pub use error::RuntimeError;
pub use interp::Interpreter;
pub use value::{FunctionValue, Value, VariantData};
