//! Type errors, grounded on `mesh-typeck/src/error.rs`'s `TypeError` enum
//! and per-variant `Display` impl, stripped of `ConstraintOrigin` (there is
//! no constraint solver here to attribute a mismatch back to — every
//! mismatch is discovered directly at the AST node that caused it, so a
//! `Span` is enough provenance).

use std::fmt;

use kira_common::{Diagnostic, Span};
use kira_resolve::ResolvedType;

#[derive(Debug, Clone)]
pub enum TypeError {
    Mismatch { expected: ResolvedType, found: ResolvedType, span: Span },
    UndefinedSymbol { name: String, span: Span },
    UndefinedType { name: String, span: Span },
    WrongArgumentCount { expected: usize, found: usize, span: Span },
    InvalidBinaryOperand { op: String, ty: ResolvedType, span: Span },
    InvalidUnaryOperand { op: String, ty: ResolvedType, span: Span },
    NoSuchField { ty: ResolvedType, field: String, span: Span },
    MissingField { type_name: String, field: String, span: Span },
    UnknownField { type_name: String, field: String, span: Span },
    NotCallable { ty: ResolvedType, span: Span },
    UnknownVariant { name: String, span: Span },
    InvalidCast { source: ResolvedType, target: ResolvedType, span: Span },
    /// Calling an effect function, or using `?`, from a pure context; `?`
    /// applied to a Result when the function doesn't return Result; `main`
    /// declared without the effect annotation.
    EffectViolation { message: String, span: Span },
    NonExhaustiveMatch { scrutinee_type: String, missing: Vec<String>, span: Span },
    UnreachablePattern { arm_index: usize, span: Span },
}

impl TypeError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            TypeError::Mismatch { expected, found, span } => {
                Diagnostic::error("E0301", *span, format!("expected `{expected}`, found `{found}`"))
            }
            TypeError::UndefinedSymbol { name, span } => {
                Diagnostic::error("E0302", *span, format!("undefined symbol `{name}`"))
            }
            TypeError::UndefinedType { name, span } => {
                Diagnostic::error("E0303", *span, format!("undefined type `{name}`"))
            }
            TypeError::WrongArgumentCount { expected, found, span } => Diagnostic::error(
                "E0304",
                *span,
                format!("expected {expected} argument(s), found {found}"),
            ),
            TypeError::InvalidBinaryOperand { op, ty, span } => {
                Diagnostic::error("E0305", *span, format!("operator `{op}` cannot be applied to `{ty}`"))
            }
            TypeError::InvalidUnaryOperand { op, ty, span } => {
                Diagnostic::error("E0306", *span, format!("unary operator `{op}` cannot be applied to `{ty}`"))
            }
            TypeError::NoSuchField { ty, field, span } => {
                Diagnostic::error("E0307", *span, format!("type `{ty}` has no field `{field}`"))
            }
            TypeError::MissingField { type_name, field, span } => {
                Diagnostic::error("E0308", *span, format!("missing field `{field}` in `{type_name}` literal"))
            }
            TypeError::UnknownField { type_name, field, span } => {
                Diagnostic::error("E0309", *span, format!("`{type_name}` has no field `{field}`"))
            }
            TypeError::NotCallable { ty, span } => {
                Diagnostic::error("E0310", *span, format!("`{ty}` is not callable"))
            }
            TypeError::UnknownVariant { name, span } => {
                Diagnostic::error("E0311", *span, format!("unknown variant `{name}`"))
            }
            TypeError::InvalidCast { source, target, span } => {
                Diagnostic::error("E0312", *span, format!("cannot cast `{source}` as `{target}`"))
            }
            TypeError::EffectViolation { message, span } => Diagnostic::error("E0313", *span, message.clone()),
            TypeError::NonExhaustiveMatch { scrutinee_type, missing, span } => Diagnostic::error(
                "E0314",
                *span,
                format!("non-exhaustive match on `{scrutinee_type}`: missing {}", missing.join(", ")),
            ),
            TypeError::UnreachablePattern { arm_index, span } => {
                Diagnostic::warning("W0001", *span, format!("match arm {arm_index} is unreachable"))
            }
        }
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_diagnostic().message)
    }
}

impl std::error::Error for TypeError {}

#[cfg(test)]
mod tests {
    use super::*;
    use kira_resolve::PrimitiveType;

    #[test]
    fn mismatch_renders_both_types() {
        let err = TypeError::Mismatch {
            expected: ResolvedType::Primitive(PrimitiveType::I32),
            found: ResolvedType::Primitive(PrimitiveType::String),
            span: Span::new(0, 1),
        };
        let diag = err.to_diagnostic();
        assert_eq!(diag.code, "E0301");
        assert!(diag.message.contains("i32"));
        assert!(diag.message.contains("string"));
    }

    #[test]
    fn unreachable_pattern_is_a_warning() {
        let err = TypeError::UnreachablePattern { arm_index: 2, span: Span::new(0, 1) };
        assert!(!err.to_diagnostic().is_error());
    }
}
