//! Runtime errors, grounded on `kira-parser::error::ParseError`'s
//! message-plus-span shape and `to_diagnostic`/`Display`/`Error` trio.
//!
//! The checker already rejects every program that could raise a
//! `TypeMismatch`, `ArityMismatch`, `NotCallable`, or `InvalidCast` at a
//! statically known call site; these variants exist for the cases the
//! checker cannot see through (values arriving from a builtin, or a
//! higher-order builtin calling back into user code with the wrong shape)
//! rather than as the primary line of defense.

use std::fmt;

use kira_common::{Diagnostic, Span};

#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeError {
    ArityMismatch { expected: usize, found: usize, span: Span },
    TypeMismatch { expected: String, found: String, span: Span },
    InvalidOperation { message: String, span: Span },
    InvalidCast { message: String, span: Span },
    AssertionFailed { message: String, span: Span },
    OutOfMemory,
}

impl RuntimeError {
    pub fn span(&self) -> Span {
        match self {
            RuntimeError::ArityMismatch { span, .. }
            | RuntimeError::TypeMismatch { span, .. }
            | RuntimeError::InvalidOperation { span, .. }
            | RuntimeError::InvalidCast { span, .. }
            | RuntimeError::AssertionFailed { span, .. } => *span,
            RuntimeError::OutOfMemory => Span::point(0),
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            RuntimeError::ArityMismatch { expected, found, span } => Diagnostic::error(
                "E0401",
                *span,
                format!("expected {expected} argument(s), found {found}"),
            ),
            RuntimeError::TypeMismatch { expected, found, span } => {
                Diagnostic::error("E0402", *span, format!("expected `{expected}`, found `{found}`"))
            }
            RuntimeError::InvalidOperation { message, span } => Diagnostic::error("E0403", *span, message.clone()),
            RuntimeError::InvalidCast { message, span } => Diagnostic::error("E0404", *span, message.clone()),
            RuntimeError::AssertionFailed { message, span } => {
                Diagnostic::error("E0405", *span, format!("assertion failed: {message}"))
            }
            RuntimeError::OutOfMemory => Diagnostic::error("E0406", Span::point(0), "out of memory"),
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_diagnostic().message)
    }
}

impl std::error::Error for RuntimeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assertion_failed_renders_message() {
        let err = RuntimeError::AssertionFailed { message: "x > 0".into(), span: Span::new(0, 1) };
        assert!(err.to_string().contains("x > 0"));
    }

    #[test]
    fn out_of_memory_is_error_severity() {
        assert!(RuntimeError::OutOfMemory.to_diagnostic().is_error());
    }
}
