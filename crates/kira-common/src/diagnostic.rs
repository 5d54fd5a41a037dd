use std::fmt;

use serde::Serialize;

use crate::span::Span;

/// Severity of a [`Diagnostic`]. Only `Error` causes a pipeline stage to
/// report overall failure; `Warning` and `Info` are advisory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// A secondary span attached to a diagnostic, with its own message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelatedSpan {
    pub span: Span,
    pub message: String,
}

/// A single diagnostic produced by any compiler stage.
///
/// Every stage-specific error type (`LexError`, `ParseError`, `TypeError`,
/// `RuntimeError`) converts into this one carrier via a `to_diagnostic`
/// method, so the CLI and the ariadne-based renderer never special-case a
/// stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub span: Span,
    pub message: String,
    /// Stable code such as `E0007` or `W0001`, used by tooling and tests.
    pub code: &'static str,
    pub related: Vec<RelatedSpan>,
}

impl Diagnostic {
    pub fn error(code: &'static str, span: Span, message: impl Into<String>) -> Self {
        Self { severity: Severity::Error, span, message: message.into(), code, related: Vec::new() }
    }

    pub fn warning(code: &'static str, span: Span, message: impl Into<String>) -> Self {
        Self { severity: Severity::Warning, span, message: message.into(), code, related: Vec::new() }
    }

    pub fn with_related(mut self, span: Span, message: impl Into<String>) -> Self {
        self.related.push(RelatedSpan { span, message: message.into() });
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.code, self.message)
    }
}

impl std::error::Error for Diagnostic {}

/// Returns `true` iff any diagnostic in the slice is error-severity.
pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(Diagnostic::is_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_display() {
        let d = Diagnostic::error("E0005", Span::new(0, 3), "type mismatch");
        assert_eq!(d.to_string(), "error[E0005]: type mismatch");
    }

    #[test]
    fn with_related_appends() {
        let d = Diagnostic::error("E0001", Span::new(0, 1), "oops")
            .with_related(Span::new(2, 3), "defined here");
        assert_eq!(d.related.len(), 1);
        assert_eq!(d.related[0].message, "defined here");
    }

    #[test]
    fn has_errors_true_only_with_error_severity() {
        let warnings = vec![Diagnostic::warning("W0001", Span::new(0, 1), "unreachable")];
        assert!(!has_errors(&warnings));
        let errors = vec![Diagnostic::error("E0001", Span::new(0, 1), "bad")];
        assert!(has_errors(&errors));
    }
}
