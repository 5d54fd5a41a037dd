use std::fmt;

use kira_common::{Diagnostic, Span};

/// A parser error with location information.
///
/// Errors are collected during parsing rather than aborting immediately;
/// the parser performs simple panic-mode recovery (skip to the next
/// statement boundary) so a single syntax error doesn't suppress every
/// diagnostic after it.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
    pub related: Option<(String, Span)>,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self { message: message.into(), span, related: None }
    }

    pub fn with_related(mut self, message: impl Into<String>, span: Span) -> Self {
        self.related = Some((message.into(), span));
        self
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error("E0001", self.span, self.message.clone());
        match &self.related {
            Some((msg, span)) => diag.with_related(*span, msg.clone()),
            None => diag,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_display() {
        let err = ParseError::new("expected ')'", Span::new(4, 5));
        assert_eq!(err.to_string(), "expected ')'");
    }

    #[test]
    fn parse_error_to_diagnostic_is_error_severity() {
        let err = ParseError::new("expected ')'", Span::new(4, 5));
        assert!(err.to_diagnostic().is_error());
    }
}
