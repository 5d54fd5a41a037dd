//! Parser for the Kira language: turns source text into a typed [`ast::Program`].
//!
//! Parsing never aborts outright. Syntax errors are collected into
//! [`Parse::errors`] via panic-mode recovery, and the returned [`ast::Program`]
//! reflects whatever could be reconstructed around them -- callers that care
//! about correctness should check `errors.is_empty()` before trusting it.

pub mod ast;
pub mod error;
mod parser;

pub use ast::Program;
pub use error::ParseError;

use parser::Parser;

/// The result of parsing one source file.
pub struct Parse {
    pub program: Program,
    pub errors: Vec<ParseError>,
}

/// Lexes and parses `source`, always producing a [`Program`] (possibly
/// partial) alongside any diagnostics collected along the way.
pub fn parse(source: &str) -> Parse {
    let tokens = kira_lexer::Lexer::tokenize(source);
    let mut parser = Parser::new(tokens, source);
    let program = parser.parse_program();
    Parse { program, errors: parser.into_errors() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_empty_source() {
        let result = parse("");
        assert!(result.errors.is_empty());
        assert!(result.program.decls.is_empty());
    }

    #[test]
    fn parses_simple_function() {
        let result = parse("fn add(a: i32, b: i32) -> i32 {\n  return a + b\n}\n");
        assert!(result.errors.is_empty(), "{:?}", result.errors);
        assert_eq!(result.program.decls.len(), 1);
    }

    #[test]
    fn recovers_from_a_syntax_error_and_keeps_parsing() {
        let src = "fn broken( {\n}\n\nfn ok() -> i32 {\n  return 1\n}\n";
        let result = parse(src);
        assert!(!result.errors.is_empty());
        assert!(result.program.decls.iter().any(|d| matches!(
            &d.kind,
            crate::ast::DeclKind::Fn { name, .. } if name == "ok"
        )));
    }
}
