//! Shared types for the Kira compiler: source spans, tokens, and diagnostics.
//!
//! Every other crate in this workspace depends on this one and nothing
//! else upstream of it; it has no knowledge of lexing, parsing, or
//! type checking.

pub mod diagnostic;
pub mod span;
pub mod token;

pub use diagnostic::{Diagnostic, RelatedSpan, Severity};
pub use span::{LineIndex, Location, Span};
pub use token::{keyword_from_str, Token, TokenKind};
