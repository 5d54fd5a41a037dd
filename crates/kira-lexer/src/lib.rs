//! Kira lexer -- tokenizer for the Kira programming language.
//!
//! Produces a stream of [`Token`]s terminated by `Eof`. The lexer never
//! fails outright; unrecognized input is emitted as an `Invalid` token so
//! downstream stages can report and keep going.

mod cursor;

use cursor::Cursor;
use kira_common::token::{keyword_from_str, Token, TokenKind};

/// Tracks what the lexer is currently doing.
#[derive(Debug, Clone, PartialEq)]
enum LexerState {
    /// Normal top-level tokenization.
    Normal,
    /// Inside a string literal (after `StringStart` emitted).
    InString,
    /// Inside `${...}` string interpolation.
    InInterpolation { brace_depth: u32 },
}

/// The Kira lexer. Converts source text into a stream of tokens.
///
/// Wraps a [`Cursor`] for byte-level iteration and implements
/// `Iterator<Item = Token>`. Uses a state stack to handle nested string
/// interpolation contexts, and tracks the kind of the most recently
/// produced non-comment token to decide whether the next newline is
/// significant.
pub struct Lexer<'src> {
    cursor: Cursor<'src>,
    emitted_eof: bool,
    pending: Vec<Token>,
    state_stack: Vec<LexerState>,
    /// Whether the most recently produced non-comment, non-newline token
    /// was a "closer" -- the single piece of state driving newline
    /// significance (spec invariant: `allow_newline_terminator`).
    allow_newline_terminator: bool,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source text.
    pub fn new(source: &'src str) -> Self {
        Self {
            cursor: Cursor::new(source),
            emitted_eof: false,
            pending: Vec::new(),
            state_stack: vec![LexerState::Normal],
            allow_newline_terminator: false,
        }
    }

    /// Convenience: tokenize the entire source into a `Vec<Token>`.
    ///
    /// The returned vector includes the final `Eof` token.
    pub fn tokenize(source: &str) -> Vec<Token> {
        Lexer::new(source).collect()
    }

    fn current_state(&self) -> &LexerState {
        self.state_stack.last().expect("state stack must never be empty")
    }

    /// Produce the next token based on current state, then update the
    /// newline-significance flag per the spec invariant.
    fn produce_token(&mut self) -> Token {
        let token = match self.current_state().clone() {
            LexerState::Normal => self.lex_normal(),
            LexerState::InString => self.lex_string_content(),
            LexerState::InInterpolation { .. } => self.lex_interpolation(),
        };
        match token.kind {
            TokenKind::Newline => {}
            TokenKind::Comment => {}
            _ => self.allow_newline_terminator = token.kind.is_closer(),
        }
        token
    }

    // ── Normal mode ────────────────────────────────────────────────────

    fn lex_normal(&mut self) -> Token {
        self.skip_whitespace();

        let start = self.cursor.pos();

        let Some(c) = self.cursor.peek() else {
            return Token::new(TokenKind::Eof, start, start);
        };

        match c {
            '\n' => self.lex_newline(start),
            '\r' => self.lex_newline(start),

            '(' => self.single_char_token(TokenKind::LParen, start),
            ')' => self.single_char_token(TokenKind::RParen, start),
            '[' => self.single_char_token(TokenKind::LBracket, start),
            ']' => self.single_char_token(TokenKind::RBracket, start),
            '{' => self.single_char_token(TokenKind::LBrace, start),
            '}' => self.single_char_token(TokenKind::RBrace, start),
            ',' => self.single_char_token(TokenKind::Comma, start),
            ';' => self.single_char_token(TokenKind::Semicolon, start),

            '=' => self.lex_eq(start),
            '!' => self.lex_bang(start),
            '<' => self.lex_lt(start),
            '>' => self.lex_gt(start),
            '&' => self.lex_amp(start),
            '|' => self.lex_pipe(start),
            '?' => self.lex_question(start),
            ':' => self.lex_colon(start),
            '.' => self.lex_dot(start),
            '*' => self.single_char_token(TokenKind::Star, start),
            '%' => self.single_char_token(TokenKind::Percent, start),
            '+' => self.single_char_token(TokenKind::Plus, start),
            '-' => self.lex_minus(start),

            '/' => self.lex_slash(start),

            '0'..='9' => self.lex_number(start),
            '\'' => self.lex_char(start),
            '"' => self.lex_string_start(start),

            c if is_ident_start(c) => self.lex_ident(start),

            _ => {
                self.cursor.advance();
                Token::new(TokenKind::Invalid, start, self.cursor.pos())
            }
        }
    }

    // ── Helpers ────────────────────────────────────────────────────────

    /// Skip whitespace characters (spaces and tabs only -- newlines are tokens).
    fn skip_whitespace(&mut self) {
        self.cursor.eat_while(|c| c == ' ' || c == '\t');
    }

    fn single_char_token(&mut self, kind: TokenKind, start: u32) -> Token {
        self.cursor.advance();
        Token::new(kind, start, self.cursor.pos())
    }

    fn lex_newline(&mut self, start: u32) -> Token {
        self.cursor.advance();
        if self.cursor.peek() == Some('\n') {
            // was \r, consume the following \n as part of the same terminator
            self.cursor.advance();
        }
        if self.allow_newline_terminator {
            Token::new(TokenKind::Newline, start, self.cursor.pos())
        } else {
            // Discarded: recurse to the next real token.
            self.lex_normal()
        }
    }

    // ── Operator lexing ────────────────────────────────────────────────

    fn lex_eq(&mut self, start: u32) -> Token {
        self.cursor.advance();
        match self.cursor.peek() {
            Some('=') => {
                self.cursor.advance();
                Token::new(TokenKind::EqEq, start, self.cursor.pos())
            }
            Some('>') => {
                self.cursor.advance();
                Token::new(TokenKind::FatArrow, start, self.cursor.pos())
            }
            _ => Token::new(TokenKind::Eq, start, self.cursor.pos()),
        }
    }

    fn lex_bang(&mut self, start: u32) -> Token {
        self.cursor.advance();
        if self.cursor.peek() == Some('=') {
            self.cursor.advance();
            Token::new(TokenKind::NotEq, start, self.cursor.pos())
        } else {
            Token::new(TokenKind::Bang, start, self.cursor.pos())
        }
    }

    fn lex_lt(&mut self, start: u32) -> Token {
        self.cursor.advance();
        if self.cursor.peek() == Some('=') {
            self.cursor.advance();
            Token::new(TokenKind::LtEq, start, self.cursor.pos())
        } else {
            Token::new(TokenKind::Lt, start, self.cursor.pos())
        }
    }

    fn lex_gt(&mut self, start: u32) -> Token {
        self.cursor.advance();
        if self.cursor.peek() == Some('=') {
            self.cursor.advance();
            Token::new(TokenKind::GtEq, start, self.cursor.pos())
        } else {
            Token::new(TokenKind::Gt, start, self.cursor.pos())
        }
    }

    /// `&&` -> `AmpAmp`, single `&` -> `Invalid`
    fn lex_amp(&mut self, start: u32) -> Token {
        self.cursor.advance();
        if self.cursor.peek() == Some('&') {
            self.cursor.advance();
            Token::new(TokenKind::AmpAmp, start, self.cursor.pos())
        } else {
            Token::new(TokenKind::Invalid, start, self.cursor.pos())
        }
    }

    /// `||` -> `PipePipe`, single `|` -> `Pipe` (or-pattern separator)
    fn lex_pipe(&mut self, start: u32) -> Token {
        self.cursor.advance();
        if self.cursor.peek() == Some('|') {
            self.cursor.advance();
            Token::new(TokenKind::PipePipe, start, self.cursor.pos())
        } else {
            Token::new(TokenKind::Pipe, start, self.cursor.pos())
        }
    }

    /// `?` -> `Question`, `??` -> `QuestionQuestion`
    fn lex_question(&mut self, start: u32) -> Token {
        self.cursor.advance();
        if self.cursor.peek() == Some('?') {
            self.cursor.advance();
            Token::new(TokenKind::QuestionQuestion, start, self.cursor.pos())
        } else {
            Token::new(TokenKind::Question, start, self.cursor.pos())
        }
    }

    /// `:` -> `Colon`, `::` -> `ColonColon`
    fn lex_colon(&mut self, start: u32) -> Token {
        self.cursor.advance();
        if self.cursor.peek() == Some(':') {
            self.cursor.advance();
            Token::new(TokenKind::ColonColon, start, self.cursor.pos())
        } else {
            Token::new(TokenKind::Colon, start, self.cursor.pos())
        }
    }

    /// `.` -> `Dot`, `..` -> `DotDot`, `..=` -> `DotDotEq`
    fn lex_dot(&mut self, start: u32) -> Token {
        self.cursor.advance();
        if self.cursor.peek() == Some('.') {
            self.cursor.advance();
            if self.cursor.peek() == Some('=') {
                self.cursor.advance();
                return Token::new(TokenKind::DotDotEq, start, self.cursor.pos());
            }
            Token::new(TokenKind::DotDot, start, self.cursor.pos())
        } else {
            Token::new(TokenKind::Dot, start, self.cursor.pos())
        }
    }

    /// `-` -> `Minus`, `->` -> `Arrow`
    fn lex_minus(&mut self, start: u32) -> Token {
        self.cursor.advance();
        if self.cursor.peek() == Some('>') {
            self.cursor.advance();
            Token::new(TokenKind::Arrow, start, self.cursor.pos())
        } else {
            Token::new(TokenKind::Minus, start, self.cursor.pos())
        }
    }

    /// `/` -> `Slash`, `//` -> line comment (skipped), `///` -> doc comment
    /// (preserved), `/* ... */` -> nested block comment (skipped).
    fn lex_slash(&mut self, start: u32) -> Token {
        self.cursor.advance(); // consume first '/'
        match self.cursor.peek() {
            Some('/') => {
                self.cursor.advance(); // consume second '/'
                if self.cursor.peek() == Some('/') {
                    self.cursor.advance(); // consume third '/' -> doc comment
                    if self.cursor.peek() == Some(' ') {
                        self.cursor.advance();
                    }
                    self.cursor.eat_while(|c| c != '\n' && c != '\r');
                    return Token::new(TokenKind::DocComment, start, self.cursor.pos());
                }
                self.cursor.eat_while(|c| c != '\n' && c != '\r');
                // Regular line comments are skipped like whitespace.
                self.lex_normal()
            }
            Some('*') => {
                self.cursor.advance(); // consume '*'
                self.lex_block_comment(start)
            }
            _ => Token::new(TokenKind::Slash, start, self.cursor.pos()),
        }
    }

    /// Lex a nestable block comment `/* ... */`, then resume normal lexing.
    fn lex_block_comment(&mut self, start: u32) -> Token {
        let mut depth: u32 = 1;
        loop {
            match self.cursor.peek() {
                None => return Token::new(TokenKind::Invalid, start, self.cursor.pos()),
                Some('/') if self.cursor.peek_next() == Some('*') => {
                    self.cursor.advance();
                    self.cursor.advance();
                    depth += 1;
                }
                Some('*') if self.cursor.peek_next() == Some('/') => {
                    self.cursor.advance();
                    self.cursor.advance();
                    depth -= 1;
                    if depth == 0 {
                        return self.lex_normal();
                    }
                }
                Some(_) => {
                    self.cursor.advance();
                }
            }
        }
    }

    // ── Number literals ───────────────────────────────────────────────

    /// Lex a number literal: decimal, hex (`0x`), or binary (`0b`), with
    /// underscore separators and an optional width/signedness suffix
    /// (`i8..i128`, `u8..u128`, `f32`, `f64`).
    fn lex_number(&mut self, start: u32) -> Token {
        let first = self.cursor.advance().unwrap();

        if first == '0' {
            match self.cursor.peek() {
                Some('x' | 'X') => return self.lex_radix(start, |c| c.is_ascii_hexdigit()),
                Some('b' | 'B') => return self.lex_radix(start, |c| c == '0' || c == '1'),
                _ => {}
            }
        }

        self.cursor.eat_while(|c| c.is_ascii_digit() || c == '_');

        let mut is_float = false;
        if self.cursor.peek() == Some('.') && self.cursor.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            self.cursor.advance();
            self.cursor.eat_while(|c| c.is_ascii_digit() || c == '_');
        }

        if matches!(self.cursor.peek(), Some('e' | 'E'))
            && matches!(self.cursor.peek_next(), Some(c) if c.is_ascii_digit() || c == '+' || c == '-')
        {
            is_float = true;
            self.lex_exponent();
        }

        self.lex_numeric_suffix();

        let kind = if is_float { TokenKind::FloatLiteral } else { TokenKind::IntLiteral };
        Token::new(kind, start, self.cursor.pos())
    }

    fn lex_radix(&mut self, start: u32, digit: impl Fn(char) -> bool) -> Token {
        self.cursor.advance(); // consume 'x'/'b'
        self.cursor.eat_while(|c| digit(c) || c == '_');
        self.lex_numeric_suffix();
        Token::new(TokenKind::IntLiteral, start, self.cursor.pos())
    }

    fn lex_exponent(&mut self) {
        self.cursor.advance(); // consume 'e'/'E'
        if matches!(self.cursor.peek(), Some('+' | '-')) {
            self.cursor.advance();
        }
        self.cursor.eat_while(|c| c.is_ascii_digit() || c == '_');
    }

    /// Consume an optional trailing type suffix (`i8`..`i128`, `u8`..`u128`,
    /// `f32`, `f64`). The lexer does not validate the suffix name; the
    /// parser/checker reject unknown suffixes.
    fn lex_numeric_suffix(&mut self) {
        if matches!(self.cursor.peek(), Some('i' | 'u' | 'f')) && self.cursor.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            self.cursor.advance();
            self.cursor.eat_while(|c| c.is_ascii_digit());
        }
    }

    // ── Char literals ──────────────────────────────────────────────────

    fn lex_char(&mut self, start: u32) -> Token {
        self.cursor.advance(); // consume opening '\''
        match self.cursor.peek() {
            Some('\\') => {
                self.cursor.advance();
                self.cursor.advance(); // escaped char
            }
            Some(_) => {
                self.cursor.advance();
            }
            None => return Token::new(TokenKind::Invalid, start, self.cursor.pos()),
        }
        if self.cursor.peek() == Some('\'') {
            self.cursor.advance();
            Token::new(TokenKind::CharLiteral, start, self.cursor.pos())
        } else {
            Token::new(TokenKind::Invalid, start, self.cursor.pos())
        }
    }

    // ── String literals ───────────────────────────────────────────────

    fn lex_string_start(&mut self, start: u32) -> Token {
        self.cursor.advance(); // consume '"'
        self.state_stack.push(LexerState::InString);
        Token::new(TokenKind::StringStart, start, self.cursor.pos())
    }

    /// Lex string content when in `InString` state. Scans until a `${`
    /// (interpolation), the closing `"`, an escape sequence, or EOF.
    fn lex_string_content(&mut self) -> Token {
        let start = self.cursor.pos();
        loop {
            match self.cursor.peek() {
                None => {
                    self.state_stack.pop();
                    let end = self.cursor.pos();
                    if end > start {
                        self.pending.push(Token::new(TokenKind::Invalid, end, end));
                        return Token::new(TokenKind::StringContent, start, end);
                    }
                    return Token::new(TokenKind::Invalid, start, end);
                }
                Some('$') if self.cursor.peek_next() == Some('{') => {
                    let content_end = self.cursor.pos();
                    self.cursor.advance();
                    self.cursor.advance();
                    let interp_end = self.cursor.pos();
                    self.state_stack.push(LexerState::InInterpolation { brace_depth: 0 });
                    self.pending.push(Token::new(TokenKind::InterpolationStart, content_end, interp_end));
                    if content_end > start {
                        return Token::new(TokenKind::StringContent, start, content_end);
                    }
                    return self.pending.remove(0);
                }
                Some('"') => {
                    let content_end = self.cursor.pos();
                    self.cursor.advance();
                    let str_end = self.cursor.pos();
                    self.state_stack.pop();
                    self.pending.push(Token::new(TokenKind::StringEnd, content_end, str_end));
                    if content_end > start {
                        return Token::new(TokenKind::StringContent, start, content_end);
                    }
                    return self.pending.remove(0);
                }
                Some('\\') => {
                    self.cursor.advance();
                    self.cursor.advance();
                }
                Some(_) => {
                    self.cursor.advance();
                }
            }
        }
    }

    // ── Interpolation ─────────────────────────────────────────────────

    /// Lex tokens inside `${...}`, tracking brace depth so nested `{}` in
    /// the interpolated expression (e.g. a record literal) doesn't close
    /// the interpolation early.
    fn lex_interpolation(&mut self) -> Token {
        self.skip_whitespace();
        let start = self.cursor.pos();

        let Some(c) = self.cursor.peek() else {
            self.state_stack.pop();
            return Token::new(TokenKind::Invalid, start, start);
        };

        match c {
            '{' => {
                if let Some(LexerState::InInterpolation { brace_depth }) = self.state_stack.last_mut() {
                    *brace_depth += 1;
                }
                self.single_char_token(TokenKind::LBrace, start)
            }
            '}' => {
                let brace_depth = match self.state_stack.last() {
                    Some(LexerState::InInterpolation { brace_depth }) => *brace_depth,
                    _ => 0,
                };
                if brace_depth == 0 {
                    self.cursor.advance();
                    let end = self.cursor.pos();
                    self.state_stack.pop();
                    Token::new(TokenKind::InterpolationEnd, start, end)
                } else {
                    if let Some(LexerState::InInterpolation { brace_depth }) = self.state_stack.last_mut() {
                        *brace_depth -= 1;
                    }
                    self.single_char_token(TokenKind::RBrace, start)
                }
            }
            '\n' | '\r' => self.lex_newline(start),
            '0'..='9' => self.lex_number(start),
            '\'' => self.lex_char(start),
            '"' => self.lex_string_start(start),
            c if is_ident_start(c) => self.lex_ident(start),
            '(' => self.single_char_token(TokenKind::LParen, start),
            ')' => self.single_char_token(TokenKind::RParen, start),
            '[' => self.single_char_token(TokenKind::LBracket, start),
            ']' => self.single_char_token(TokenKind::RBracket, start),
            ',' => self.single_char_token(TokenKind::Comma, start),
            ';' => self.single_char_token(TokenKind::Semicolon, start),
            '=' => self.lex_eq(start),
            '!' => self.lex_bang(start),
            '<' => self.lex_lt(start),
            '>' => self.lex_gt(start),
            '&' => self.lex_amp(start),
            '|' => self.lex_pipe(start),
            '?' => self.lex_question(start),
            ':' => self.lex_colon(start),
            '.' => self.lex_dot(start),
            '*' => self.single_char_token(TokenKind::Star, start),
            '%' => self.single_char_token(TokenKind::Percent, start),
            '+' => self.single_char_token(TokenKind::Plus, start),
            '-' => self.lex_minus(start),
            '/' => self.lex_slash(start),
            _ => {
                self.cursor.advance();
                Token::new(TokenKind::Invalid, start, self.cursor.pos())
            }
        }
    }

    // ── Identifiers and keywords ──────────────────────────────────────

    fn lex_ident(&mut self, start: u32) -> Token {
        self.cursor.advance();
        self.cursor.eat_while(is_ident_continue);
        let text = self.cursor.slice(start, self.cursor.pos());
        let kind = keyword_from_str(text).unwrap_or(TokenKind::Ident);
        Token::new(kind, start, self.cursor.pos())
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.emitted_eof {
            return None;
        }
        if !self.pending.is_empty() {
            let token = self.pending.remove(0);
            match token.kind {
                TokenKind::Eof => self.emitted_eof = true,
                TokenKind::Newline | TokenKind::Comment => {}
                _ => self.allow_newline_terminator = token.kind.is_closer(),
            }
            return Some(token);
        }
        let token = self.produce_token();
        if token.kind == TokenKind::Eof {
            self.emitted_eof = true;
        }
        Some(token)
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::tokenize(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lex_simple_expression() {
        assert_eq!(
            kinds("let x = 42"),
            vec![TokenKind::Let, TokenKind::Ident, TokenKind::Eq, TokenKind::IntLiteral, TokenKind::Eof]
        );
    }

    #[test]
    fn newline_significant_after_identifier() {
        assert_eq!(
            kinds("x\ny"),
            vec![TokenKind::Ident, TokenKind::Newline, TokenKind::Ident, TokenKind::Eof]
        );
    }

    #[test]
    fn newline_not_significant_after_operator() {
        // trailing '+' means the next line continues the expression
        assert_eq!(
            kinds("x +\ny"),
            vec![TokenKind::Ident, TokenKind::Plus, TokenKind::Ident, TokenKind::Eof]
        );
    }

    #[test]
    fn newline_not_significant_after_open_paren() {
        assert_eq!(
            kinds("f(\nx\n)"),
            vec![
                TokenKind::Ident,
                TokenKind::LParen,
                TokenKind::Ident,
                TokenKind::Newline,
                TokenKind::RParen,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn newline_significant_after_return_and_break() {
        assert_eq!(kinds("return\nx"), vec![TokenKind::Return, TokenKind::Newline, TokenKind::Ident, TokenKind::Eof]);
        assert_eq!(kinds("break\nx"), vec![TokenKind::Break, TokenKind::Newline, TokenKind::Ident, TokenKind::Eof]);
    }

    #[test]
    fn newline_significant_after_closing_delimiters() {
        assert_eq!(kinds("f()\nx"), vec![
            TokenKind::Ident, TokenKind::LParen, TokenKind::RParen, TokenKind::Newline, TokenKind::Ident, TokenKind::Eof
        ]);
        assert_eq!(kinds("[1]\nx"), vec![
            TokenKind::LBracket, TokenKind::IntLiteral, TokenKind::RBracket, TokenKind::Newline, TokenKind::Ident, TokenKind::Eof
        ]);
    }

    #[test]
    fn lex_simple_string() {
        assert_eq!(
            kinds(r#""hello""#),
            vec![TokenKind::StringStart, TokenKind::StringContent, TokenKind::StringEnd, TokenKind::Eof]
        );
    }

    #[test]
    fn lex_string_interpolation_basic() {
        assert_eq!(
            kinds(r#""hello ${name} world""#),
            vec![
                TokenKind::StringStart,
                TokenKind::StringContent,
                TokenKind::InterpolationStart,
                TokenKind::Ident,
                TokenKind::InterpolationEnd,
                TokenKind::StringContent,
                TokenKind::StringEnd,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_nested_interpolation_with_record_literal() {
        // `{ a: 1 }` inside the interpolation must not prematurely close it.
        assert_eq!(
            kinds(r#""${ { a: 1 } }""#),
            vec![
                TokenKind::StringStart,
                TokenKind::InterpolationStart,
                TokenKind::LBrace,
                TokenKind::Ident,
                TokenKind::Colon,
                TokenKind::IntLiteral,
                TokenKind::RBrace,
                TokenKind::InterpolationEnd,
                TokenKind::StringEnd,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_nested_block_comment_is_skipped() {
        assert_eq!(kinds("/* outer /* inner */ still */x"), vec![TokenKind::Ident, TokenKind::Eof]);
    }

    #[test]
    fn lex_line_comment_is_skipped() {
        assert_eq!(kinds("x // trailing\ny"), vec![TokenKind::Ident, TokenKind::Newline, TokenKind::Ident, TokenKind::Eof]);
    }

    #[test]
    fn lex_doc_comment_preserved() {
        assert_eq!(kinds("/// does a thing\nfn f() {}"), vec![
            TokenKind::DocComment, TokenKind::Fn, TokenKind::Ident, TokenKind::LParen, TokenKind::RParen,
            TokenKind::LBrace, TokenKind::RBrace, TokenKind::Eof
        ]);
    }

    #[test]
    fn lex_hex_and_binary_with_suffix() {
        assert_eq!(kinds("0xFFu8"), vec![TokenKind::IntLiteral, TokenKind::Eof]);
        assert_eq!(kinds("0b1010i64"), vec![TokenKind::IntLiteral, TokenKind::Eof]);
    }

    #[test]
    fn lex_float_with_suffix_and_underscore() {
        assert_eq!(kinds("1_000.5f32"), vec![TokenKind::FloatLiteral, TokenKind::Eof]);
    }

    #[test]
    fn lex_range_operators() {
        assert_eq!(kinds("0..10"), vec![TokenKind::IntLiteral, TokenKind::DotDot, TokenKind::IntLiteral, TokenKind::Eof]);
        assert_eq!(kinds("0..=10"), vec![TokenKind::IntLiteral, TokenKind::DotDotEq, TokenKind::IntLiteral, TokenKind::Eof]);
    }

    #[test]
    fn lex_try_and_coalesce_operators() {
        assert_eq!(kinds("x?"), vec![TokenKind::Ident, TokenKind::Question, TokenKind::Eof]);
        assert_eq!(kinds("x ?? 0"), vec![TokenKind::Ident, TokenKind::QuestionQuestion, TokenKind::IntLiteral, TokenKind::Eof]);
    }

    #[test]
    fn lex_char_literal_and_escape() {
        assert_eq!(kinds("'a'"), vec![TokenKind::CharLiteral, TokenKind::Eof]);
        assert_eq!(kinds("'\\n'"), vec![TokenKind::CharLiteral, TokenKind::Eof]);
    }

    #[test]
    fn lex_spans_accurate() {
        let tokens = Lexer::tokenize("let x = 42");
        assert_eq!(tokens[0].span.start, 0);
        assert_eq!(tokens[0].span.end, 3);
        assert_eq!(tokens[3].span.start, 8);
        assert_eq!(tokens[3].span.end, 10);
    }

    #[test]
    fn unknown_character_is_invalid_token_not_failure() {
        assert_eq!(kinds("x @ y"), vec![TokenKind::Ident, TokenKind::Invalid, TokenKind::Ident, TokenKind::Eof]);
    }
}
