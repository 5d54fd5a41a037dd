//! Recursive-descent parser: turns a token stream into a [`Program`].
//!
//! The lexer already resolves newline significance (see `kira-lexer`), so
//! this parser never tracks paren/bracket/brace depth itself -- every
//! `Newline` token it sees is already a statement terminator and is treated
//! as such alongside `;`.

use kira_common::token::{Token, TokenKind};
use kira_common::Span;

use crate::ast::expr::{BinaryOp, Expr, ExprKind, StringPart, UnaryOp};
use crate::ast::item::{
    Decl, DeclKind, MatchArm, Param, Stmt, StmtKind, TraitMethod, TypeParam, Variant, VariantFields,
};
use crate::ast::pat::{ConstructorArgs, LiteralPat, Pattern};
use crate::ast::ty::Type;
use crate::ast::Program;
use crate::error::ParseError;

pub(crate) struct Parser<'src> {
    tokens: Vec<Token>,
    pos: usize,
    source: &'src str,
    errors: Vec<ParseError>,
}

impl<'src> Parser<'src> {
    pub(crate) fn new(tokens: Vec<Token>, source: &'src str) -> Self {
        let tokens: Vec<Token> = tokens
            .into_iter()
            .filter(|t| !matches!(t.kind, TokenKind::Comment | TokenKind::DocComment))
            .collect();
        Self { tokens, pos: 0, source, errors: Vec::new() }
    }

    pub(crate) fn into_errors(self) -> Vec<ParseError> {
        self.errors
    }

    pub(crate) fn parse_program(&mut self) -> Program {
        let start = self.current_span();
        let mut decls = Vec::new();
        self.skip_terminators();
        while !self.at(TokenKind::Eof) {
            let before = self.pos;
            match self.parse_decl() {
                Some(decl) => decls.push(decl),
                None => self.synchronize(),
            }
            if self.pos == before {
                // Nothing consumed (e.g. a stray closing brace at the top
                // level): force progress so recovery can't loop forever.
                self.bump();
            }
            self.skip_terminators();
        }
        let end = self.prev_span();
        Program { decls, span: start.merge(end) }
    }

    // ── Token stream primitives ────────────────────────────────────────

    fn current_span(&self) -> Span {
        self.tokens[self.pos].span
    }

    fn prev_span(&self) -> Span {
        if self.pos == 0 {
            self.tokens[0].span
        } else {
            self.tokens[self.pos - 1].span
        }
    }

    fn peek_kind(&self) -> TokenKind {
        self.tokens[self.pos].kind.clone()
    }

    fn peek_kind_at(&self, offset: usize) -> TokenKind {
        self.tokens.get(self.pos + offset).map(|t| t.kind.clone()).unwrap_or(TokenKind::Eof)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn bump(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn bump_text(&mut self) -> String {
        let token = self.bump();
        self.text(token.span).to_string()
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn text(&self, span: Span) -> &'src str {
        &self.source[span.start as usize..span.end as usize]
    }

    fn expect(&mut self, kind: TokenKind, msg: &str) -> Option<Token> {
        if self.at(kind) {
            Some(self.bump())
        } else {
            self.error_here(msg);
            None
        }
    }

    fn expect_ident(&mut self, msg: &str) -> Option<String> {
        if self.at(TokenKind::Ident) {
            Some(self.bump_text())
        } else {
            self.error_here(msg);
            None
        }
    }

    fn error_here(&mut self, msg: impl Into<String>) {
        let span = self.current_span();
        self.errors.push(ParseError::new(msg.into(), span));
    }

    fn skip_newlines(&mut self) {
        while self.at(TokenKind::Newline) {
            self.bump();
        }
    }

    fn skip_terminators(&mut self) {
        while matches!(self.peek_kind(), TokenKind::Newline | TokenKind::Semicolon) {
            self.bump();
        }
    }

    /// Panic-mode recovery: skip to the next statement terminator or an
    /// obvious declaration/block boundary.
    fn synchronize(&mut self) {
        while !self.at(TokenKind::Eof) {
            if matches!(self.peek_kind(), TokenKind::Newline | TokenKind::Semicolon) {
                self.bump();
                return;
            }
            if matches!(
                self.peek_kind(),
                TokenKind::Fn
                    | TokenKind::Effect
                    | TokenKind::Let
                    | TokenKind::Var
                    | TokenKind::Const
                    | TokenKind::Type
                    | TokenKind::Trait
                    | TokenKind::Impl
                    | TokenKind::Test
                    | TokenKind::Pub
                    | TokenKind::Module
                    | TokenKind::Import
                    | TokenKind::RBrace
            ) {
                return;
            }
            self.bump();
        }
    }

    fn can_start_expr(&self) -> bool {
        !matches!(
            self.peek_kind(),
            TokenKind::Newline
                | TokenKind::Semicolon
                | TokenKind::RBrace
                | TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::Comma
                | TokenKind::Eof
                | TokenKind::LBrace
        )
    }

    // ── Declarations ────────────────────────────────────────────────────

    fn parse_decl(&mut self) -> Option<Decl> {
        let start = self.current_span();
        let is_pub = self.eat(TokenKind::Pub);
        let kind = match self.peek_kind() {
            TokenKind::Module => self.parse_module_decl()?,
            TokenKind::Import => self.parse_import_decl()?,
            TokenKind::Effect | TokenKind::Fn => self.parse_fn_decl()?,
            TokenKind::Const => self.parse_const_decl()?,
            TokenKind::Let => self.parse_let_decl()?,
            TokenKind::Type => self.parse_type_decl()?,
            TokenKind::Trait => self.parse_trait_decl()?,
            TokenKind::Impl => self.parse_impl_decl()?,
            TokenKind::Test => self.parse_test_decl()?,
            _ => {
                self.error_here("expected a declaration");
                return None;
            }
        };
        let end = self.prev_span();
        Some(Decl { kind, is_pub, span: start.merge(end) })
    }

    fn parse_module_decl(&mut self) -> Option<DeclKind> {
        self.bump(); // 'module'
        let name = self.expect_ident("expected module name")?;
        self.skip_newlines();
        self.expect(TokenKind::LBrace, "expected '{'")?;
        self.skip_terminators();
        let mut decls = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            let before = self.pos;
            match self.parse_decl() {
                Some(decl) => decls.push(decl),
                None => self.synchronize(),
            }
            if self.pos == before {
                self.bump();
            }
            self.skip_terminators();
        }
        self.expect(TokenKind::RBrace, "expected '}'")?;
        Some(DeclKind::Module { name, decls })
    }

    fn parse_import_decl(&mut self) -> Option<DeclKind> {
        self.bump(); // 'import'
        let mut path = vec![self.expect_ident("expected an import path segment")?];
        while self.eat(TokenKind::ColonColon) {
            path.push(self.expect_ident("expected an import path segment")?);
        }
        let alias = if self.eat(TokenKind::As) { Some(self.expect_ident("expected an alias name")?) } else { None };
        Some(DeclKind::Import { path, alias })
    }

    fn parse_fn_decl(&mut self) -> Option<DeclKind> {
        let is_effect = self.eat(TokenKind::Effect);
        self.expect(TokenKind::Fn, "expected 'fn'")?;
        let name = self.expect_ident("expected a function name")?;
        let type_params = self.parse_optional_type_params()?;
        self.expect(TokenKind::LParen, "expected '('")?;
        let params = self.parse_params()?;
        self.expect(TokenKind::RParen, "expected ')'")?;
        let ret = if self.eat(TokenKind::Arrow) {
            self.parse_type()?
        } else {
            Type::Named { name: "void".to_string(), span: self.prev_span() }
        };
        self.skip_newlines();
        let body = self.parse_block()?;
        Some(DeclKind::Fn { name, type_params, params, ret, is_effect, body })
    }

    fn parse_const_decl(&mut self) -> Option<DeclKind> {
        self.bump(); // 'const'
        let name = self.expect_ident("expected a constant name")?;
        self.expect(TokenKind::Colon, "expected ':'")?;
        let ty = self.parse_type()?;
        self.expect(TokenKind::Eq, "expected '='")?;
        let value = self.parse_expr()?;
        Some(DeclKind::Const { name, ty, value })
    }

    fn parse_let_decl(&mut self) -> Option<DeclKind> {
        self.bump(); // 'let'
        let pattern = self.parse_pattern()?;
        self.expect(TokenKind::Colon, "expected ':'")?;
        let ty = self.parse_type()?;
        self.expect(TokenKind::Eq, "expected '='")?;
        let value = self.parse_expr()?;
        Some(DeclKind::Let { pattern, ty, value })
    }

    /// Parses a `type` declaration: a product type (`type Name { .. }`), a
    /// sum type (`type Name = Variant | Variant | ..`), or a type alias
    /// (`type Name = ExistingType`).
    ///
    /// Disambiguating a single-variant sum type from an alias is genuinely
    /// ambiguous from the grammar alone; see DESIGN.md for the convention
    /// used here (a bare capitalized name or generic application with no
    /// `|` and no variant fields is treated as an alias target).
    fn parse_type_decl(&mut self) -> Option<DeclKind> {
        self.bump(); // 'type'
        let name = self.expect_ident("expected a type name")?;
        let type_params = self.parse_optional_type_params()?;

        if self.at(TokenKind::LBrace) {
            self.bump();
            self.skip_terminators();
            let mut fields = Vec::new();
            while !self.at(TokenKind::RBrace) {
                let field_name = self.expect_ident("expected a field name")?;
                self.expect(TokenKind::Colon, "expected ':'")?;
                let field_ty = self.parse_type()?;
                fields.push((field_name, field_ty));
                self.skip_terminators();
                if !self.eat(TokenKind::Comma) && !self.at(TokenKind::RBrace) {
                    break;
                }
                self.skip_terminators();
            }
            self.expect(TokenKind::RBrace, "expected '}'")?;
            return Some(DeclKind::ProductType { name, type_params, fields });
        }

        self.expect(TokenKind::Eq, "expected '='")?;
        self.skip_newlines();

        let mut variants = Vec::new();
        loop {
            let variant_start = self.current_span();
            let variant_name = self.expect_ident("expected a variant name")?;

            let fields = if self.at(TokenKind::LParen) {
                self.bump();
                let mut types = Vec::new();
                while !self.at(TokenKind::RParen) {
                    types.push(self.parse_type()?);
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(TokenKind::RParen, "expected ')'")?;
                Some(VariantFields::Tuple(types))
            } else if self.at(TokenKind::LBrace) {
                self.bump();
                self.skip_terminators();
                let mut rec_fields = Vec::new();
                while !self.at(TokenKind::RBrace) {
                    let fname = self.expect_ident("expected a field name")?;
                    self.expect(TokenKind::Colon, "expected ':'")?;
                    let fty = self.parse_type()?;
                    rec_fields.push((fname, fty));
                    self.skip_terminators();
                    if !self.eat(TokenKind::Comma) && !self.at(TokenKind::RBrace) {
                        break;
                    }
                    self.skip_terminators();
                }
                self.expect(TokenKind::RBrace, "expected '}'")?;
                Some(VariantFields::Record(rec_fields))
            } else {
                None
            };

            // A `|` separating variants may be on its own line; newlines
            // are otherwise statement terminators, so they must be
            // skipped before checking for one.
            self.skip_newlines();

            if fields.is_none() && variants.is_empty() && !self.at(TokenKind::Pipe) {
                // No fields, nothing parsed yet, and no alternative follows:
                // this is a type alias, not a one-variant sum type.
                if self.at(TokenKind::LBracket) {
                    self.bump();
                    let mut args = Vec::new();
                    while !self.at(TokenKind::RBracket) {
                        args.push(self.parse_type()?);
                        if !self.eat(TokenKind::Comma) {
                            break;
                        }
                    }
                    self.expect(TokenKind::RBracket, "expected ']'")?;
                    let end = self.prev_span();
                    let target = Type::Generic { base: variant_name, args, span: variant_start.merge(end) };
                    return Some(DeclKind::TypeAlias { name, type_params, target });
                }
                let end = self.prev_span();
                let target = Type::Named { name: variant_name, span: variant_start.merge(end) };
                return Some(DeclKind::TypeAlias { name, type_params, target });
            }

            let end = self.prev_span();
            variants.push(Variant {
                name: variant_name,
                fields: fields.unwrap_or(VariantFields::Unit),
                span: variant_start.merge(end),
            });

            if self.eat(TokenKind::Pipe) {
                self.skip_newlines();
                continue;
            }
            break;
        }

        Some(DeclKind::SumType { name, type_params, variants })
    }

    fn parse_trait_decl(&mut self) -> Option<DeclKind> {
        self.bump(); // 'trait'
        let name = self.expect_ident("expected a trait name")?;
        let type_params = self.parse_optional_type_params()?;
        self.skip_newlines();
        self.expect(TokenKind::LBrace, "expected '{'")?;
        self.skip_terminators();
        let mut methods = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            let start = self.current_span();
            let is_effect = self.eat(TokenKind::Effect);
            if self.expect(TokenKind::Fn, "expected 'fn'").is_none() {
                self.synchronize();
                self.skip_terminators();
                continue;
            }
            let Some(method_name) = self.expect_ident("expected a method name") else {
                self.synchronize();
                self.skip_terminators();
                continue;
            };
            self.expect(TokenKind::LParen, "expected '('")?;
            let params = self.parse_params()?;
            self.expect(TokenKind::RParen, "expected ')'")?;
            let ret = if self.eat(TokenKind::Arrow) {
                self.parse_type()?
            } else {
                Type::Named { name: "void".to_string(), span: self.prev_span() }
            };
            let end = self.prev_span();
            methods.push(TraitMethod { name: method_name, params, ret, is_effect, span: start.merge(end) });
            self.skip_terminators();
        }
        self.expect(TokenKind::RBrace, "expected '}'")?;
        Some(DeclKind::Trait { name, type_params, methods })
    }

    fn parse_impl_decl(&mut self) -> Option<DeclKind> {
        self.bump(); // 'impl'
        let type_params = self.parse_optional_type_params()?;
        let first = self.parse_type()?;
        let (trait_name, target) = if self.eat(TokenKind::For) {
            let trait_name = match &first {
                Type::Named { name, .. } => name.clone(),
                Type::Generic { base, .. } => base.clone(),
                _ => {
                    self.error_here("expected a trait name before 'for'");
                    String::new()
                }
            };
            let target = self.parse_type()?;
            (Some(trait_name), target)
        } else {
            (None, first)
        };
        self.skip_newlines();
        self.expect(TokenKind::LBrace, "expected '{'")?;
        self.skip_terminators();
        let mut methods = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            let start = self.current_span();
            let before = self.pos;
            match self.parse_fn_decl() {
                Some(kind) => {
                    let end = self.prev_span();
                    methods.push(Decl { kind, is_pub: false, span: start.merge(end) });
                }
                None => self.synchronize(),
            }
            if self.pos == before {
                self.bump();
            }
            self.skip_terminators();
        }
        self.expect(TokenKind::RBrace, "expected '}'")?;
        Some(DeclKind::Impl { trait_name, type_params, target, methods })
    }

    fn parse_test_decl(&mut self) -> Option<DeclKind> {
        self.bump(); // 'test'
        self.expect(TokenKind::StringStart, "expected a string literal test name")?;
        let name = self.parse_string_literal_text()?;
        self.skip_newlines();
        let body = self.parse_block()?;
        Some(DeclKind::Test { name, body })
    }

    fn parse_optional_type_params(&mut self) -> Option<Vec<TypeParam>> {
        if !self.at(TokenKind::LBracket) {
            return Some(Vec::new());
        }
        self.bump();
        let mut params = Vec::new();
        while !self.at(TokenKind::RBracket) {
            let start = self.current_span();
            let name = self.expect_ident("expected a type parameter name")?;
            let mut constraints = Vec::new();
            if self.eat(TokenKind::Colon) {
                constraints.push(self.expect_ident("expected a trait name")?);
                while self.eat(TokenKind::Plus) {
                    constraints.push(self.expect_ident("expected a trait name")?);
                }
            }
            let end = self.prev_span();
            params.push(TypeParam { name, constraints, span: start.merge(end) });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RBracket, "expected ']'")?;
        Some(params)
    }

    fn parse_params(&mut self) -> Option<Vec<Param>> {
        let mut params = Vec::new();
        while !self.at(TokenKind::RParen) {
            let start = self.current_span();
            if self.eat(TokenKind::SelfValue) {
                let end = self.prev_span();
                params.push(Param { name: "self".to_string(), ty: Type::SelfType { span: end }, span: start.merge(end) });
            } else {
                let name = self.expect_ident("expected a parameter name")?;
                self.expect(TokenKind::Colon, "expected ':'")?;
                let ty = self.parse_type()?;
                let end = self.prev_span();
                params.push(Param { name, ty, span: start.merge(end) });
            }
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        Some(params)
    }

    // ── Types ───────────────────────────────────────────────────────────

    fn parse_type(&mut self) -> Option<Type> {
        let start = self.current_span();
        match self.peek_kind() {
            TokenKind::SelfType => {
                self.bump();
                Some(Type::SelfType { span: start })
            }
            TokenKind::LParen => {
                self.bump();
                let mut elements = Vec::new();
                while !self.at(TokenKind::RParen) {
                    elements.push(self.parse_type()?);
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(TokenKind::RParen, "expected ')'")?;
                let end = self.prev_span();
                Some(Type::Tuple { elements, span: start.merge(end) })
            }
            TokenKind::LBracket => {
                self.bump();
                let element = Box::new(self.parse_type()?);
                let size = if self.eat(TokenKind::Semicolon) {
                    let tok = self.expect(TokenKind::IntLiteral, "expected an array size")?;
                    tok.map(|t| self.text(t.span).parse::<u64>().unwrap_or(0))
                } else {
                    None
                };
                self.expect(TokenKind::RBracket, "expected ']'")?;
                let end = self.prev_span();
                Some(Type::Array { element, size, span: start.merge(end) })
            }
            TokenKind::Effect | TokenKind::Fn => {
                let is_effect = self.eat(TokenKind::Effect);
                self.expect(TokenKind::Fn, "expected 'fn'")?;
                self.expect(TokenKind::LParen, "expected '('")?;
                let mut params = Vec::new();
                while !self.at(TokenKind::RParen) {
                    params.push(self.parse_type()?);
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(TokenKind::RParen, "expected ')'")?;
                self.expect(TokenKind::Arrow, "expected '->'")?;
                let ret = Box::new(self.parse_type()?);
                let end = self.prev_span();
                Some(Type::Function { params, ret, is_effect, span: start.merge(end) })
            }
            TokenKind::Ident => {
                let name = self.bump_text();
                if name == "_" {
                    return Some(Type::Inferred { span: start });
                }
                if name == "IO" && self.at(TokenKind::LBracket) {
                    self.bump();
                    let inner = Box::new(self.parse_type()?);
                    self.expect(TokenKind::RBracket, "expected ']'")?;
                    let end = self.prev_span();
                    return Some(Type::Io { inner, span: start.merge(end) });
                }
                if name == "Result" && self.at(TokenKind::LBracket) {
                    self.bump();
                    let ok = Box::new(self.parse_type()?);
                    self.expect(TokenKind::Comma, "expected ','")?;
                    let err = Box::new(self.parse_type()?);
                    self.expect(TokenKind::RBracket, "expected ']'")?;
                    let end = self.prev_span();
                    return Some(Type::Result { ok, err, span: start.merge(end) });
                }
                if name == "Option" && self.at(TokenKind::LBracket) {
                    self.bump();
                    let inner = Box::new(self.parse_type()?);
                    self.expect(TokenKind::RBracket, "expected ']'")?;
                    let end = self.prev_span();
                    return Some(Type::Option { inner, span: start.merge(end) });
                }

                let mut segments = vec![name];
                while self.at(TokenKind::ColonColon) {
                    self.bump();
                    segments.push(self.expect_ident("expected a path segment")?);
                }

                if self.at(TokenKind::LBracket) {
                    self.bump();
                    let mut args = Vec::new();
                    while !self.at(TokenKind::RBracket) {
                        args.push(self.parse_type()?);
                        if !self.eat(TokenKind::Comma) {
                            break;
                        }
                    }
                    self.expect(TokenKind::RBracket, "expected ']'")?;
                    let end = self.prev_span();
                    let base = segments.join("::");
                    return Some(Type::Generic { base, args, span: start.merge(end) });
                }

                let end = self.prev_span();
                if segments.len() > 1 {
                    Some(Type::Path { segments, span: start.merge(end) })
                } else {
                    Some(Type::Named { name: segments.into_iter().next().unwrap(), span: start.merge(end) })
                }
            }
            _ => {
                self.error_here("expected a type");
                None
            }
        }
    }

    // ── Statements ──────────────────────────────────────────────────────

    fn parse_block(&mut self) -> Option<Vec<Stmt>> {
        self.expect(TokenKind::LBrace, "expected '{'")?;
        self.skip_terminators();
        let mut stmts = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            let before = self.pos;
            match self.parse_stmt() {
                Some(stmt) => stmts.push(stmt),
                None => self.synchronize(),
            }
            if self.pos == before {
                self.bump();
            }
            self.skip_terminators();
        }
        self.expect(TokenKind::RBrace, "expected '}'")?;
        Some(stmts)
    }

    fn parse_stmt(&mut self) -> Option<Stmt> {
        let start = self.current_span();
        match self.peek_kind() {
            TokenKind::If => self.parse_if_stmt(start),
            TokenKind::Match => self.parse_match_stmt(start),
            _ => {
                let kind = match self.peek_kind() {
                    TokenKind::Let => self.parse_let_stmt()?,
                    TokenKind::Var => self.parse_var_stmt()?,
                    TokenKind::For => self.parse_for_stmt()?,
                    TokenKind::While => self.parse_while_stmt()?,
                    TokenKind::Loop => self.parse_loop_stmt()?,
                    TokenKind::Return => self.parse_return_stmt()?,
                    TokenKind::Break => {
                        self.bump();
                        StmtKind::Break
                    }
                    TokenKind::LBrace => StmtKind::Block(self.parse_block()?),
                    _ => self.parse_expr_or_assign_stmt()?,
                };
                let end = self.prev_span();
                Some(Stmt { kind, span: start.merge(end) })
            }
        }
    }

    fn parse_if_stmt(&mut self, start: Span) -> Option<Stmt> {
        self.bump(); // 'if'
        let cond = self.parse_expr()?;
        self.skip_newlines();
        let then_branch = self.parse_block()?;
        self.skip_newlines();
        let else_branch = if self.eat(TokenKind::Else) {
            self.skip_newlines();
            if self.at(TokenKind::If) {
                let inner_start = self.current_span();
                Some(vec![self.parse_if_stmt(inner_start)?])
            } else {
                Some(self.parse_block()?)
            }
        } else {
            None
        };
        let end = self.prev_span();
        Some(Stmt { kind: StmtKind::If { cond, then_branch, else_branch }, span: start.merge(end) })
    }

    fn parse_match_stmt(&mut self, start: Span) -> Option<Stmt> {
        self.bump(); // 'match'
        let subject = self.parse_expr()?;
        self.skip_newlines();
        let arms = self.parse_match_arms()?;
        let end = self.prev_span();
        Some(Stmt { kind: StmtKind::Match { subject, arms }, span: start.merge(end) })
    }

    fn parse_match_arms(&mut self) -> Option<Vec<MatchArm>> {
        self.expect(TokenKind::LBrace, "expected '{'")?;
        self.skip_terminators();
        let mut arms = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            let start = self.current_span();
            let pattern = self.parse_or_pattern()?;
            let guard = if self.eat(TokenKind::If) { Some(self.parse_expr()?) } else { None };
            self.expect(TokenKind::FatArrow, "expected '=>'")?;
            self.skip_newlines();
            let body = if self.at(TokenKind::LBrace) {
                self.parse_block()?
            } else {
                let expr = self.parse_expr()?;
                let span = expr.span;
                vec![Stmt { kind: StmtKind::Expr(expr), span }]
            };
            let end = self.prev_span();
            arms.push(MatchArm { pattern, guard, body, span: start.merge(end) });
            self.skip_terminators();
            if self.eat(TokenKind::Comma) {
                self.skip_terminators();
            }
        }
        self.expect(TokenKind::RBrace, "expected '}'")?;
        Some(arms)
    }

    fn parse_for_stmt(&mut self) -> Option<StmtKind> {
        self.bump(); // 'for'
        let pattern = self.parse_pattern()?;
        self.expect(TokenKind::In, "expected 'in'")?;
        let iterable = self.parse_expr()?;
        self.skip_newlines();
        let body = self.parse_block()?;
        Some(StmtKind::For { pattern, iterable, body })
    }

    fn parse_while_stmt(&mut self) -> Option<StmtKind> {
        self.bump(); // 'while'
        let cond = self.parse_expr()?;
        self.skip_newlines();
        let body = self.parse_block()?;
        Some(StmtKind::While { cond, body })
    }

    fn parse_loop_stmt(&mut self) -> Option<StmtKind> {
        self.bump(); // 'loop'
        self.skip_newlines();
        let body = self.parse_block()?;
        Some(StmtKind::Loop { body })
    }

    fn parse_return_stmt(&mut self) -> Option<StmtKind> {
        self.bump(); // 'return'
        if matches!(self.peek_kind(), TokenKind::Newline | TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof) {
            Some(StmtKind::Return { value: None })
        } else {
            Some(StmtKind::Return { value: Some(self.parse_expr()?) })
        }
    }

    fn parse_let_stmt(&mut self) -> Option<StmtKind> {
        self.bump(); // 'let'
        let pattern = self.parse_pattern()?;
        self.expect(TokenKind::Colon, "expected ':'")?;
        let ty = self.parse_type()?;
        self.expect(TokenKind::Eq, "expected '='")?;
        let value = self.parse_expr()?;
        Some(StmtKind::Let { pattern, ty, value })
    }

    fn parse_var_stmt(&mut self) -> Option<StmtKind> {
        self.bump(); // 'var'
        let name = self.expect_ident("expected a variable name")?;
        let ty = if self.eat(TokenKind::Colon) { Some(self.parse_type()?) } else { None };
        let value = if self.eat(TokenKind::Eq) { Some(self.parse_expr()?) } else { None };
        Some(StmtKind::Var { name, ty, value })
    }

    fn parse_expr_or_assign_stmt(&mut self) -> Option<StmtKind> {
        let expr = self.parse_expr()?;
        if self.eat(TokenKind::Eq) {
            let value = self.parse_expr()?;
            Some(StmtKind::Assign { target: expr, value })
        } else {
            Some(StmtKind::Expr(expr))
        }
    }

    // ── Expressions (precedence climbing, loosest to tightest) ─────────
    //
    // coalesce `??` > or `||` > and `&&` > equality > comparison (incl.
    // `is`/`in`) > range `..`/`..=` > additive > multiplicative > cast
    // `as` > unary > postfix > primary.

    fn parse_expr(&mut self) -> Option<Expr> {
        self.parse_coalesce()
    }

    fn parse_coalesce(&mut self) -> Option<Expr> {
        let mut lhs = self.parse_or()?;
        while self.at(TokenKind::QuestionQuestion) {
            self.bump();
            let rhs = self.parse_or()?;
            let span = lhs.span.merge(rhs.span);
            lhs = Expr { kind: ExprKind::Coalesce { operand: Box::new(lhs), default: Box::new(rhs) }, span };
        }
        Some(lhs)
    }

    fn parse_or(&mut self) -> Option<Expr> {
        let mut lhs = self.parse_and()?;
        while self.at(TokenKind::PipePipe) {
            self.bump();
            let rhs = self.parse_and()?;
            lhs = self.make_binary(lhs, BinaryOp::Or, rhs);
        }
        Some(lhs)
    }

    fn parse_and(&mut self) -> Option<Expr> {
        let mut lhs = self.parse_equality()?;
        while self.at(TokenKind::AmpAmp) {
            self.bump();
            let rhs = self.parse_equality()?;
            lhs = self.make_binary(lhs, BinaryOp::And, rhs);
        }
        Some(lhs)
    }

    fn parse_equality(&mut self) -> Option<Expr> {
        let mut lhs = self.parse_comparison()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::EqEq => BinaryOp::Eq,
                TokenKind::NotEq => BinaryOp::NotEq,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_comparison()?;
            lhs = self.make_binary(lhs, op, rhs);
        }
        Some(lhs)
    }

    fn parse_comparison(&mut self) -> Option<Expr> {
        let mut lhs = self.parse_range()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::LtEq => BinaryOp::LtEq,
                TokenKind::GtEq => BinaryOp::GtEq,
                TokenKind::Is => BinaryOp::Is,
                TokenKind::In => BinaryOp::In,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_range()?;
            lhs = self.make_binary(lhs, op, rhs);
        }
        Some(lhs)
    }

    fn parse_range(&mut self) -> Option<Expr> {
        let start = self.current_span();
        if matches!(self.peek_kind(), TokenKind::DotDot | TokenKind::DotDotEq) {
            let inclusive = self.at(TokenKind::DotDotEq);
            self.bump();
            let end_expr = if self.can_start_expr() { Some(Box::new(self.parse_additive()?)) } else { None };
            let end = self.prev_span();
            return Some(Expr { kind: ExprKind::Range { start: None, end: end_expr, inclusive }, span: start.merge(end) });
        }
        let lhs = self.parse_additive()?;
        if matches!(self.peek_kind(), TokenKind::DotDot | TokenKind::DotDotEq) {
            let inclusive = self.at(TokenKind::DotDotEq);
            self.bump();
            let end_expr = if self.can_start_expr() { Some(Box::new(self.parse_additive()?)) } else { None };
            let end = self.prev_span();
            return Some(Expr {
                span: lhs.span.merge(end),
                kind: ExprKind::Range { start: Some(Box::new(lhs)), end: end_expr, inclusive },
            });
        }
        Some(lhs)
    }

    fn parse_additive(&mut self) -> Option<Expr> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_multiplicative()?;
            lhs = self.make_binary(lhs, op, rhs);
        }
        Some(lhs)
    }

    fn parse_multiplicative(&mut self) -> Option<Expr> {
        let mut lhs = self.parse_cast()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Rem,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_cast()?;
            lhs = self.make_binary(lhs, op, rhs);
        }
        Some(lhs)
    }

    fn parse_cast(&mut self) -> Option<Expr> {
        let mut expr = self.parse_unary()?;
        while self.eat(TokenKind::As) {
            let target = self.parse_type()?;
            let span = expr.span.merge(target.span());
            expr = Expr { kind: ExprKind::Cast { operand: Box::new(expr), target }, span };
        }
        Some(expr)
    }

    fn parse_unary(&mut self) -> Option<Expr> {
        let start = self.current_span();
        match self.peek_kind() {
            TokenKind::Bang => {
                self.bump();
                let operand = self.parse_unary()?;
                let span = start.merge(operand.span);
                Some(Expr { kind: ExprKind::Unary { op: UnaryOp::Not, operand: Box::new(operand) }, span })
            }
            TokenKind::Minus => {
                self.bump();
                let operand = self.parse_unary()?;
                let span = start.merge(operand.span);
                Some(Expr { kind: ExprKind::Unary { op: UnaryOp::Neg, operand: Box::new(operand) }, span })
            }
            _ => self.parse_postfix(),
        }
    }

    fn make_binary(&self, lhs: Expr, op: BinaryOp, rhs: Expr) -> Expr {
        let span = lhs.span.merge(rhs.span);
        Expr { kind: ExprKind::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) }, span }
    }

    fn parse_postfix(&mut self) -> Option<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek_kind() {
                TokenKind::Dot => {
                    self.bump();
                    if self.at(TokenKind::IntLiteral) {
                        let tok = self.bump();
                        let index: u32 = self.text(tok.span).parse().unwrap_or(0);
                        let span = expr.span.merge(tok.span);
                        expr = Expr { kind: ExprKind::TupleIndex { object: Box::new(expr), index }, span };
                        continue;
                    }
                    let Some(name) = self.expect_ident("expected a field or method name") else { break };
                    if self.at(TokenKind::LParen) {
                        self.bump();
                        let args = self.parse_call_args()?;
                        let end = self.prev_span();
                        let span = expr.span.merge(end);
                        expr = Expr { kind: ExprKind::MethodCall { receiver: Box::new(expr), method: name, args }, span };
                    } else {
                        let end = self.prev_span();
                        let span = expr.span.merge(end);
                        expr = Expr { kind: ExprKind::Field { object: Box::new(expr), field: name }, span };
                    }
                }
                TokenKind::LParen => {
                    self.bump();
                    let args = self.parse_call_args()?;
                    let end = self.prev_span();
                    let span = expr.span.merge(end);
                    expr = Expr { kind: ExprKind::Call { callee: Box::new(expr), args }, span };
                }
                TokenKind::LBracket => {
                    self.bump();
                    let index = self.parse_expr()?;
                    self.expect(TokenKind::RBracket, "expected ']'")?;
                    let end = self.prev_span();
                    let span = expr.span.merge(end);
                    expr = Expr { kind: ExprKind::Index { object: Box::new(expr), index: Box::new(index) }, span };
                }
                TokenKind::Question => {
                    self.bump();
                    let span = expr.span.merge(self.prev_span());
                    expr = Expr { kind: ExprKind::Try(Box::new(expr)), span };
                }
                _ => break,
            }
        }
        Some(expr)
    }

    fn parse_call_args(&mut self) -> Option<Vec<Expr>> {
        let mut args = Vec::new();
        self.skip_newlines();
        while !self.at(TokenKind::RParen) {
            args.push(self.parse_expr()?);
            self.skip_newlines();
            if !self.eat(TokenKind::Comma) {
                break;
            }
            self.skip_newlines();
        }
        self.expect(TokenKind::RParen, "expected ')'")?;
        Some(args)
    }

    fn parse_primary(&mut self) -> Option<Expr> {
        match self.peek_kind() {
            TokenKind::IntLiteral => {
                let tok = self.bump();
                let value = parse_int_literal(self.text(tok.span));
                Some(Expr { kind: ExprKind::Literal(LiteralPat::Int(value)), span: tok.span })
            }
            TokenKind::FloatLiteral => {
                let tok = self.bump();
                let value = parse_float_literal(self.text(tok.span));
                Some(Expr { kind: ExprKind::Literal(LiteralPat::Float(value)), span: tok.span })
            }
            TokenKind::True => {
                let tok = self.bump();
                Some(Expr { kind: ExprKind::Literal(LiteralPat::Bool(true)), span: tok.span })
            }
            TokenKind::False => {
                let tok = self.bump();
                Some(Expr { kind: ExprKind::Literal(LiteralPat::Bool(false)), span: tok.span })
            }
            TokenKind::CharLiteral => {
                let tok = self.bump();
                let value = parse_char_literal(self.text(tok.span));
                Some(Expr { kind: ExprKind::Literal(LiteralPat::Char(value)), span: tok.span })
            }
            TokenKind::StringStart => self.parse_string_expr(),
            TokenKind::SelfValue => {
                let tok = self.bump();
                Some(Expr { kind: ExprKind::SelfValue, span: tok.span })
            }
            TokenKind::SelfType => {
                let tok = self.bump();
                Some(Expr { kind: ExprKind::SelfType, span: tok.span })
            }
            TokenKind::Ident => self.parse_ident_led_expr(),
            TokenKind::LParen => self.parse_paren_or_tuple(),
            TokenKind::LBracket => self.parse_array_expr(),
            TokenKind::LBrace => self.parse_record_or_block(None),
            TokenKind::Effect | TokenKind::Fn => self.parse_closure_expr(),
            TokenKind::If => self.parse_if_expr(),
            TokenKind::Match => self.parse_match_expr(),
            _ => {
                self.error_here("expected an expression");
                self.bump();
                None
            }
        }
    }

    fn parse_ident_led_expr(&mut self) -> Option<Expr> {
        let tok = self.bump();
        let name = self.text(tok.span).to_string();
        let is_capitalized = name.chars().next().is_some_and(|c| c.is_uppercase());

        if is_capitalized && self.at(TokenKind::LParen) {
            self.bump();
            let args = self.parse_call_args()?;
            let end = self.prev_span();
            return Some(Expr { kind: ExprKind::VariantConstructor { name, args }, span: tok.span.merge(end) });
        }
        if is_capitalized && self.at(TokenKind::LBrace) {
            return self.parse_record_or_block(Some((name, tok.span)));
        }
        if self.at(TokenKind::ColonColon) {
            let mut full = name;
            let mut end_span = tok.span;
            while self.eat(TokenKind::ColonColon) {
                let seg = self.expect_ident("expected a path segment")?;
                end_span = self.prev_span();
                full.push_str("::");
                full.push_str(&seg);
            }
            if self.at(TokenKind::LParen) {
                self.bump();
                let args = self.parse_call_args()?;
                let end = self.prev_span();
                return Some(Expr { kind: ExprKind::VariantConstructor { name: full, args }, span: tok.span.merge(end) });
            }
            return Some(Expr { kind: ExprKind::Ident(full), span: tok.span.merge(end_span) });
        }
        Some(Expr { kind: ExprKind::Ident(name), span: tok.span })
    }

    /// Parses either a record literal (`{ x: 1, y: 2 }`, optionally
    /// preceded by a capitalized type name already consumed by the
    /// caller) or a block expression (`{ stmt; stmt }`). An empty `{}`
    /// is treated as an empty block.
    fn parse_record_or_block(&mut self, named: Option<(String, Span)>) -> Option<Expr> {
        let start = named.as_ref().map(|(_, s)| *s).unwrap_or_else(|| self.current_span());
        self.expect(TokenKind::LBrace, "expected '{'")?;
        self.skip_terminators();

        let looks_like_record = named.is_some()
            || (self.at(TokenKind::Ident)
                && matches!(self.peek_kind_at(1), TokenKind::Colon | TokenKind::Comma | TokenKind::RBrace));

        if looks_like_record && !self.at(TokenKind::RBrace) {
            let mut fields = Vec::new();
            while !self.at(TokenKind::RBrace) {
                let field_name = self.expect_ident("expected a field name")?;
                let value = if self.eat(TokenKind::Colon) {
                    self.parse_expr()?
                } else {
                    let span = self.prev_span();
                    Expr { kind: ExprKind::Ident(field_name.clone()), span }
                };
                fields.push((field_name, value));
                self.skip_terminators();
                if !self.eat(TokenKind::Comma) && !self.at(TokenKind::RBrace) {
                    break;
                }
                self.skip_terminators();
            }
            self.expect(TokenKind::RBrace, "expected '}'")?;
            let end = self.prev_span();
            let type_name = named.map(|(n, _)| n);
            return Some(Expr { kind: ExprKind::Record { type_name, fields }, span: start.merge(end) });
        }

        let mut stmts = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            let before = self.pos;
            match self.parse_stmt() {
                Some(stmt) => stmts.push(stmt),
                None => self.synchronize(),
            }
            if self.pos == before {
                self.bump();
            }
            self.skip_terminators();
        }
        self.expect(TokenKind::RBrace, "expected '}'")?;
        let end = self.prev_span();
        Some(Expr { kind: ExprKind::Block(stmts), span: start.merge(end) })
    }

    fn parse_paren_or_tuple(&mut self) -> Option<Expr> {
        let start = self.current_span();
        self.bump(); // '('
        self.skip_newlines();
        if self.eat(TokenKind::RParen) {
            let end = self.prev_span();
            return Some(Expr { kind: ExprKind::Tuple(Vec::new()), span: start.merge(end) });
        }
        let first = self.parse_expr()?;
        self.skip_newlines();
        if self.eat(TokenKind::Comma) {
            self.skip_newlines();
            let mut elements = vec![first];
            while !self.at(TokenKind::RParen) {
                elements.push(self.parse_expr()?);
                self.skip_newlines();
                if !self.eat(TokenKind::Comma) {
                    break;
                }
                self.skip_newlines();
            }
            self.expect(TokenKind::RParen, "expected ')'")?;
            let end = self.prev_span();
            return Some(Expr { kind: ExprKind::Tuple(elements), span: start.merge(end) });
        }
        self.expect(TokenKind::RParen, "expected ')'")?;
        let end = self.prev_span();
        Some(Expr { kind: ExprKind::Group(Box::new(first)), span: start.merge(end) })
    }

    fn parse_array_expr(&mut self) -> Option<Expr> {
        let start = self.current_span();
        self.bump(); // '['
        self.skip_newlines();
        let mut elements = Vec::new();
        while !self.at(TokenKind::RBracket) {
            elements.push(self.parse_expr()?);
            self.skip_newlines();
            if !self.eat(TokenKind::Comma) {
                break;
            }
            self.skip_newlines();
        }
        self.expect(TokenKind::RBracket, "expected ']'")?;
        let end = self.prev_span();
        Some(Expr { kind: ExprKind::Array(elements), span: start.merge(end) })
    }

    fn parse_closure_expr(&mut self) -> Option<Expr> {
        let start = self.current_span();
        let is_effect = self.eat(TokenKind::Effect);
        self.expect(TokenKind::Fn, "expected 'fn'")?;
        self.expect(TokenKind::LParen, "expected '('")?;
        let params = self.parse_params()?;
        self.expect(TokenKind::RParen, "expected ')'")?;
        let ret = if self.eat(TokenKind::Arrow) { Some(self.parse_type()?) } else { None };
        self.skip_newlines();
        let body = self.parse_block()?;
        let end = self.prev_span();
        Some(Expr { kind: ExprKind::Closure { params, ret, is_effect, body }, span: start.merge(end) })
    }

    fn parse_if_expr(&mut self) -> Option<Expr> {
        let start = self.current_span();
        self.bump(); // 'if'
        let cond = self.parse_expr()?;
        self.skip_newlines();
        let then_branch = self.parse_record_or_block(None)?;
        self.skip_newlines();
        let else_branch = if self.eat(TokenKind::Else) {
            self.skip_newlines();
            if self.at(TokenKind::If) {
                Some(Box::new(self.parse_if_expr()?))
            } else {
                Some(Box::new(self.parse_record_or_block(None)?))
            }
        } else {
            None
        };
        let end = self.prev_span();
        Some(Expr {
            kind: ExprKind::If { cond: Box::new(cond), then_branch: Box::new(then_branch), else_branch },
            span: start.merge(end),
        })
    }

    fn parse_match_expr(&mut self) -> Option<Expr> {
        let start = self.current_span();
        self.bump(); // 'match'
        let subject = self.parse_expr()?;
        self.skip_newlines();
        let arms = self.parse_match_arms()?;
        let end = self.prev_span();
        Some(Expr { kind: ExprKind::Match { subject: Box::new(subject), arms }, span: start.merge(end) })
    }

    fn parse_string_expr(&mut self) -> Option<Expr> {
        let start = self.current_span();
        self.bump(); // StringStart
        let mut parts = Vec::new();
        loop {
            match self.peek_kind() {
                TokenKind::StringContent => {
                    let tok = self.bump();
                    let text = unescape(self.text(tok.span));
                    if !text.is_empty() {
                        parts.push(StringPart::Text(text));
                    }
                }
                TokenKind::InterpolationStart => {
                    self.bump();
                    self.skip_newlines();
                    let expr = self.parse_expr()?;
                    self.skip_newlines();
                    self.expect(TokenKind::InterpolationEnd, "expected '}' to close interpolation")?;
                    parts.push(StringPart::Expr(Box::new(expr)));
                }
                TokenKind::StringEnd => {
                    self.bump();
                    break;
                }
                _ => {
                    self.error_here("unterminated string literal");
                    break;
                }
            }
        }
        let end = self.prev_span();
        let span = start.merge(end);
        if parts.is_empty() {
            return Some(Expr { kind: ExprKind::Literal(LiteralPat::String(String::new())), span });
        }
        if parts.len() == 1 {
            if let StringPart::Text(text) = &parts[0] {
                return Some(Expr { kind: ExprKind::Literal(LiteralPat::String(text.clone())), span });
            }
        }
        Some(Expr { kind: ExprKind::InterpolatedString(parts), span })
    }

    // ── Patterns ──────────────────────────────────────────────────────

    fn parse_or_pattern(&mut self) -> Option<Pattern> {
        let start = self.current_span();
        let mut alternatives = vec![self.parse_pattern()?];
        while self.eat(TokenKind::Pipe) {
            alternatives.push(self.parse_pattern()?);
        }
        if alternatives.len() == 1 {
            return alternatives.into_iter().next();
        }
        let end = self.prev_span();
        Some(Pattern::Or { alternatives, span: start.merge(end) })
    }

    fn parse_pattern(&mut self) -> Option<Pattern> {
        let pattern = self.parse_range_pattern()?;
        if self.eat(TokenKind::Colon) {
            let type_name = self.expect_ident("expected a type name")?;
            let span = pattern.span().merge(self.prev_span());
            return Some(Pattern::Typed { pattern: Box::new(pattern), type_name, span });
        }
        Some(pattern)
    }

    fn parse_range_pattern(&mut self) -> Option<Pattern> {
        let start = self.current_span();
        let lhs = self.parse_primary_pattern()?;
        if matches!(self.peek_kind(), TokenKind::DotDot | TokenKind::DotDotEq) {
            let inclusive = self.at(TokenKind::DotDotEq);
            self.bump();
            let rhs = self.parse_primary_pattern()?;
            let end = self.prev_span();
            return Some(Pattern::Range {
                start: Some(Box::new(lhs)),
                end: Some(Box::new(rhs)),
                inclusive,
                span: start.merge(end),
            });
        }
        Some(lhs)
    }

    fn parse_primary_pattern(&mut self) -> Option<Pattern> {
        let start = self.current_span();
        match self.peek_kind() {
            TokenKind::DotDot => {
                self.bump();
                Some(Pattern::Rest { span: start })
            }
            TokenKind::Var => {
                self.bump();
                let name = self.expect_ident("expected a binding name")?;
                let end = self.prev_span();
                Some(Pattern::Ident { name, is_mut: true, span: start.merge(end) })
            }
            TokenKind::IntLiteral => {
                let tok = self.bump();
                let value = parse_int_literal(self.text(tok.span));
                Some(Pattern::Literal { kind: LiteralPat::Int(value), span: tok.span })
            }
            TokenKind::FloatLiteral => {
                let tok = self.bump();
                let value = parse_float_literal(self.text(tok.span));
                Some(Pattern::Literal { kind: LiteralPat::Float(value), span: tok.span })
            }
            TokenKind::True => {
                let tok = self.bump();
                Some(Pattern::Literal { kind: LiteralPat::Bool(true), span: tok.span })
            }
            TokenKind::False => {
                let tok = self.bump();
                Some(Pattern::Literal { kind: LiteralPat::Bool(false), span: tok.span })
            }
            TokenKind::CharLiteral => {
                let tok = self.bump();
                let value = parse_char_literal(self.text(tok.span));
                Some(Pattern::Literal { kind: LiteralPat::Char(value), span: tok.span })
            }
            TokenKind::StringStart => {
                self.bump();
                let text = self.parse_string_literal_text()?;
                let end = self.prev_span();
                Some(Pattern::Literal { kind: LiteralPat::String(text), span: start.merge(end) })
            }
            TokenKind::Minus => {
                self.bump();
                match self.peek_kind() {
                    TokenKind::IntLiteral => {
                        let tok = self.bump();
                        let value = -parse_int_literal(self.text(tok.span));
                        Some(Pattern::Literal { kind: LiteralPat::Int(value), span: start.merge(tok.span) })
                    }
                    TokenKind::FloatLiteral => {
                        let tok = self.bump();
                        let value = -parse_float_literal(self.text(tok.span));
                        Some(Pattern::Literal { kind: LiteralPat::Float(value), span: start.merge(tok.span) })
                    }
                    _ => {
                        self.error_here("expected a numeric literal after '-'");
                        None
                    }
                }
            }
            TokenKind::LParen => {
                self.bump();
                self.skip_newlines();
                let mut elements = Vec::new();
                while !self.at(TokenKind::RParen) {
                    elements.push(self.parse_or_pattern()?);
                    self.skip_newlines();
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                    self.skip_newlines();
                }
                self.expect(TokenKind::RParen, "expected ')'")?;
                let end = self.prev_span();
                Some(Pattern::Tuple { elements, span: start.merge(end) })
            }
            TokenKind::LBrace => self.parse_record_pattern(None, start),
            TokenKind::Ident => {
                let tok = self.bump();
                let name = self.text(tok.span).to_string();
                if name == "_" {
                    return Some(Pattern::Wildcard { span: tok.span });
                }
                let is_capitalized = name.chars().next().is_some_and(|c| c.is_uppercase());
                if is_capitalized && self.at(TokenKind::LParen) {
                    self.bump();
                    let mut args = Vec::new();
                    while !self.at(TokenKind::RParen) {
                        args.push(self.parse_or_pattern()?);
                        if !self.eat(TokenKind::Comma) {
                            break;
                        }
                    }
                    self.expect(TokenKind::RParen, "expected ')'")?;
                    let end = self.prev_span();
                    return Some(Pattern::Constructor {
                        name,
                        args: ConstructorArgs::Positional(args),
                        span: start.merge(end),
                    });
                }
                if is_capitalized && self.at(TokenKind::LBrace) {
                    return self.parse_record_pattern(Some(name), start);
                }
                if is_capitalized {
                    return Some(Pattern::Constructor { name, args: ConstructorArgs::None, span: tok.span });
                }
                Some(Pattern::Ident { name, is_mut: false, span: tok.span })
            }
            _ => {
                self.error_here("expected a pattern");
                None
            }
        }
    }

    fn parse_record_pattern(&mut self, type_name: Option<String>, start: Span) -> Option<Pattern> {
        self.expect(TokenKind::LBrace, "expected '{'")?;
        let mut fields = Vec::new();
        let mut has_rest = false;
        while !self.at(TokenKind::RBrace) {
            if self.eat(TokenKind::DotDot) {
                has_rest = true;
                break;
            }
            let field_name = self.expect_ident("expected a field name")?;
            let pattern = if self.eat(TokenKind::Colon) {
                self.parse_or_pattern()?
            } else {
                Pattern::Ident { name: field_name.clone(), is_mut: false, span: self.prev_span() }
            };
            fields.push((field_name, pattern));
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RBrace, "expected '}'")?;
        let end = self.prev_span();
        Some(Pattern::Record { type_name, fields, has_rest, span: start.merge(end) })
    }

    /// Gathers string-literal token text after `StringStart` has already
    /// been consumed, rejecting interpolation (used for test names).
    fn parse_string_literal_text(&mut self) -> Option<String> {
        let mut text = String::new();
        loop {
            match self.peek_kind() {
                TokenKind::StringContent => {
                    let tok = self.bump();
                    text.push_str(&unescape(self.text(tok.span)));
                }
                TokenKind::StringEnd => {
                    self.bump();
                    break;
                }
                TokenKind::InterpolationStart => {
                    self.error_here("string interpolation is not allowed here");
                    return None;
                }
                _ => {
                    self.error_here("unterminated string literal");
                    return None;
                }
            }
        }
        Some(text)
    }
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some('0') => out.push('\0'),
                Some(other) => out.push(other),
                None => {}
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn parse_int_literal(text: &str) -> i128 {
    let trimmed = strip_numeric_suffix(text);
    let cleaned: String = trimmed.chars().filter(|c| *c != '_').collect();
    if let Some(hex) = cleaned.strip_prefix("0x").or_else(|| cleaned.strip_prefix("0X")) {
        return i128::from_str_radix(hex, 16).unwrap_or(0);
    }
    if let Some(bin) = cleaned.strip_prefix("0b").or_else(|| cleaned.strip_prefix("0B")) {
        return i128::from_str_radix(bin, 2).unwrap_or(0);
    }
    cleaned.parse().unwrap_or(0)
}

fn parse_float_literal(text: &str) -> f64 {
    let trimmed = strip_numeric_suffix(text);
    let cleaned: String = trimmed.chars().filter(|c| *c != '_').collect();
    cleaned.parse().unwrap_or(0.0)
}

/// Strips an optional trailing width/signedness suffix (`i8`..`i128`,
/// `u8`..`u128`, `f32`, `f64`) from a numeric literal's source text.
fn strip_numeric_suffix(text: &str) -> &str {
    let bytes = text.as_bytes();
    let mut i = bytes.len();
    while i > 0 && bytes[i - 1].is_ascii_digit() {
        i -= 1;
    }
    if i > 1 && i < bytes.len() && matches!(bytes[i - 1], b'i' | b'u' | b'f') {
        return &text[..i - 1];
    }
    text
}

fn parse_char_literal(text: &str) -> char {
    let inner = &text[1..text.len() - 1];
    if let Some(rest) = inner.strip_prefix('\\') {
        match rest.chars().next() {
            Some('n') => '\n',
            Some('t') => '\t',
            Some('r') => '\r',
            Some('0') => '\0',
            Some(c) => c,
            None => '\0',
        }
    } else {
        inner.chars().next().unwrap_or('\0')
    }
}
