use kira_common::token::TokenKind;
use kira_lexer::Lexer;

fn kinds(source: &str) -> Vec<TokenKind> {
    Lexer::tokenize(source).into_iter().map(|t| t.kind).collect()
}

#[test]
fn full_function_declaration_tokenizes_with_significant_newlines() {
    let source = "fn add(a: i32, b: i32) -> i32 {\n    return a + b\n}\n";
    let k = kinds(source);
    assert_eq!(
        k,
        vec![
            TokenKind::Fn,
            TokenKind::Ident,
            TokenKind::LParen,
            TokenKind::Ident,
            TokenKind::Colon,
            TokenKind::Ident,
            TokenKind::Comma,
            TokenKind::Ident,
            TokenKind::Colon,
            TokenKind::Ident,
            TokenKind::RParen,
            TokenKind::Arrow,
            TokenKind::Ident,
            TokenKind::LBrace,
            TokenKind::Return,
            TokenKind::Ident,
            TokenKind::Plus,
            TokenKind::Ident,
            TokenKind::Newline,
            TokenKind::RBrace,
            TokenKind::Newline,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn generic_type_application_lexes_as_brackets_not_comparisons() {
    let k = kinds("let xs: Option[i32] = None");
    assert_eq!(
        k,
        vec![
            TokenKind::Let,
            TokenKind::Ident,
            TokenKind::Colon,
            TokenKind::Ident,
            TokenKind::LBracket,
            TokenKind::Ident,
            TokenKind::RBracket,
            TokenKind::Eq,
            TokenKind::Ident,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn match_arm_separators_and_fat_arrow() {
    let k = kinds("match x {\n    true => 1,\n    false => 0,\n}");
    assert!(k.contains(&TokenKind::FatArrow));
    assert!(k.contains(&TokenKind::Match));
}

#[test]
fn token_stream_reconstructs_source_modulo_comments() {
    // Testable property 1: concatenating lexemes (with whitespace elided)
    // reconstructs the source modulo comments.
    let source = "let x = 1 + 2";
    let tokens = Lexer::tokenize(source);
    let mut rebuilt = String::new();
    for tok in &tokens {
        if tok.kind == TokenKind::Eof {
            continue;
        }
        rebuilt.push_str(&source[tok.span.start as usize..tok.span.end as usize]);
        rebuilt.push(' ');
    }
    assert_eq!(rebuilt.trim(), "let x = 1 + 2");
}

#[test]
fn unterminated_string_is_invalid_not_panic() {
    let k = kinds("\"unterminated");
    assert!(k.contains(&TokenKind::Invalid));
    assert_eq!(*k.last().unwrap(), TokenKind::Eof);
}
