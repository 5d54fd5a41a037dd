use kira_parser::ast::expr::ExprKind;
use kira_parser::ast::item::{DeclKind, StmtKind};
use kira_parser::ast::pat::{ConstructorArgs, LiteralPat, Pattern};
use kira_parser::parse;

fn decl_kinds(src: &str) -> Vec<DeclKind> {
    let result = parse(src);
    assert!(result.errors.is_empty(), "unexpected errors: {:?}", result.errors);
    result.program.decls.into_iter().map(|d| d.kind).collect()
}

#[test]
fn parses_module_with_nested_function() {
    let src = "module shapes {\n  pub fn area(r: f64) -> f64 {\n    return r * r\n  }\n}\n";
    let decls = decl_kinds(src);
    match &decls[0] {
        DeclKind::Module { name, decls } => {
            assert_eq!(name, "shapes");
            assert_eq!(decls.len(), 1);
            assert!(decls[0].is_pub);
            assert!(matches!(&decls[0].kind, DeclKind::Fn { name, .. } if name == "area"));
        }
        other => panic!("expected module, got {other:?}"),
    }
}

#[test]
fn parses_import_with_alias() {
    let decls = decl_kinds("import shapes::geometry as geo\n");
    match &decls[0] {
        DeclKind::Import { path, alias } => {
            assert_eq!(path, &vec!["shapes".to_string(), "geometry".to_string()]);
            assert_eq!(alias.as_deref(), Some("geo"));
        }
        other => panic!("expected import, got {other:?}"),
    }
}

#[test]
fn parses_sum_type_with_mixed_variants() {
    let src = "type Shape =\n  Circle(f64)\n  | Point { x: f64, y: f64 }\n  | Nil\n";
    let decls = decl_kinds(src);
    match &decls[0] {
        DeclKind::SumType { name, variants, .. } => {
            assert_eq!(name, "Shape");
            assert_eq!(variants.len(), 3);
            assert_eq!(variants[0].name, "Circle");
            assert_eq!(variants[1].name, "Point");
            assert_eq!(variants[2].name, "Nil");
        }
        other => panic!("expected sum type, got {other:?}"),
    }
}

#[test]
fn parses_type_alias_distinct_from_single_variant_sum_type() {
    let decls = decl_kinds("type UserId = i64\n");
    match &decls[0] {
        DeclKind::TypeAlias { name, .. } => assert_eq!(name, "UserId"),
        other => panic!("expected type alias, got {other:?}"),
    }
}

#[test]
fn parses_product_type() {
    let decls = decl_kinds("type Point {\n  x: f64,\n  y: f64\n}\n");
    match &decls[0] {
        DeclKind::ProductType { name, fields, .. } => {
            assert_eq!(name, "Point");
            assert_eq!(fields.len(), 2);
        }
        other => panic!("expected product type, got {other:?}"),
    }
}

#[test]
fn parses_trait_and_impl() {
    let src = "trait Area {\n  fn area(self) -> f64\n}\n\nimpl Area for Point {\n  fn area(self) -> f64 {\n    return 0.0\n  }\n}\n";
    let decls = decl_kinds(src);
    assert!(matches!(&decls[0], DeclKind::Trait { name, methods, .. } if name == "Area" && methods.len() == 1));
    assert!(matches!(&decls[1], DeclKind::Impl { trait_name: Some(t), methods, .. } if t == "Area" && methods.len() == 1));
}

#[test]
fn parses_test_decl_with_string_name() {
    let decls = decl_kinds("test \"addition works\" {\n  let x: i32 = 1 + 1\n}\n");
    match &decls[0] {
        DeclKind::Test { name, body } => {
            assert_eq!(name, "addition works");
            assert_eq!(body.len(), 1);
        }
        other => panic!("expected test decl, got {other:?}"),
    }
}

#[test]
fn parses_effect_function_with_body_statements() {
    let src = "effect fn main() -> void {\n  let x: i32 = 1\n  var y = 2\n  y = x + y\n  if y > 0 {\n    return\n  }\n}\n";
    let decls = decl_kinds(src);
    match &decls[0] {
        DeclKind::Fn { is_effect, body, .. } => {
            assert!(is_effect);
            assert_eq!(body.len(), 4);
            assert!(matches!(body[0].kind, StmtKind::Let { .. }));
            assert!(matches!(body[1].kind, StmtKind::Var { .. }));
            assert!(matches!(body[2].kind, StmtKind::Assign { .. }));
            assert!(matches!(body[3].kind, StmtKind::If { .. }));
        }
        other => panic!("expected fn, got {other:?}"),
    }
}

#[test]
fn parses_expression_precedence() {
    let src = "fn f() -> i32 {\n  return 1 + 2 * 3 == 7 && true\n}\n";
    let decls = decl_kinds(src);
    match &decls[0] {
        DeclKind::Fn { body, .. } => match &body[0].kind {
            StmtKind::Return { value: Some(expr) } => {
                assert!(matches!(expr.kind, ExprKind::Binary { .. }));
            }
            other => panic!("expected return, got {other:?}"),
        },
        other => panic!("expected fn, got {other:?}"),
    }
}

#[test]
fn parses_open_ended_range_before_loop_body() {
    let src = "fn f() -> void {\n  for i in 0.. {\n    break\n  }\n}\n";
    let decls = decl_kinds(src);
    match &decls[0] {
        DeclKind::Fn { body, .. } => match &body[0].kind {
            StmtKind::For { iterable, body, .. } => {
                assert!(matches!(iterable.kind, ExprKind::Range { end: None, .. }));
                assert_eq!(body.len(), 1);
            }
            other => panic!("expected for, got {other:?}"),
        },
        other => panic!("expected fn, got {other:?}"),
    }
}

#[test]
fn parses_record_literal_vs_block_disambiguation() {
    let src = "fn f() -> void {\n  let p: Point = Point { x: 1, y: 2 }\n  let b: i32 = {\n    1\n  }\n}\n";
    let decls = decl_kinds(src);
    match &decls[0] {
        DeclKind::Fn { body, .. } => {
            match &body[0].kind {
                StmtKind::Let { value, .. } => {
                    assert!(matches!(&value.kind, ExprKind::Record { type_name: Some(n), .. } if n == "Point"));
                }
                other => panic!("expected let, got {other:?}"),
            }
            match &body[1].kind {
                StmtKind::Let { value, .. } => {
                    assert!(matches!(value.kind, ExprKind::Block(_)));
                }
                other => panic!("expected let, got {other:?}"),
            }
        }
        other => panic!("expected fn, got {other:?}"),
    }
}

#[test]
fn parses_match_with_constructor_and_guard_patterns() {
    let src = "fn f(x: Shape) -> f64 {\n  match x {\n    Circle(r) if r > 0.0 => r * r\n    Point { x, y } => x + y\n    _ => 0.0\n  }\n}\n";
    let decls = decl_kinds(src);
    match &decls[0] {
        DeclKind::Fn { body, .. } => match &body[0].kind {
            StmtKind::Match { arms, .. } => {
                assert_eq!(arms.len(), 3);
                assert!(matches!(&arms[0].pattern, Pattern::Constructor { name, args: ConstructorArgs::Positional(_), .. } if name == "Circle"));
                assert!(arms[0].guard.is_some());
                assert!(matches!(&arms[1].pattern, Pattern::Record { type_name: Some(n), .. } if n == "Point"));
                assert!(matches!(arms[2].pattern, Pattern::Wildcard { .. }));
            }
            other => panic!("expected match, got {other:?}"),
        },
        other => panic!("expected fn, got {other:?}"),
    }
}

#[test]
fn parses_string_interpolation() {
    let src = "fn f(name: string) -> string {\n  return \"hello ${name}!\"\n}\n";
    let decls = decl_kinds(src);
    match &decls[0] {
        DeclKind::Fn { body, .. } => match &body[0].kind {
            StmtKind::Return { value: Some(expr) } => {
                assert!(matches!(expr.kind, ExprKind::InterpolatedString(_)));
            }
            other => panic!("expected return, got {other:?}"),
        },
        other => panic!("expected fn, got {other:?}"),
    }
}

#[test]
fn parses_cast_and_try_and_coalesce_expressions() {
    let src = "fn f() -> i32 {\n  return (g()? as i32) ?? 0\n}\n";
    let decls = decl_kinds(src);
    match &decls[0] {
        DeclKind::Fn { body, .. } => match &body[0].kind {
            StmtKind::Return { value: Some(expr) } => {
                assert!(matches!(expr.kind, ExprKind::Coalesce { .. }));
            }
            other => panic!("expected return, got {other:?}"),
        },
        other => panic!("expected fn, got {other:?}"),
    }
}

#[test]
fn parses_numeric_literals_with_suffix_and_radix() {
    let decls = decl_kinds("const MAX: i64 = 0xFFu64\nconst MASK: i32 = 0b1010\n");
    match &decls[0] {
        DeclKind::Const { value, .. } => {
            assert!(matches!(value.kind, ExprKind::Literal(LiteralPat::Int(255))));
        }
        other => panic!("expected const, got {other:?}"),
    }
    match &decls[1] {
        DeclKind::Const { value, .. } => {
            assert!(matches!(value.kind, ExprKind::Literal(LiteralPat::Int(10))));
        }
        other => panic!("expected const, got {other:?}"),
    }
}

#[test]
fn reports_error_and_recovers_at_next_declaration() {
    let src = "fn broken(a: {\n}\n\nfn ok(x: i32) -> i32 {\n  return x\n}\n";
    let result = parse(src);
    assert!(!result.errors.is_empty());
    assert!(result
        .program
        .decls
        .iter()
        .any(|d| matches!(&d.kind, DeclKind::Fn { name, .. } if name == "ok")));
}
