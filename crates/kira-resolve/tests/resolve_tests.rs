use kira_parser::parse;
use kira_resolve::{resolve_program, PrimitiveType, ResolvedType, SymbolKind, TypeDefKind};

fn resolve(src: &str) -> (kira_resolve::SymbolTable, Vec<kira_common::Diagnostic>) {
    let parsed = parse(src);
    assert!(parsed.errors.is_empty(), "parse errors: {:?}", parsed.errors);
    resolve_program(&parsed.program)
}

#[test]
fn duplicate_top_level_names_are_rejected() {
    let src = "fn area() -> f64 {\n  return 0.0\n}\n\nfn area() -> f64 {\n  return 1.0\n}\n";
    let (_table, diags) = resolve(src);
    assert!(diags.iter().any(|d| d.code == "E0201"));
}

#[test]
fn import_alias_resolves_to_the_imported_function() {
    let src = "module shapes {\n  pub fn area(r: f64) -> f64 {\n    return r * r\n  }\n}\n\nimport shapes::area as compute_area\n";
    let (table, diags) = resolve(src);
    assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
    let alias = table.lookup("compute_area").unwrap();
    match &alias.kind {
        SymbolKind::ImportAlias { resolved: Some(id) } => {
            assert_eq!(table.symbol(*id).name, "area");
        }
        other => panic!("expected import alias, got {other:?}"),
    }
}

#[test]
fn undefined_import_path_is_reported() {
    let (_table, diags) = resolve("import nope::nothing\n");
    assert!(diags.iter().any(|d| d.code == "E0202"));
}

#[test]
fn type_alias_target_resolves_to_primitive() {
    let (table, diags) = resolve("type UserId = i64\n");
    assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
    let sym = table.lookup("UserId").unwrap();
    match &sym.kind {
        SymbolKind::TypeDef { kind: TypeDefKind::Alias { target }, .. } => {
            assert_eq!(*target, ResolvedType::Primitive(PrimitiveType::I64));
        }
        other => panic!("expected type alias, got {other:?}"),
    }
}

#[test]
fn generic_instantiation_with_correct_arity_resolves() {
    let src = "type Box[T] {\n  value: T\n}\n\nfn unwrap(b: Box[i32]) -> i32 {\n  return b.value\n}\n";
    let (table, diags) = resolve(src);
    assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
    let sym = table.lookup("unwrap").unwrap();
    match &sym.kind {
        SymbolKind::Function(sig) => {
            assert!(matches!(&sig.params[0], ResolvedType::Instantiated { name, args, .. } if name == "Box" && args.len() == 1));
        }
        other => panic!("expected function, got {other:?}"),
    }
}

#[test]
fn trait_method_signatures_resolve() {
    let src = "trait Area {\n  fn area(self) -> f64\n}\n";
    let (table, diags) = resolve(src);
    assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
    let sym = table.lookup("Area").unwrap();
    match &sym.kind {
        SymbolKind::TraitDef { methods } => {
            assert_eq!(methods.len(), 1);
            assert_eq!(methods[0].0, "area");
            assert_eq!(methods[0].1.ret, ResolvedType::Primitive(PrimitiveType::F64));
        }
        other => panic!("expected trait, got {other:?}"),
    }
}

#[test]
fn impl_block_is_resolved_against_its_trait_and_target() {
    let src = "type Point {\n  x: f64,\n  y: f64\n}\n\ntrait Area {\n  fn area(self) -> f64\n}\n\nimpl Area for Point {\n  fn area(self) -> f64 {\n    return 0.0\n  }\n}\n";
    let (_table, diags) = resolve(src);
    assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
}

#[test]
fn impl_referencing_an_undefined_trait_is_reported() {
    let src = "type Point {\n  x: f64\n}\n\nimpl Nope for Point {\n}\n";
    let (_table, diags) = resolve(src);
    assert!(diags.iter().any(|d| d.code == "E0202"));
}
