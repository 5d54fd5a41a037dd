//! Snapshot tests for Kira type-checker diagnostics.
//!
//! Each test triggers a specific class of diagnostic and snapshots its
//! rendered `Display` form (`severity[code]: message`), so wording
//! regressions in `error.rs` show up as a snapshot diff.

use kira_typeck::check_program;

fn render_first(src: &str) -> String {
    let parsed = kira_parser::parse(src);
    assert!(parsed.errors.is_empty(), "unexpected parse errors: {:?}", parsed.errors);
    let (table, resolve_diags) = kira_resolve::resolve_program(&parsed.program);
    assert!(resolve_diags.is_empty(), "unexpected resolve errors: {resolve_diags:?}");
    let (_table, diags) = check_program(table, &parsed.program);
    assert!(!diags.is_empty(), "expected at least one diagnostic for source: {src:?}");
    diags[0].to_string()
}

#[test]
fn snapshot_mismatched_return_type() {
    let output = render_first("fn f() -> i32 {\n  return true\n}\n\neffect fn main() {\n}\n");
    insta::assert_snapshot!(output);
}

#[test]
fn snapshot_effect_called_from_pure_context() {
    let output = render_first("effect fn write() -> i32 {\n  return 1\n}\n\nfn pure_caller() -> i32 {\n  return write()\n}\n\neffect fn main() {\n}\n");
    insta::assert_snapshot!(output);
}

#[test]
fn snapshot_unknown_field_access() {
    let output = render_first(
        "type Point {\n  x: f64,\n  y: f64\n}\n\nfn bad(p: Point) -> f64 {\n  return p.z\n}\n\neffect fn main() {\n}\n",
    );
    insta::assert_snapshot!(output);
}

#[test]
fn snapshot_non_exhaustive_match() {
    let output = render_first(
        "effect fn main() {\n  let b: bool = true\n  let r: i32 = match b {\n    true => { 1 }\n  }\n}\n",
    );
    insta::assert_snapshot!(output);
}
