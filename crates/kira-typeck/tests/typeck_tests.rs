use kira_common::Diagnostic;
use kira_typeck::check_program;

fn check(src: &str) -> Vec<Diagnostic> {
    let parsed = kira_parser::parse(src);
    assert!(parsed.errors.is_empty(), "unexpected parse errors: {:?}", parsed.errors);
    let (table, resolve_diags) = kira_resolve::resolve_program(&parsed.program);
    assert!(resolve_diags.is_empty(), "unexpected resolve errors: {resolve_diags:?}");
    let (_table, diags) = check_program(table, &parsed.program);
    diags
}

fn has_code(diags: &[Diagnostic], code: &str) -> bool {
    diags.iter().any(|d| d.code == code)
}

#[test]
fn generic_identity_function_round_trips_through_every_type_param_use() {
    let diags = check(
        "fn identity[T](x: T) -> T {\n  return x\n}\n\neffect fn main() {\n  let a: i32 = identity(1)\n  let b: str = identity(\"hi\")\n}\n",
    );
    assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
}

#[test]
fn effect_function_called_from_effect_context_is_accepted() {
    let diags = check(
        "effect fn write() -> i32 {\n  return 1\n}\n\neffect fn main() -> i32 {\n  return write()\n}\n",
    );
    assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
}

#[test]
fn nested_generic_array_type_checks_element_wise() {
    let diags = check(
        "fn first(xs: [i32]) -> i32 {\n  return xs[0]\n}\n\neffect fn main() {\n  let xs: [i32] = [1, 2, 3]\n  let x: i32 = first(xs)\n}\n",
    );
    assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
}

#[test]
fn assigning_a_mismatched_array_element_type_is_reported() {
    let diags = check("effect fn main() {\n  let xs: [i32] = [1, \"two\", 3]\n}\n");
    assert!(!diags.is_empty(), "expected a type mismatch for a mixed-type array literal");
}

#[test]
fn impl_method_missing_from_its_trait_is_reported() {
    let diags = check(
        "trait Shape {\n  fn area(self) -> f64\n}\n\ntype Square {\n  side: f64\n}\n\nimpl Shape for Square {\n}\n\neffect fn main() {\n}\n",
    );
    assert!(!diags.is_empty(), "expected a diagnostic for a missing trait method");
}

#[test]
fn method_call_through_self_type_resolves_against_the_impl_block() {
    let diags = check(
        "type Counter {\n  value: i32\n}\n\nimpl Counter {\n  fn get(self) -> i32 {\n    return self.value\n  }\n}\n\neffect fn main() {\n  let c: Counter = Counter { value: 5 }\n  let v: i32 = c.get()\n}\n",
    );
    assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
}

#[test]
fn non_exhaustive_sum_type_match_names_the_missing_variant() {
    let diags = check(
        "type Shape = Circle(f64) | Point\n\nfn area(s: Shape) -> f64 {\n  return match s {\n    Circle(r) => { r }\n  }\n}\n\neffect fn main() {\n}\n",
    );
    assert!(has_code(&diags, "E0314"));
}

#[test]
fn guard_expression_must_evaluate_to_bool() {
    let diags = check(
        "effect fn main() {\n  let n: i32 = 1\n  let r: i32 = match n {\n    n if n => { 1 }\n    _ => { 0 }\n  }\n}\n",
    );
    assert!(!diags.is_empty(), "expected a type error on a non-bool guard");
}

#[test]
fn coalesce_operator_falls_back_when_option_is_none() {
    let diags = check(
        "fn first(xs: [i32]) -> option[i32] {\n  return None\n}\n\neffect fn main() {\n  let x: i32 = first([]) ?? 0\n}\n",
    );
    assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
}
