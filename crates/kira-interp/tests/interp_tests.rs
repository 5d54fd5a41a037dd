use kira_interp::{BuiltinContext, Interpreter, Value};

fn eval(src: &str) -> Value {
    let parsed = kira_parser::parse(src);
    assert!(parsed.errors.is_empty(), "unexpected parse errors: {:?}", parsed.errors);
    let mut interp = Interpreter::new(BuiltinContext::default());
    interp.run(&parsed.program).expect("program should evaluate without raising")
}

#[test]
fn recursive_function_computes_a_factorial() {
    let src = "fn fact(n: i32) -> i32 {\n  if n <= 1 {\n    return 1\n  }\n  return n * fact(n - 1)\n}\n\neffect fn main() -> i32 {\n  return fact(5)\n}\n";
    assert_eq!(eval(src), Value::Int(120));
}

#[test]
fn higher_order_functions_compose_through_closures() {
    let src = "fn twice(f: fn(i32) -> i32, x: i32) -> i32 {\n  return f(f(x))\n}\n\neffect fn main() -> i32 {\n  let inc: fn(i32) -> i32 = fn(x: i32) -> i32 { return x + 1 }\n  return twice(inc, 10)\n}\n";
    assert_eq!(eval(src), Value::Int(12));
}

#[test]
fn while_loop_and_mutable_binding_sum_to_n() {
    let src = "effect fn main() -> i32 {\n  var i: i32 = 0\n  var total: i32 = 0\n  while i < 5 {\n    total = total + i\n    i = i + 1\n  }\n  return total\n}\n";
    assert_eq!(eval(src), Value::Int(10));
}

#[test]
fn or_patterns_and_guards_select_the_matching_arm() {
    let src = "fn classify(n: i32) -> str {\n  return match n {\n    0 => { \"zero\" }\n    n if n < 0 => { \"negative\" }\n    1 | 2 | 3 => { \"small\" }\n    _ => { \"large\" }\n  }\n}\n\neffect fn main() -> str {\n  return classify(2)\n}\n";
    assert_eq!(eval(src), Value::str("small"));
}

#[test]
fn nested_sum_type_variants_destructure_through_match() {
    let src = "type Tree =\n  Leaf(i32)\n  | Node { left: Tree, right: Tree }\n\nfn sum(t: Tree) -> i32 {\n  return match t {\n    Leaf(v) => { v }\n    Node { left, right } => { sum(left) + sum(right) }\n  }\n}\n\neffect fn main() -> i32 {\n  let tree: Tree = Node { left: Leaf(1), right: Node { left: Leaf(2), right: Leaf(3) } }\n  return sum(tree)\n}\n";
    assert_eq!(eval(src), Value::Int(6));
}

#[test]
fn result_propagation_short_circuits_on_err() {
    let src = "fn parse_positive(n: i32) -> result[i32, str] {\n  if n < 0 {\n    return Err(\"negative\")\n  }\n  return Ok(n)\n}\n\nfn double_if_positive(n: i32) -> result[i32, str] {\n  let v: i32 = parse_positive(n)?\n  return Ok(v * 2)\n}\n\neffect fn main() -> result[i32, str] {\n  return double_if_positive(-1)\n}\n";
    match eval(src) {
        Value::Result(Err(e)) => assert_eq!(*e, Value::str("negative")),
        other => panic!("expected Err, got {other:?}"),
    }
}

#[test]
fn array_literal_indexing_and_out_of_bounds_raises_runtime_error() {
    let src = "effect fn main() -> i32 {\n  let xs: [i32] = [1, 2, 3]\n  return xs[5]\n}\n";
    let parsed = kira_parser::parse(src);
    assert!(parsed.errors.is_empty());
    let mut interp = Interpreter::new(BuiltinContext::default());
    let result = interp.run(&parsed.program);
    assert!(result.is_err(), "indexing past the end of an array should raise a runtime error");
}

#[test]
fn run_tests_executes_every_test_declaration_independently() {
    let src = "fn add(a: i32, b: i32) -> i32 {\n  return a + b\n}\n\ntest \"add is commutative\" {\n  std.assert(add(2, 3) == add(3, 2), \"should be commutative\")\n}\n\ntest \"add with zero is identity\" {\n  std.assert(add(4, 0) == 4, \"should be the identity\")\n}\n\neffect fn main() -> i32 {\n  return 0\n}\n";
    let parsed = kira_parser::parse(src);
    assert!(parsed.errors.is_empty());
    let mut interp = Interpreter::new(BuiltinContext::default());
    interp.load(&parsed.program).expect("load should succeed");
    let results = interp.run_tests();
    assert_eq!(results.len(), 2);
    for (name, outcome) in &results {
        assert!(outcome.is_ok(), "test '{name}' failed: {outcome:?}");
    }
}
