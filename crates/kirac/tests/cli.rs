//! Black-box end-to-end tests for the `kirac` binary, grounded on
//! `snowc/tests/tooling_e2e.rs`'s pattern of driving the compiled binary
//! through `std::process::Command` against scratch source files.

use std::path::PathBuf;
use std::process::Command;

fn kirac_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_kirac"))
}

fn write_source(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn check_accepts_a_well_typed_program() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(
        &dir,
        "main.kira",
        "fn add(a: i32, b: i32) -> i32 {\n  return a + b\n}\n\neffect fn main() -> i32 {\n  return add(2, 3)\n}\n",
    );

    let output = Command::new(kirac_bin())
        .args(["check", path.to_str().unwrap()])
        .output()
        .expect("failed to run kirac check");

    assert!(
        output.status.success(),
        "expected check to succeed, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(output.stderr.is_empty());
}

#[test]
fn check_rejects_a_type_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(
        &dir,
        "main.kira",
        "effect fn main() -> i32 {\n  let x: i32 = \"not a number\"\n  return x\n}\n",
    );

    let output = Command::new(kirac_bin())
        .args(["check", path.to_str().unwrap()])
        .output()
        .expect("failed to run kirac check");

    assert!(!output.status.success(), "expected check to fail on a type error");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains('E'), "expected a rendered diagnostic with an error code, got: {stderr}");
}

#[test]
fn check_json_emits_a_diagnostic_array_on_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(
        &dir,
        "main.kira",
        "effect fn main() -> i32 {\n  let x: i32 = \"not a number\"\n  return x\n}\n",
    );

    let output = Command::new(kirac_bin())
        .args(["check", "--json", path.to_str().unwrap()])
        .output()
        .expect("failed to run kirac check --json");

    assert!(!output.status.success());
    assert!(output.stderr.is_empty(), "rendered text should not appear on stderr in --json mode");

    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value = serde_json::from_str(stdout.trim()).expect("stdout should be a JSON array");
    let diags = parsed.as_array().expect("expected a JSON array of diagnostics");
    assert!(!diags.is_empty());
    assert!(diags[0].get("code").is_some(), "JSON diagnostic missing 'code' field");
    assert!(diags[0].get("severity").is_some(), "JSON diagnostic missing 'severity' field");
}

#[test]
fn run_evaluates_main_and_exits_successfully() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(
        &dir,
        "main.kira",
        "fn add(a: i32, b: i32) -> i32 {\n  return a + b\n}\n\neffect fn main() -> i32 {\n  return add(2, 3)\n}\n",
    );

    let output = Command::new(kirac_bin())
        .args(["run", path.to_str().unwrap()])
        .output()
        .expect("failed to run kirac run");

    assert!(
        output.status.success(),
        "expected run to succeed, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn run_never_evaluates_a_program_that_fails_check() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(
        &dir,
        "main.kira",
        "effect fn main() -> i32 {\n  let x: i32 = \"not a number\"\n  return x\n}\n",
    );

    let output = Command::new(kirac_bin())
        .args(["run", path.to_str().unwrap()])
        .output()
        .expect("failed to run kirac run");

    assert!(!output.status.success(), "expected run to fail before evaluating main");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains('E'), "expected a rendered diagnostic, got: {stderr}");
}

#[test]
fn check_reports_a_missing_file_without_panicking() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("does-not-exist.kira");

    let output = Command::new(kirac_bin())
        .args(["check", missing.to_str().unwrap()])
        .output()
        .expect("failed to run kirac check");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error:"), "expected a plain error message, got: {stderr}");
}
