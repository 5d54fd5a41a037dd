//! The Kira compiler CLI.
//!
//! Provides the `kirac` command with two subcommands:
//!
//! - `kirac check <path>` - lex, parse, resolve, and typecheck a source file
//! - `kirac run <path>` - `check`, then evaluate `main` if it succeeded
//!
//! This crate is the only place in the workspace allowed to touch
//! `std::fs` or `std::process::exit`; every upstream crate is a pure
//! function of a source string or already-built in-memory structures.

mod diagnostics;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};

use kira_common::{has_errors, Diagnostic};
use kira_interp::{BuiltinContext, Interpreter};

#[derive(Parser)]
#[command(name = "kirac", version, about = "The Kira compiler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lex, parse, resolve, and typecheck a source file
    Check {
        /// Path to a `.kira` source file
        path: PathBuf,

        /// Emit diagnostics as a JSON array instead of rendered text
        #[arg(long)]
        json: bool,
    },
    /// Typecheck a source file, then evaluate its `main` function
    Run {
        /// Path to a `.kira` source file
        path: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Check { path, json } => check(&path, json),
        Commands::Run { path } => run(&path),
    };
    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

/// Runs the `check` pipeline: lex → parse → resolve → typecheck, then
/// renders whatever diagnostics came out of it. Returns an error (causing
/// a nonzero exit) iff any diagnostic is error-severity.
fn check(path: &Path, json: bool) -> Result<(), String> {
    let (source, diags) = run_pipeline(path)?;
    report(&diags, &source, json)?;
    if has_errors(&diags) {
        return Err("compilation failed due to errors above".to_string());
    }
    Ok(())
}

/// `check`, then evaluates `main` if it succeeded.
fn run(path: &Path) -> Result<(), String> {
    let (source, diags) = run_pipeline(path)?;
    report(&diags, &source, false)?;
    if has_errors(&diags) {
        return Err("compilation failed due to errors above".to_string());
    }

    let parsed = kira_parser::parse(&source);
    let mut interp = Interpreter::new(BuiltinContext { argv: std::env::args().skip(2).collect() });
    interp.run(&parsed.program).map_err(|e| e.to_string())?;
    Ok(())
}

/// Reads `path` and runs it through parse → resolve → typecheck, returning
/// the source text (so callers can render diagnostics against it) and
/// every diagnostic collected along the way.
fn run_pipeline(path: &Path) -> Result<(String, Vec<Diagnostic>), String> {
    let source = std::fs::read_to_string(path).map_err(|e| format!("failed to read '{}': {e}", path.display()))?;

    let parsed = kira_parser::parse(&source);
    let mut diags: Vec<Diagnostic> = parsed.errors.iter().map(|e| e.to_diagnostic()).collect();

    let (table, resolve_diags) = kira_resolve::resolve_program(&parsed.program);
    diags.extend(resolve_diags);

    if !has_errors(&diags) {
        let (_table, check_diags) = kira_typeck::check_program(table, &parsed.program);
        diags.extend(check_diags);
    }

    Ok((source, diags))
}

fn report(diags: &[Diagnostic], source: &str, json: bool) -> Result<(), String> {
    if diags.is_empty() {
        return Ok(());
    }
    if json {
        let rendered = diagnostics::render_json(diags).map_err(|e| e.to_string())?;
        println!("{rendered}");
    } else {
        eprint!("{}", diagnostics::render(diags, source));
    }
    Ok(())
}
