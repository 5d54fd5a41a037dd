//! Ariadne-based diagnostic rendering, grounded on
//! `snow-typeck::diagnostics::render_diagnostic` and `snowc/src/main.rs`'s
//! `report_diagnostics`: one `ariadne::Report` per diagnostic, written
//! against the original source text, plus a `--json` fallback that just
//! serializes the `Diagnostic` list.

use std::ops::Range;

use ariadne::{Color, Config, Label, Report, ReportKind, Source};

use kira_common::{Diagnostic, Severity};

fn report_kind(severity: Severity) -> ReportKind<'static> {
    match severity {
        Severity::Error => ReportKind::Error,
        Severity::Warning => ReportKind::Warning,
        Severity::Info => ReportKind::Advice,
    }
}

fn label_color(severity: Severity) -> Color {
    match severity {
        Severity::Error => Color::Red,
        Severity::Warning => Color::Yellow,
        Severity::Info => Color::Blue,
    }
}

fn clamp(range: Range<usize>, source_len: usize) -> Range<usize> {
    let start = range.start.min(source_len);
    let end = range.end.min(source_len).max(start);
    if start == end {
        start..end.saturating_add(1).min(source_len).max(start)
    } else {
        start..end
    }
}

/// Renders every diagnostic in `diags` into one colorless `ariadne` report
/// per entry (colorless so output stays stable for snapshot tests),
/// concatenated in order.
pub fn render(diags: &[Diagnostic], source: &str) -> String {
    let config = Config::default().with_color(false);
    let source_len = source.len();
    let mut out = Vec::new();
    for diag in diags {
        let span = clamp(diag.span.start as usize..diag.span.end as usize, source_len);
        let mut builder = Report::build(report_kind(diag.severity), span.clone())
            .with_code(diag.code)
            .with_message(&diag.message)
            .with_config(config);
        builder = builder.with_label(Label::new(span).with_message(&diag.message).with_color(label_color(diag.severity)));
        for related in &diag.related {
            let rspan = clamp(related.span.start as usize..related.span.end as usize, source_len);
            builder = builder.with_label(Label::new(rspan).with_message(&related.message).with_color(Color::Blue));
        }
        let report = builder.finish();
        let mut buf = Vec::new();
        report.write(Source::from(source), &mut buf).expect("diagnostic rendering should not fail");
        out.push(String::from_utf8_lossy(&buf).into_owned());
    }
    out.join("\n")
}

/// Renders `diags` as a JSON array, for `--json`.
pub fn render_json(diags: &[Diagnostic]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(diags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kira_common::Span;

    #[test]
    fn render_includes_the_error_code_and_message() {
        let diags = vec![Diagnostic::error("E0301", Span::new(0, 3), "type mismatch")];
        let rendered = render(&diags, "let x = 1");
        assert!(rendered.contains("E0301"));
        assert!(rendered.contains("type mismatch"));
    }

    #[test]
    fn render_json_serializes_severity_and_code() {
        let diags = vec![Diagnostic::warning("W0001", Span::new(0, 1), "unreachable pattern")];
        let json = render_json(&diags).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0]["code"], "W0001");
        assert_eq!(parsed[0]["severity"], "Warning");
    }

    #[test]
    fn render_empty_diagnostics_is_empty_string() {
        assert_eq!(render(&[], ""), "");
    }
}
