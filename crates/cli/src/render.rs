//! Diagnostic rendering for the terminal and for tools.
//!
//! Pretty output goes through ariadne and lands on stderr so that documents
//! and segment listings on stdout stay clean. JSON output is a single
//! document on stdout.

use std::io::{self, IsTerminal};

use ariadne::{Color, Config, Fmt, Label, Report, ReportKind, Source};
use clap::ValueEnum;
use texfilter_diagnostics::{Diagnostic, Severity};

/// `--output` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum Format {
    /// Coloured, source-annotated output.
    Pretty,
    /// Machine-readable JSON.
    Json,
}

impl Format {
    /// Use the explicit choice, else pretty on a terminal and JSON in pipes.
    pub(crate) fn resolve_or_detect(explicit: Option<Format>) -> Self {
        explicit.unwrap_or_else(|| {
            if io::stdout().is_terminal() {
                Format::Pretty
            } else {
                Format::Json
            }
        })
    }
}

fn report_kind(severity: &Severity) -> ReportKind<'static> {
    match severity {
        Severity::Error => ReportKind::Error,
        _ => ReportKind::Warning,
    }
}

fn severity_color(severity: &Severity) -> Color {
    match severity {
        Severity::Error => Color::Red,
        Severity::Warn => Color::Yellow,
        _ => Color::White,
    }
}

fn context_note(diag: &Diagnostic) -> Option<String> {
    let ctx = diag.context.as_ref().filter(|ctx| !ctx.is_empty())?;
    Some(
        ctx.iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(", "),
    )
}

/// Render diagnostics for one input to stderr.
///
/// Diagnostics with a span are drawn against `source`; the rest are printed
/// as plain `severity[ID]: message` lines.
pub(crate) fn render_pretty(source: &str, filename: &str, diagnostics: &[Diagnostic]) {
    let config = Config::default().with_compact(false);
    let mut cache = (filename, Source::from(source));

    for diag in diagnostics {
        let Some(span) = diag.span else {
            eprintln!("{diag}");
            if let Some(note) = context_note(diag) {
                eprintln!("  = note: {note}");
            }
            if let Some(help) = diag.explain() {
                eprintln!("  = help: {help}");
            }
            continue;
        };

        let start = span.start.min(source.len());
        let end = span.end.min(source.len()).max(start);
        let mut builder = Report::build(report_kind(&diag.severity), (filename, start..end))
            .with_code(diag.id.as_ref())
            .with_message(&diag.message)
            .with_config(config)
            .with_label(
                Label::new((filename, start..end))
                    .with_message(context_note(diag).unwrap_or_else(|| diag.message.clone()))
                    .with_color(severity_color(&diag.severity)),
            );
        if let Some(help) = diag.explain() {
            builder = builder.with_help(help);
        }
        builder.finish().eprint(&mut cache).ok();
    }
}

/// Print a JSON value to stdout.
pub(crate) fn print_json(value: &serde_json::Value) {
    let json = serde_json::to_string_pretty(value).expect("JSON value serialization cannot fail");
    println!("{json}");
}

/// Print `N errors, M warnings` to stderr when there is anything to count.
pub(crate) fn print_summary(diagnostics: &[Diagnostic]) {
    let errors = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .count();
    let warnings = diagnostics.len() - errors;
    if diagnostics.is_empty() {
        return;
    }

    let mut parts = Vec::new();
    if errors > 0 {
        let s = if errors == 1 { "" } else { "s" };
        parts.push(format!("{}", format!("{errors} error{s}").fg(Color::Red)));
    }
    if warnings > 0 {
        let s = if warnings == 1 { "" } else { "s" };
        parts.push(format!("{}", format!("{warnings} warning{s}").fg(Color::Yellow)));
    }
    eprintln!("{}", parts.join(", "));
}

/// `true` when any diagnostic is an error.
pub(crate) fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(|d| d.severity == Severity::Error)
}
