mod render;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use texfilter_core::{
    CommandTable, DictionaryProvider, FilterError, FilterOptions, FilterSession, SegmentCollector,
    token_report, tokens_to_json,
};
use texfilter_diagnostics::{self as diag, Diagnostic, codes};
use texfilter_tables::{BUILTIN_CONFIG_JSON, lint_config_str, scan_unknown_commands};
use tracing_subscriber::EnvFilter;

use crate::render::{Format, has_errors, print_json, print_summary, render_pretty};

/// Environment variable holding the log filter.
const LOG_ENV: &str = "TEXFILTER_LOG";

// ── CLI definition ──────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "texfilter",
    version,
    about = "Split LaTeX documents into translatable segments and put the markup back"
)]
struct Cli {
    /// Output mode. Defaults to "pretty" when stdout is a TTY, "json"
    /// otherwise.
    #[arg(long, global = true, value_enum)]
    output: Option<Format>,

    /// Command table JSON to use instead of the built-in table.
    #[arg(long, global = true)]
    commands: Option<String>,

    /// Do not pass `Environments: ...` comments along with segments.
    #[arg(long, global = true)]
    no_environment_comments: bool,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// List the segments a translator would see.
    Extract { file: String },

    /// Translate a document with a JSON dictionary of segments.
    Translate {
        file: String,
        /// JSON object mapping source segments to translations.
        #[arg(long)]
        dict: String,
        /// Write the translated document here instead of stdout.
        #[arg(short = 'o', long = "out")]
        out: Option<String>,
    },

    /// Show every token with its parser mark.
    Tokens { file: String },

    /// Check a command table configuration, and optionally documents for
    /// commands it does not know.
    CheckConfig {
        /// Configuration to check. Defaults to `--commands`, then the
        /// built-in table.
        path: Option<String>,
        /// Documents to scan for unknown commands.
        #[arg(long, num_args = 1..)]
        content: Vec<String>,
    },

    /// Write the built-in command table as a starting point for editing.
    DumpConfig {
        #[arg(short = 'o', long = "out")]
        out: Option<String>,
    },

    /// Explain a diagnostic ID (e.g. TEX1001).
    Explain { id: String },
}

// ── Main ────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();
    let format = Format::resolve_or_detect(cli.output);
    let options = FilterOptions {
        environment_comments: !cli.no_environment_comments,
    };
    let commands = cli.commands.as_deref();

    match cli.cmd {
        Cmd::Extract { file } => cmd_extract(&file, commands, options, format)?,
        Cmd::Translate { file, dict, out } => {
            cmd_translate(&file, &dict, out.as_deref(), commands, options, format)?;
        }
        Cmd::Tokens { file } => cmd_tokens(&file, commands, format)?,
        Cmd::CheckConfig { path, content } => {
            cmd_check_config(path.as_deref().or(commands), &content, format)?;
        }
        Cmd::DumpConfig { out } => cmd_dump_config(out.as_deref(), format)?,
        Cmd::Explain { id } => cmd_explain(&id, format)?,
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

// ── Commands ────────────────────────────────────────────────────────────

fn cmd_extract(
    file: &str,
    commands: Option<&str>,
    options: FilterOptions,
    format: Format,
) -> Result<()> {
    let input = read_file(file)?;
    let loaded = load_table(commands)?;
    let table = table_or_builtin(loaded.as_ref());

    let mut collector = SegmentCollector::new();
    let mut sink = String::new();
    if let Err(err) =
        FilterSession::with_options(table, options).process_document(&input, &mut collector, &mut sink)
    {
        exit_with_filter_error(&input, file, &err, format);
    }
    let segments = collector.into_segments();

    match format {
        Format::Json => print_json(&serde_json::json!({
            "file": file,
            "segments": segments,
        })),
        Format::Pretty => {
            for (i, segment) in segments.iter().enumerate() {
                println!("{:>4}  {}", i + 1, segment.text.escape_debug());
                if let Some(comment) = &segment.comment {
                    println!("      # {comment}");
                }
            }
            eprintln!("{} segments", segments.len());
        }
    }
    Ok(())
}

/// Outcome of `translate`, reported next to the document.
#[derive(Debug, Serialize)]
struct TranslateSummary<'a> {
    file: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    out: Option<&'a str>,
    translated: usize,
    untranslated: usize,
}

fn cmd_translate(
    file: &str,
    dict: &str,
    out: Option<&str>,
    commands: Option<&str>,
    options: FilterOptions,
    format: Format,
) -> Result<()> {
    let input = read_file(file)?;
    let mut provider = DictionaryProvider::from_json_str(&read_file(dict)?)
        .with_context(|| format!("invalid dictionary {dict}"))?;
    tracing::debug!(entries = provider.len(), "loaded dictionary");
    let loaded = load_table(commands)?;
    let table = table_or_builtin(loaded.as_ref());

    let mut translated = String::with_capacity(input.len());
    if let Err(err) = FilterSession::with_options(table, options).process_document(
        &input,
        &mut provider,
        &mut translated,
    ) {
        exit_with_filter_error(&input, file, &err, format);
    }

    match out {
        Some(path) => {
            fs::write(path, &translated).with_context(|| format!("failed to write {path}"))?;
        }
        None => print!("{translated}"),
    }

    let summary = TranslateSummary {
        file,
        out,
        translated: provider.hits(),
        untranslated: provider.misses(),
    };
    match format {
        // With no `--out`, stdout already carries the document.
        Format::Json if out.is_some() => print_json(&serde_json::to_value(&summary)?),
        Format::Json => {}
        Format::Pretty => eprintln!(
            "{} segments translated, {} left unchanged",
            summary.translated, summary.untranslated
        ),
    }
    Ok(())
}

fn cmd_tokens(file: &str, commands: Option<&str>, format: Format) -> Result<()> {
    let input = read_file(file)?;
    let loaded = load_table(commands)?;
    let table = table_or_builtin(loaded.as_ref());

    let marked = match FilterSession::new(table).mark_tokens(&input) {
        Ok(marked) => marked,
        Err(err) => exit_with_filter_error(&input, file, &err, format),
    };

    match format {
        Format::Json => println!("{}", tokens_to_json(&input, &marked)),
        Format::Pretty => {
            for row in token_report(&input, &marked) {
                let position = format!("{}:{}", row.line + 1, row.column + 1);
                let text = format!("{:?}", row.text);
                println!(
                    "{position:<8} {:<12} {text:<28} {} x={} id={} {}",
                    row.kind.to_string(),
                    if row.translatable { "T" } else { "-" },
                    row.externality,
                    row.tag_id,
                    if row.escape { "esc" } else { "raw" },
                );
            }
        }
    }
    Ok(())
}

fn cmd_check_config(path: Option<&str>, content: &[String], format: Format) -> Result<()> {
    let (name, json) = match path {
        Some(p) => (p.to_string(), read_file(p)?),
        None => ("<builtin>".to_string(), BUILTIN_CONFIG_JSON.to_string()),
    };
    let config_diagnostics =
        lint_config_str(&json).with_context(|| format!("failed to parse command table {name}"))?;
    let table = CommandTable::from_json_str(&json)
        .with_context(|| format!("failed to load command table {name}"))?;

    let mut documents = Vec::with_capacity(content.len());
    for file in content {
        let text = read_file(file)?;
        let diagnostics: Vec<Diagnostic> = scan_unknown_commands(&table, &text)
            .into_iter()
            .map(|command| {
                Diagnostic::warn(
                    codes::PARSER_UNKNOWN_COMMAND,
                    format!("\\{command} is not in the command table"),
                    None,
                )
                .with_context(BTreeMap::from([
                    ("command".to_string(), command),
                    ("file".to_string(), file.clone()),
                ]))
            })
            .collect();
        documents.push((file.as_str(), text, diagnostics));
    }

    let mut all = config_diagnostics.clone();
    all.extend(documents.iter().flat_map(|(_, _, d)| d.iter().cloned()));
    let ok = !has_errors(&all);

    match format {
        Format::Json => print_json(&serde_json::json!({
            "config": name,
            "ok": ok,
            "diagnostics": all,
        })),
        Format::Pretty => {
            render_pretty(&json, &name, &config_diagnostics);
            for (file, text, diagnostics) in &documents {
                render_pretty(text, file, diagnostics);
            }
            print_summary(&all);
            if ok {
                eprintln!("config ok: {} commands", table.len());
            }
        }
    }

    if !ok {
        process::exit(1);
    }
    Ok(())
}

fn cmd_dump_config(out: Option<&str>, format: Format) -> Result<()> {
    let Some(path) = out else {
        print!("{BUILTIN_CONFIG_JSON}");
        return Ok(());
    };
    fs::write(path, BUILTIN_CONFIG_JSON).with_context(|| format!("failed to write {path}"))?;
    match format {
        Format::Json => print_json(&serde_json::json!({ "status": "written", "file": path })),
        Format::Pretty => eprintln!("wrote built-in command table to {path}"),
    }
    Ok(())
}

fn cmd_explain(id: &str, format: Format) -> Result<()> {
    match format {
        Format::Json => print_json(&serde_json::json!({
            "id": id,
            "explanation": diag::explain(id),
        })),
        Format::Pretty => match diag::explain(id) {
            Some(text) => {
                use ariadne::Fmt;
                println!("{}: {}", id.fg(ariadne::Color::Cyan), text);
            }
            None => println!("{id}: (no explanation available)"),
        },
    }
    Ok(())
}

// ── Helpers ─────────────────────────────────────────────────────────────

fn read_file(path: &str) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {path}"))
}

/// Load `--commands` when given.
fn load_table(path: Option<&str>) -> Result<Option<CommandTable>> {
    path.map(|p| CommandTable::from_path(Path::new(p)).with_context(|| format!("invalid command table {p}")))
        .transpose()
}

fn table_or_builtin(loaded: Option<&CommandTable>) -> &CommandTable {
    loaded.unwrap_or_else(|| CommandTable::builtin())
}

/// Report a fatal filter error against the document and exit with code 1.
fn exit_with_filter_error(source: &str, file: &str, err: &FilterError, format: Format) -> ! {
    let diagnostics = [err.to_diagnostic()];
    match format {
        Format::Json => print_json(&serde_json::json!({
            "file": file,
            "ok": false,
            "diagnostics": diagnostics,
        })),
        Format::Pretty => {
            render_pretty(source, file, &diagnostics);
            print_summary(&diagnostics);
        }
    }
    process::exit(1);
}
