//! Loading and checking command table configuration files.

use std::path::Path;

use texfilter_diagnostics::{Severity, codes};
use texfilter_tables::{
    BUILTIN_CONFIG_JSON, CommandKind, CommandTable, TableError, lint_config_str,
    scan_unknown_commands,
};

fn data_path(name: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("data").join(name)
}

#[test]
fn builtin_file_loads_from_disk() {
    let from_disk = CommandTable::from_path(&data_path("commands.json")).unwrap();
    let builtin = CommandTable::builtin();
    assert_eq!(from_disk.len(), builtin.len());
    assert_eq!(from_disk.get("footnote").kind, CommandKind::Format);
    assert!(from_disk.is_option_consumer("figure"));
}

#[test]
fn missing_file_reports_path() {
    let err = CommandTable::from_path(&data_path("missing.json")).unwrap_err();
    assert!(matches!(err, TableError::Io { .. }));
    assert!(err.to_string().contains("missing.json"), "{err}");
}

#[test]
fn builtin_config_has_no_lint_errors() {
    let diags = lint_config_str(BUILTIN_CONFIG_JSON).unwrap();
    let errors: Vec<_> = diags
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .collect();
    assert!(errors.is_empty(), "{errors:?}");
}

#[test]
fn lint_reports_duplicate_labels_across_groups() {
    let json = r#"{"allCommands": [
        {"type": "FORMAT", "commands": [{"name": "textbf", "tag": "b1"}]},
        {"type": "FORMAT", "commands": [{"name": "mybold", "tag": "b1"}]}
    ]}"#;
    let diags = lint_config_str(json).unwrap();
    assert!(diags.iter().any(|d| d.id == codes::CONFIG_DUPLICATE_TAG));
}

#[test]
fn unknown_command_scan_uses_the_table() {
    let doc = "\\section{A} \\foobar{b} \\mycmd \\foobar \\begin{x}\\end{x} \\% \\\\";
    assert_eq!(
        scan_unknown_commands(CommandTable::builtin(), doc),
        vec!["foobar".to_string(), "mycmd".to_string()]
    );
}
