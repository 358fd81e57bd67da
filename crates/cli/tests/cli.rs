//! End-to-end tests for the `texfilter` binary.

use std::fs;
use std::process::{Command, Output};

use assert_cmd::cargo;

const SAMPLE: &str = "\\section{Intro}\nExample of \\textbf{bold} and \\emph{emphasis}.\n";

fn texfilter() -> Command {
    Command::new(cargo::cargo_bin!("texfilter"))
}

fn write_temp(dir: &tempfile::TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("write temp file");
    path.to_string_lossy().to_string()
}

fn json_stdout(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).unwrap_or_else(|e| panic!("invalid json ({e}): {stdout}"))
}

#[test]
fn extract_lists_segments_as_json() {
    let dir = tempfile::tempdir().expect("tempdir");
    let file = write_temp(&dir, "doc.tex", SAMPLE);

    let output = texfilter()
        .args(["extract", &file, "--output", "json"])
        .output()
        .expect("run extract");

    assert!(output.status.success(), "stderr={}", String::from_utf8_lossy(&output.stderr));
    let json = json_stdout(&output);
    let texts: Vec<&str> = json["segments"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["text"].as_str().unwrap())
        .collect();
    assert_eq!(
        texts,
        vec!["Intro", "Example of <b1>bold</b1> and <e1>emphasis</e1>."]
    );
    assert_eq!(json["segments"][0]["escape"], true);
}

#[test]
fn translate_writes_output_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let file = write_temp(&dir, "doc.tex", SAMPLE);
    let dict = write_temp(
        &dir,
        "dict.json",
        r#"{"Intro": "Introduction",
            "Example of <b1>bold</b1> and <e1>emphasis</e1>.":
            "Exemple de <e1>emphase</e1> et <b1>gras</b1>."}"#,
    );
    let out = dir.path().join("out.tex");

    let output = texfilter()
        .args(["translate", &file, "--dict", &dict, "-o"])
        .arg(&out)
        .args(["--output", "json"])
        .output()
        .expect("run translate");

    assert!(output.status.success(), "stderr={}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        fs::read_to_string(&out).unwrap(),
        "\\section{Introduction}\nExemple de \\emph{emphase} et \\textbf{gras}.\n"
    );
    let json = json_stdout(&output);
    assert_eq!(json["translated"], 2);
    assert_eq!(json["untranslated"], 0);
}

#[test]
fn translate_without_out_prints_document() {
    let dir = tempfile::tempdir().expect("tempdir");
    let file = write_temp(&dir, "doc.tex", SAMPLE);
    let dict = write_temp(&dir, "dict.json", "{}");

    let output = texfilter()
        .args(["translate", &file, "--dict", &dict, "--output", "json"])
        .output()
        .expect("run translate");

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), SAMPLE);
}

#[test]
fn environment_mismatch_exits_with_diagnostic() {
    let dir = tempfile::tempdir().expect("tempdir");
    let file = write_temp(&dir, "bad.tex", "Text\n\\end{table}\n");

    let output = texfilter()
        .args(["extract", &file, "--output", "json"])
        .output()
        .expect("run extract");

    assert_eq!(output.status.code(), Some(1));
    let json = json_stdout(&output);
    assert_eq!(json["ok"], false);
    assert_eq!(json["diagnostics"][0]["id"], "TEX1001");
    assert_eq!(json["diagnostics"][0]["span"]["start"], 5);
}

#[test]
fn tokens_reports_marks() {
    let dir = tempfile::tempdir().expect("tempdir");
    let file = write_temp(&dir, "doc.tex", "a \\emph{b}");

    let output = texfilter()
        .args(["tokens", &file, "--output", "json"])
        .output()
        .expect("run tokens");

    assert!(output.status.success());
    let json = json_stdout(&output);
    let emph = json
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["text"] == "\\emph")
        .expect("emph token");
    assert_eq!(emph["kind"], "command");
    assert_eq!(emph["tagId"], 1);
}

#[test]
fn builtin_config_checks_clean() {
    let output = texfilter()
        .args(["check-config", "--output", "json"])
        .output()
        .expect("run check-config");

    assert!(output.status.success());
    let json = json_stdout(&output);
    assert_eq!(json["ok"], true);
    assert_eq!(json["config"], "<builtin>");
}

#[test]
fn config_errors_fail_the_check() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_temp(
        &dir,
        "commands.json",
        r#"{"allCommands": [{"type": "FORMAT", "commands": ["mybold"]}]}"#,
    );

    let output = texfilter()
        .args(["check-config", &config, "--output", "json"])
        .output()
        .expect("run check-config");

    assert_eq!(output.status.code(), Some(1));
    let json = json_stdout(&output);
    assert_eq!(json["ok"], false);
    assert_eq!(json["diagnostics"][0]["id"], "TEX3002");
}

#[test]
fn content_scan_reports_unknown_commands() {
    let dir = tempfile::tempdir().expect("tempdir");
    let doc = write_temp(&dir, "doc.tex", "\\section{A} \\foobar{b}");

    let output = texfilter()
        .args(["check-config", "--content", &doc, "--output", "json"])
        .output()
        .expect("run check-config");

    assert!(output.status.success());
    let json = json_stdout(&output);
    let unknown: Vec<&serde_json::Value> = json["diagnostics"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|d| d["id"] == "TEX1002")
        .collect();
    assert_eq!(unknown.len(), 1);
    assert_eq!(unknown[0]["context"]["command"], "foobar");
}

#[test]
fn dumped_config_can_be_loaded_back() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = dir.path().join("commands.json");

    let dump = texfilter()
        .args(["dump-config", "-o"])
        .arg(&config)
        .args(["--output", "json"])
        .output()
        .expect("run dump-config");
    assert!(dump.status.success());
    assert_eq!(json_stdout(&dump)["status"], "written");

    let file = write_temp(&dir, "doc.tex", SAMPLE);
    let output = texfilter()
        .args(["extract", &file, "--output", "json", "--commands"])
        .arg(&config)
        .output()
        .expect("run extract");
    assert!(output.status.success(), "stderr={}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(json_stdout(&output)["segments"].as_array().unwrap().len(), 2);
}

#[test]
fn explain_known_code() {
    let output = texfilter()
        .args(["explain", "TEX1001", "--output", "json"])
        .output()
        .expect("run explain");

    assert!(output.status.success());
    let json = json_stdout(&output);
    assert_eq!(json["id"], "TEX1001");
    assert!(json["explanation"].is_string());
}

#[test]
fn explain_unknown_code_has_null_explanation() {
    let output = texfilter()
        .args(["explain", "TEX9999", "--output", "json"])
        .output()
        .expect("run explain");

    assert!(output.status.success());
    assert!(json_stdout(&output)["explanation"].is_null());
}
