mod common;

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use common::{temp_root, write_file};
use serde_json::{Value as Json, json};

const SETTINGS: &str = r#"
export component Settings inherits Rectangle {
    in-out property <string> title: "Untitled";
    in-out property <int> volume: 5;
    out property <int> doubled: volume * 2;
    callback describe(string, int) -> string;
    describe(name, level) => { return name + "@" + level; }
    label := Text { text: title; }
}
"#;

fn fixture(label: &str, source: &str) -> PathBuf {
    let path = temp_root(label).join("settings.vel");
    write_file(&path, source);
    path
}

fn run_vellum(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_vellum"))
        .args(args)
        .env("NO_COLOR", "1")
        .env_remove("VELLUM_STYLE")
        .env_remove("VELLUM_INCLUDE_PATH")
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("failed to run vellum with args {:?}: {e}", args))
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn path_arg(path: &Path) -> &str {
    path.to_str().expect("utf-8 temp path")
}

/// Every JSON document printed on stdout, in order.
fn json_documents(text: &str) -> Vec<Json> {
    serde_json::Deserializer::from_str(text)
        .into_iter::<Json>()
        .collect::<Result<_, _>>()
        .unwrap_or_else(|e| panic!("stdout is not a JSON stream ({e}):\n{}", text))
}

#[test]
fn check_reports_the_component_name() {
    let file = fixture("cli_check", SETTINGS);
    let output = run_vellum(&["check", path_arg(&file)]);

    assert!(output.status.success(), "stderr:\n{}", stderr(&output));
    assert_eq!(stdout(&output), format!("{}: ok (Settings)\n", path_arg(&file)));
}

#[test]
fn inspect_prints_the_definition_summary() {
    let file = fixture("cli_inspect", SETTINGS);
    let output = run_vellum(&["inspect", path_arg(&file)]);
    assert!(output.status.success(), "stderr:\n{}", stderr(&output));

    let summary = &json_documents(&stdout(&output))[0];
    assert_eq!(summary["name"], "Settings");
    assert_eq!(summary["style"], "fluent");
    let properties: Vec<(&str, &str)> = summary["properties"]
        .as_array()
        .expect("properties array")
        .iter()
        .map(|p| (p["name"].as_str().unwrap(), p["access"].as_str().unwrap()))
        .collect();
    assert_eq!(
        properties,
        vec![("title", "in-out"), ("volume", "in-out"), ("doubled", "out")]
    );
    assert_eq!(summary["callbacks"][0]["name"], "describe");
    assert_eq!(summary["callbacks"][0]["return_type"], "string");
}

#[test]
fn run_applies_json_assignments() {
    let file = fixture("cli_set", SETTINGS);
    let output = run_vellum(&[
        "run",
        path_arg(&file),
        "--set",
        "volume=7.9",
        "--set",
        "title=\"Loud\"",
    ]);
    assert!(output.status.success(), "stderr:\n{}", stderr(&output));

    assert_eq!(
        json_documents(&stdout(&output)),
        vec![json!({ "title": "Loud", "volume": 7, "doubled": 14 })]
    );
}

#[test]
fn run_invokes_callbacks_with_json_arguments() {
    let file = fixture("cli_invoke", SETTINGS);
    let output = run_vellum(&["run", path_arg(&file), "--invoke", "describe=[\"vol\", 3]"]);
    assert!(output.status.success(), "stderr:\n{}", stderr(&output));

    let text = stdout(&output);
    let (first, rest) = text.split_once('\n').expect("invoke line");
    assert_eq!(first, "describe -> \"vol@3\"");
    assert_eq!(json_documents(rest)[0]["volume"], 5);
}

#[test]
fn run_prints_the_scene_as_json() {
    let file = fixture("cli_scene", SETTINGS);
    let output = run_vellum(&["run", path_arg(&file), "--scene-json"]);
    assert!(output.status.success(), "stderr:\n{}", stderr(&output));

    let documents = json_documents(&stdout(&output));
    assert_eq!(documents.len(), 2);
    assert_eq!(documents[1]["type"], "Settings");
    assert_eq!(documents[1]["element"], "Rectangle");
    assert_eq!(
        documents[1]["children"][0],
        json!({ "type": "Text", "element": "Text", "id": "label", "properties": { "text": "Untitled" } })
    );
}

#[test]
fn compile_errors_exit_with_one() {
    let file = fixture("cli_broken", "export component A {\n    Gizmo {}\n}\n");
    let output = run_vellum(&["check", path_arg(&file)]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).is_empty());
    let text = stderr(&output);
    assert!(text.contains("error[E102]: UNKNOWN ELEMENT"), "stderr:\n{}", text);
    assert!(text.contains("2 |     Gizmo {}"), "stderr:\n{}", text);
}

#[test]
fn rejected_assignments_and_calls_exit_with_one() {
    let file = fixture("cli_rejected", SETTINGS);

    let output = run_vellum(&["run", path_arg(&file), "--set", "volume=\"loud\""]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("--set volume: expected int, found a string"));

    let output = run_vellum(&["run", path_arg(&file), "--set", "doubled=3"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("cannot be set"), "stderr:\n{}", stderr(&output));

    let output = run_vellum(&["run", path_arg(&file), "--invoke", "missing=[]"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("no callback named `missing`"));

    let output = run_vellum(&["run", path_arg(&file), "--invoke", "describe={}"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("arguments must be a JSON array"));
}

#[test]
fn usage_errors_exit_with_two() {
    let file = fixture("cli_usage", SETTINGS);

    let output = run_vellum(&["frobnicate", path_arg(&file)]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("unknown command `frobnicate`"));

    let output = run_vellum(&["check"]);
    assert_eq!(output.status.code(), Some(2));

    let output = run_vellum(&["check", path_arg(&file), "--bogus"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("unknown flag `--bogus`"));

    let output = run_vellum(&["run", path_arg(&file), "--set", "volume"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("expected name=JSON"));
}

#[test]
fn help_exits_successfully() {
    let output = run_vellum(&["--help"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("vellum check <file.vel>"));
}
