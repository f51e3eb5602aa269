// CLI integration tests; only commands that never reach the network.
use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;

fn cmd() -> Command {
    let exe = env!("CARGO_BIN_EXE_chart-drawings");
    let mut command = Command::new(exe);
    command
        .env_remove("SESSION")
        .env_remove("SIGNATURE")
        .env_remove("USER_ID")
        .env_remove("RUST_LOG");
    command
}

fn fixture() -> &'static Path {
    Path::new(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/fixtures/layout_sources.json"
    ))
}

fn stdout_json(output: &Output) -> Value {
    let text = std::str::from_utf8(&output.stdout).expect("utf8");
    serde_json::from_str(text.trim()).expect("stdout json")
}

fn stderr_json(output: &Output) -> Value {
    let text = String::from_utf8_lossy(&output.stderr);
    let line = text.lines().last().expect("stderr line");
    serde_json::from_str(line).expect("stderr json")
}

#[test]
fn parse_prints_all_drawings() {
    let output = cmd()
        .args(["parse", fixture().to_str().expect("path")])
        .output()
        .expect("parse");
    assert!(output.status.success());
    let value = stdout_json(&output);
    assert_eq!(value["drawings"].as_array().map(Vec::len), Some(4));
    assert_eq!(value["groups"][0]["name"], "4H笔");
    assert!(value.get("raw").is_none());
}

#[test]
fn parse_filters_by_type() {
    let output = cmd()
        .args([
            "parse",
            fixture().to_str().expect("path"),
            "--type",
            "LineToolTable",
        ])
        .output()
        .expect("parse");
    assert!(output.status.success());
    let value = stdout_json(&output);
    let drawings = value["drawings"].as_array().expect("drawings");
    assert_eq!(drawings.len(), 1);
    assert_eq!(drawings[0]["id"], "dUMWzJ");
    assert_eq!(drawings[0]["style"]["rowsCount"], 3);
}

#[test]
fn parse_summary_for_group() {
    let output = cmd()
        .args([
            "parse",
            fixture().to_str().expect("path"),
            "--group",
            "9dPnET",
            "--summary",
        ])
        .output()
        .expect("parse");
    assert!(output.status.success());
    let value = stdout_json(&output);
    assert_eq!(value["total"], 1);
    assert_eq!(value["grouped"], 1);
    assert_eq!(value["typeCount"]["LineToolPath"], 1);
}

#[test]
fn parse_rejects_failed_envelope() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("failed.json");
    std::fs::write(&path, r#"{"success": false}"#).expect("write");

    let output = cmd()
        .args(["parse", path.to_str().expect("path")])
        .output()
        .expect("parse");
    assert_eq!(output.status.code(), Some(6));
    let err = stderr_json(&output);
    assert_eq!(err["error"]["kind"], "Parse");
    assert_eq!(err["error"]["message"], "response indicates failure");
}

#[test]
fn parse_reports_invalid_json_and_missing_file() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("broken.json");
    std::fs::write(&path, "{\"success\": true,").expect("write");

    let output = cmd()
        .args(["parse", path.to_str().expect("path")])
        .output()
        .expect("parse");
    assert_eq!(output.status.code(), Some(6));
    assert!(stderr_json(&output)["error"]["hint"]
        .as_str()
        .is_some_and(|hint| hint.starts_with("line 1")));

    let missing = temp.path().join("missing.json");
    let output = cmd()
        .args(["parse", missing.to_str().expect("path")])
        .output()
        .expect("parse");
    assert_eq!(output.status.code(), Some(7));
    assert_eq!(stderr_json(&output)["error"]["kind"], "Io");
}

#[test]
fn fetch_without_session_fails_with_auth() {
    let output = cmd()
        .args(["fetch", "LAYOUT1"])
        .output()
        .expect("fetch");
    assert_eq!(output.status.code(), Some(3));
    assert_eq!(
        stderr_json(&output)["error"]["message"],
        "session credentials required for access token"
    );
}

#[test]
fn save_validates_bundle_before_network() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("bundle.json");
    std::fs::write(&path, r#"{"drawing_groups": {}}"#).expect("write");

    let output = cmd()
        .env("SESSION", "sess")
        .args(["save", "LAYOUT1", path.to_str().expect("path")])
        .output()
        .expect("save");
    assert_eq!(output.status.code(), Some(2));
    let err = stderr_json(&output);
    assert_eq!(err["error"]["message"], "drawing data with sources is required");
    assert_eq!(err["error"]["field"], "sources");
}

#[test]
fn ids_prints_fresh_identifiers() {
    let output = cmd().arg("ids").output().expect("ids");
    assert!(output.status.success());
    let value = stdout_json(&output);
    assert_eq!(value["drawingId"].as_str().map(str::len), Some(6));
    assert_eq!(value["linkKey"].as_str().map(str::len), Some(15));
    assert_eq!(
        value["clientId"].as_str().map(|id| id.split('/').count()),
        Some(3)
    );
}

#[test]
fn unknown_subcommand_is_usage_error() {
    let output = cmd().arg("frobnicate").output().expect("run");
    assert_eq!(output.status.code(), Some(2));
    assert_eq!(stderr_json(&output)["error"]["kind"], "Validation");
}
