//! Integration tests for the xmerge CLI commands.
//!
//! Uses tempfile to run each command against real documents on disk.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use clap::Parser;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tempfile::TempDir;
use xmerge::cli::{
    Cli, DocumentFormat, InputOptions, OutputOptions, cmd_equals, cmd_flatten, cmd_get,
    cmd_merge, cmd_set, emit, execute, load_document, render,
};
use xmerge_core::{XmergeError, to_json};

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Write `contents` to `name` inside `dir` and return its path.
fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn default_input() -> InputOptions {
    InputOptions::new(DocumentFormat::Auto, "!delete")
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

// =============================================================================
// MERGE COMMAND
// =============================================================================

#[test]
fn test_merge_json_and_toml() {
    let dir = TempDir::new().unwrap();
    let base = write_file(
        &dir,
        "base.toml",
        "name = \"svc\"\ntags = [\"a\"]\n\n[db]\nhost = \"localhost\"\nport = 5432\n",
    );
    let overlay = write_file(
        &dir,
        "overlay.json",
        r#"{"tags": ["a", "b"], "db": {"host": "db.internal", "port": "!delete"}}"#,
    );

    let merged = cmd_merge(&[base, overlay], &default_input()).unwrap();
    assert_eq!(
        to_json(&merged).unwrap(),
        json!({"name": "svc", "tags": ["a", "b"], "db": {"host": "db.internal"}})
    );
}

#[test]
fn test_merge_without_marker_keeps_text() {
    let dir = TempDir::new().unwrap();
    let base = write_file(&dir, "a.json", r#"{"k": 1}"#);
    let overlay = write_file(&dir, "b.json", r#"{"k": "!delete"}"#);

    let input = InputOptions::new(DocumentFormat::Auto, "");
    let merged = cmd_merge(&[base, overlay], &input).unwrap();
    assert_eq!(to_json(&merged).unwrap(), json!({"k": "!delete"}));
}

#[test]
fn test_merge_single_file_is_identity() {
    let dir = TempDir::new().unwrap();
    let only = write_file(&dir, "a.json", r#"{"z": 1, "a": [1, 2]}"#);

    let merged = cmd_merge(&[only], &default_input()).unwrap();
    assert_eq!(render(&merged, true).unwrap(), r#"{"z":1,"a":[1,2]}"#);
}

#[test]
fn test_merge_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.json");

    let result = cmd_merge(&[missing], &default_input());
    assert!(matches!(result, Err(XmergeError::IoError(_))));
}

#[test]
fn test_merge_invalid_json_fails() {
    let dir = TempDir::new().unwrap();
    let bad = write_file(&dir, "bad.json", "{oops");

    let result = cmd_merge(&[bad], &default_input());
    assert!(matches!(result, Err(XmergeError::DeserializationError(_))));
}

#[test]
fn test_forced_format_overrides_extension() {
    let dir = TempDir::new().unwrap();
    let toml_in_txt = write_file(&dir, "doc.txt", "a = 1\n");

    let input = InputOptions::new(DocumentFormat::Toml, "!delete");
    let doc = load_document(&toml_in_txt, &input).unwrap();
    assert_eq!(to_json(&doc).unwrap(), json!({"a": 1}));
}

// =============================================================================
// EQUALS COMMAND
// =============================================================================

#[test]
fn test_equals_loose_and_strict() {
    let dir = TempDir::new().unwrap();
    let left = write_file(&dir, "l.json", r#"{"a": [1, 2], "b": "1"}"#);
    let right = write_file(&dir, "r.json", r#"{"b": 1, "a": [2, 1]}"#);

    assert!(cmd_equals(&left, &right, false, &default_input()).unwrap());
    assert!(!cmd_equals(&left, &right, true, &default_input()).unwrap());
}

#[test]
fn test_equals_exit_code() {
    let dir = TempDir::new().unwrap();
    let left = write_file(&dir, "l.json", r#"{"a": 1}"#);
    let right = write_file(&dir, "r.json", r#"{"a": 2}"#);
    let out = dir.path().join("verdict.txt");

    let cli = Cli::parse_from([
        "xmerge",
        "equals",
        left.to_str().unwrap(),
        right.to_str().unwrap(),
        "-o",
        out.to_str().unwrap(),
    ]);
    assert_eq!(execute(cli).unwrap(), ExitCode::FAILURE);
    assert_eq!(std::fs::read_to_string(&out).unwrap().trim(), "false");
}

// =============================================================================
// PATH COMMANDS
// =============================================================================

#[test]
fn test_get_existing_and_missing() {
    let dir = TempDir::new().unwrap();
    let doc = write_file(&dir, "doc.json", r#"{"server": {"ports": [80, 443]}}"#);

    let found = cmd_get(&doc, "server.ports.1", &default_input()).unwrap();
    assert_eq!(to_json(&found).unwrap(), json!(443));

    let missing = cmd_get(&doc, "server.host", &default_input()).unwrap();
    assert!(missing.is_absent());
    assert_eq!(render(&missing, true).unwrap(), "null");
}

#[test]
fn test_set_replaces_and_merges() {
    let dir = TempDir::new().unwrap();
    let doc = write_file(&dir, "doc.json", r#"{"tls": {"enabled": false, "cert": "x"}}"#);

    let replaced = cmd_set(&doc, "tls", r#"{"enabled": true}"#, false, &default_input()).unwrap();
    assert_eq!(to_json(&replaced).unwrap(), json!({"tls": {"enabled": true}}));

    let merged = cmd_set(&doc, "tls", r#"{"enabled": true}"#, true, &default_input()).unwrap();
    assert_eq!(
        to_json(&merged).unwrap(),
        json!({"tls": {"enabled": true, "cert": "x"}})
    );
}

#[test]
fn test_set_creates_intermediate_sequence() {
    let dir = TempDir::new().unwrap();
    let doc = write_file(&dir, "doc.json", "{}");

    let updated = cmd_set(&doc, "items.1.name", r#""b""#, false, &default_input()).unwrap();
    assert_eq!(
        to_json(&updated).unwrap(),
        json!({"items": [null, {"name": "b"}]})
    );
}

#[test]
fn test_set_rejects_invalid_value() {
    let dir = TempDir::new().unwrap();
    let doc = write_file(&dir, "doc.json", "{}");

    let result = cmd_set(&doc, "a", "not json", false, &default_input());
    assert!(matches!(result, Err(XmergeError::DeserializationError(_))));
}

// =============================================================================
// FLATTEN COMMAND
// =============================================================================

#[test]
fn test_flatten_document() {
    let dir = TempDir::new().unwrap();
    let doc = write_file(
        &dir,
        "doc.json",
        r#"{"a": {"n": 1, "m": 2}, "b": ["x", {"y": "z"}], "c": 3}"#,
    );

    let flat = cmd_flatten(&doc, &default_input()).unwrap();
    assert_eq!(
        to_json(&flat).unwrap(),
        json!({"a.n": 1, "a.m": 2, "b[0]": "x", "b[1].y": "z", "c": 3})
    );
}

// =============================================================================
// OUTPUT
// =============================================================================

#[test]
fn test_emit_writes_output_file() {
    let dir = TempDir::new().unwrap();
    let doc = write_file(&dir, "doc.json", r#"{"a": 1}"#);
    let out = dir.path().join("out.json");

    let value = load_document(&doc, &default_input()).unwrap();
    let output = OutputOptions {
        compact: false,
        path: Some(out.clone()),
    };
    emit(&value, &output).unwrap();
    assert_eq!(read_json(&out), json!({"a": 1}));
}

#[test]
fn test_emit_rejects_missing_output_directory() {
    let dir = TempDir::new().unwrap();
    let value = xmerge_core::Value::Null;
    let output = OutputOptions {
        compact: true,
        path: Some(dir.path().join("nope").join("out.json")),
    };
    assert!(matches!(emit(&value, &output), Err(XmergeError::IoError(_))));
}

#[test]
fn test_cli_merge_end_to_end() {
    let dir = TempDir::new().unwrap();
    let a = write_file(&dir, "a.json", r#"{"list": [1], "keep": true}"#);
    let b = write_file(&dir, "b.json", r#"{"list": [2], "drop": 1}"#);
    let c = write_file(&dir, "c.json", r#"{"drop": "-"}"#);
    let out = dir.path().join("merged.json");

    let cli = Cli::parse_from([
        "xmerge",
        "--remove-marker",
        "-",
        "merge",
        a.to_str().unwrap(),
        b.to_str().unwrap(),
        c.to_str().unwrap(),
        "--output",
        out.to_str().unwrap(),
        "--compact",
    ]);
    assert_eq!(execute(cli).unwrap(), ExitCode::SUCCESS);
    assert_eq!(read_json(&out), json!({"list": [1, 2], "keep": true}));
}
