//! Integration tests for the preamble binary

use crate::integration::{write_file, BASE_DEFINITIONS};
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn run(temp_dir: &Path, args: &[&str]) -> Output {
    let home = temp_dir.join("home");
    let config_home = temp_dir.join("config");
    std::fs::create_dir_all(&home).unwrap();
    std::fs::create_dir_all(&config_home).unwrap();

    let bin = env!("CARGO_BIN_EXE_preamble");
    Command::new(bin)
        .env("HOME", home.as_os_str())
        .env("XDG_CONFIG_HOME", config_home.as_os_str())
        .env_remove("PREAMBLE_ENV")
        .env_remove("PREAMBLE_LOG")
        .arg("--workspace")
        .arg(temp_dir)
        .arg("--quiet")
        .args(args)
        .output()
        .unwrap()
}

fn definitions(temp_dir: &TempDir) -> String {
    write_file(temp_dir.path(), "defs.toml", BASE_DEFINITIONS)
        .to_string_lossy()
        .to_string()
}

#[test]
fn test_plan_json_output() {
    let temp_dir = TempDir::new().unwrap();
    let defs = definitions(&temp_dir);
    let output = run(
        temp_dir.path(),
        &[
            "--definitions",
            &defs,
            "plan",
            "--provider",
            "base",
            "withSig",
            "exports",
            "--exclude",
            "warnings",
            "--exclude",
            "exporter=bar",
            "--format",
            "json",
        ],
    );
    assert!(
        output.status.success(),
        "plan should succeed: stderr={:?}",
        String::from_utf8_lossy(&output.stderr)
    );

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let declarations: Vec<&str> = json["directives"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["declaration"].as_str().unwrap())
        .collect();
    assert_eq!(
        declarations,
        vec!["strict", "feature:[signatures]", "exporter:[foo,baz]"]
    );
}

#[test]
fn test_apply_text_output() {
    let temp_dir = TempDir::new().unwrap();
    let defs = definitions(&temp_dir);
    let output = run(
        temp_dir.path(),
        &[
            "--definitions",
            &defs,
            "apply",
            "--provider",
            "app",
            "class",
            "--arg",
            "flavor=vanilla",
        ],
    );
    assert!(
        output.status.success(),
        "apply should succeed: stderr={:?}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("Context: main (batch 1)"));
    assert!(stdout.contains("Applied: 6"));
    assert!(stdout.contains("vanilla"));
}

#[test]
fn test_unknown_bundle_exits_nonzero() {
    let temp_dir = TempDir::new().unwrap();
    let defs = definitions(&temp_dir);
    let output = run(
        temp_dir.path(),
        &["--definitions", &defs, "plan", "--provider", "base", "nope"],
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("error[bundle]: Unknown bundle 'nope'"),
        "unexpected stderr: {}",
        stderr
    );
}

#[test]
fn test_failed_apply_reports_committed_effects() {
    let temp_dir = TempDir::new().unwrap();
    let defs = definitions(&temp_dir);
    let output = run(
        temp_dir.path(),
        &["--definitions", &defs, "apply", "--provider", "base", "modern"],
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("error[version]: "),
        "unexpected stderr: {}",
        stderr
    );
    assert!(stderr.contains("(2 effect(s) applied before the failure)"));
    assert!(stderr.contains("Applied before the failure:"));
    assert!(stderr.contains("strict"));
    assert!(stderr.contains("warnings"));
}

#[test]
fn test_bundles_listing() {
    let temp_dir = TempDir::new().unwrap();
    let defs = definitions(&temp_dir);
    let output = run(
        temp_dir.path(),
        &["--definitions", &defs, "bundles", "--format", "json"],
    );
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["total"], 2);
    assert_eq!(json["providers"][0]["name"], "app");
    assert_eq!(json["providers"][1]["bundles"][3], "withSig");
}
