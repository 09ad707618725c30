//! Integration tests running the `tb_cli` binary.
//!
//! Only commands that work without a database are exercised here.

use std::process::{Command, Output};

fn tb_cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tb_cli"))
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .expect("Failed to run tb_cli")
}

#[test]
fn test_help() {
    let output = tb_cli(&["--help"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("USAGE:"));
    assert!(stdout.contains("generate <TOURNAMENT>"));
}

#[test]
fn test_demo_text_output() {
    let output = tb_cli(&["demo", "5"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Round 1"));
    assert!(stdout.contains("Final"));
    assert!(stdout.contains("bye -> Player 005"));
    assert!(stdout.lines().any(|l| l.starts_with("Champion: Player")));
}

#[test]
fn test_demo_json_output() {
    let output = tb_cli(&["--json", "demo", "6"]);
    assert!(output.status.success());

    let bracket: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("demo prints JSON");
    let rounds = bracket["rounds"].as_object().expect("rounds map");
    assert_eq!(rounds.len(), 3);
    assert_eq!(rounds["1"].as_array().unwrap().len(), 3);
    assert_eq!(rounds["3"][0]["status"], "completed");
}

#[test]
fn test_unknown_command_fails() {
    let output = tb_cli(&["--memory", "frobnicate"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown command"));
}

#[test]
fn test_memory_store_rejects_migrate() {
    let output = tb_cli(&["--memory", "migrate"]);
    assert!(!output.status.success());
}

#[test]
fn test_memory_store_reports_missing_tournament() {
    let output = tb_cli(&[
        "--memory",
        "bracket",
        "00000000-0000-0000-0000-000000000000",
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Tournament not found"));
}
