//! Integration tests for the rover CLI commands.

#![allow(deprecated)] // Command::cargo_bin, pending the cargo_bin! macro

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn rover() -> Command {
    let mut cmd = Command::cargo_bin("rover").unwrap();
    cmd.env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}

/// Write `source` to a script file in a fresh temp directory.
fn script(source: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("patrol.rbs");
    fs::write(&path, source).unwrap();
    (dir, path)
}

const PATROL: &str = "// square-ish patrol\n\
motor.forward(10); motor.left(90); motor.forward(5)\n\
debug.pen(true); debug.color(#ff00ff)\n";

#[test]
fn run_prints_final_state() {
    let (_dir, path) = script(PATROL);
    rover()
        .arg("run")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("alpha"))
        .stdout(predicate::str::contains("(25, 25)"))
        .stdout(predicate::str::contains("#ff00ff"))
        .stdout(predicate::str::contains("pen(true)"));
}

#[test]
fn run_json_report() {
    let (_dir, path) = script(PATROL);
    let output = rover()
        .args(["run", "--json"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["commands"], 5);
    assert_eq!(report["position"]["x"], 25.0);
    assert_eq!(report["position"]["y"], 25.0);
    assert_eq!(report["heading"], 90.0);
    assert_eq!(report["debug"]["pen_down"], true);
    assert!(report["error"].is_null());
}

#[test]
fn run_selects_bot_by_callsign() {
    let (_dir, path) = script("motor.backwards(4)");
    rover()
        .args(["run", "--bot", "bravo"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("bravo"))
        .stdout(predicate::str::contains("(55, 68)"));
}

#[test]
fn run_unknown_callsign_fails() {
    let (_dir, path) = script("debug.pen(true)");
    rover()
        .args(["run", "--bot", "zulu"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no bot with callsign 'zulu'"));
}

#[test]
fn run_runtime_error_exits_nonzero() {
    let (_dir, path) = script("motor.forward(2)\nmotr.left(90)");
    rover()
        .arg("run")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown module 'motr'; did you mean 'motor'?"))
        .stderr(predicate::str::contains("error: runtime error"));
}

#[test]
fn check_accepts_valid_script() {
    let (_dir, path) = script(PATROL);
    rover()
        .arg("check")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("5 commands"));
}

#[test]
fn check_reports_syntax_error() {
    let (_dir, path) = script("motor.forward(10)\ndebug.color(red)");
    rover()
        .arg("check")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("patrol.rbs"))
        .stderr(predicate::str::contains("Unexpected 'red'"))
        .stderr(predicate::str::contains("syntax check failed"));
}

#[test]
fn check_warns_on_empty_script() {
    let (_dir, path) = script("\n\n");
    rover()
        .arg("check")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("0 commands"))
        .stderr(predicate::str::contains("script has no statements"));
}

#[test]
fn missing_script_file() {
    rover()
        .args(["check", "does-not-exist.rbs"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read"));
}

#[test]
fn simulate_prints_systems_and_bots() {
    rover()
        .args(["simulate", "--ticks", "5", "--delta-ms", "200"])
        .assert()
        .success()
        .stdout(predicate::str::contains("lifecycle"))
        .stdout(predicate::str::contains("vitals"))
        .stdout(predicate::str::contains("charlie"));
}

#[test]
fn simulate_with_random_bots() {
    rover()
        .args(["simulate", "--ticks", "2", "--bots", "4", "--seed", "9"])
        .assert()
        .success()
        .stdout(predicate::str::contains("7 bots"))
        .stdout(predicate::str::contains("delta"));
}

#[test]
fn modules_lists_signatures() {
    rover()
        .arg("modules")
        .assert()
        .success()
        .stdout(predicate::str::contains("motor.forward"))
        .stdout(predicate::str::contains("forward(distance: number)"))
        .stdout(predicate::str::contains("color(hex: hexcolor)"));
}

#[test]
fn modules_json() {
    let output = rover().args(["modules", "--json"]).output().unwrap();
    assert!(output.status.success());
    let modules: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(modules[0]["module"], "motor");
    assert_eq!(modules[0]["functions"].as_array().unwrap().len(), 4);
    assert_eq!(modules[1]["module"], "debug");
}
