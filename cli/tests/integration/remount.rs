//! Integration tests for cpy-remount.
//!
//! Nothing here mounts anything: the volumes root points at an empty temp
//! directory, so the volume is never found.

#[path = "../common/mod.rs"]
mod common;

use assert_cmd::cargo::cargo_bin_cmd;
use common::command_exists;
use predicates::prelude::*;
use tempfile::TempDir;

#[test]
fn test_missing_volume_exits_1() {
    if !command_exists("mount") {
        eprintln!("Skipping test: mount not available");
        return;
    }
    let root = TempDir::new().unwrap();

    cargo_bin_cmd!("cpy-remount")
        .arg("--volumes-root")
        .arg(root.path())
        .arg("--no-sudo")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No volume named CIRCUITPY"))
        .stderr(predicate::str::contains("hint: is the board plugged in"));
}

#[test]
fn test_dry_run_with_missing_volume_runs_nothing() {
    if !command_exists("mount") {
        eprintln!("Skipping test: mount not available");
        return;
    }
    let root = TempDir::new().unwrap();

    cargo_bin_cmd!("cpy-remount")
        .args(["--dry-run", "--volume", "FEATHER"])
        .arg("--volumes-root")
        .arg(root.path())
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("FEATHER"));

    assert!(!root.path().join("FEATHER").exists());
}

#[test]
fn test_bad_delay_is_usage_error() {
    cargo_bin_cmd!("cpy-remount")
        .args(["--delay", "soon"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--delay"));
}

#[test]
fn test_help_exits_0() {
    cargo_bin_cmd!("cpy-remount")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--volumes-root"));
}
