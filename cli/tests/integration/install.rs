//! Integration tests for cpy-install.

#[path = "../common/mod.rs"]
mod common;

use assert_cmd::cargo::cargo_bin_cmd;
use common::{BoardFixture, CORE_FILES};
use predicates::prelude::*;
use rstest::rstest;
use std::fs;

fn install(fixture: &BoardFixture) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("cpy-install");
    cmd.arg("--source")
        .arg(fixture.app_path())
        .arg(fixture.board_path());
    cmd
}

#[test]
fn test_fresh_install() {
    let fixture = BoardFixture::new();

    install(&fixture)
        .assert()
        .success()
        .stdout(predicate::str::contains("Installed onto"))
        .stdout(predicate::str::contains("Settings:    installed"));

    for name in CORE_FILES {
        fixture.assert_board_content(name, &format!("# app {name}"));
    }
    fixture.assert_board_content("settings.py", "volume = 5");
    fixture.assert_board_content("lib/neopixel.mpy", "app neopixel");
    fixture.assert_board_content("lib/adafruit_hid/keyboard.mpy", "app keyboard");
}

#[test]
fn test_reinstall_keeps_user_files() {
    let fixture = BoardFixture::new();
    fixture.write_board("code.py", "# old code");
    fixture.write_board("settings.py", "volume = 11");
    fixture.write_board("lib/neopixel.mpy", "board neopixel");
    fixture.write_board("lib/extra.mpy", "user module");

    install(&fixture)
        .assert()
        .success()
        .stdout(predicate::str::contains("kept existing"));

    fixture.assert_board_content("code.py", "# app code.py");
    fixture.assert_board_content("settings.py", "volume = 11");
    fixture.assert_board_content("lib/neopixel.mpy", "board neopixel");
    fixture.assert_board_content("lib/adafruit_hid/keyboard.mpy", "app keyboard");
    fixture.assert_board_content("lib/extra.mpy", "user module");
}

#[test]
fn test_no_temp_files_left_behind() {
    let fixture = BoardFixture::new();
    install(&fixture).assert().success();

    // 6 core files, settings.py, two library files
    assert_eq!(fixture.count_board_files(), 9);
    let leftovers: Vec<_> = fs::read_dir(fixture.board_path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with(".cpytools"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn test_missing_lib_dir_fails() {
    let fixture = BoardFixture::new();
    fs::remove_dir(fixture.on_board("lib")).unwrap();

    install(&fixture)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no library directory"))
        .stderr(predicate::str::contains("hint: create it first"));

    // Core files land before the library folder is checked
    fixture.assert_board_content("code.py", "# app code.py");
}

#[test]
fn test_missing_core_file_fails() {
    let fixture = BoardFixture::new();
    fs::remove_file(fixture.app_path().join("terms.py")).unwrap();

    install(&fixture)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("terms.py"));
}

#[test]
fn test_missing_destination_fails() {
    let fixture = BoardFixture::new();

    cargo_bin_cmd!("cpy-install")
        .arg("--source")
        .arg(fixture.app_path())
        .arg(fixture.board_path().join("nope"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Destination does not exist"));
}

#[rstest]
#[case::no_arguments(&[])]
#[case::two_destinations(&["/Volumes/CIRCUITPY", "/Volumes/CIRCUITPY1"])]
#[case::unknown_flag(&["--bogus", "/Volumes/CIRCUITPY"])]
fn test_usage_errors_exit_1(#[case] args: &[&str]) {
    cargo_bin_cmd!("cpy-install")
        .args(args)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_help_exits_0() {
    cargo_bin_cmd!("cpy-install")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("DESTINATION"));
}

#[test]
fn test_plan_writes_nothing() {
    let fixture = BoardFixture::new();
    fixture.write_board("settings.py", "volume = 11");

    install(&fixture)
        .arg("--plan")
        .assert()
        .success()
        .stdout(predicate::str::contains("Plan (9 items):"))
        .stdout(predicate::str::contains("skip"))
        .stdout(predicate::str::contains("copy"));

    assert!(!fixture.on_board("code.py").exists());
    assert!(!fixture.on_board("lib/neopixel.mpy").exists());
    fixture.assert_board_content("settings.py", "volume = 11");
}

#[test]
fn test_plan_json_output() {
    let fixture = BoardFixture::new();
    fixture.write_board("code.py", "# old code");

    let output = install(&fixture)
        .args(["--plan", "--output", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let payload: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(payload["mode"], "plan");
    let items = payload["items"].as_array().unwrap();
    assert_eq!(items.len(), 9);
    assert_eq!(items[0]["action"], "overwrite");
    assert_eq!(items[0]["reason"], "exists");
    assert_eq!(items[1]["action"], "copy");
}

#[test]
fn test_execute_json_output() {
    let fixture = BoardFixture::new();
    fixture.write_board("lib/neopixel.mpy", "board neopixel");

    let output = install(&fixture)
        .args(["--output", "json", "--no-sync"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let payload: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(payload["mode"], "execute");
    assert_eq!(payload["core"]["files_copied"], 6);
    assert_eq!(payload["settings_copied"], true);
    assert_eq!(payload["lib"]["files_copied"], 1);
    assert_eq!(payload["lib"]["files_skipped"], 1);
}

#[test]
fn test_quiet_prints_nothing() {
    let fixture = BoardFixture::new();

    install(&fixture)
        .arg("-q")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}
