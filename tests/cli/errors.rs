//! Tests for error handling and CLI flags.

use predicates::prelude::*;

use crate::support::*;

#[test]
fn test_help_lists_commands() {
    let t = Test::new();

    t.cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("up"))
        .stdout(predicate::str::contains("down"))
        .stdout(predicate::str::contains("verify"));
}

#[test]
fn test_unknown_command_fails() {
    let t = Test::new();

    t.cmd().arg("unknown-command").assert().failure();
}

#[test]
fn test_missing_settings_file() {
    let t = Test::new();

    t.cmd()
        .args(["--config", "/nonexistent/vpnpod.toml", "verify", "work"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("settings file not found"));
}

#[test]
fn test_unknown_settings_key() {
    let t = Test::new();
    let settings = t.settings_file("[runtime]\nengine = \"docker\"\n");

    t.cmd()
        .arg("--config")
        .arg(&settings)
        .args(["verify", "work"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to parse settings"));
}

#[test]
fn test_missing_runtime_binary() {
    let t = Test::new();
    let settings = t.with_runtime("vpnpod-no-such-runtime");

    t.cmd()
        .arg("--config")
        .arg(&settings)
        .args(["down", "work", "--yes"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_verbose_flag_accepted() {
    let t = Test::new();
    let settings = t.with_runtime("false");

    t.cmd()
        .arg("--verbose")
        .arg("--config")
        .arg(&settings)
        .args(["down", "work", "--yes"])
        .assert()
        .success();
}
