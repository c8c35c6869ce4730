//! Tests for `vpnpod down`.

use predicates::prelude::*;

use crate::support::*;

#[test]
fn test_down_absent_pod_is_noop() {
    let t = Test::new();
    let settings = t.with_runtime("false");

    t.cmd()
        .arg("--config")
        .arg(&settings)
        .args(["down", "work", "--yes"])
        .assert()
        .success()
        .stderr(predicate::str::contains("no pod named work"));
}

#[test]
fn test_down_removes_pod() {
    let t = Test::new();
    let settings = t.with_runtime("true");

    t.cmd()
        .arg("--config")
        .arg(&settings)
        .args(["down", "work", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("removed container work-client"))
        .stdout(predicate::str::contains("removed container work-vpn"))
        .stdout(predicate::str::contains("removed pod work"));
}

#[test]
fn test_down_requires_confirmation_without_terminal() {
    let t = Test::new();
    let settings = t.with_runtime("true");

    t.cmd()
        .arg("--config")
        .arg(&settings)
        .args(["down", "work"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("aborted by user"));
}

#[test]
fn test_down_rejects_invalid_name() {
    let t = Test::new();
    let settings = t.with_runtime("true");

    t.cmd()
        .arg("--config")
        .arg(&settings)
        .args(["down", "_work", "--yes"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid pod name"));
}
