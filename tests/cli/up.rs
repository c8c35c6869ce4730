//! Tests for `vpnpod up` without a terminal.

use predicates::prelude::*;

use crate::support::*;

#[test]
fn test_up_without_terminal_needs_username() {
    let t = Test::new();
    let settings = t.with_runtime("true");

    t.cmd()
        .arg("--config")
        .arg(&settings)
        .arg("up")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("username cannot be empty"));
}

#[test]
fn test_up_missing_vpn_config() {
    let t = Test::new();
    let settings = t.with_runtime("true");

    t.cmd()
        .arg("--config")
        .arg(&settings)
        .args(["up", "--username", USERNAME, "--pod", POD, "--yes"])
        .arg("--vpn-config")
        .arg(t.dir.path().join("missing.ovpn"))
        .env("VPNPOD_PASSWORD", PASSWORD)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("vpn config not found"));
}

#[test]
fn test_up_existing_pod_suggests_down() {
    let t = Test::new();
    let settings = t.with_runtime("true");

    t.cmd()
        .arg("--config")
        .arg(&settings)
        .args(["up", "--username", USERNAME, "--pod", POD, "--yes"])
        .arg("--vpn-config")
        .arg(t.vpn_config())
        .env("VPNPOD_PASSWORD", PASSWORD)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("pod already exists: work"))
        .stdout(predicate::str::contains("vpnpod down work"));
}

#[test]
fn test_up_never_prints_password() {
    let t = Test::new();
    let settings = t.with_runtime("true");

    t.cmd()
        .arg("--config")
        .arg(&settings)
        .args(["--verbose", "up", "--username", USERNAME, "--pod", POD, "--yes"])
        .arg("--vpn-config")
        .arg(t.vpn_config())
        .env("VPNPOD_PASSWORD", PASSWORD)
        .assert()
        .failure()
        .stdout(predicate::str::contains(PASSWORD).not())
        .stderr(predicate::str::contains(PASSWORD).not());
}
