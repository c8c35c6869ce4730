//! Tests for `vpnpod verify`.

use predicates::prelude::*;

use crate::support::*;

#[test]
fn test_verify_absent_pod_fails() {
    let t = Test::new();
    let settings = t.with_runtime("false");

    t.cmd()
        .arg("--config")
        .arg(&settings)
        .args(["verify", "work"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no pod named work"));
}
