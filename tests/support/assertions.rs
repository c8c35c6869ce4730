//! Test assertion helpers.

use vpnpod::core::orchestrator::Outcome;
use vpnpod::error::Error;

use super::FakeRuntime;

/// Assert that a run succeeded, showing the error otherwise.
pub fn assert_succeeded(outcome: &Outcome) {
    if let Err(e) = &outcome.result {
        panic!("run failed at {}: {}", outcome.reached, e);
    }
    assert_eq!(outcome.exit_code(), 0);
}

/// Assert that a run failed with a non-interrupt error.
pub fn assert_failed(outcome: &Outcome) {
    match &outcome.result {
        Ok(_) => panic!("expected run to fail but it succeeded"),
        Err(e) => assert!(!e.is_interrupt(), "expected failure, got interrupt"),
    }
    assert_eq!(outcome.exit_code(), 1);
}

/// Assert that a run ended on an interrupt.
pub fn assert_interrupted(outcome: &Outcome) {
    assert!(
        matches!(outcome.result, Err(Error::Interrupted)),
        "expected interrupt, got {:?}",
        outcome.result
    );
    assert_eq!(outcome.exit_code(), 130);
}

/// Assert that nothing was left behind in the runtime.
pub fn assert_no_resources(runtime: &FakeRuntime) {
    assert!(runtime.pods().is_empty(), "pods left: {:?}", runtime.pods());
    assert!(
        runtime.containers().is_empty(),
        "containers left: {:?}",
        runtime.containers()
    );
}
