//! Readiness polling.
//!
//! Bounded polling against an observable predicate, used wherever a step
//! has to wait for an external process to settle. Every wait is sliced so
//! a cancelled run is noticed within [`SLICE`].

use std::time::Duration;

use tracing::{debug, trace};

use crate::core::orchestrator::RunState;
use crate::error::{Error, Result};

/// Longest uninterrupted sleep.
pub const SLICE: Duration = Duration::from_millis(100);

/// Source of delays. Tests substitute a clock that does not block.
pub trait Clock: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// Real wall-clock sleeps
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// How many times to poll and how long to wait between polls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Budget {
    pub attempts: u32,
    pub interval: Duration,
}

impl Budget {
    pub fn new(attempts: u32, interval: Duration) -> Self {
        Self { attempts, interval }
    }
}

/// Sleep for `duration`, returning early with `Interrupted` if the run is
/// cancelled.
pub fn pause(clock: &dyn Clock, state: &RunState, duration: Duration) -> Result<()> {
    let mut remaining = duration;

    while !remaining.is_zero() {
        if state.is_cancelled() {
            return Err(Error::Interrupted);
        }
        let slice = remaining.min(SLICE);
        clock.sleep(slice);
        remaining -= slice;
    }

    if state.is_cancelled() {
        return Err(Error::Interrupted);
    }
    Ok(())
}

/// Poll `ready` until it returns true or the budget runs out.
///
/// Returns `Ok(true)` when ready, `Ok(false)` when the budget is exhausted.
/// Errors from the predicate propagate immediately.
///
/// # Errors
///
/// Returns `Interrupted` as soon as the run is cancelled.
pub fn wait_until<F>(
    what: &str,
    budget: Budget,
    clock: &dyn Clock,
    state: &RunState,
    mut ready: F,
) -> Result<bool>
where
    F: FnMut() -> Result<bool>,
{
    for attempt in 1..=budget.attempts {
        if state.is_cancelled() {
            return Err(Error::Interrupted);
        }
        if ready()? {
            debug!(what, attempt, "ready");
            return Ok(true);
        }
        trace!(what, attempt, "not ready");
        if attempt < budget.attempts {
            pause(clock, state, budget.interval)?;
        }
    }

    debug!(what, attempts = budget.attempts, "readiness budget exhausted");
    Ok(false)
}
