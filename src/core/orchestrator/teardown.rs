//! Teardown.
//!
//! The single cleanup pass shared by the failure, interrupt and success
//! paths. Whichever path claims it first runs it; every later call is a
//! no-op.

use tracing::{debug, info, warn};

use super::RunState;
use crate::core::domain::{ResourceHandle, ResourceKind};
use crate::core::ledger::Ledger;
use crate::core::runtime::Runtime;
use crate::core::vault::Vault;
use crate::error::RuntimeError;

/// What a teardown pass did
#[derive(Debug, Default)]
pub struct TeardownReport {
    /// Removed from the runtime, newest first
    pub removed: Vec<ResourceHandle>,
    /// Removal attempted but failed
    pub failed: Vec<(ResourceHandle, RuntimeError)>,
    /// Left in place because the run succeeded
    pub retained: Vec<ResourceHandle>,
}

impl TeardownReport {
    /// Whether any removal was attempted.
    pub fn rolled_back(&self) -> bool {
        !self.removed.is_empty() || !self.failed.is_empty()
    }

    /// Whether every attempted removal succeeded.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Run the teardown pass once.
///
/// Unless the run succeeded, drains the ledger newest first and force
/// removes each resource, logging removal failures instead of returning
/// them. The vault's scratch area is erased in every case.
///
/// Returns `None` if another caller already ran teardown.
pub fn teardown(
    state: &RunState,
    ledger: &Ledger,
    runtime: &dyn Runtime,
    vault: &Vault,
) -> Option<TeardownReport> {
    if !state.begin_teardown() {
        debug!("teardown already ran");
        return None;
    }

    let mut report = TeardownReport::default();

    if state.is_succeeded() {
        report.retained = ledger.snapshot();
        debug!(resources = report.retained.len(), "run succeeded, keeping resources");
    } else {
        while let Some(handle) = ledger.pop() {
            let result = match handle.kind() {
                ResourceKind::Container => runtime.remove_container(handle.name(), true),
                ResourceKind::Pod => runtime.remove_pod(handle.name(), true),
            };

            match result {
                Ok(()) => {
                    info!(resource = %handle, "removed");
                    report.removed.push(handle);
                }
                Err(e) => {
                    warn!(resource = %handle, error = %e, "removal failed");
                    report.failed.push((handle, e));
                }
            }
        }
    }

    vault.erase();
    Some(report)
}
