//! Run state.
//!
//! Phase of the provisioning run plus the flags shared with the signal
//! watcher. The phase only moves forward; `Succeeded` and `Failed` are
//! terminal. The flags are guarded together so an interrupt can never
//! change the outcome once teardown has started.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use crate::error::{Error, Result};

/// Provisioning phases, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Phase {
    Init,
    CredentialsCollected,
    CredentialsSealed,
    ConfigPrepared,
    PodNamed,
    Confirmed,
    PodCreated,
    GatewayContainerRunning,
    CredentialsDelivered,
    CredentialsPurged,
    ClientContainerRunning,
    TunnelVerified,
    NamespaceVerified,
    Succeeded,
    Failed,
}

impl Phase {
    /// Every phase in order, `Failed` last.
    pub const ALL: [Phase; 15] = [
        Phase::Init,
        Phase::CredentialsCollected,
        Phase::CredentialsSealed,
        Phase::ConfigPrepared,
        Phase::PodNamed,
        Phase::Confirmed,
        Phase::PodCreated,
        Phase::GatewayContainerRunning,
        Phase::CredentialsDelivered,
        Phase::CredentialsPurged,
        Phase::ClientContainerRunning,
        Phase::TunnelVerified,
        Phase::NamespaceVerified,
        Phase::Succeeded,
        Phase::Failed,
    ];

    fn from_u8(value: u8) -> Phase {
        Self::ALL
            .get(value as usize)
            .copied()
            .unwrap_or(Phase::Failed)
    }

    /// The phase that follows this one on the forward pass.
    pub fn next(self) -> Option<Phase> {
        match self {
            Phase::Succeeded | Phase::Failed => None,
            _ => Some(Self::from_u8(self as u8 + 1)),
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Succeeded | Phase::Failed)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Phase::Init => "init",
            Phase::CredentialsCollected => "credentials collected",
            Phase::CredentialsSealed => "credentials sealed",
            Phase::ConfigPrepared => "config prepared",
            Phase::PodNamed => "pod named",
            Phase::Confirmed => "confirmed",
            Phase::PodCreated => "pod created",
            Phase::GatewayContainerRunning => "gateway running",
            Phase::CredentialsDelivered => "credentials delivered",
            Phase::CredentialsPurged => "credentials purged",
            Phase::ClientContainerRunning => "client running",
            Phase::TunnelVerified => "tunnel verified",
            Phase::NamespaceVerified => "namespace verified",
            Phase::Succeeded => "succeeded",
            Phase::Failed => "failed",
        };
        write!(f, "{}", text)
    }
}

#[derive(Debug, Default)]
struct Flags {
    succeeded: bool,
    cancelled: bool,
    teardown_started: bool,
}

/// Shared state of one provisioning run.
#[derive(Debug)]
pub struct RunState {
    phase: AtomicU8,
    reached: AtomicU8,
    flags: Mutex<Flags>,
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

impl RunState {
    pub fn new() -> Self {
        Self {
            phase: AtomicU8::new(Phase::Init as u8),
            reached: AtomicU8::new(Phase::Init as u8),
            flags: Mutex::new(Flags::default()),
        }
    }

    fn flags(&self) -> MutexGuard<'_, Flags> {
        self.flags.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        Phase::from_u8(self.phase.load(Ordering::SeqCst))
    }

    /// Last non-terminal phase completed, kept after a failure.
    pub fn reached(&self) -> Phase {
        Phase::from_u8(self.reached.load(Ordering::SeqCst))
    }

    pub fn is_cancelled(&self) -> bool {
        self.flags().cancelled
    }

    pub fn is_succeeded(&self) -> bool {
        self.flags().succeeded
    }

    pub fn teardown_started(&self) -> bool {
        self.flags().teardown_started
    }

    /// Move to `next`, which must directly follow the current phase.
    /// The terminal transitions go through [`RunState::succeed`] and
    /// [`RunState::fail`].
    ///
    /// # Errors
    ///
    /// Returns `Interrupted` if the run has been cancelled.
    pub fn advance(&self, next: Phase) -> Result<()> {
        if self.is_cancelled() {
            return Err(Error::Interrupted);
        }

        let current = self.phase();
        debug_assert_eq!(current.next(), Some(next), "phases advance one step at a time");
        debug_assert!(!next.is_terminal());

        if self
            .phase
            .compare_exchange(current as u8, next as u8, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            // lost to fail() from another path
            return Err(Error::Interrupted);
        }
        self.reached.store(next as u8, Ordering::SeqCst);

        debug!(phase = %next, "phase reached");
        Ok(())
    }

    /// Mark the run successful. Only valid after `NamespaceVerified`.
    ///
    /// Returns false, leaving the run unsuccessful, if it was cancelled
    /// first.
    pub fn succeed(&self) -> bool {
        let mut flags = self.flags();
        if flags.cancelled || flags.teardown_started {
            return false;
        }

        if self
            .phase
            .compare_exchange(
                Phase::NamespaceVerified as u8,
                Phase::Succeeded as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_err()
        {
            return false;
        }

        flags.succeeded = true;
        debug!("run succeeded");
        true
    }

    /// Latch the terminal `Failed` phase. `reached` keeps the last phase.
    ///
    /// A `Succeeded` phase is demoted only when an interrupt has already
    /// cleared the success flag.
    pub fn fail(&self) {
        let mut current = self.phase.load(Ordering::SeqCst);
        loop {
            match Phase::from_u8(current) {
                Phase::Failed => return,
                Phase::Succeeded if self.is_succeeded() => return,
                _ => {}
            }
            match self.phase.compare_exchange(
                current,
                Phase::Failed as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return,
                Err(actual) => current = actual,
            }
        }
    }

    /// Record an external interrupt.
    ///
    /// Forces the run unsuccessful unless teardown is already underway.
    pub fn interrupt(&self) {
        let mut flags = self.flags();
        flags.cancelled = true;
        if !flags.teardown_started {
            flags.succeeded = false;
        }
        debug!("interrupt recorded");
    }

    /// Claim the single teardown pass.
    ///
    /// Returns true exactly once; later callers get false.
    pub fn begin_teardown(&self) -> bool {
        let mut flags = self.flags();
        if flags.teardown_started {
            return false;
        }
        flags.teardown_started = true;
        true
    }
}
