//! Test support utilities for vpnpod integration tests.
//!
//! In-memory stand-ins for the container runtime, the address-echo probe,
//! the terminal and the clock, plus a harness wiring them into an
//! orchestrator.

#![allow(dead_code)]

pub mod assertions;
pub mod commands;
pub mod fakes;
pub mod fixtures;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fakes::*;
#[allow(unused_imports)]
pub use fixtures::*;

use std::path::PathBuf;

use tempfile::TempDir;
use vpnpod::core::config::Settings;
use vpnpod::core::orchestrator::{Collaborators, Orchestrator};
use vpnpod::Vault;

/// One provisioning scenario with isolated temp directories.
///
/// Holds the fakes so tests can script them before the run and inspect
/// them afterwards.
pub struct Test {
    /// Scratch parent, VPN config and client config live here
    pub dir: TempDir,
    pub runtime: FakeRuntime,
    pub probe: ScriptedProbe,
    pub prompter: ScriptedPrompter,
    pub clock: FakeClock,
    pub settings: Settings,
}

impl Test {
    /// A scenario that succeeds end to end for pod `work`.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let vpn_config = dir.path().join("client.ovpn");
        std::fs::write(&vpn_config, SAMPLE_OVPN).expect("failed to write vpn config");

        let mut settings = Settings::default();
        settings.client.config_dir = Some(dir.path().join("client"));

        Self {
            runtime: FakeRuntime::new(),
            probe: ScriptedProbe::tunnel(HOST_ADDRESS, TUNNEL_ADDRESS),
            prompter: ScriptedPrompter::new(POD, vpn_config),
            clock: FakeClock::new(),
            settings,
            dir,
        }
    }

    /// Build an orchestrator over this scenario's fakes.
    pub fn orchestrator(&self) -> Orchestrator<'_> {
        let vault = Vault::open_in(self.dir.path()).expect("failed to open vault");
        Orchestrator::new(
            Collaborators {
                runtime: &self.runtime,
                probe: &self.probe,
                prompter: &self.prompter,
                clock: &self.clock,
                progress: &(),
            },
            &self.settings,
            vault,
        )
    }

    /// Path of the scripted VPN config.
    pub fn vpn_config(&self) -> PathBuf {
        self.dir.path().join("client.ovpn")
    }
}
