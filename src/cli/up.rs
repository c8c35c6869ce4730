//! Up command.
//!
//! Provisions the pod, gateway and client, verifies the tunnel, and rolls
//! everything back on failure or interrupt.

use crate::cli::prompt::{Answers, TerminalPrompter};
use crate::cli::{output, signal};
use crate::core::config::Settings;
use crate::core::orchestrator::{Collaborators, Orchestrator, Outcome, Phase, Progress};
use crate::core::probe::EchoProbe;
use crate::core::readiness::SystemClock;
use crate::core::runtime::Podman;
use crate::core::vault::Vault;
use crate::error::{Error, Result};

/// Progress reporter printing each completed phase.
struct ConsoleProgress;

impl Progress for ConsoleProgress {
    fn phase(&self, phase: Phase) {
        if phase != Phase::Succeeded {
            output::success(&phase.to_string());
        }
    }

    fn warn(&self, message: &str) {
        output::warn(message);
    }
}

/// Provision a new pod.
pub fn execute(settings: &Settings, answers: Answers) -> Result<()> {
    let runtime = Podman::detect(&settings.runtime.binary, settings.runtime.sudo)?;
    let probe = EchoProbe::new(&runtime, &settings.probe.url, settings.probe.timeout());
    let prompter = TerminalPrompter::new(answers);
    let vault = Vault::open()?;

    let orchestrator = Orchestrator::new(
        Collaborators {
            runtime: &runtime,
            probe: &probe,
            prompter: &prompter,
            clock: &SystemClock,
            progress: &ConsoleProgress,
        },
        settings,
        vault,
    );

    signal::watch(orchestrator.state());

    let outcome = orchestrator.run();
    report(&outcome);
    outcome.result.map(|_| ())
}

fn report(outcome: &Outcome) {
    match &outcome.result {
        Ok(summary) => {
            output::section("Ready");
            output::kv("pod     ", &summary.names.pod);
            output::kv("gateway ", &summary.names.gateway);
            output::kv("client  ", &summary.names.client);
            output::kv("host    ", &summary.host_address);
            output::kv("tunnel  ", &summary.tunnel_address);
            output::blank();
            output::hint(&format!(
                "attach with: podman attach {}",
                summary.names.client
            ));
            output::hint(&format!("remove with: vpnpod down {}", summary.names.pod));
        }
        Err(e) => {
            output::section(if e.is_interrupt() { "Interrupted" } else { "Failed" });
            output::kv("phase reached", outcome.reached);

            if let Error::Verification(failure) = e {
                if let Some(logs) = failure.logs() {
                    output::section("Gateway logs");
                    for line in logs.lines() {
                        output::dimmed(line);
                    }
                }
            }

            match &outcome.teardown {
                Some(teardown) => {
                    for handle in &teardown.removed {
                        output::success(&format!("removed {}", handle));
                    }
                    for (handle, err) in &teardown.failed {
                        output::warn(&format!("could not remove {}: {}", handle, err));
                    }
                    if teardown.is_clean() {
                        output::success("cleanup complete, scratch area erased");
                    } else {
                        output::warn("cleanup finished with errors, scratch area erased");
                        output::hint("remove leftovers with: vpnpod down <pod>");
                    }
                }
                None => output::dimmed("cleanup already ran"),
            }
        }
    }
}
