//! Provisioning orchestrator.
//!
//! Runs the forward pass one step at a time, recording each created
//! resource in the [`Ledger`], and on the first failure or interrupt hands
//! over to the single [`teardown`] pass.
//!
//! ```text
//! Init → CredentialsCollected → CredentialsSealed → ConfigPrepared
//!      → PodNamed → Confirmed → PodCreated → GatewayContainerRunning
//!      → CredentialsDelivered → CredentialsPurged → ClientContainerRunning
//!      → TunnelVerified → NamespaceVerified → Succeeded
//! ```
//!
//! Any step error moves the run to `Failed`. Nothing retries.

mod state;
mod teardown;

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::core::config::Settings;
use crate::core::constants;
use crate::core::domain::{Address, Credential, Origin, ResourceKind};
use crate::core::ledger::Ledger;
use crate::core::openvpn::VpnConfig;
use crate::core::probe::{
    check_namespace, tunnel_verdict, AddressSource, NamespaceVerdict, TunnelVerdict,
    SAME_ADDRESS_EXPLANATIONS,
};
use crate::core::readiness::{wait_until, Budget, Clock};
use crate::core::runtime::{ContainerSpec, Mount, Runtime};
use crate::core::validation::validate_pod_name;
use crate::core::vault::{Target, Vault};
use crate::error::{Error, Result, ValidationError, VerificationFailure};

pub use state::{Phase, RunState};
pub use teardown::{teardown, TeardownReport};

/// Source of the interactive answers a run needs.
pub trait Prompter {
    /// VPN username and password.
    fn credentials(&self) -> Result<Credential>;

    /// Path of the user's OpenVPN config file.
    fn vpn_config_path(&self) -> Result<PathBuf>;

    /// Name for the new pod.
    fn pod_name(&self) -> Result<String>;

    /// Final yes/no before anything is created.
    fn confirm(&self, plan: &Plan) -> Result<bool>;
}

/// Receiver of progress notifications. All methods default to no-ops.
pub trait Progress {
    fn phase(&self, _phase: Phase) {}

    fn warn(&self, _message: &str) {}
}

impl Progress for () {}

/// Names of the pod and its two containers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodNames {
    pub pod: String,
    pub gateway: String,
    pub client: String,
}

impl PodNames {
    /// Derive container names from a validated pod name.
    pub fn new(pod: &str) -> Result<Self> {
        validate_pod_name(pod)?;
        Ok(Self {
            pod: pod.to_string(),
            gateway: format!("{}{}", pod, constants::GATEWAY_SUFFIX),
            client: format!("{}{}", pod, constants::CLIENT_SUFFIX),
        })
    }
}

/// What a run is about to create, shown at the confirmation gate
#[derive(Debug, Clone)]
pub struct Plan {
    pub names: PodNames,
    pub vpn_config: PathBuf,
    pub gateway_image: String,
    pub client_image: String,
    pub client_config_dir: PathBuf,
}

/// Result of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub names: PodNames,
    pub host_address: Address,
    pub tunnel_address: String,
}

/// Everything a finished run reports
#[derive(Debug)]
pub struct Outcome {
    /// Last phase completed
    pub reached: Phase,
    pub result: Result<Summary>,
    /// `None` only if teardown had already been claimed elsewhere
    pub teardown: Option<TeardownReport>,
}

impl Outcome {
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }

    /// Process exit code: 0, 1, or 130 after an interrupt.
    pub fn exit_code(&self) -> i32 {
        match &self.result {
            Ok(_) => 0,
            Err(e) => e.exit_code(),
        }
    }
}

/// External collaborators of a run
pub struct Collaborators<'a> {
    pub runtime: &'a dyn Runtime,
    pub probe: &'a dyn AddressSource,
    pub prompter: &'a dyn Prompter,
    pub clock: &'a dyn Clock,
    pub progress: &'a dyn Progress,
}

/// The provisioning state machine.
pub struct Orchestrator<'a> {
    runtime: &'a dyn Runtime,
    probe: &'a dyn AddressSource,
    prompter: &'a dyn Prompter,
    clock: &'a dyn Clock,
    progress: &'a dyn Progress,
    settings: &'a Settings,
    state: Arc<RunState>,
    ledger: Ledger,
    vault: Vault,
}

impl<'a> Orchestrator<'a> {
    pub fn new(with: Collaborators<'a>, settings: &'a Settings, vault: Vault) -> Self {
        Self {
            runtime: with.runtime,
            probe: with.probe,
            prompter: with.prompter,
            clock: with.clock,
            progress: with.progress,
            settings,
            state: Arc::new(RunState::new()),
            ledger: Ledger::new(),
            vault,
        }
    }

    /// Shared run state, for the signal watcher.
    pub fn state(&self) -> Arc<RunState> {
        Arc::clone(&self.state)
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn vault(&self) -> &Vault {
        &self.vault
    }

    /// Run the teardown pass. Later calls return `None`.
    pub fn teardown(&self) -> Option<TeardownReport> {
        teardown(&self.state, &self.ledger, self.runtime, &self.vault)
    }

    /// Execute the forward pass, then teardown exactly once.
    pub fn run(&self) -> Outcome {
        let result = self.forward();

        if let Err(e) = &result {
            self.state.fail();
            debug!(phase = %self.state.reached(), error = %e, "forward pass stopped");
        }

        let report = self.teardown();

        let interrupted = self.state.is_cancelled() && !self.state.is_succeeded();
        let result = match result {
            Ok(_) | Err(_) if interrupted => {
                self.state.fail();
                Err(Error::Interrupted)
            }
            other => other,
        };

        if let Some(report) = &report {
            if report.rolled_back() {
                if interrupted {
                    warn!(
                        phase = %self.state.reached(),
                        removed = report.removed.len(),
                        failed = report.failed.len(),
                        "rolled back after interruption"
                    );
                } else {
                    warn!(
                        phase = %self.state.reached(),
                        removed = report.removed.len(),
                        failed = report.failed.len(),
                        "rolled back after failure"
                    );
                }
            }
        }

        Outcome {
            reached: self.state.reached(),
            result,
            teardown: report,
        }
    }

    fn advance(&self, phase: Phase) -> Result<()> {
        self.state.advance(phase)?;
        self.progress.phase(phase);
        info!(phase = %phase, "step complete");
        Ok(())
    }

    fn forward(&self) -> Result<Summary> {
        let gw = &self.settings.gateway;

        let credential = self.prompter.credentials()?;
        self.advance(Phase::CredentialsCollected)?;

        let sealed = self.vault.seal(credential)?;
        self.advance(Phase::CredentialsSealed)?;

        let vpn_path = self.prompter.vpn_config_path()?;
        let vpn = VpnConfig::prepare(&vpn_path, &gw.credential_path)?;
        self.advance(Phase::ConfigPrepared)?;

        let pod = self.prompter.pod_name()?;
        let names = PodNames::new(pod.trim())?;
        self.ensure_absent(&names)?;
        self.advance(Phase::PodNamed)?;

        let client_config_dir = self.settings.client.resolved_config_dir()?;
        let plan = Plan {
            names: names.clone(),
            vpn_config: vpn.source().to_path_buf(),
            gateway_image: gw.image.clone(),
            client_image: self.settings.client.image.clone(),
            client_config_dir: client_config_dir.clone(),
        };
        if !self.prompter.confirm(&plan)? {
            return Err(ValidationError::Declined.into());
        }
        self.advance(Phase::Confirmed)?;

        self.runtime.create_pod(&names.pod)?;
        self.ledger.record(ResourceKind::Pod, &names.pod);
        self.advance(Phase::PodCreated)?;

        self.runtime.run_container(&self.gateway_spec(&names))?;
        self.ledger.record(ResourceKind::Container, &names.gateway);
        self.await_running(&names.gateway)?;
        self.advance(Phase::GatewayContainerRunning)?;

        let staged = self.vault.stage_file(vpn.contents().as_bytes(), "config-")?;
        self.runtime
            .copy_into_container(&names.gateway, &staged, &gw.config_path)?;
        let target = Target::new(&names.gateway, &gw.credential_path);
        self.vault.deliver(&sealed, self.runtime, &target)?;
        self.advance(Phase::CredentialsDelivered)?;

        self.await_authenticated(&names.gateway)?;
        if !Vault::purge(self.runtime, &target) {
            self.progress
                .warn("could not purge the credential file from the gateway");
        }
        drop(sealed);
        self.advance(Phase::CredentialsPurged)?;

        std::fs::create_dir_all(&client_config_dir)?;
        self.runtime
            .run_container(&self.client_spec(&names, client_config_dir))?;
        self.ledger.record(ResourceKind::Container, &names.client);
        self.await_running(&names.client)?;
        self.advance(Phase::ClientContainerRunning)?;

        let host_address = self.probe.external_address(&Origin::Host);
        let tunnel_address = self.verify_tunnel(&names, &host_address)?;
        self.advance(Phase::TunnelVerified)?;

        self.verify_namespace(&names)?;
        self.advance(Phase::NamespaceVerified)?;

        if !self.state.succeed() {
            return Err(Error::Interrupted);
        }
        self.progress.phase(Phase::Succeeded);
        info!(pod = %names.pod, "provisioning succeeded");

        Ok(Summary {
            names,
            host_address,
            tunnel_address,
        })
    }

    /// None of the objects this run would create may already exist.
    fn ensure_absent(&self, names: &PodNames) -> Result<()> {
        if self.runtime.pod_exists(&names.pod)? {
            return Err(ValidationError::PodExists(names.pod.clone()).into());
        }
        for container in [&names.gateway, &names.client] {
            if self.runtime.container_exists(container)? {
                return Err(ValidationError::Invalid {
                    field: "pod name",
                    reason: format!("container {} already exists", container),
                }
                .into());
            }
        }
        Ok(())
    }

    fn gateway_spec(&self, names: &PodNames) -> ContainerSpec {
        let gw = &self.settings.gateway;

        // Wait for both files, then hand over to the VPN client.
        let script = format!(
            "while [ ! -s '{cfg}' ] || [ ! -s '{auth}' ]; do sleep 1; done; exec openvpn --config '{cfg}'",
            cfg = gw.config_path,
            auth = gw.credential_path,
        );

        let mut spec = ContainerSpec::new(&names.gateway, &names.pod, &gw.image);
        spec.entrypoint = Some(gw.entrypoint.clone());
        spec.command = vec!["-c".to_string(), script];
        spec.capabilities = gw.capabilities.clone();
        spec.devices = gw.devices.clone();
        spec.tmpfs = gw.tmpfs.clone();
        spec
    }

    fn client_spec(&self, names: &PodNames, config_dir: PathBuf) -> ContainerSpec {
        let client = &self.settings.client;

        let mut spec = ContainerSpec::new(&names.client, &names.pod, &client.image);
        spec.command = client.command.clone();
        spec.user = Some(client.user.clone()).filter(|u| !u.is_empty());
        spec.mounts = vec![Mount::new(config_dir, &client.config_mount)];
        spec
    }

    fn await_running(&self, container: &str) -> Result<()> {
        let budget = self.settings.settle.start_budget();
        let running = wait_until(
            &format!("container {}", container),
            budget,
            self.clock,
            &self.state,
            || Ok(self.runtime.container_running(container)?),
        )?;

        if !running {
            return Err(self.not_ready(&format!("container {}", container), budget, container));
        }
        Ok(())
    }

    fn await_authenticated(&self, gateway: &str) -> Result<()> {
        let budget = self.settings.settle.auth_budget();
        let marker = self.settings.gateway.ready_marker.as_str();
        let authenticated = wait_until(
            "vpn authentication",
            budget,
            self.clock,
            &self.state,
            || {
                let logs = self.runtime.tail_logs(gateway, constants::LOG_TAIL_LINES)?;
                Ok(logs.contains(marker))
            },
        )?;

        if !authenticated {
            return Err(self.not_ready("vpn authentication", budget, gateway));
        }
        Ok(())
    }

    fn not_ready(&self, what: &str, budget: Budget, container: &str) -> Error {
        VerificationFailure::NotReady {
            what: what.to_string(),
            attempts: budget.attempts,
            logs: self.gateway_logs(container),
        }
        .into()
    }

    fn gateway_logs(&self, container: &str) -> Option<String> {
        match self.runtime.tail_logs(container, constants::LOG_TAIL_LINES) {
            Ok(logs) => Some(logs),
            Err(e) => {
                warn!(container, error = %e, "could not read logs");
                None
            }
        }
    }

    /// Poll until the gateway leaves through a different address than the
    /// host, then judge the last answer.
    fn verify_tunnel(&self, names: &PodNames, host: &Address) -> Result<String> {
        let gateway = Origin::container(&names.gateway);
        let mut verdict = TunnelVerdict::GatewayUnavailable { host: host.clone() };

        wait_until(
            "tunnel",
            self.settings.settle.tunnel_budget(),
            self.clock,
            &self.state,
            || {
                verdict = tunnel_verdict(host.clone(), self.probe.external_address(&gateway));
                Ok(verdict.passed())
            },
        )?;

        match verdict {
            TunnelVerdict::Established { gateway, .. } => {
                info!(host = %host, tunnel = %gateway, "tunnel established");
                Ok(gateway)
            }
            TunnelVerdict::GatewayUnavailable { .. } => {
                Err(VerificationFailure::GatewayUnavailable {
                    logs: self.gateway_logs(&names.gateway),
                }
                .into())
            }
            TunnelVerdict::SameAddress(address) => {
                let mut message = format!(
                    "gateway and host both exit through {}; possible causes:",
                    address
                );
                for reason in SAME_ADDRESS_EXPLANATIONS {
                    message.push_str("\n  - ");
                    message.push_str(reason);
                }
                warn!(address = %address, "gateway address equals host address");
                self.progress.warn(&message);

                if self.settings.verify.allow_same_address {
                    Ok(address)
                } else {
                    Err(VerificationFailure::SameAddress { address }.into())
                }
            }
        }
    }

    fn verify_namespace(&self, names: &PodNames) -> Result<()> {
        let user = Some(self.settings.client.user.as_str()).filter(|u| !u.is_empty());
        let mut verdict = NamespaceVerdict::ClientUnavailable;

        wait_until(
            "shared namespace",
            self.settings.settle.tunnel_budget(),
            self.clock,
            &self.state,
            || {
                verdict = check_namespace(self.probe, &names.client, user, &names.gateway);
                Ok(verdict.passed())
            },
        )?;

        match verdict {
            NamespaceVerdict::Shared(address) => {
                info!(address = %address, "client shares gateway network path");
                Ok(())
            }
            NamespaceVerdict::ClientUnavailable => {
                Err(VerificationFailure::ClientUnavailable.into())
            }
            NamespaceVerdict::GatewayUnavailable => {
                Err(VerificationFailure::GatewayUnavailable {
                    logs: self.gateway_logs(&names.gateway),
                }
                .into())
            }
            NamespaceVerdict::Mismatch { client, gateway } => {
                Err(VerificationFailure::NamespaceMismatch { client, gateway }.into())
            }
        }
    }
}
