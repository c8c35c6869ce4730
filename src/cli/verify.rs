//! Verify command.
//!
//! Re-runs the tunnel and shared-namespace checks against an existing pod
//! without changing anything.

use crate::cli::output;
use crate::core::config::Settings;
use crate::core::constants;
use crate::core::orchestrator::PodNames;
use crate::core::probe::{
    check_namespace, check_tunnel, AddressSource, EchoProbe, NamespaceVerdict, TunnelVerdict,
    SAME_ADDRESS_EXPLANATIONS,
};
use crate::core::runtime::{Podman, Runtime};
use crate::error::{Result, ValidationError, VerificationFailure};

/// Verify an existing pod.
pub fn execute(settings: &Settings, pod: &str) -> Result<()> {
    let runtime = Podman::detect(&settings.runtime.binary, settings.runtime.sudo)?;
    let probe = EchoProbe::new(&runtime, &settings.probe.url, settings.probe.timeout());
    check(&runtime, &probe, settings, pod)
}

/// Run both checks and report each.
pub fn check(
    runtime: &dyn Runtime,
    probe: &dyn AddressSource,
    settings: &Settings,
    pod: &str,
) -> Result<()> {
    let names = PodNames::new(pod)?;
    if !runtime.pod_exists(&names.pod)? {
        return Err(ValidationError::Invalid {
            field: "pod name",
            reason: format!("no pod named {}", names.pod),
        }
        .into());
    }

    output::progress("tunnel");
    match check_tunnel(probe, &names.gateway) {
        TunnelVerdict::Established { host, gateway } => {
            output::progress_done(true);
            output::kv("host   ", host);
            output::kv("gateway", &gateway);
        }
        TunnelVerdict::SameAddress(address) => {
            output::progress_done(false);
            output::warn(&format!("gateway and host both exit through {}", address));
            for reason in SAME_ADDRESS_EXPLANATIONS {
                output::list_item(reason);
            }
            if !settings.verify.allow_same_address {
                return Err(VerificationFailure::SameAddress { address }.into());
            }
        }
        TunnelVerdict::GatewayUnavailable { .. } => {
            output::progress_done(false);
            let logs = runtime
                .tail_logs(&names.gateway, constants::LOG_TAIL_LINES)
                .ok();
            if let Some(logs) = &logs {
                output::section("Gateway logs");
                for line in logs.lines() {
                    output::dimmed(line);
                }
            }
            return Err(VerificationFailure::GatewayUnavailable { logs }.into());
        }
    }

    output::progress("shared namespace");
    let user = Some(settings.client.user.as_str()).filter(|u| !u.is_empty());
    match check_namespace(probe, &names.client, user, &names.gateway) {
        NamespaceVerdict::Shared(address) => {
            output::progress_done(true);
            output::kv("client ", &address);
            Ok(())
        }
        NamespaceVerdict::ClientUnavailable => {
            output::progress_done(false);
            Err(VerificationFailure::ClientUnavailable.into())
        }
        NamespaceVerdict::GatewayUnavailable => {
            output::progress_done(false);
            Err(VerificationFailure::GatewayUnavailable { logs: None }.into())
        }
        NamespaceVerdict::Mismatch { client, gateway } => {
            output::progress_done(false);
            Err(VerificationFailure::NamespaceMismatch { client, gateway }.into())
        }
    }
}
