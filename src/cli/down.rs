//! Down command.
//!
//! Force-removes a provisioned pod and its containers. The client's
//! configuration directory is left in place.

use std::io::{self, IsTerminal};

use dialoguer::Confirm;
use tracing::info;

use crate::cli::output;
use crate::core::config::Settings;
use crate::core::orchestrator::PodNames;
use crate::core::runtime::{Podman, Runtime};
use crate::error::{Result, ValidationError};

/// Remove a pod.
pub fn execute(settings: &Settings, pod: &str, yes: bool) -> Result<()> {
    let runtime = Podman::detect(&settings.runtime.binary, settings.runtime.sudo)?;
    remove(&runtime, pod, yes)
}

/// Remove the pod's containers, newest first, then the pod.
pub fn remove(runtime: &dyn Runtime, pod: &str, yes: bool) -> Result<()> {
    let names = PodNames::new(pod)?;

    if !runtime.pod_exists(&names.pod)? {
        output::warn(&format!("no pod named {}", output::name(&names.pod)));
        return Ok(());
    }

    if !yes {
        if !io::stdin().is_terminal() {
            output::hint("pass --yes to remove without a terminal");
            return Err(ValidationError::Declined.into());
        }
        let confirmed = Confirm::new()
            .with_prompt(format!("Remove pod {} and its containers?", names.pod))
            .default(false)
            .interact()?;
        if !confirmed {
            return Err(ValidationError::Declined.into());
        }
    }

    for container in [&names.client, &names.gateway] {
        if runtime.container_exists(container)? {
            runtime.remove_container(container, true)?;
            output::success(&format!("removed container {}", container));
        }
    }

    runtime.remove_pod(&names.pod, true)?;
    info!(pod = %names.pod, "pod removed");
    output::success(&format!("removed pod {}", names.pod));

    Ok(())
}
