//! Podman runtime backend.
//!
//! Drives the `podman` CLI, optionally through `sudo` for rootful pods.
//!
//! ## Requirements
//!
//! - `podman` must be on `PATH` (or configured explicitly)
//! - The gateway needs `NET_ADMIN` and `/dev/net/tun`, which usually means
//!   rootful podman

use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use tracing::{debug, trace};

use super::{ContainerSpec, Runtime, RuntimeResult};
use crate::error::RuntimeError;

/// Podman CLI runtime
#[derive(Debug, Clone)]
pub struct Podman {
    binary: PathBuf,
    sudo: bool,
}

impl Podman {
    /// Locate `binary` on `PATH`.
    ///
    /// # Errors
    ///
    /// Returns `RuntimeError` if the binary cannot be found.
    pub fn detect(binary: &str, sudo: bool) -> RuntimeResult<Self> {
        let path = which::which(binary).map_err(|e| {
            RuntimeError::new("locate runtime", format!("{} not found: {}", binary, e))
        })?;
        debug!(binary = %path.display(), sudo, "runtime located");
        Ok(Self { binary: path, sudo })
    }

    /// Use an explicit binary path without lookup.
    pub fn with_binary(binary: impl Into<PathBuf>, sudo: bool) -> Self {
        Self {
            binary: binary.into(),
            sudo,
        }
    }

    fn command(&self) -> Command {
        let mut cmd = if self.sudo {
            // never prompt: a password prompt would need the terminal
            let mut cmd = Command::new("sudo");
            cmd.arg("-n").arg(&self.binary);
            cmd
        } else {
            Command::new(&self.binary)
        };

        // Keep runtime calls out of the terminal's process group so a
        // Ctrl+C reaches only us; the main loop decides when to stop.
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }
        cmd
    }

    fn output(&self, operation: &str, args: &[&str]) -> RuntimeResult<Output> {
        trace!(operation, ?args, "runtime call");

        self.command()
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                RuntimeError::new(operation, format!("failed to spawn {}: {}", self.binary.display(), e))
            })
    }

    /// Run a call that must exit zero, returning stdout.
    fn run(&self, operation: &str, args: &[&str]) -> RuntimeResult<String> {
        let output = self.output(operation, args)?;

        if !output.status.success() {
            return Err(RuntimeError::new(operation, failure_message(&output)));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Run an `exists` call: exit 0 is true, exit 1 is false.
    fn exists(&self, operation: &str, args: &[&str]) -> RuntimeResult<bool> {
        let output = self.output(operation, args)?;

        match output.status.code() {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            _ => Err(RuntimeError::new(operation, failure_message(&output))),
        }
    }
}

/// Best description of a failed call: stderr, else the exit status.
fn failure_message(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        format!("exited with {}", output.status)
    } else {
        stderr.to_string()
    }
}

impl Runtime for Podman {
    fn create_pod(&self, name: &str) -> RuntimeResult<()> {
        self.run("create pod", &["pod", "create", "--name", name])?;
        debug!(pod = name, "pod created");
        Ok(())
    }

    fn remove_pod(&self, name: &str, force: bool) -> RuntimeResult<()> {
        let mut args = vec!["pod", "rm"];
        if force {
            args.push("--force");
        }
        args.push(name);
        self.run("remove pod", &args)?;
        debug!(pod = name, "pod removed");
        Ok(())
    }

    fn pod_exists(&self, name: &str) -> RuntimeResult<bool> {
        self.exists("check pod", &["pod", "exists", name])
    }

    fn run_container(&self, spec: &ContainerSpec) -> RuntimeResult<()> {
        let args = spec.run_args();
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.run("run container", &args)?;
        debug!(container = %spec.name, pod = %spec.pod, "container started");
        Ok(())
    }

    fn exec_in_container(
        &self,
        name: &str,
        command: &[&str],
        user: Option<&str>,
    ) -> RuntimeResult<String> {
        let mut args = vec!["exec"];
        if let Some(user) = user {
            args.push("--user");
            args.push(user);
        }
        args.push(name);
        args.extend_from_slice(command);
        self.run("exec in container", &args)
    }

    fn copy_into_container(&self, name: &str, local: &Path, remote: &str) -> RuntimeResult<()> {
        let local = local.to_string_lossy();
        let target = format!("{}:{}", name, remote);
        self.run("copy into container", &["cp", &local, &target])?;
        debug!(container = name, remote, "file copied");
        Ok(())
    }

    fn container_exists(&self, name: &str) -> RuntimeResult<bool> {
        self.exists("check container", &["container", "exists", name])
    }

    fn container_running(&self, name: &str) -> RuntimeResult<bool> {
        if !self.container_exists(name)? {
            return Ok(false);
        }
        let state = self.run(
            "inspect container",
            &["container", "inspect", "--format", "{{.State.Running}}", name],
        )?;
        Ok(state.trim() == "true")
    }

    fn remove_container(&self, name: &str, force: bool) -> RuntimeResult<()> {
        let mut args = vec!["rm"];
        if force {
            args.push("--force");
        }
        args.push(name);
        self.run("remove container", &args)?;
        debug!(container = name, "container removed");
        Ok(())
    }

    fn tail_logs(&self, name: &str, lines: usize) -> RuntimeResult<String> {
        let tail = lines.to_string();
        let output = self.output("read logs", &["logs", "--tail", &tail, name])?;

        if !output.status.success() {
            return Err(RuntimeError::new("read logs", failure_message(&output)));
        }

        // container stderr is replayed on our stderr
        let mut logs = String::from_utf8_lossy(&output.stdout).into_owned();
        logs.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(logs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_missing_binary() {
        let err = Podman::detect("vpnpod-no-such-runtime-binary", false).unwrap_err();
        assert_eq!(err.operation, "locate runtime");
        assert!(err.message.contains("not found"));
    }

    #[test]
    fn test_spawn_failure_is_runtime_error() {
        let podman = Podman::with_binary("/nonexistent/vpnpod/podman", false);
        let err = podman.create_pod("work").unwrap_err();
        assert_eq!(err.operation, "create pod");
        assert!(err.message.contains("failed to spawn"));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_zero_exit_is_runtime_error() {
        // `false` ignores its arguments and exits 1
        let podman = Podman::with_binary("false", false);
        let err = podman.remove_container("work-vpn", true).unwrap_err();
        assert_eq!(err.operation, "remove container");
        assert!(err.message.contains("exited with"));
    }

    #[cfg(unix)]
    #[test]
    fn test_exists_maps_exit_one_to_false() {
        let podman = Podman::with_binary("false", false);
        assert!(!podman.pod_exists("work").unwrap());

        let podman = Podman::with_binary("true", false);
        assert!(podman.pod_exists("work").unwrap());
    }

    #[test]
    fn test_sudo_never_prompts() {
        let podman = Podman::with_binary("/usr/bin/podman", true);
        let cmd = podman.command();

        assert_eq!(cmd.get_program(), "sudo");
        let args: Vec<_> = cmd.get_args().collect();
        assert_eq!(args, vec!["-n", "/usr/bin/podman"]);
    }

    #[test]
    fn test_plain_command_runs_binary() {
        let podman = Podman::with_binary("/usr/bin/podman", false);
        let cmd = podman.command();

        assert_eq!(cmd.get_program(), "/usr/bin/podman");
        assert_eq!(cmd.get_args().count(), 0);
    }
}
