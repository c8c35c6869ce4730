//! Container runtime client.
//!
//! A synchronous facade over the external container runtime. Every call
//! either succeeds or returns a [`RuntimeError`]; nothing retries here,
//! retry policy belongs to the orchestrator.

use std::path::{Path, PathBuf};

use crate::error::RuntimeError;

mod podman;

pub use podman::Podman;

/// Result of a runtime call.
pub type RuntimeResult<T> = std::result::Result<T, RuntimeError>;

/// Container runtime operations used by provisioning and teardown.
pub trait Runtime {
    /// Create an empty pod.
    fn create_pod(&self, name: &str) -> RuntimeResult<()>;

    /// Remove a pod, and with `force` any containers still inside it.
    fn remove_pod(&self, name: &str, force: bool) -> RuntimeResult<()>;

    /// Whether a pod with this name exists.
    fn pod_exists(&self, name: &str) -> RuntimeResult<bool>;

    /// Start a detached container from `spec`.
    fn run_container(&self, spec: &ContainerSpec) -> RuntimeResult<()>;

    /// Run a command inside a running container and return its stdout.
    ///
    /// A non-zero exit status is an error.
    fn exec_in_container(
        &self,
        name: &str,
        command: &[&str],
        user: Option<&str>,
    ) -> RuntimeResult<String>;

    /// Copy a host file into a container.
    fn copy_into_container(&self, name: &str, local: &Path, remote: &str) -> RuntimeResult<()>;

    /// Whether a container with this name exists.
    fn container_exists(&self, name: &str) -> RuntimeResult<bool>;

    /// Whether the container exists and is in the running state.
    fn container_running(&self, name: &str) -> RuntimeResult<bool>;

    /// Remove a container, and with `force` stop it first.
    fn remove_container(&self, name: &str, force: bool) -> RuntimeResult<()>;

    /// Last `lines` lines of the container's output.
    fn tail_logs(&self, name: &str, lines: usize) -> RuntimeResult<String>;
}

/// Bind mount from the host into a container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mount {
    pub host: PathBuf,
    pub container: String,
}

impl Mount {
    pub fn new(host: impl Into<PathBuf>, container: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            container: container.into(),
        }
    }

    /// `host:container` volume argument
    pub fn to_arg(&self) -> String {
        format!("{}:{}", self.host.display(), self.container)
    }
}

/// Everything needed to start one container in a pod
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerSpec {
    pub name: String,
    pub pod: String,
    pub image: String,
    pub entrypoint: Option<String>,
    pub command: Vec<String>,
    pub capabilities: Vec<String>,
    pub devices: Vec<String>,
    pub mounts: Vec<Mount>,
    /// In-memory filesystems mounted at these container paths
    pub tmpfs: Vec<String>,
    pub user: Option<String>,
}

impl ContainerSpec {
    pub fn new(
        name: impl Into<String>,
        pod: impl Into<String>,
        image: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            pod: pod.into(),
            image: image.into(),
            ..Self::default()
        }
    }

    /// Arguments after the runtime binary for `run`.
    pub fn run_args(&self) -> Vec<String> {
        let mut args = vec![
            "run".to_string(),
            "--detach".to_string(),
            "--name".to_string(),
            self.name.clone(),
            "--pod".to_string(),
            self.pod.clone(),
        ];

        for cap in &self.capabilities {
            args.push("--cap-add".to_string());
            args.push(cap.clone());
        }
        for device in &self.devices {
            args.push("--device".to_string());
            args.push(device.clone());
        }
        for mount in &self.mounts {
            args.push("--volume".to_string());
            args.push(mount.to_arg());
        }
        for path in &self.tmpfs {
            args.push("--tmpfs".to_string());
            args.push(format!("{}:rw,mode=0700", path));
        }
        if let Some(user) = &self.user {
            args.push("--user".to_string());
            args.push(user.clone());
        }
        if let Some(entrypoint) = &self.entrypoint {
            args.push("--entrypoint".to_string());
            args.push(entrypoint.clone());
        }

        args.push(self.image.clone());
        args.extend(self.command.iter().cloned());
        args
    }
}
