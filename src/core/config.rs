//! Settings file management.
//!
//! Reads the optional `config.toml` that tunes images, probe and readiness
//! budgets. Every field has a default, so a missing default file is fine.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::core::constants;
use crate::core::readiness::Budget;
use crate::error::{ConfigError, Result};

/// All tunable settings
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub runtime: RuntimeSettings,
    pub gateway: GatewaySettings,
    pub client: ClientSettings,
    pub probe: ProbeSettings,
    pub settle: SettleSettings,
    pub verify: VerifySettings,
}

/// How the container runtime is invoked
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeSettings {
    /// Runtime binary, looked up on `PATH`
    pub binary: String,
    /// Prefix every call with `sudo`
    pub sudo: bool,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            binary: "podman".to_string(),
            sudo: false,
        }
    }
}

/// VPN gateway container
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GatewaySettings {
    /// Image providing `sh`, `openvpn` and `curl`
    pub image: String,
    pub entrypoint: String,
    pub capabilities: Vec<String>,
    pub devices: Vec<String>,
    /// In-memory mounts; the config and credential paths live here
    pub tmpfs: Vec<String>,
    /// In-container path of the prepared VPN config
    pub config_path: String,
    /// In-container path the credential is delivered to
    pub credential_path: String,
    /// Log line that means the VPN client finished authenticating
    pub ready_marker: String,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            image: "docker.io/dperson/openvpn-client:latest".to_string(),
            entrypoint: "/bin/sh".to_string(),
            capabilities: vec!["NET_ADMIN".to_string()],
            devices: vec!["/dev/net/tun".to_string()],
            tmpfs: vec!["/vpn".to_string()],
            config_path: "/vpn/client.ovpn".to_string(),
            credential_path: "/vpn/auth.txt".to_string(),
            ready_marker: constants::VPN_READY_MARKER.to_string(),
        }
    }
}

/// Chat client container
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientSettings {
    pub image: String,
    /// Arguments after the image; empty keeps the image default
    pub command: Vec<String>,
    /// User the client runs (and is probed) as
    pub user: String,
    /// Where the host config directory appears inside the container
    pub config_mount: String,
    /// Host directory with the client's own configuration. Survives runs.
    pub config_dir: Option<PathBuf>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            image: "docker.io/weechat/weechat:latest-alpine".to_string(),
            command: Vec::new(),
            user: "user".to_string(),
            config_mount: "/home/user/.weechat".to_string(),
            config_dir: None,
        }
    }
}

impl ClientSettings {
    /// Configured host directory, or `<config dir>/vpnpod/client`.
    pub fn resolved_config_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.config_dir {
            return Ok(dir.clone());
        }
        let base = dirs::config_dir().ok_or_else(|| ConfigError::InvalidValue {
            field: "client.config_dir",
            reason: "unable to determine config directory".to_string(),
        })?;
        Ok(base.join(constants::APP_DIR).join("client"))
    }
}

/// Address-echo probe
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProbeSettings {
    pub url: String,
    pub timeout_secs: u64,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            url: "https://ifconfig.me".to_string(),
            timeout_secs: constants::MAX_PROBE_TIMEOUT_SECS,
        }
    }
}

impl ProbeSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Readiness polling budgets
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettleSettings {
    pub interval_ms: u64,
    /// Polls while waiting for a container to reach the running state
    pub start_attempts: u32,
    /// Polls while waiting for the VPN client to authenticate
    pub auth_attempts: u32,
    /// Polls while waiting for the gateway to leave through the tunnel
    pub tunnel_attempts: u32,
}

impl Default for SettleSettings {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            start_attempts: 30,
            auth_attempts: 60,
            tunnel_attempts: 20,
        }
    }
}

impl SettleSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn start_budget(&self) -> Budget {
        Budget::new(self.start_attempts, self.interval())
    }

    pub fn auth_budget(&self) -> Budget {
        Budget::new(self.auth_attempts, self.interval())
    }

    pub fn tunnel_budget(&self) -> Budget {
        Budget::new(self.tunnel_attempts, self.interval())
    }
}

/// Verification policy
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VerifySettings {
    /// Continue when gateway and host report the same address
    pub allow_same_address: bool,
}

impl Settings {
    /// Default settings file location (`<config dir>/vpnpod/config.toml`).
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(constants::APP_DIR).join(constants::SETTINGS_FILE))
    }

    /// Load settings.
    ///
    /// With an explicit path the file must exist. Without one, the default
    /// location is used if present and defaults otherwise.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read, parsed or validated.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound(path.display().to_string()).into());
                }
                path.to_path_buf()
            }
            None => match Self::default_path() {
                Some(path) if path.exists() => path,
                _ => {
                    debug!("no settings file, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        debug!(path = %path.display(), "loading settings");
        let contents = std::fs::read_to_string(&path).map_err(ConfigError::ReadFile)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate settings from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let settings: Self = toml::from_str(contents).map_err(ConfigError::Parse)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate value ranges.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` on the first bad field.
    pub fn validate(&self) -> Result<()> {
        fn invalid(field: &'static str, reason: &str) -> crate::error::Error {
            ConfigError::InvalidValue {
                field,
                reason: reason.to_string(),
            }
            .into()
        }

        if self.runtime.binary.trim().is_empty() {
            return Err(invalid("runtime.binary", "cannot be empty"));
        }
        if self.gateway.image.trim().is_empty() {
            return Err(invalid("gateway.image", "cannot be empty"));
        }
        if self.client.image.trim().is_empty() {
            return Err(invalid("client.image", "cannot be empty"));
        }
        if self.probe.timeout_secs == 0 || self.probe.timeout_secs > constants::MAX_PROBE_TIMEOUT_SECS {
            return Err(invalid(
                "probe.timeout_secs",
                &format!("must be between 1 and {}", constants::MAX_PROBE_TIMEOUT_SECS),
            ));
        }
        if self.probe.url.trim().is_empty() {
            return Err(invalid("probe.url", "cannot be empty"));
        }
        if self.settle.interval_ms == 0 {
            return Err(invalid("settle.interval_ms", "must be positive"));
        }
        if self.settle.start_attempts == 0
            || self.settle.auth_attempts == 0
            || self.settle.tunnel_attempts == 0
        {
            return Err(invalid("settle", "attempt budgets must be positive"));
        }
        if !self.gateway.credential_path.starts_with('/') || !self.gateway.config_path.starts_with('/') {
            return Err(invalid("gateway", "in-container paths must be absolute"));
        }

        Ok(())
    }
}
