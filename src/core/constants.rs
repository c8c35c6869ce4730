//! Constants used throughout vpnpod.
//!
//! Centralizes names, paths and defaults shared by several modules.

/// Environment variable holding the tracing filter.
pub const LOG_ENV: &str = "VPNPOD_LOG";

/// Environment variable that pre-answers the password prompt.
pub const PASSWORD_ENV: &str = "VPNPOD_PASSWORD";

/// Settings directory name under the user config dir.
pub const APP_DIR: &str = "vpnpod";

/// Settings file name inside [`APP_DIR`].
pub const SETTINGS_FILE: &str = "config.toml";

/// Prefix for the private scratch directory.
pub const SCRATCH_PREFIX: &str = "vpnpod-";

/// Suffixes appended to the pod name for its containers.
pub const GATEWAY_SUFFIX: &str = "-vpn";
pub const CLIENT_SUFFIX: &str = "-client";

/// Log lines dumped when the gateway cannot be reached.
pub const LOG_TAIL_LINES: usize = 30;

/// Upper bound for a single echo probe.
pub const MAX_PROBE_TIMEOUT_SECS: u64 = 10;

/// Longest pod name the runtime accepts.
pub const MAX_POD_NAME_LEN: usize = 63;

/// Marker OpenVPN prints once the tunnel is authenticated and configured.
pub const VPN_READY_MARKER: &str = "Initialization Sequence Completed";
