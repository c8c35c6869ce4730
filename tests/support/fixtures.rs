//! Test fixtures and constants.

use vpnpod::core::constants;

/// Pod name used by the standard scenario.
pub const POD: &str = "work";

/// Derived container names for [`POD`].
pub const GATEWAY: &str = "work-vpn";
pub const CLIENT: &str = "work-client";

pub const USERNAME: &str = "alice";
pub const PASSWORD: &str = "hunter2-correct-horse";

/// Address the host reaches the internet from.
pub const HOST_ADDRESS: &str = "203.0.113.10";

/// Address of the VPN exit.
pub const TUNNEL_ADDRESS: &str = "198.51.100.77";

/// Minimal OpenVPN profile with an auth directive to be rewritten.
pub const SAMPLE_OVPN: &str = "\
client
dev tun
proto udp
remote vpn.example.com 1194
auth-user-pass
";

/// Gateway output once the tunnel is up.
pub fn ready_logs() -> String {
    format!(
        "OpenVPN 2.6.8 x86_64-alpine-linux-musl\nPeer Connection Initiated\n{}\n",
        constants::VPN_READY_MARKER
    )
}

/// Gateway output after a rejected login.
pub const AUTH_FAILED_LOGS: &str = "\
OpenVPN 2.6.8 x86_64-alpine-linux-musl
AUTH: Received control message: AUTH_FAILED
SIGTERM[soft,auth-failure] received, process exiting
";
