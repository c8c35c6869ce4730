//! Network verification probe.
//!
//! Asks an address-echo service which public address a request arrives
//! from, issued from the host or from inside a container, and compares the
//! answers to certify that the gateway is tunneled and that the client
//! shares its network path.

use std::process::{Command, Stdio};
use std::time::Duration;

use tracing::{debug, trace};

use crate::core::domain::{Address, Origin};
use crate::core::runtime::Runtime;

/// Anything that can report the external address seen from an origin.
pub trait AddressSource {
    /// External address seen from `origin`.
    ///
    /// Timeouts, non-zero exits and empty bodies are all `Unavailable`.
    fn external_address(&self, origin: &Origin) -> Address;
}

/// Probe backed by `curl`, run on the host or through the runtime.
pub struct EchoProbe<'a> {
    runtime: &'a dyn Runtime,
    url: String,
    timeout: Duration,
}

impl<'a> EchoProbe<'a> {
    pub fn new(runtime: &'a dyn Runtime, url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            runtime,
            url: url.into(),
            timeout,
        }
    }

    fn from_host(&self) -> Address {
        let args = curl_args(&self.url, self.timeout);
        let output = Command::new(&args[0])
            .args(&args[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output();

        match output {
            Ok(out) if out.status.success() => Address::from_body(&String::from_utf8_lossy(&out.stdout)),
            Ok(out) => {
                debug!(status = %out.status, "host echo query failed");
                Address::Unavailable
            }
            Err(e) => {
                debug!(error = %e, "host echo query could not start");
                Address::Unavailable
            }
        }
    }

    fn from_container(&self, name: &str, user: Option<&str>) -> Address {
        let args = curl_args(&self.url, self.timeout);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();

        match self.runtime.exec_in_container(name, &args, user) {
            Ok(body) => Address::from_body(&body),
            Err(e) => {
                debug!(container = name, error = %e, "container echo query failed");
                Address::Unavailable
            }
        }
    }
}

/// `curl` invocation bounded by `timeout` (whole seconds, at least one).
fn curl_args(url: &str, timeout: Duration) -> Vec<String> {
    let secs = timeout.as_secs().max(1).to_string();
    vec![
        "curl".to_string(),
        "--silent".to_string(),
        "--fail".to_string(),
        "--max-time".to_string(),
        secs.clone(),
        "--connect-timeout".to_string(),
        secs,
        url.to_string(),
    ]
}

impl AddressSource for EchoProbe<'_> {
    fn external_address(&self, origin: &Origin) -> Address {
        let address = match origin {
            Origin::Host => self.from_host(),
            Origin::Container { name, user } => self.from_container(name, user.as_deref()),
        };
        trace!(%origin, %address, "echo query");
        address
    }
}

/// Outcome of comparing the gateway's address with the host's
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TunnelVerdict {
    /// Gateway resolvable and different from the host.
    Established { host: Address, gateway: String },
    /// Both report the same address. Not proof either way.
    SameAddress(String),
    /// Gateway could not reach the echo service.
    GatewayUnavailable { host: Address },
}

impl TunnelVerdict {
    pub fn passed(&self) -> bool {
        matches!(self, TunnelVerdict::Established { .. })
    }
}

/// Reasons two equal addresses may not mean the tunnel is broken.
pub const SAME_ADDRESS_EXPLANATIONS: [&str; 3] = [
    "the tunnel is not up yet",
    "the host itself is already routed through a VPN",
    "the VPN config does not redirect the default route",
];

/// Compare host and gateway addresses.
pub fn check_tunnel(source: &dyn AddressSource, gateway: &str) -> TunnelVerdict {
    let host = source.external_address(&Origin::Host);
    let gw = source.external_address(&Origin::container(gateway));
    tunnel_verdict(host, gw)
}

/// Verdict for an already collected pair of addresses.
pub fn tunnel_verdict(host: Address, gateway: Address) -> TunnelVerdict {
    match gateway {
        Address::Unavailable => TunnelVerdict::GatewayUnavailable { host },
        Address::Resolved(gw) => {
            if host.as_str() == Some(gw.as_str()) {
                TunnelVerdict::SameAddress(gw)
            } else {
                TunnelVerdict::Established { host, gateway: gw }
            }
        }
    }
}

/// Outcome of comparing the client's address with the gateway's
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamespaceVerdict {
    Shared(String),
    ClientUnavailable,
    GatewayUnavailable,
    Mismatch { client: String, gateway: String },
}

impl NamespaceVerdict {
    pub fn passed(&self) -> bool {
        matches!(self, NamespaceVerdict::Shared(_))
    }
}

/// Compare the client container's address with the gateway's.
pub fn check_namespace(
    source: &dyn AddressSource,
    client: &str,
    user: Option<&str>,
    gateway: &str,
) -> NamespaceVerdict {
    let client_origin = match user {
        Some(user) => Origin::container_as(client, user),
        None => Origin::container(client),
    };
    let client_addr = source.external_address(&client_origin);
    let gateway_addr = source.external_address(&Origin::container(gateway));

    match (client_addr, gateway_addr) {
        (Address::Unavailable, _) => NamespaceVerdict::ClientUnavailable,
        (_, Address::Unavailable) => NamespaceVerdict::GatewayUnavailable,
        (Address::Resolved(c), Address::Resolved(g)) if c == g => NamespaceVerdict::Shared(c),
        (Address::Resolved(client), Address::Resolved(gateway)) => {
            NamespaceVerdict::Mismatch { client, gateway }
        }
    }
}
