//! vpnpod - VPN gateway pods with transactional rollback.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Command-line interface
//! │   ├── up            # Provision a pod
//! │   ├── down          # Remove a pod
//! │   ├── verify        # Re-run the network checks
//! │   ├── prompt        # Interactive answers
//! │   ├── signal        # Interrupt watcher
//! │   └── output        # Terminal output helpers
//! └── core/             # Core library components
//!     ├── config        # config.toml settings
//!     ├── cipher/       # Encryption backends
//!     ├── vault         # Sealed credentials and scratch area
//!     ├── runtime/      # Container runtime facade
//!     ├── ledger        # Created-resource record
//!     ├── probe         # Address-echo verification
//!     ├── readiness     # Bounded polling
//!     ├── openvpn       # VPN config preparation
//!     └── orchestrator/ # Provisioning state machine and teardown
//! ```
//!
//! # Guarantees
//!
//! - Credentials are sealed under an ephemeral key and never persist in
//!   plaintext
//! - A run only succeeds once traffic is verified to leave through the tunnel
//! - Every created resource is removed, newest first, on failure or interrupt

pub mod cli;
pub mod core;
pub mod error;

pub use crate::core::orchestrator::{Orchestrator, Outcome, Phase, RunState};
pub use crate::core::vault::Vault;
