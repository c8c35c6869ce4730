//! Core library components.
//!
//! Provisioning logic independent of the terminal: the secret vault, the
//! runtime facade, the resource ledger, the network probe and the
//! orchestrator that drives them.

pub mod cipher;
pub mod config;
pub mod constants;
pub mod domain;
pub mod ledger;
pub mod openvpn;
pub mod orchestrator;
pub mod probe;
pub mod readiness;
pub mod runtime;
pub mod validation;
pub mod vault;
