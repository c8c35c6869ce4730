//! Error types.
//!
//! Every failure a provisioning run can hit, grouped by concern. The
//! orchestrator treats all of them as terminal for the run.

use thiserror::Error;

/// Top-level error for vpnpod operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error(transparent)]
    Verification(#[from] VerificationFailure),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("interrupted")]
    Interrupted,

    #[error("prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Process exit code for this error.
    ///
    /// `130` for an interrupt (conventional SIGINT status), `1` otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Interrupted => 130,
            _ => 1,
        }
    }

    /// Whether this error came from an external interrupt.
    pub fn is_interrupt(&self) -> bool {
        matches!(self, Error::Interrupted)
    }
}

/// Invalid user input, caught before any resource exists.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("{0} cannot be empty")]
    Empty(&'static str),

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("invalid pod name '{name}': {reason}")]
    InvalidPodName { name: String, reason: String },

    #[error("pod already exists: {0}")]
    PodExists(String),

    #[error("vpn config not found: {0}")]
    ConfigMissing(String),

    #[error("invalid vpn config {path}: {reason}")]
    ConfigInvalid { path: String, reason: String },

    #[error("aborted by user")]
    Declined,
}

/// Sealing, unsealing and scratch-area failures.
#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("malformed credential: {0}")]
    Malformed(String),

    #[error("scratch area error: {0}")]
    Scratch(String),
}

/// A container runtime call failed.
#[derive(Error, Debug)]
#[error("{operation} failed: {message}")]
pub struct RuntimeError {
    /// Runtime operation that failed (e.g. `create pod`)
    pub operation: String,
    /// Text reported by the runtime or the process launcher
    pub message: String,
}

impl RuntimeError {
    pub fn new(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

/// One of the network checks did not pass.
#[derive(Error, Debug)]
pub enum VerificationFailure {
    #[error("gateway has no external address (tunnel down or echo service unreachable)")]
    GatewayUnavailable { logs: Option<String> },

    #[error("gateway exits through the host address {address}")]
    SameAddress { address: String },

    #[error("client container has no external address")]
    ClientUnavailable,

    #[error("client exits through {client}, gateway through {gateway}")]
    NamespaceMismatch { client: String, gateway: String },

    #[error("{what} not ready after {attempts} attempts")]
    NotReady {
        what: String,
        attempts: u32,
        logs: Option<String>,
    },
}

impl VerificationFailure {
    /// Gateway log tail attached for diagnosis, if any was collected.
    pub fn logs(&self) -> Option<&str> {
        match self {
            VerificationFailure::GatewayUnavailable { logs }
            | VerificationFailure::NotReady { logs, .. } => logs.as_deref(),
            _ => None,
        }
    }
}

/// Settings file errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("settings file not found: {0}")]
    NotFound(String),

    #[error("failed to read settings: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
