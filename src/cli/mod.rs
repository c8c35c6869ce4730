//! Command-line interface.

pub mod down;
pub mod output;
pub mod prompt;
pub mod signal;
pub mod up;
pub mod verify;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use zeroize::Zeroizing;

use crate::core::config::Settings;
use crate::core::constants;
use crate::error::Result;
use prompt::Answers;

/// vpnpod - run a client container behind an OpenVPN gateway pod.
#[derive(Parser)]
#[command(
    name = "vpnpod",
    about = "Run a client container behind an OpenVPN gateway pod",
    version,
    after_help = "Everything created is rolled back if a step fails or you press Ctrl+C."
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Settings file (defaults to the user config directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Command {
    /// Provision a gateway pod and a client sharing its network
    Up {
        /// VPN username
        #[arg(short, long)]
        username: Option<String>,

        /// VPN password
        #[arg(long, env = constants::PASSWORD_ENV, hide_env_values = true)]
        password: Option<String>,

        /// OpenVPN configuration file
        #[arg(long, value_name = "PATH")]
        vpn_config: Option<PathBuf>,

        /// Pod name
        #[arg(short, long)]
        pod: Option<String>,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Remove a pod and its containers
    Down {
        /// Pod name
        pod: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Re-check the tunnel of an existing pod
    Verify {
        /// Pod name
        pod: String,
    },
}

/// Execute a command.
pub fn execute(command: Command, config: Option<PathBuf>) -> Result<()> {
    let settings = Settings::load(config.as_deref())?;

    match command {
        Command::Up {
            username,
            password,
            vpn_config,
            pod,
            yes,
        } => up::execute(
            &settings,
            Answers {
                username,
                password: password.map(Zeroizing::new),
                vpn_config,
                pod,
                yes,
            },
        ),
        Command::Down { pod, yes } => down::execute(&settings, &pod, yes),
        Command::Verify { pod } => verify::execute(&settings, &pod),
    }
}
