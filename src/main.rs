//! vpnpod - run a client container behind an OpenVPN gateway pod.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vpnpod::cli::output;
use vpnpod::cli::{execute, Cli};
use vpnpod::core::constants;
use vpnpod::error::{Error, ValidationError};

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_env(constants::LOG_ENV).unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("vpnpod=debug")
        } else {
            EnvFilter::new("vpnpod=warn")
        }
    });

    let registry = tracing_subscriber::registry().with(filter);
    if cli.log_json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .without_time()
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    if let Err(e) = execute(cli.command, cli.config) {
        let suggestion = match &e {
            Error::Validation(ValidationError::PodExists(pod)) => {
                Some(format!("run: vpnpod down {}", pod))
            }
            Error::Validation(ValidationError::Empty(field)) => {
                Some(format!("pass the {} as a flag when not running in a terminal", field))
            }
            _ => None,
        };

        output::error(&e.to_string());
        if let Some(hint) = suggestion {
            output::hint(&hint);
        }
        std::process::exit(e.exit_code());
    }
}
