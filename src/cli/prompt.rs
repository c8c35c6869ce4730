//! Terminal prompts.
//!
//! Collects the run's answers from flags first and the terminal second.
//! Without a terminal every answer must come from a flag.

use std::io::{self, IsTerminal};
use std::path::PathBuf;

use dialoguer::{Confirm, Input, Password};
use zeroize::Zeroizing;

use crate::cli::output;
use crate::core::domain::Credential;
use crate::core::orchestrator::{Plan, Prompter};
use crate::error::{Error, Result, ValidationError};

/// Answers supplied up front
#[derive(Default)]
pub struct Answers {
    pub username: Option<String>,
    pub password: Option<Zeroizing<String>>,
    pub vpn_config: Option<PathBuf>,
    pub pod: Option<String>,
    /// Skip the confirmation gate
    pub yes: bool,
}

/// Prompter backed by `dialoguer`
pub struct TerminalPrompter {
    answers: Answers,
    interactive: bool,
}

impl TerminalPrompter {
    pub fn new(answers: Answers) -> Self {
        Self {
            answers,
            interactive: io::stdin().is_terminal(),
        }
    }

    fn text(&self, given: Option<&String>, prompt: &str, field: &'static str) -> Result<String> {
        if let Some(value) = given {
            return Ok(value.clone());
        }
        if !self.interactive {
            return Err(ValidationError::Empty(field).into());
        }
        Ok(Input::<String>::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
            .map_err(prompt_error)?)
    }
}

/// Ctrl+C inside a prompt surfaces as an interrupted read.
fn prompt_error(e: dialoguer::Error) -> Error {
    match e {
        dialoguer::Error::IO(io) if io.kind() == io::ErrorKind::Interrupted => Error::Interrupted,
        other => other.into(),
    }
}

/// Expand a leading `~/` to the home directory.
fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

impl Prompter for TerminalPrompter {
    fn credentials(&self) -> Result<Credential> {
        let username = self.text(self.answers.username.as_ref(), "VPN username", "username")?;

        let password = match &self.answers.password {
            Some(p) => p.clone(),
            None if self.interactive => Zeroizing::new(
                Password::new()
                    .with_prompt("VPN password")
                    .allow_empty_password(true)
                    .interact()
                    .map_err(prompt_error)?,
            ),
            None => return Err(ValidationError::Empty("password").into()),
        };

        Credential::new(username.trim(), password.as_str())
    }

    fn vpn_config_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.answers.vpn_config {
            return Ok(path.clone());
        }
        let raw = self.text(None, "OpenVPN config file", "vpn config path")?;
        Ok(expand_home(raw.trim()))
    }

    fn pod_name(&self) -> Result<String> {
        if let Some(pod) = &self.answers.pod {
            return Ok(pod.clone());
        }
        if !self.interactive {
            return Err(ValidationError::Empty("pod name").into());
        }

        let suggestion = chrono::Local::now().format("vpn-%Y%m%d").to_string();
        Ok(Input::<String>::new()
            .with_prompt("Pod name")
            .default(suggestion)
            .interact_text()
            .map_err(prompt_error)?)
    }

    fn confirm(&self, plan: &Plan) -> Result<bool> {
        output::section("Plan");
        output::kv("pod     ", &plan.names.pod);
        output::kv("gateway ", format!("{} ({})", plan.names.gateway, plan.gateway_image));
        output::kv("client  ", format!("{} ({})", plan.names.client, plan.client_image));
        output::kv("config  ", plan.vpn_config.display());
        output::kv("data    ", plan.client_config_dir.display());
        output::blank();

        if self.answers.yes {
            return Ok(true);
        }
        if !self.interactive {
            output::hint("pass --yes to confirm without a terminal");
            return Ok(false);
        }

        Ok(Confirm::new()
            .with_prompt("Create these resources?")
            .default(false)
            .interact()
            .map_err(prompt_error)?)
    }
}
