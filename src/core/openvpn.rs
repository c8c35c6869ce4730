//! VPN client configuration.
//!
//! Prepares a user-supplied OpenVPN config for the gateway container: the
//! credential directive is pointed at the delivered file and the client is
//! told not to cache the password.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, ValidationError};

/// A prepared, non-secret VPN client config
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VpnConfig {
    source: PathBuf,
    contents: String,
}

impl VpnConfig {
    /// Read and prepare the config at `path`.
    ///
    /// Removes existing `auth-user-pass` and `auth-nocache` directives and
    /// any inline `<auth-user-pass>` block, then appends
    /// `auth-user-pass <credential_path>` and `auth-nocache`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::ConfigMissing` if the file does not exist,
    /// or `ValidationError::ConfigInvalid` if it is unreadable, not UTF-8 or
    /// has no `remote` directive.
    pub fn prepare(path: &Path, credential_path: &str) -> Result<Self> {
        if path.as_os_str().is_empty() {
            return Err(ValidationError::Empty("vpn config path").into());
        }
        if !path.is_file() {
            return Err(ValidationError::ConfigMissing(path.display().to_string()).into());
        }

        let invalid = |reason: String| -> crate::error::Error {
            ValidationError::ConfigInvalid {
                path: path.display().to_string(),
                reason,
            }
            .into()
        };

        let raw = std::fs::read(path).map_err(|e| invalid(e.to_string()))?;
        let text = String::from_utf8(raw).map_err(|_| invalid("not UTF-8 text".to_string()))?;

        let contents = rewrite(&text, credential_path);
        if !contents.lines().any(|l| directive(l) == Some("remote")) {
            return Err(invalid("no remote directive".to_string()));
        }

        debug!(path = %path.display(), bytes = contents.len(), "vpn config prepared");

        Ok(Self {
            source: path.to_path_buf(),
            contents,
        })
    }

    /// File the config was read from
    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn contents(&self) -> &str {
        &self.contents
    }
}

/// First word of a config line, ignoring comments.
fn directive(line: &str) -> Option<&str> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
        return None;
    }
    line.split_whitespace().next()
}

fn rewrite(text: &str, credential_path: &str) -> String {
    let mut out = String::with_capacity(text.len() + 64);
    let mut in_inline_auth = false;

    for line in text.lines() {
        let trimmed = line.trim();

        if in_inline_auth {
            if trimmed == "</auth-user-pass>" {
                in_inline_auth = false;
            }
            continue;
        }
        if trimmed == "<auth-user-pass>" {
            in_inline_auth = true;
            continue;
        }
        if matches!(directive(line), Some("auth-user-pass") | Some("auth-nocache")) {
            continue;
        }

        out.push_str(line);
        out.push('\n');
    }

    out.push_str(&format!("auth-user-pass {}\n", credential_path));
    out.push_str("auth-nocache\n");
    out
}
