//! Credential type.
//!
//! VPN username and password in plaintext. Lives only long enough to be
//! sealed or delivered; the password is wiped from memory on drop.

use zeroize::Zeroizing;

use crate::error::{CryptoError, Result, ValidationError};

/// Plaintext VPN credentials
#[derive(Clone)]
pub struct Credential {
    username: String,
    password: Zeroizing<String>,
}

impl Credential {
    /// Build a credential from collected input.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::Empty` if either field is blank.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        let username = username.into();
        let password = Zeroizing::new(password.into());

        if username.trim().is_empty() {
            return Err(ValidationError::Empty("username").into());
        }
        if password.is_empty() {
            return Err(ValidationError::Empty("password").into());
        }
        if username.contains('\n') || password.contains('\n') {
            return Err(ValidationError::Invalid {
                field: "credentials",
                reason: "cannot contain newlines".to_string(),
            }
            .into());
        }

        Ok(Self { username, password })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// Serialize in the two-line `auth-user-pass` file format.
    pub fn to_auth_file(&self) -> Zeroizing<Vec<u8>> {
        let mut buf = Zeroizing::new(Vec::with_capacity(
            self.username.len() + self.password.len() + 2,
        ));
        buf.extend_from_slice(self.username.as_bytes());
        buf.push(b'\n');
        buf.extend_from_slice(self.password.as_bytes());
        buf.push(b'\n');
        buf
    }

    /// Parse the two-line `auth-user-pass` format.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::Malformed` if the payload is not UTF-8 or is
    /// missing a line.
    pub fn from_auth_file(bytes: &[u8]) -> Result<Self> {
        let text = Zeroizing::new(
            std::str::from_utf8(bytes)
                .map_err(|e| CryptoError::Malformed(format!("UTF-8 error: {}", e)))?
                .to_string(),
        );

        let mut lines = text.lines();
        let username = lines
            .next()
            .ok_or_else(|| CryptoError::Malformed("missing username".into()))?;
        let password = lines
            .next()
            .ok_or_else(|| CryptoError::Malformed("missing password".into()))?;

        Self::new(username, password)
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
