//! Input validation for vpnpod operations.
//!
//! Validates pod names before anything is created.

use crate::core::constants;
use crate::error::{Result, ValidationError};

/// Validate a pod name.
///
/// Pod names must be usable as runtime object names:
/// - Cannot be empty
/// - At most 63 characters
/// - Start with an ASCII letter or digit
/// - Only letters, digits, `_`, `.` and `-`
///
/// # Errors
///
/// Returns `ValidationError` if the name is invalid.
pub fn validate_pod_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ValidationError::Empty("pod name").into());
    }

    let invalid = |reason: String| -> crate::error::Error {
        ValidationError::InvalidPodName {
            name: name.to_string(),
            reason,
        }
        .into()
    };

    if name.len() > constants::MAX_POD_NAME_LEN {
        return Err(invalid(format!(
            "longer than {} characters",
            constants::MAX_POD_NAME_LEN
        )));
    }

    if let Some(first) = name.chars().next() {
        if !first.is_ascii_alphanumeric() {
            return Err(invalid("must start with a letter or digit".to_string()));
        }
    }

    for (i, ch) in name.chars().enumerate() {
        if !ch.is_ascii_alphanumeric() && !matches!(ch, '_' | '.' | '-') {
            return Err(invalid(format!(
                "invalid character '{}' at position {}",
                ch,
                i + 1
            )));
        }
    }

    Ok(())
}
