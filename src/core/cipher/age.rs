//! Age encryption backend implementation.
//!
//! Binary age format with a single x25519 recipient derived from an
//! ephemeral identity.

use std::io::{Read, Write};

use ::age::x25519;
use tracing::trace;
use zeroize::Zeroizing;

use super::Cipher;
use crate::error::{CryptoError, Result};

/// Age-based cryptographic backend using x25519 keys
pub struct Age;

impl Cipher for Age {
    type Key = x25519::Identity;

    fn generate_key(&self) -> x25519::Identity {
        x25519::Identity::generate()
    }

    fn encrypt(&self, plaintext: &[u8], key: &x25519::Identity) -> Result<Vec<u8>> {
        trace!(plaintext_len = plaintext.len(), "encrypting");

        let recipient = key.to_public();
        let encryptor =
            ::age::Encryptor::with_recipients(std::iter::once(&recipient as &dyn ::age::Recipient))
                .map_err(|e| CryptoError::EncryptionFailed(format!("{}", e)))?;

        let mut encrypted = Vec::new();
        let mut writer = encryptor
            .wrap_output(&mut encrypted)
            .map_err(|e| CryptoError::EncryptionFailed(format!("{}", e)))?;

        writer
            .write_all(plaintext)
            .map_err(|e| CryptoError::EncryptionFailed(format!("{}", e)))?;
        writer
            .finish()
            .map_err(|e| CryptoError::EncryptionFailed(format!("{}", e)))?;

        trace!(ciphertext_len = encrypted.len(), "encrypted");
        Ok(encrypted)
    }

    fn decrypt(&self, ciphertext: &[u8], key: &x25519::Identity) -> Result<Zeroizing<Vec<u8>>> {
        trace!(ciphertext_len = ciphertext.len(), "decrypting");

        let decryptor = ::age::Decryptor::new(ciphertext)
            .map_err(|e| CryptoError::DecryptionFailed(format!("{}", e)))?;

        let mut decrypted = Zeroizing::new(Vec::new());
        let mut reader = decryptor
            .decrypt(std::iter::once(key as &dyn ::age::Identity))
            .map_err(|e| CryptoError::DecryptionFailed(format!("{}", e)))?;

        reader
            .read_to_end(&mut decrypted)
            .map_err(|e| CryptoError::DecryptionFailed(format!("{}", e)))?;

        trace!(plaintext_len = decrypted.len(), "decrypted");
        Ok(decrypted)
    }

    fn algorithm(&self) -> &'static str {
        "age-x25519-chacha20poly1305"
    }
}
