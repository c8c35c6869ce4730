//! Cryptographic operations.
//!
//! Provides the encryption/decryption abstraction used by the secret vault.
//!
//! ## Backends
//!
//! - **age**: x25519 key agreement with ChaCha20-Poly1305 payload
//!   encryption. Authenticated, so tampering is detected on decrypt.

use zeroize::Zeroizing;

use crate::error::Result;

mod age;

pub use self::age::Age;

/// Cryptographic backend trait.
///
/// Abstracts encryption and decryption so the vault does not depend on a
/// particular primitive.
pub trait Cipher {
    /// Private key material. Must erase itself on drop.
    type Key;

    /// Generate a fresh random key.
    fn generate_key(&self) -> Self::Key;

    /// Encrypt plaintext to the given key.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::EncryptionFailed` if the primitive fails.
    fn encrypt(&self, plaintext: &[u8], key: &Self::Key) -> Result<Vec<u8>>;

    /// Decrypt ciphertext with the given key.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::DecryptionFailed` on a wrong key, truncation
    /// or any other authentication failure.
    fn decrypt(&self, ciphertext: &[u8], key: &Self::Key) -> Result<Zeroizing<Vec<u8>>>;

    /// Algorithm tag recorded alongside sealed data.
    fn algorithm(&self) -> &'static str;
}
