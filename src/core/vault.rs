//! Secret vault.
//!
//! Seals collected VPN credentials under an ephemeral key, keeps the
//! ciphertext in a private scratch directory, and hands the plaintext to a
//! container only for the span of a single copy.
//!
//! Plaintext exists at collection, during [`Vault::deliver`], and inside the
//! VPN process. The key never leaves memory and is wiped on drop; the
//! scratch directory is overwritten and removed by [`Vault::erase`].

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use ::age::x25519;
use rand::RngCore;
use tempfile::TempDir;
use tracing::{debug, warn};

use crate::core::cipher::{Age, Cipher};
use crate::core::constants;
use crate::core::domain::Credential;
use crate::core::runtime::Runtime;
use crate::error::{CryptoError, Result};

/// Credentials encrypted at rest in the scratch area.
///
/// The key is held only in memory. Dropping the value overwrites and
/// deletes the ciphertext file.
pub struct SealedCredential {
    path: PathBuf,
    key: x25519::Identity,
    algorithm: &'static str,
}

impl SealedCredential {
    /// Location of the ciphertext
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Algorithm tag
    pub fn algorithm(&self) -> &'static str {
        self.algorithm
    }

    /// Read the ciphertext back from the scratch area.
    pub fn ciphertext(&self) -> Result<Vec<u8>> {
        fs::read(&self.path)
            .map_err(|e| CryptoError::DecryptionFailed(format!("ciphertext unreadable: {}", e)).into())
    }
}

impl std::fmt::Debug for SealedCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SealedCredential")
            .field("path", &self.path)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl Drop for SealedCredential {
    fn drop(&mut self) {
        if self.path.exists() {
            if let Err(e) = shred_file(&self.path) {
                warn!(path = %self.path.display(), error = %e, "failed to destroy sealed credential");
            }
        }
    }
}

/// Where the plaintext credential is delivered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub container: String,
    pub path: String,
}

impl Target {
    pub fn new(container: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            path: path.into(),
        }
    }
}

/// Owner of the scratch area and every credential sealed into it.
pub struct Vault {
    scratch: Mutex<Option<TempDir>>,
    root: PathBuf,
    cipher: Age,
}

impl Vault {
    /// Create a private scratch area in the system temp directory.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::Scratch` if the directory cannot be created.
    pub fn open() -> Result<Self> {
        Self::create(tempfile::Builder::new().prefix(constants::SCRATCH_PREFIX).tempdir())
    }

    /// Create a private scratch area under `parent`.
    pub fn open_in(parent: &Path) -> Result<Self> {
        Self::create(
            tempfile::Builder::new()
                .prefix(constants::SCRATCH_PREFIX)
                .tempdir_in(parent),
        )
    }

    fn create(dir: std::io::Result<TempDir>) -> Result<Self> {
        let dir = dir.map_err(|e| CryptoError::Scratch(format!("cannot create: {}", e)))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(dir.path(), fs::Permissions::from_mode(0o700))
                .map_err(|e| CryptoError::Scratch(format!("cannot restrict: {}", e)))?;
        }

        let root = dir.path().to_path_buf();
        debug!(path = %root.display(), "scratch area created");

        Ok(Self {
            scratch: Mutex::new(Some(dir)),
            root,
            cipher: Age,
        })
    }

    /// Scratch directory path. It no longer exists after [`Vault::erase`].
    pub fn scratch_path(&self) -> &Path {
        &self.root
    }

    /// Whether [`Vault::erase`] has run.
    pub fn is_erased(&self) -> bool {
        self.lock_scratch().is_none()
    }

    fn lock_scratch(&self) -> std::sync::MutexGuard<'_, Option<TempDir>> {
        self.scratch.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Encrypt a credential under a fresh key.
    ///
    /// Takes ownership so the plaintext is dropped (and zeroed) here.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError` if encryption or the scratch write fails.
    pub fn seal(&self, credential: Credential) -> Result<SealedCredential> {
        if self.is_erased() {
            return Err(CryptoError::Scratch("vault already erased".into()).into());
        }

        let key = self.cipher.generate_key();
        let ciphertext = {
            let plaintext = credential.to_auth_file();
            self.cipher.encrypt(&plaintext, &key)?
        };
        drop(credential);

        let file = tempfile::Builder::new()
            .prefix("credential-")
            .suffix(".age")
            .tempfile_in(&self.root)
            .map_err(|e| CryptoError::Scratch(format!("cannot stage ciphertext: {}", e)))?;
        let (mut file, path) = file
            .keep()
            .map_err(|e| CryptoError::Scratch(format!("cannot stage ciphertext: {}", e)))?;
        file.write_all(&ciphertext)
            .and_then(|_| file.sync_all())
            .map_err(|e| CryptoError::Scratch(format!("cannot write ciphertext: {}", e)))?;

        debug!(
            path = %path.display(),
            algorithm = self.cipher.algorithm(),
            ciphertext_len = ciphertext.len(),
            "credential sealed"
        );

        Ok(SealedCredential {
            path,
            key,
            algorithm: self.cipher.algorithm(),
        })
    }

    /// Decrypt a sealed credential.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError` if the ciphertext is missing, truncated, or was
    /// not produced under this key.
    pub fn unseal(&self, sealed: &SealedCredential) -> Result<Credential> {
        let ciphertext = sealed.ciphertext()?;
        let plaintext = self.cipher.decrypt(&ciphertext, &sealed.key)?;
        Credential::from_auth_file(&plaintext)
    }

    /// Unseal and copy the credential into a container, mode 0600.
    ///
    /// The plaintext is staged in the scratch area only for the copy call
    /// and is overwritten and deleted before this returns, on every path.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError` if unsealing fails, or `RuntimeError` if the
    /// copy or the permission change fails.
    pub fn deliver(
        &self,
        sealed: &SealedCredential,
        runtime: &dyn Runtime,
        target: &Target,
    ) -> Result<()> {
        let staged = {
            let credential = self.unseal(sealed)?;
            self.stage(&credential.to_auth_file(), "auth-")?
        };

        let copied = runtime.copy_into_container(&target.container, &staged, &target.path);

        if let Err(e) = shred_file(&staged) {
            warn!(path = %staged.display(), error = %e, "failed to shred staged credential");
        }
        copied?;

        runtime.exec_in_container(&target.container, &["chmod", "600", &target.path], None)?;

        debug!(container = %target.container, path = %target.path, "credential delivered");
        Ok(())
    }

    /// Write non-secret content into the scratch area for a runtime copy.
    ///
    /// The file is removed by [`Vault::erase`].
    pub fn stage_file(&self, contents: &[u8], prefix: &str) -> Result<PathBuf> {
        self.stage(contents, prefix)
    }

    fn stage(&self, contents: &[u8], prefix: &str) -> Result<PathBuf> {
        if self.is_erased() {
            return Err(CryptoError::Scratch("vault already erased".into()).into());
        }

        let file = tempfile::Builder::new()
            .prefix(prefix)
            .tempfile_in(&self.root)
            .map_err(|e| CryptoError::Scratch(format!("cannot stage file: {}", e)))?;
        let (mut file, path) = file
            .keep()
            .map_err(|e| CryptoError::Scratch(format!("cannot stage file: {}", e)))?;

        if let Err(e) = file.write_all(contents).and_then(|_| file.sync_all()) {
            let _ = shred_file(&path);
            return Err(CryptoError::Scratch(format!("cannot write staged file: {}", e)).into());
        }

        Ok(path)
    }

    /// Overwrite the delivered credential with random bytes, then delete it.
    ///
    /// Best-effort: failures are logged and reported as `false`, since the
    /// VPN process has already read the file by the time this runs.
    pub fn purge(runtime: &dyn Runtime, target: &Target) -> bool {
        let shred = runtime.exec_in_container(
            &target.container,
            &["shred", "-u", "-n", "1", &target.path],
            None,
        );

        let result = match shred {
            Ok(_) => Ok(()),
            Err(e) => {
                debug!(error = %e, "shred unavailable, overwriting with dd");
                runtime
                    .exec_in_container(
                        &target.container,
                        &[
                            "sh",
                            "-c",
                            "dd if=/dev/urandom of=\"$1\" bs=1 count=$(wc -c < \"$1\") conv=notrunc && rm -f \"$1\"",
                            "purge",
                            &target.path,
                        ],
                        None,
                    )
                    .map(|_| ())
            }
        };

        match result {
            Ok(()) => {
                debug!(container = %target.container, path = %target.path, "credential purged");
                true
            }
            Err(e) => {
                warn!(
                    container = %target.container,
                    path = %target.path,
                    error = %e,
                    "failed to purge delivered credential"
                );
                false
            }
        }
    }

    /// Overwrite every file in the scratch area and remove it.
    ///
    /// Safe to call more than once; later calls do nothing.
    pub fn erase(&self) {
        let Some(dir) = self.lock_scratch().take() else {
            return;
        };

        match fs::read_dir(dir.path()) {
            Ok(entries) => {
                for entry in entries.flatten() {
                    let path = entry.path();
                    if path.is_file() {
                        if let Err(e) = shred_file(&path) {
                            warn!(path = %path.display(), error = %e, "failed to shred scratch file");
                        }
                    }
                }
            }
            Err(e) => warn!(error = %e, "failed to list scratch area"),
        }

        let path = dir.path().to_path_buf();
        if let Err(e) = dir.close() {
            warn!(path = %path.display(), error = %e, "failed to remove scratch area");
        } else {
            debug!(path = %path.display(), "scratch area erased");
        }
    }
}

impl Drop for Vault {
    fn drop(&mut self) {
        self.erase();
    }
}

/// Overwrite a file with random bytes of the same length, then delete it.
pub(crate) fn shred_file(path: &Path) -> std::io::Result<()> {
    let len = fs::metadata(path)?.len() as usize;

    if len > 0 {
        let mut noise = vec![0u8; len];
        rand::thread_rng().fill_bytes(&mut noise);

        let mut file = fs::OpenOptions::new().write(true).open(path)?;
        file.write_all(&noise)?;
        file.sync_all()?;
    }

    fs::remove_file(path)
}
