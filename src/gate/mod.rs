//! Master password gate.
//!
//! Guards the CLI before any vault operation runs. The master password is
//! stored only as an Argon2 PHC string in `<vault_dir>/config.json`:
//!
//! ```json
//! { "master_hash": "$argon2id$v=19$m=19456,t=2,p=1$..." }
//! ```
//!
//! The gate is independent of file passwords: it never derives file keys.
//!
//! Older vaults stored a bcrypt hash (`$2b$...`) under the same key. Those
//! configs cannot be verified here; `verify` reports them as
//! `CorruptMetadata` and the vault owner must move `config.json` aside and
//! run `init` again. File artifacts and metadata are unaffected.

use std::fs;
use std::path::{Path, PathBuf};

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, VaultError};

/// Minimum master password length.
pub const MIN_MASTER_LEN: usize = 8;

/// Attempts the CLI grants before giving up with `AccessDenied`.
pub const MAX_ATTEMPTS: usize = 3;

#[derive(Debug, Serialize, Deserialize)]
struct GateConfig {
    master_hash: String,
}

/// Master password check backed by a JSON config file.
#[derive(Debug, Clone)]
pub struct MasterGate {
    config_path: PathBuf,
}

impl MasterGate {
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// True once a master password hash has been stored.
    pub fn is_configured(&self) -> bool {
        self.config_path.exists()
    }

    /// Hash and store a new master password.
    ///
    /// Refuses to overwrite an existing configuration.
    pub fn set_master_password(&self, raw: &str) -> Result<()> {
        if self.is_configured() {
            return Err(VaultError::GateAlreadyConfigured(self.config_path.clone()));
        }
        if raw.len() < MIN_MASTER_LEN {
            return Err(VaultError::CommandFailed(format!(
                "master password must be at least {MIN_MASTER_LEN} characters"
            )));
        }

        let mut salt_bytes = [0u8; 16];
        rand::rng().fill_bytes(&mut salt_bytes);
        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(|e| VaultError::KeyDerivationFailed(format!("salt encoding: {e}")))?;

        let master_hash = Argon2::default()
            .hash_password(raw.as_bytes(), &salt)
            .map_err(|e| VaultError::KeyDerivationFailed(format!("master hash: {e}")))?
            .to_string();

        let json = serde_json::to_string_pretty(&GateConfig { master_hash })
            .map_err(|e| VaultError::SerializationError(e.to_string()))?;

        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.config_path, json)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.config_path, fs::Permissions::from_mode(0o600))?;
        }

        tracing::info!(path = %self.config_path.display(), "master password configured");
        Ok(())
    }

    /// Check `raw` against the stored hash.
    ///
    /// `Ok(false)` means a wrong password. Errors mean the gate itself is
    /// unusable (missing or unreadable config).
    pub fn verify(&self, raw: &str) -> Result<bool> {
        if !self.is_configured() {
            return Err(VaultError::GateNotConfigured);
        }

        let contents = fs::read_to_string(&self.config_path)?;
        let config: GateConfig =
            serde_json::from_str(&contents).map_err(|e| VaultError::CorruptMetadata {
                path: self.config_path.clone(),
                reason: e.to_string(),
            })?;

        if is_bcrypt(&config.master_hash) {
            return Err(VaultError::CorruptMetadata {
                path: self.config_path.clone(),
                reason: "bcrypt master hashes are not supported; move config.json aside and run `filevault init`".into(),
            });
        }

        let parsed = PasswordHash::new(&config.master_hash).map_err(|e| {
            VaultError::CorruptMetadata {
                path: self.config_path.clone(),
                reason: format!("invalid master hash: {e}"),
            }
        })?;

        let ok = Argon2::default()
            .verify_password(raw.as_bytes(), &parsed)
            .is_ok();
        if !ok {
            tracing::debug!("master password rejected");
        }
        Ok(ok)
    }
}

fn is_bcrypt(hash: &str) -> bool {
    ["$2a$", "$2b$", "$2x$", "$2y$"]
        .iter()
        .any(|prefix| hash.starts_with(prefix))
}
