//! Password-based key derivation.
//!
//! Two schemes are supported:
//!
//! - **Legacy SHA-256** (default): the key is the SHA-256 digest of the
//!   UTF-8 password.  No salt and no work factor, so the same password
//!   always yields the same key, across vaults too.  Nothing besides the
//!   password is needed to decrypt, which keeps old artifacts readable.
//! - **Argon2id** (opt-in): a memory-hard KDF with a random per-version
//!   salt.  The salt and parameters are stored in the version record.

use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use super::keys::{VaultKey, KEY_LEN};
use crate::errors::{Result, VaultError};

/// Length of an Argon2id salt in bytes (256 bits).
pub const SALT_LEN: usize = 32;

/// Minimum safe memory cost in KiB (8 MB).
const MIN_MEMORY_KIB: u32 = 8_192;

/// Configurable Argon2id parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Argon2Params {
    /// Memory cost in KiB (default: 65 536 = 64 MB).
    pub memory_kib: u32,
    /// Number of iterations (default: 3).
    pub iterations: u32,
    /// Parallelism lanes (default: 4).
    pub parallelism: u32,
}

impl Default for Argon2Params {
    fn default() -> Self {
        Self {
            memory_kib: 65_536,
            iterations: 3,
            parallelism: 4,
        }
    }
}

/// Which derivation to run for a given version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KdfSpec {
    /// Unsalted SHA-256 of the password.
    Sha256,
    /// Salted Argon2id.
    Argon2id { salt: Vec<u8>, params: Argon2Params },
}

impl KdfSpec {
    /// A fresh Argon2id spec with a random salt.
    pub fn new_argon2id(params: Argon2Params) -> Self {
        Self::Argon2id {
            salt: generate_salt().to_vec(),
            params,
        }
    }
}

/// Which scheme new encryptions use.  Decryption always follows the
/// scheme recorded on the version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KdfMode {
    #[default]
    Sha256,
    Argon2id(Argon2Params),
}

impl KdfMode {
    /// The spec for one new encryption (fresh salt for Argon2id).
    pub fn fresh_spec(&self) -> KdfSpec {
        match self {
            Self::Sha256 => KdfSpec::Sha256,
            Self::Argon2id(params) => KdfSpec::new_argon2id(*params),
        }
    }
}

/// Derive the legacy key: SHA-256 over the password bytes.
///
/// Total for every input; two calls with the same password always agree.
pub fn derive_legacy_key(password: &str) -> VaultKey {
    let digest = Sha256::digest(password.as_bytes());
    let mut bytes = [0u8; KEY_LEN];
    bytes.copy_from_slice(&digest[..KEY_LEN]);
    VaultKey::new(bytes)
}

/// Derive a key from `password` according to `spec`.
pub fn derive_key(password: &str, spec: &KdfSpec) -> Result<VaultKey> {
    match spec {
        KdfSpec::Sha256 => Ok(derive_legacy_key(password)),
        KdfSpec::Argon2id { salt, params } => derive_argon2id(password.as_bytes(), salt, params),
    }
}

/// Derive a 32-byte key with explicit Argon2id parameters.
///
/// Enforces minimum Argon2 parameters to prevent dangerously weak settings.
pub fn derive_argon2id(
    password: &[u8],
    salt: &[u8],
    argon2_params: &Argon2Params,
) -> Result<VaultKey> {
    if argon2_params.memory_kib < MIN_MEMORY_KIB {
        return Err(VaultError::KeyDerivationFailed(format!(
            "Argon2 memory_kib must be at least {MIN_MEMORY_KIB} (got {})",
            argon2_params.memory_kib
        )));
    }
    if argon2_params.iterations < 1 {
        return Err(VaultError::KeyDerivationFailed(
            "Argon2 iterations must be at least 1".into(),
        ));
    }
    if argon2_params.parallelism < 1 {
        return Err(VaultError::KeyDerivationFailed(
            "Argon2 parallelism must be at least 1".into(),
        ));
    }

    let params = Params::new(
        argon2_params.memory_kib,
        argon2_params.iterations,
        argon2_params.parallelism,
        Some(KEY_LEN),
    )
    .map_err(|e| VaultError::KeyDerivationFailed(format!("invalid Argon2 params: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = [0u8; KEY_LEN];
    argon2
        .hash_password_into(password, salt, &mut key)
        .map_err(|e| VaultError::KeyDerivationFailed(format!("Argon2id hashing failed: {e}")))?;

    let vault_key = VaultKey::new(key);
    key.zeroize();
    Ok(vault_key)
}

/// Generate a cryptographically random salt.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    salt
}
