//! AES-256-GCM authenticated encryption producing self-contained tokens.
//!
//! Each call to `encrypt` generates a fresh random 12-byte nonce and
//! frames it together with the ciphertext, so the token is the only thing
//! that needs to be written to disk.
//!
//! Token layout:
//!   [ 1-byte version | 12-byte nonce | ciphertext + 16-byte auth tag ]

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};

use crate::errors::{Result, VaultError};

/// Current token format version.
pub const TOKEN_VERSION: u8 = 0x01;

/// Size of the AES-256-GCM nonce in bytes.
const NONCE_LEN: usize = 12;

/// Size of the GCM authentication tag in bytes.
const TAG_LEN: usize = 16;

/// Smallest well-formed token: version + nonce + tag (empty plaintext).
pub const MIN_TOKEN_LEN: usize = 1 + NONCE_LEN + TAG_LEN;

/// Encrypt `plaintext` with a 32-byte `key` and return a framed token.
pub fn encrypt(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| VaultError::EncryptionFailed(format!("invalid key length: {e}")))?;

    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| VaultError::EncryptionFailed(format!("encryption error: {e}")))?;

    let mut token = Vec::with_capacity(1 + NONCE_LEN + ciphertext.len());
    token.push(TOKEN_VERSION);
    token.extend_from_slice(&nonce);
    token.extend_from_slice(&ciphertext);
    Ok(token)
}

/// Decrypt a token produced by `encrypt`.
///
/// Framing problems are reported as `MalformedToken`; a tag mismatch
/// (wrong key or modified bytes) is `AuthenticationFailed`.
pub fn decrypt(key: &[u8], token: &[u8]) -> Result<Vec<u8>> {
    if token.len() < MIN_TOKEN_LEN {
        return Err(VaultError::MalformedToken(format!(
            "token is {} bytes, expected at least {MIN_TOKEN_LEN}",
            token.len()
        )));
    }

    let (version, rest) = token.split_at(1);
    if version[0] != TOKEN_VERSION {
        return Err(VaultError::MalformedToken(format!(
            "unsupported token version {:#04x}",
            version[0]
        )));
    }

    let (nonce_bytes, ciphertext) = rest.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);

    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| VaultError::MalformedToken(format!("invalid key length: {e}")))?;

    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| VaultError::AuthenticationFailed)
}
