//! Cryptographic primitives for FileVault.
//!
//! This module provides:
//! - AES-256-GCM token encryption and decryption (`encryption`)
//! - Password-based key derivation, legacy SHA-256 or Argon2id (`kdf`)
//! - Streaming SHA-256 content hashing (`hash`)
//! - Random password generation (`password`)

pub mod encryption;
pub mod hash;
pub mod kdf;
pub mod keys;
pub mod password;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{encrypt, decrypt, derive_key, ...};
pub use encryption::{decrypt, encrypt};
pub use hash::{digest_bytes, digest_file};
pub use kdf::{derive_key, derive_legacy_key, Argon2Params, KdfMode, KdfSpec};
pub use keys::VaultKey;
pub use password::generate_password;
