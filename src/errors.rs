use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur in FileVault.
#[derive(Debug, Error)]
pub enum VaultError {
    // --- Crypto errors ---
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: wrong password or tampered ciphertext")]
    AuthenticationFailed,

    #[error("Malformed token: {0}")]
    MalformedToken(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    #[error("Password cannot be empty")]
    EmptyPassword,

    // --- Metadata errors ---
    #[error("Metadata file {path} is corrupt: {reason}")]
    CorruptMetadata { path: PathBuf, reason: String },

    #[error("File '{0}' not found in metadata")]
    NotFound(String),

    #[error("Version '{version}' of '{name}' not found in metadata")]
    VersionNotFound { name: String, version: String },

    #[error("Encrypted file '{0}' is not referenced by any metadata entry")]
    EncryptedFileNotFound(String),

    #[error("File hash mismatch for '{name}' version {version}: possible tampering")]
    IntegrityMismatch { name: String, version: String },

    #[error("Metadata lock error: {0}")]
    LockError(String),

    // --- Master password gate ---
    #[error("Access denied: incorrect master password")]
    AccessDenied,

    #[error("No master password configured: run `filevault init` first")]
    GateNotConfigured,

    #[error("A master password is already configured at {0}")]
    GateAlreadyConfigured(PathBuf),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    // --- Audit errors ---
    #[error("Audit error: {0}")]
    AuditError(String),
}

/// Convenience type alias for FileVault results.
pub type Result<T> = std::result::Result<T, VaultError>;
