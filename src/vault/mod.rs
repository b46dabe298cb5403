//! Vault engine: versioned metadata plus the encrypt/decrypt pipelines.
//!
//! This module provides:
//! - `VersionRecord`, `FileHistory`, `VaultMetadata` document types (`record`)
//! - `MetadataStore` with JSON and in-memory backends (`store`)
//! - The cross-process metadata lock (`lock`)
//! - The encryption pipeline and batch driver (`encrypt`)
//! - The decryption pipeline (`decrypt`)

pub mod decrypt;
pub mod encrypt;
pub mod lock;
pub mod record;
pub mod store;

// Re-export the most commonly used items.
pub use decrypt::{decrypt_by_encrypted_name, decrypt_file, DecryptMode, Decrypted};
pub use encrypt::{
    encrypt_file, encrypt_file_at, encrypt_paths, BatchReport, EncryptOptions, EncryptOutcome,
    ShredStatus,
};
pub use record::{FileHistory, StoredKdf, VaultMetadata, VersionRecord};
pub use store::{FileSummary, JsonFileBackend, MemoryBackend, MetadataBackend, MetadataStore};
