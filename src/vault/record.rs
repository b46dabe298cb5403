//! Metadata document types.
//!
//! The persisted document is a two-level map:
//!
//! ```text
//! { "<original name>": { "<YYYYMMDD_HHMMSS>": { "encrypted_file": ..., "sha256": ..., "timestamp": ... } } }
//! ```
//!
//! Both levels are `BTreeMap`s, so iteration order is the sort order of
//! the keys.  Version ids are fixed-width and zero-padded, which makes
//! lexicographic order chronological.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::crypto::kdf::{Argon2Params, KdfSpec};

/// `strftime` pattern of a version id, e.g. `20240131_235959`.
pub const VERSION_ID_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Build the version id for an encryption that happened at `at`.
pub fn version_id(at: &NaiveDateTime) -> String {
    at.format(VERSION_ID_FORMAT).to_string()
}

/// ISO-8601 rendering of `at` stored in the `timestamp` field.
pub fn iso_timestamp(at: &NaiveDateTime) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// One encrypted snapshot of a file.  Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    /// Where the ciphertext token lives.
    #[serde(rename = "encrypted_file")]
    pub encrypted_path: PathBuf,

    /// Hex SHA-256 of the original plaintext.
    #[serde(rename = "sha256")]
    pub content_hash: String,

    /// ISO-8601 time of the encryption.
    #[serde(rename = "timestamp")]
    pub created_at: String,

    /// Salted KDF used for this version.  `None` means the legacy
    /// unsalted SHA-256 derivation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kdf: Option<StoredKdf>,
}

impl VersionRecord {
    /// The KDF the decryptor must run to recover this version's key.
    pub fn kdf_spec(&self) -> KdfSpec {
        match &self.kdf {
            None => KdfSpec::Sha256,
            Some(StoredKdf::Argon2id {
                salt,
                memory_kib,
                iterations,
                parallelism,
            }) => KdfSpec::Argon2id {
                salt: salt.clone(),
                params: Argon2Params {
                    memory_kib: *memory_kib,
                    iterations: *iterations,
                    parallelism: *parallelism,
                },
            },
        }
    }

    /// File name component of `encrypted_path`.
    pub fn encrypted_basename(&self) -> Option<&str> {
        self.encrypted_path.file_name().and_then(|n| n.to_str())
    }
}

/// KDF parameters persisted next to a version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "lowercase")]
pub enum StoredKdf {
    Argon2id {
        #[serde(serialize_with = "hex_encode", deserialize_with = "hex_decode")]
        salt: Vec<u8>,
        memory_kib: u32,
        iterations: u32,
        parallelism: u32,
    },
}

impl StoredKdf {
    /// What to persist for `spec`; the legacy scheme stores nothing.
    pub fn from_spec(spec: &KdfSpec) -> Option<Self> {
        match spec {
            KdfSpec::Sha256 => None,
            KdfSpec::Argon2id { salt, params } => Some(Self::Argon2id {
                salt: salt.clone(),
                memory_kib: params.memory_kib,
                iterations: params.iterations,
                parallelism: params.parallelism,
            }),
        }
    }
}

/// Version id -> record, for one original file name.
pub type FileHistory = BTreeMap<String, VersionRecord>;

/// Original file name -> its history.  The whole persisted document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VaultMetadata {
    files: BTreeMap<String, FileHistory>,
}

impl VaultMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `record` under `version_id`, replacing any record that
    /// already has the same id.
    pub fn insert_version(&mut self, original_name: &str, version_id: &str, record: VersionRecord) {
        self.files
            .entry(original_name.to_string())
            .or_default()
            .insert(version_id.to_string(), record);
    }

    /// History for an exact original name.
    pub fn history(&self, original_name: &str) -> Option<&FileHistory> {
        self.files.get(original_name)
    }

    /// The version with the greatest id.
    pub fn latest(&self, original_name: &str) -> Option<(&str, &VersionRecord)> {
        self.files
            .get(original_name)?
            .iter()
            .next_back()
            .map(|(id, record)| (id.as_str(), record))
    }

    /// Reverse lookup from a ciphertext file name to `(original, version)`.
    ///
    /// Only the file name component is compared, so callers may pass
    /// either a bare name or a full path.
    pub fn find_by_encrypted_name(&self, encrypted: &str) -> Option<(&str, &str)> {
        let wanted = Path::new(encrypted).file_name()?.to_str()?;
        self.files.iter().find_map(|(name, history)| {
            history
                .iter()
                .find(|(_, record)| record.encrypted_basename() == Some(wanted))
                .map(|(id, _)| (name.as_str(), id.as_str()))
        })
    }

    /// Iterate over `(original name, history)` in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FileHistory)> {
        self.files.iter().map(|(name, h)| (name.as_str(), h))
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Number of distinct original names.
    pub fn len(&self) -> usize {
        self.files.len()
    }
}

// ---------------------------------------------------------------------------
// Serde helpers for hex-encoded Vec<u8> fields
// ---------------------------------------------------------------------------

fn hex_encode<S>(data: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&hex::encode(data))
}

fn hex_decode<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    hex::decode(&s).map_err(serde::de::Error::custom)
}
