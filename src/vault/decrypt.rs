//! Decryption pipeline with two independent integrity signals:
//! the AEAD tag (checked by the cipher) and the recorded SHA-256 of the
//! plaintext (checked against the restored file).

use std::fs;
use std::path::{Path, PathBuf};

use zeroize::Zeroizing;

use super::record::VersionRecord;
use super::store::MetadataStore;
use crate::crypto::{self, hash};
use crate::errors::{Result, VaultError};

/// Prefix of every restored file name.
pub const DECRYPTED_PREFIX: &str = "decrypted_";

/// What to do with the recovered plaintext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecryptMode {
    /// Return the plaintext as lossy UTF-8 text; nothing is written and
    /// no hash check runs.
    Preview,
    /// Write `decrypted_<name>` into this directory and verify its hash.
    WriteTo(PathBuf),
}

/// Successful decryption result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decrypted {
    Preview(String),
    Written(PathBuf),
}

/// Decrypt a version of `original_name` (the latest if `version` is
/// `None` or empty).
pub fn decrypt_file(
    store: &MetadataStore,
    original_name: &str,
    password: &str,
    version: Option<&str>,
    mode: &DecryptMode,
) -> Result<Decrypted> {
    let (version_id, record) = match version.filter(|v| !v.is_empty()) {
        Some(v) => (v.to_string(), store.version(original_name, v)?),
        None => store.latest_version(original_name)?,
    };

    decrypt_record(original_name, &version_id, &record, password, mode)
}

/// Decrypt the version whose ciphertext file is named `encrypted_name`.
pub fn decrypt_by_encrypted_name(
    store: &MetadataStore,
    encrypted_name: &str,
    password: &str,
    mode: &DecryptMode,
) -> Result<Decrypted> {
    let (original_name, version_id) = store.find_by_encrypted_name(encrypted_name)?;
    decrypt_file(store, &original_name, password, Some(&version_id), mode)
}

fn decrypt_record(
    original_name: &str,
    version_id: &str,
    record: &VersionRecord,
    password: &str,
    mode: &DecryptMode,
) -> Result<Decrypted> {
    if password.is_empty() {
        return Err(VaultError::EmptyPassword);
    }

    let key = crypto::derive_key(password, &record.kdf_spec())?;
    let token = fs::read(&record.encrypted_path)?;
    let plaintext = Zeroizing::new(crypto::decrypt(key.as_bytes(), &token)?);
    drop(key);

    let output_dir = match mode {
        DecryptMode::Preview => {
            tracing::debug!(file = original_name, version = version_id, "previewed file");
            return Ok(Decrypted::Preview(
                String::from_utf8_lossy(&plaintext).into_owned(),
            ));
        }
        DecryptMode::WriteTo(dir) => dir,
    };

    fs::create_dir_all(output_dir)?;
    let output_path = output_dir.join(output_file_name(original_name));
    fs::write(&output_path, plaintext.as_slice())?;

    let restored_hash = hash::digest_file(&output_path)?;
    if !hash::digests_match(&restored_hash, &record.content_hash) {
        tracing::warn!(
            file = original_name,
            version = version_id,
            output = %output_path.display(),
            "restored content does not match recorded hash"
        );
        return Err(VaultError::IntegrityMismatch {
            name: original_name.to_string(),
            version: version_id.to_string(),
        });
    }

    tracing::info!(
        file = original_name,
        version = version_id,
        output = %output_path.display(),
        "decrypted file"
    );
    Ok(Decrypted::Written(output_path))
}

/// `decrypted_<name>`, using only the final component of `original_name`.
fn output_file_name(original_name: &str) -> String {
    let base = Path::new(original_name)
        .file_name()
        .map_or_else(|| "file".into(), |n| n.to_string_lossy());
    format!("{DECRYPTED_PREFIX}{base}")
}
