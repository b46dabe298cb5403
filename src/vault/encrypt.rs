//! Encryption pipeline: one plaintext file in, one `.enc` token out, one
//! new version recorded.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use zeroize::Zeroizing;

use super::record::{iso_timestamp, version_id, StoredKdf, VersionRecord};
use super::store::MetadataStore;
use crate::crypto::{self, KdfMode};
use crate::errors::{Result, VaultError};
use crate::shred::shred_file;

/// Extension of every ciphertext artifact.
pub const ENCRYPTED_EXTENSION: &str = "enc";

/// Per-invocation knobs supplied by the caller.
#[derive(Debug, Clone)]
pub struct EncryptOptions {
    /// Directory the `.enc` artifact is written to (created if missing).
    pub destination_dir: PathBuf,
    /// Securely delete the source after a successful encryption.
    pub shred: bool,
    /// Key derivation scheme for this encryption.
    pub kdf: KdfMode,
    /// Directories batch encryption never reads from.
    pub exclude: Vec<PathBuf>,
}

impl EncryptOptions {
    pub fn new(destination_dir: impl Into<PathBuf>) -> Self {
        Self {
            destination_dir: destination_dir.into(),
            shred: false,
            kdf: KdfMode::default(),
            exclude: Vec::new(),
        }
    }
}

/// What happened to the plaintext original.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShredStatus {
    NotRequested,
    Shredded,
    /// Shredding failed; the encryption itself still stands.
    Failed(String),
}

/// Result of one successful encryption.
#[derive(Debug, Clone)]
pub struct EncryptOutcome {
    pub source: PathBuf,
    pub original_name: String,
    pub version_id: String,
    pub record: VersionRecord,
    pub shred: ShredStatus,
}

impl EncryptOutcome {
    pub fn encrypted_path(&self) -> &Path {
        &self.record.encrypted_path
    }
}

/// `<original_basename>_<version id>.enc`
pub fn encrypted_file_name(original_name: &str, version_id: &str) -> String {
    format!("{original_name}_{version_id}.{ENCRYPTED_EXTENSION}")
}

/// Encrypt `source` under `password` and record it as a new version.
pub fn encrypt_file(
    store: &MetadataStore,
    source: &Path,
    password: &str,
    opts: &EncryptOptions,
) -> Result<EncryptOutcome> {
    encrypt_file_at(store, source, password, opts, Local::now().naive_local())
}

/// Same as [`encrypt_file`] with an explicit clock reading.
///
/// The version id has one-second resolution. A second encryption of the
/// same name within one second into the same directory finds the artifact
/// already present and fails with `Io` before recording or shredding.
pub fn encrypt_file_at(
    store: &MetadataStore,
    source: &Path,
    password: &str,
    opts: &EncryptOptions,
    now: NaiveDateTime,
) -> Result<EncryptOutcome> {
    if password.is_empty() {
        return Err(VaultError::EmptyPassword);
    }

    let original_name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| {
            VaultError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} has no file name", source.display()),
            ))
        })?;

    // 1. Read the plaintext and fingerprint exactly the bytes we encrypt.
    let plaintext = Zeroizing::new(fs::read(source)?);
    let content_hash = crypto::digest_bytes(&plaintext);

    // 2. Derive the key and encrypt.
    let kdf_spec = opts.kdf.fresh_spec();
    let key = crypto::derive_key(password, &kdf_spec)?;
    let token = crypto::encrypt(key.as_bytes(), &plaintext)?;
    drop(key);

    // 3. Write the artifact.  An existing artifact is never replaced.
    fs::create_dir_all(&opts.destination_dir)?;
    let destination_dir = std::path::absolute(&opts.destination_dir)?;
    let version = version_id(&now);
    let encrypted_path = destination_dir.join(encrypted_file_name(&original_name, &version));
    write_new_file(&encrypted_path, &token)?;

    // 4. Record the version.  A failure here orphans the artifact but
    //    leaves earlier versions untouched.
    let record = VersionRecord {
        encrypted_path,
        content_hash,
        created_at: iso_timestamp(&now),
        kdf: StoredKdf::from_spec(&kdf_spec),
    };
    store.record_version(&original_name, &version, record.clone())?;

    tracing::info!(
        file = %original_name,
        version = %version,
        encrypted = %record.encrypted_path.display(),
        "encrypted file"
    );

    // 5. Best-effort shred of the original.
    let shred = if opts.shred {
        match shred_file(source) {
            Ok(()) => ShredStatus::Shredded,
            Err(e) => {
                tracing::warn!(path = %source.display(), error = %e, "shred failed");
                ShredStatus::Failed(e.to_string())
            }
        }
    } else {
        ShredStatus::NotRequested
    };

    Ok(EncryptOutcome {
        source: source.to_path_buf(),
        original_name,
        version_id: version,
        record,
        shred,
    })
}

/// Create `path` and write `bytes`, failing if the file already exists.
fn write_new_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| {
            if e.kind() == io::ErrorKind::AlreadyExists {
                io::Error::new(e.kind(), format!("{} already exists", path.display()))
            } else {
                e
            }
        })?;

    let written = file.write_all(bytes).and_then(|()| file.sync_all());
    if let Err(e) = written {
        drop(file);
        let _ = fs::remove_file(path);
        return Err(e.into());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Batch encryption
// ---------------------------------------------------------------------------

/// Outcome of encrypting many files; failures do not stop the batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub encrypted: Vec<EncryptOutcome>,
    pub failed: Vec<(PathBuf, VaultError)>,
}

impl BatchReport {
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Outcomes whose source could not be shredded.
    pub fn shred_failures(&self) -> impl Iterator<Item = &EncryptOutcome> {
        self.encrypted
            .iter()
            .filter(|o| matches!(o.shred, ShredStatus::Failed(_)))
    }
}

/// Encrypt every file in `paths`, walking directories recursively.
///
/// Nothing under the destination directory, the store's data directory or
/// any `opts.exclude` entry is read, so a folder that contains the vault is
/// never encrypted into itself.
pub fn encrypt_paths(
    store: &MetadataStore,
    paths: &[PathBuf],
    password: &str,
    opts: &EncryptOptions,
) -> BatchReport {
    let mut report = BatchReport::default();
    let skip = SkipSet::new(store, opts);

    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            if let Err(e) = collect_files(path, &skip, &mut files) {
                tracing::warn!(path = %path.display(), error = %e, "cannot walk directory");
                report.failed.push((path.clone(), e));
            }
        } else if skip.contains(path) {
            let reason = io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} belongs to the vault", path.display()),
            );
            report.failed.push((path.clone(), reason.into()));
        } else {
            files.push(path.clone());
        }
    }

    for file in files {
        match encrypt_file(store, &file, password, opts) {
            Ok(outcome) => report.encrypted.push(outcome),
            Err(e) => {
                tracing::warn!(path = %file.display(), error = %e, "failed to encrypt file");
                report.failed.push((file, e));
            }
        }
    }

    report
}

/// Canonical directories a batch must not read from.
struct SkipSet {
    dirs: Vec<PathBuf>,
}

impl SkipSet {
    fn new(store: &MetadataStore, opts: &EncryptOptions) -> Self {
        let dirs = std::iter::once(opts.destination_dir.as_path())
            .chain(opts.exclude.iter().map(PathBuf::as_path))
            .chain(store.data_dir())
            .filter_map(|dir| fs::canonicalize(dir).ok())
            .collect();
        Self { dirs }
    }

    fn contains(&self, path: &Path) -> bool {
        fs::canonicalize(path).is_ok_and(|p| self.dirs.iter().any(|dir| p.starts_with(dir)))
    }
}

/// Push every regular file below `dir` onto `out`, in sorted order.
fn collect_files(dir: &Path, skip: &SkipSet, out: &mut Vec<PathBuf>) -> Result<()> {
    if skip.contains(dir) {
        tracing::debug!(path = %dir.display(), "skipping vault directory");
        return Ok(());
    }

    let mut entries = fs::read_dir(dir)?.collect::<io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            collect_files(&path, skip, out)?;
        } else if file_type.is_file() {
            out.push(path);
        } else {
            tracing::debug!(path = %path.display(), "skipping non-regular file");
        }
    }
    Ok(())
}
