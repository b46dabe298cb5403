//! Durable metadata bookkeeping.
//!
//! `MetadataStore` is the only way the pipelines touch the metadata
//! document.  Every mutation is a whole-document load-modify-save run
//! inside one critical section: an in-process mutex plus whatever
//! cross-process lock the backend provides.  A store can therefore be
//! shared between threads behind an `Arc`.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::lock::FileLock;
use super::record::{FileHistory, VaultMetadata, VersionRecord};
use crate::errors::{Result, VaultError};

/// Persistence for the whole metadata document.
pub trait MetadataBackend: Send + Sync {
    /// Read the persisted document, or an empty one if nothing exists yet.
    fn load(&self) -> Result<VaultMetadata>;

    /// Replace the persisted document.
    fn save(&self, metadata: &VaultMetadata) -> Result<()>;

    /// Cross-process exclusion for one load-modify-save cycle.
    fn lock(&self) -> Result<Option<FileLock>> {
        Ok(None)
    }

    /// Directory holding the document and its lock, if it lives on disk.
    fn data_dir(&self) -> Option<&Path> {
        None
    }
}

// ---------------------------------------------------------------------------
// JSON file backend
// ---------------------------------------------------------------------------

/// Pretty-printed JSON document on disk, written via temp-file + rename.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".lock");
        self.path.with_file_name(name)
    }

    fn corrupt(&self, reason: impl ToString) -> VaultError {
        VaultError::CorruptMetadata {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }
}

impl MetadataBackend for JsonFileBackend {
    fn load(&self) -> Result<VaultMetadata> {
        if !self.path.exists() {
            return Ok(VaultMetadata::new());
        }

        let data = fs::read(&self.path)?;
        if data.is_empty() {
            return Ok(VaultMetadata::new());
        }

        serde_json::from_slice(&data).map_err(|e| self.corrupt(e))
    }

    fn save(&self, metadata: &VaultMetadata) -> Result<()> {
        use serde::Serialize;

        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        metadata
            .serialize(&mut ser)
            .map_err(|e| VaultError::SerializationError(format!("metadata: {e}")))?;
        buf.push(b'\n');

        let parent = self.path.parent().unwrap_or(Path::new("."));
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }

        // The temp file is in the same directory so the rename is atomic.
        let tmp_path = parent.join(format!(
            ".{}.tmp",
            self.path.file_name().unwrap_or_default().to_string_lossy()
        ));
        fs::write(&tmp_path, &buf)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    fn lock(&self) -> Result<Option<FileLock>> {
        FileLock::acquire(&self.lock_path()).map(Some)
    }

    fn data_dir(&self) -> Option<&Path> {
        self.path.parent().filter(|p| !p.as_os_str().is_empty())
    }
}

// ---------------------------------------------------------------------------
// In-memory backend
// ---------------------------------------------------------------------------

/// Keeps the document in memory only (tests, embedding hosts).
#[derive(Debug, Default)]
pub struct MemoryBackend {
    doc: Mutex<VaultMetadata>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metadata(metadata: VaultMetadata) -> Self {
        Self {
            doc: Mutex::new(metadata),
        }
    }
}

impl MetadataBackend for MemoryBackend {
    fn load(&self) -> Result<VaultMetadata> {
        let doc = self
            .doc
            .lock()
            .map_err(|_| VaultError::LockError("memory backend poisoned".into()))?;
        Ok(doc.clone())
    }

    fn save(&self, metadata: &VaultMetadata) -> Result<()> {
        let mut doc = self
            .doc
            .lock()
            .map_err(|_| VaultError::LockError("memory backend poisoned".into()))?;
        *doc = metadata.clone();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MetadataStore
// ---------------------------------------------------------------------------

/// Summary row for one original file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSummary {
    pub name: String,
    pub versions: usize,
    pub latest_version: String,
}

/// The metadata service used by the pipelines.
pub struct MetadataStore {
    backend: Box<dyn MetadataBackend>,
    write_lock: Mutex<()>,
}

impl MetadataStore {
    pub fn new(backend: impl MetadataBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            write_lock: Mutex::new(()),
        }
    }

    /// A store persisted as JSON at `path`.
    pub fn open_json(path: impl Into<PathBuf>) -> Self {
        Self::new(JsonFileBackend::new(path))
    }

    /// A store that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }

    /// Read the current document.
    pub fn load(&self) -> Result<VaultMetadata> {
        self.backend.load()
    }

    /// Overwrite the whole document, whatever is currently persisted.
    pub fn save(&self, metadata: &VaultMetadata) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| VaultError::LockError("metadata mutex poisoned".into()))?;
        let _file_lock = self.backend.lock()?;
        self.backend.save(metadata)
    }

    /// Where the backend keeps its files; batch encryption never reads there.
    pub fn data_dir(&self) -> Option<&Path> {
        self.backend.data_dir()
    }

    /// Run `f` over the document inside the critical section and persist
    /// the result.  Nothing is written if `f` fails.
    pub fn update<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut VaultMetadata) -> Result<R>,
    {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| VaultError::LockError("metadata mutex poisoned".into()))?;
        let _file_lock = self.backend.lock()?;

        let mut doc = self.backend.load()?;
        let out = f(&mut doc)?;
        self.backend.save(&doc)?;
        Ok(out)
    }

    /// Record a new version of `original_name`.
    pub fn record_version(
        &self,
        original_name: &str,
        version_id: &str,
        record: VersionRecord,
    ) -> Result<()> {
        self.update(|doc| {
            doc.insert_version(original_name, version_id, record);
            Ok(())
        })?;
        tracing::debug!(file = original_name, version = version_id, "recorded version");
        Ok(())
    }

    /// The newest version of `original_name` as `(version id, record)`.
    pub fn latest_version(&self, original_name: &str) -> Result<(String, VersionRecord)> {
        let doc = self.load()?;
        doc.latest(original_name)
            .map(|(id, record)| (id.to_string(), record.clone()))
            .ok_or_else(|| VaultError::NotFound(original_name.to_string()))
    }

    /// A specific version of `original_name`.
    pub fn version(&self, original_name: &str, version_id: &str) -> Result<VersionRecord> {
        let doc = self.load()?;
        let history = doc
            .history(original_name)
            .ok_or_else(|| VaultError::NotFound(original_name.to_string()))?;
        history
            .get(version_id)
            .cloned()
            .ok_or_else(|| VaultError::VersionNotFound {
                name: original_name.to_string(),
                version: version_id.to_string(),
            })
    }

    /// Which `(original name, version id)` produced the ciphertext `basename`.
    pub fn find_by_encrypted_name(&self, basename: &str) -> Result<(String, String)> {
        let doc = self.load()?;
        doc.find_by_encrypted_name(basename)
            .map(|(name, id)| (name.to_string(), id.to_string()))
            .ok_or_else(|| VaultError::EncryptedFileNotFound(basename.to_string()))
    }

    /// Full history of an exact original name.
    pub fn search(&self, original_name: &str) -> Result<FileHistory> {
        let doc = self.load()?;
        doc.history(original_name)
            .cloned()
            .ok_or_else(|| VaultError::NotFound(original_name.to_string()))
    }

    /// One summary row per original name, sorted by name.
    pub fn list(&self) -> Result<Vec<FileSummary>> {
        let doc = self.load()?;
        Ok(doc
            .iter()
            .filter_map(|(name, history)| {
                history.keys().next_back().map(|latest| FileSummary {
                    name: name.to_string(),
                    versions: history.len(),
                    latest_version: latest.clone(),
                })
            })
            .collect())
    }
}
