use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::crypto::kdf::{Argon2Params, KdfMode};
use crate::errors::{Result, VaultError};

/// Key derivation used for new encryptions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KdfSetting {
    /// Unsalted SHA-256 of the password (compatible default).
    #[default]
    Sha256,
    /// Salted Argon2id, parameters below.
    Argon2id,
}

/// Project-level configuration, loaded from `.filevault.toml`.
///
/// Every field has a sensible default so FileVault works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Directory (relative to the working directory) holding metadata,
    /// the master password hash, and the audit log.
    #[serde(default = "default_vault_dir")]
    pub vault_dir: String,

    /// Where `.enc` artifacts go (default: `<vault_dir>/encrypted_files`).
    #[serde(default)]
    pub output_dir: Option<String>,

    /// Where decrypted files are written (default: working directory).
    #[serde(default)]
    pub restore_dir: Option<String>,

    /// KDF for new encryptions.
    #[serde(default)]
    pub kdf: KdfSetting,

    /// Argon2 memory cost in KiB (default: 64 MB).
    #[serde(default = "default_argon2_memory_kib")]
    pub argon2_memory_kib: u32,

    /// Argon2 iteration count (default: 3).
    #[serde(default = "default_argon2_iterations")]
    pub argon2_iterations: u32,

    /// Argon2 parallelism degree (default: 4).
    #[serde(default = "default_argon2_parallelism")]
    pub argon2_parallelism: u32,

    /// Characters shown by `decrypt --preview`.
    #[serde(default = "default_preview_limit")]
    pub preview_limit: usize,

    /// Length of passwords from `generate-password`.
    #[serde(default = "default_password_length")]
    pub password_length: usize,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_vault_dir() -> String {
    ".filevault".to_string()
}

fn default_argon2_memory_kib() -> u32 {
    65_536 // 64 MB
}

fn default_argon2_iterations() -> u32 {
    3
}

fn default_argon2_parallelism() -> u32 {
    4
}

fn default_preview_limit() -> usize {
    1_000
}

fn default_password_length() -> usize {
    crate::crypto::password::DEFAULT_LENGTH
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            vault_dir: default_vault_dir(),
            output_dir: None,
            restore_dir: None,
            kdf: KdfSetting::default(),
            argon2_memory_kib: default_argon2_memory_kib(),
            argon2_iterations: default_argon2_iterations(),
            argon2_parallelism: default_argon2_parallelism(),
            preview_limit: default_preview_limit(),
            password_length: default_password_length(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the project root.
    const FILE_NAME: &'static str = ".filevault.toml";

    /// File name of the metadata document inside the vault directory.
    pub const METADATA_FILE: &'static str = "metadata.json";

    /// File name of the master password config inside the vault directory.
    pub const GATE_FILE: &'static str = "config.json";

    /// Load settings from `<project_dir>/.filevault.toml`.
    ///
    /// If the file does not exist, sensible defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            VaultError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        Ok(settings)
    }

    /// `project_dir/<vault_dir>`
    pub fn vault_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.vault_dir)
    }

    /// `project_dir/<vault_dir>/metadata.json`
    pub fn metadata_path(&self, project_dir: &Path) -> PathBuf {
        self.vault_path(project_dir).join(Self::METADATA_FILE)
    }

    /// `project_dir/<vault_dir>/config.json`
    pub fn gate_path(&self, project_dir: &Path) -> PathBuf {
        self.vault_path(project_dir).join(Self::GATE_FILE)
    }

    /// Directory for new `.enc` artifacts.
    pub fn output_path(&self, project_dir: &Path) -> PathBuf {
        match &self.output_dir {
            Some(dir) => project_dir.join(dir),
            None => self.vault_path(project_dir).join("encrypted_files"),
        }
    }

    /// Directory for decrypted files.
    pub fn restore_path(&self, project_dir: &Path) -> PathBuf {
        match &self.restore_dir {
            Some(dir) => project_dir.join(dir),
            None => project_dir.to_path_buf(),
        }
    }

    /// Convert the Argon2 settings into crypto-layer params.
    pub fn argon2_params(&self) -> Argon2Params {
        Argon2Params {
            memory_kib: self.argon2_memory_kib,
            iterations: self.argon2_iterations,
            parallelism: self.argon2_parallelism,
        }
    }

    /// The KDF mode new encryptions should use.
    pub fn kdf_mode(&self) -> KdfMode {
        match self.kdf {
            KdfSetting::Sha256 => KdfMode::Sha256,
            KdfSetting::Argon2id => KdfMode::Argon2id(self.argon2_params()),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
