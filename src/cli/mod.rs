//! CLI module: Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod gitignore;
pub mod output;

use std::path::PathBuf;

use clap::Parser;

use zeroize::Zeroizing;

use crate::config::Settings;
use crate::errors::{Result, VaultError};
use crate::gate::{MasterGate, MAX_ATTEMPTS, MIN_MASTER_LEN};
use crate::vault::MetadataStore;

/// Env var consulted for file passwords before prompting.
pub const PASSWORD_ENV: &str = "FILEVAULT_PASSWORD";

/// Env var consulted for the master password before prompting.
pub const MASTER_PASSWORD_ENV: &str = "FILEVAULT_MASTER_PASSWORD";

/// FileVault CLI: encrypted, versioned personal file vault.
#[derive(Parser)]
#[command(
    name = "filevault",
    about = "Encrypted personal file vault with versioned, tamper-checked history",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Vault directory (default: `vault_dir` from .filevault.toml, else .filevault)
    #[arg(long, global = true)]
    pub vault_dir: Option<String>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Initialize a vault and set its master password
    Init,

    /// Encrypt files or folders into the vault
    Encrypt {
        /// Files or directories to encrypt (directories are walked recursively)
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Directory for the .enc artifacts
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Securely delete each original after it is encrypted
        #[arg(long)]
        shred: bool,

        /// Generate a random file password instead of prompting
        #[arg(long)]
        generate_password: bool,

        /// Derive the key with salted Argon2id (overrides the config)
        #[arg(long)]
        argon2: bool,
    },

    /// Decrypt a file from the vault
    Decrypt {
        /// Encrypted file (path or basename), or the original name with --name
        target: String,

        /// Treat TARGET as the original file name
        #[arg(long)]
        name: bool,

        /// Version id to restore (default: latest)
        #[arg(long, requires = "name")]
        version: Option<String>,

        /// Print the decrypted text instead of writing a file
        #[arg(long)]
        preview: bool,

        /// Directory for the restored file
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Show every recorded version of a file
    Search {
        /// Original file name
        name: String,

        /// Print the history as JSON
        #[arg(long)]
        json: bool,
    },

    /// List every file in the vault
    List,

    /// Generate a random password
    GeneratePassword {
        /// Password length (default: `password_length` from config)
        #[arg(short, long)]
        length: Option<usize>,

        /// Copy the password to the clipboard instead of printing it
        #[arg(long)]
        copy: bool,
    },

    /// View the audit log of vault operations
    Audit {
        /// Number of entries to show (default: 50)
        #[arg(long, default_value = "50")]
        last: usize,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell)
        shell: String,
    },

    /// Show version information
    Version,
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Everything a command needs about where the vault lives.
pub struct Workspace {
    pub project_dir: PathBuf,
    pub settings: Settings,
}

impl Workspace {
    /// `<project_dir>/<vault_dir>`
    pub fn vault_dir(&self) -> PathBuf {
        self.settings.vault_path(&self.project_dir)
    }

    /// The metadata store for this vault.
    pub fn store(&self) -> MetadataStore {
        MetadataStore::open_json(self.settings.metadata_path(&self.project_dir))
    }

    /// The master password gate for this vault.
    pub fn gate(&self) -> MasterGate {
        MasterGate::new(self.settings.gate_path(&self.project_dir))
    }

    /// Record an audit event; never fails.
    pub fn audit(&self, op: &str, file: Option<&str>, version: Option<&str>, details: Option<&str>) {
        crate::audit::log_audit(&self.vault_dir(), op, file, version, details);
    }
}

/// Load settings for the current directory, applying `--vault-dir`.
pub fn workspace(cli: &Cli) -> Result<Workspace> {
    let project_dir = std::env::current_dir()?;
    let mut settings = Settings::load(&project_dir)?;
    if let Some(dir) = &cli.vault_dir {
        settings.vault_dir.clone_from(dir);
    }
    Ok(Workspace {
        project_dir,
        settings,
    })
}

/// Pass the master password gate.
///
/// `FILEVAULT_MASTER_PASSWORD` gets one attempt; interactive use gets
/// [`MAX_ATTEMPTS`]. Exhausting them is `AccessDenied`.
pub fn unlock(ws: &Workspace) -> Result<()> {
    let gate = ws.gate();
    if !gate.is_configured() {
        return Err(VaultError::GateNotConfigured);
    }

    if let Some(pw) = env_password(MASTER_PASSWORD_ENV) {
        return if gate.verify(&pw)? {
            Ok(())
        } else {
            ws.audit("unlock", None, None, Some("rejected"));
            Err(VaultError::AccessDenied)
        };
    }

    for attempt in 1..=MAX_ATTEMPTS {
        let pw = Zeroizing::new(
            dialoguer::Password::new()
                .with_prompt("Enter master password")
                .interact()
                .map_err(|e| VaultError::CommandFailed(format!("password prompt: {e}")))?,
        );
        if gate.verify(&pw)? {
            return Ok(());
        }
        let left = MAX_ATTEMPTS - attempt;
        if left > 0 {
            output::warning(&format!("Incorrect master password ({left} attempt(s) left)"));
        }
    }

    ws.audit("unlock", None, None, Some("attempts exhausted"));
    Err(VaultError::AccessDenied)
}

/// Get a file password, trying in order:
/// 1. `FILEVAULT_PASSWORD` env var (scripts/CI)
/// 2. Interactive prompt
///
/// Returns `Zeroizing<String>` so the password is wiped from memory on drop.
pub fn prompt_password() -> Result<Zeroizing<String>> {
    if let Some(pw) = env_password(PASSWORD_ENV) {
        return Ok(pw);
    }

    let pw = dialoguer::Password::new()
        .with_prompt("Enter file password")
        .interact()
        .map_err(|e| VaultError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Prompt for a file password with confirmation (used by `encrypt`).
///
/// Also respects `FILEVAULT_PASSWORD` for scripted/CI usage.
pub fn prompt_new_password() -> Result<Zeroizing<String>> {
    if let Some(pw) = env_password(PASSWORD_ENV) {
        return Ok(pw);
    }

    let password = dialoguer::Password::new()
        .with_prompt("Choose file password")
        .with_confirmation("Confirm file password", "Passwords do not match, try again")
        .interact()
        .map_err(|e| VaultError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(password))
}

/// Prompt for a new master password with confirmation (used by `init`).
///
/// Enforces the minimum master password length.
pub fn prompt_new_master_password() -> Result<Zeroizing<String>> {
    if let Some(pw) = env_password(MASTER_PASSWORD_ENV) {
        if pw.len() < MIN_MASTER_LEN {
            return Err(VaultError::CommandFailed(format!(
                "master password must be at least {MIN_MASTER_LEN} characters"
            )));
        }
        return Ok(pw);
    }

    loop {
        let password = dialoguer::Password::new()
            .with_prompt("Choose master password")
            .with_confirmation(
                "Confirm master password",
                "Passwords do not match, try again",
            )
            .interact()
            .map_err(|e| VaultError::CommandFailed(format!("password prompt: {e}")))?;

        if password.len() < MIN_MASTER_LEN {
            output::warning(&format!(
                "Password must be at least {MIN_MASTER_LEN} characters. Try again."
            ));
            continue;
        }

        return Ok(Zeroizing::new(password));
    }
}

/// Non-empty value of `var`, if set.
fn env_password(var: &str) -> Option<Zeroizing<String>> {
    std::env::var(var)
        .ok()
        .filter(|pw| !pw.is_empty())
        .map(Zeroizing::new)
}
