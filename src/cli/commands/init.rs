//! `filevault init`: create the vault directory and set the master password.

use std::fs;

use crate::cli::gitignore::{ignore_vault_dir, IgnoreOutcome};
use crate::cli::output;
use crate::cli::{prompt_new_master_password, workspace, Cli};
use crate::errors::{Result, VaultError};

/// Execute the `init` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let ws = workspace(cli)?;
    let vault_dir = ws.vault_dir();
    let gate = ws.gate();

    // 1. Refuse to re-initialise an existing vault.
    if gate.is_configured() {
        output::tip("Use `filevault encrypt <PATH>` to add files to the existing vault.");
        return Err(VaultError::GateAlreadyConfigured(gate.config_path().to_path_buf()));
    }

    // 2. Create the vault layout.
    if !vault_dir.exists() {
        fs::create_dir_all(&vault_dir)?;
        output::info(&format!("Created vault directory: {}", vault_dir.display()));
    }
    fs::create_dir_all(ws.settings.output_path(&ws.project_dir))?;

    // 3. Master password (with confirmation).
    let password = prompt_new_master_password()?;
    gate.set_master_password(&password)?;
    output::success(&format!("Vault initialised at {}", vault_dir.display()));

    // 4. Keep the vault out of version control.
    if ignore_vault_dir(&ws.project_dir, &ws.settings.vault_dir) == IgnoreOutcome::Added {
        output::info(&format!("Added '{}/' to .gitignore", ws.settings.vault_dir.trim_matches('/')));
    }

    ws.audit("init", None, None, Some("vault created"));

    output::tip("Run `filevault encrypt <PATH>` to encrypt a file or folder.");
    output::tip("Run `filevault list` to see what the vault holds.");

    Ok(())
}
