//! `filevault encrypt`: encrypt files and folders into the vault.

use std::path::PathBuf;

use zeroize::Zeroizing;

use crate::cli::output;
use crate::cli::{prompt_new_password, unlock, workspace, Cli};
use crate::crypto::{generate_password, KdfMode};
use crate::errors::{Result, VaultError};
use crate::vault::{encrypt_paths, EncryptOptions, ShredStatus};

/// Flags of the `encrypt` subcommand.
pub struct EncryptArgs<'a> {
    pub paths: &'a [PathBuf],
    pub output_dir: Option<&'a PathBuf>,
    pub shred: bool,
    pub generate_password: bool,
    pub argon2: bool,
}

/// Execute the `encrypt` command.
pub fn execute(cli: &Cli, args: &EncryptArgs<'_>) -> Result<()> {
    let ws = workspace(cli)?;
    unlock(&ws)?;

    // 1. File password: generated, from env, or prompted with confirmation.
    let password = if args.generate_password {
        let pw = Zeroizing::new(generate_password(ws.settings.password_length));
        output::info(&format!("Generated password: {}", pw.as_str()));
        output::tip("Store it somewhere safe; it cannot be recovered.");
        pw
    } else {
        prompt_new_password()?
    };
    if password.is_empty() {
        return Err(VaultError::EmptyPassword);
    }

    // 2. Options from config, overridden by flags.
    let destination_dir = match args.output_dir {
        Some(dir) => ws.project_dir.join(dir),
        None => ws.settings.output_path(&ws.project_dir),
    };
    let kdf = if args.argon2 {
        KdfMode::Argon2id(ws.settings.argon2_params())
    } else {
        ws.settings.kdf_mode()
    };
    let opts = EncryptOptions {
        destination_dir,
        shred: args.shred,
        kdf,
        exclude: vec![ws.vault_dir()],
    };

    // 3. Encrypt everything, collecting per-file failures.
    let store = ws.store();
    let report = encrypt_paths(&store, args.paths, &password, &opts);

    for outcome in &report.encrypted {
        output::success(&format!(
            "Encrypted {} (version {}) -> {}",
            outcome.original_name,
            outcome.version_id,
            outcome.encrypted_path().display()
        ));
        ws.audit(
            "encrypt",
            Some(&outcome.original_name),
            Some(&outcome.version_id),
            None,
        );

        match &outcome.shred {
            ShredStatus::NotRequested => {}
            ShredStatus::Shredded => {
                ws.audit("shred", Some(&outcome.original_name), None, None);
            }
            ShredStatus::Failed(reason) => output::warning(&format!(
                "Could not shred {}: {reason}",
                outcome.source.display()
            )),
        }
    }

    for (path, err) in &report.failed {
        output::error(&format!("{}: {err}", path.display()));
    }

    if report.is_complete_success() {
        Ok(())
    } else {
        Err(VaultError::CommandFailed(format!(
            "{} of {} file(s) failed to encrypt",
            report.failed.len(),
            report.failed.len() + report.encrypted.len()
        )))
    }
}
