//! `filevault decrypt`: restore or preview a file from the vault.

use std::path::{Path, PathBuf};

use crate::cli::output;
use crate::cli::{prompt_password, unlock, workspace, Cli};
use crate::errors::{Result, VaultError};
use crate::vault::{decrypt_file, DecryptMode, Decrypted};

/// Flags of the `decrypt` subcommand.
pub struct DecryptArgs<'a> {
    pub target: &'a str,
    pub by_name: bool,
    pub version: Option<&'a str>,
    pub preview: bool,
    pub output_dir: Option<&'a PathBuf>,
}

/// Execute the `decrypt` command.
pub fn execute(cli: &Cli, args: &DecryptArgs<'_>) -> Result<()> {
    let ws = workspace(cli)?;
    unlock(&ws)?;

    let mode = if args.preview {
        DecryptMode::Preview
    } else {
        let dir = match args.output_dir {
            Some(dir) => ws.project_dir.join(dir),
            None => ws.settings.restore_path(&ws.project_dir),
        };
        DecryptMode::WriteTo(dir)
    };

    let password = prompt_password()?;
    let store = ws.store();

    // Resolve the exact version up front so the audit row names it.
    let (name, version) = if args.by_name {
        let version = match args.version.filter(|v| !v.is_empty()) {
            Some(v) => v.to_string(),
            None => store.latest_version(args.target)?.0,
        };
        (args.target.to_string(), version)
    } else {
        store.find_by_encrypted_name(&encrypted_basename(args.target))?
    };

    match decrypt_file(&store, &name, &password, Some(&version), &mode) {
        Ok(Decrypted::Preview(text)) => {
            ws.audit("preview", Some(&name), Some(&version), None);
            println!("{}", truncate_chars(&text, ws.settings.preview_limit));
            Ok(())
        }
        Ok(Decrypted::Written(path)) => {
            ws.audit("decrypt", Some(&name), Some(&version), None);
            output::success(&format!("Decrypted to {}", path.display()));
            Ok(())
        }
        Err(err @ VaultError::IntegrityMismatch { .. }) => {
            ws.audit("integrity-failure", Some(&name), Some(&version), None);
            output::warning("The restored file does not match its recorded hash; inspect it before use.");
            Err(err)
        }
        Err(err) => Err(err),
    }
}

/// Accept either a path to a `.enc` file or its bare name.
fn encrypted_basename(target: &str) -> String {
    Path::new(target)
        .file_name()
        .map_or_else(|| target.to_string(), |n| n.to_string_lossy().into_owned())
}

/// The first `limit` characters of `text`, marking a cut with an ellipsis.
fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => format!("{}\u{2026}", &text[..idx]),
        None => text.to_string(),
    }
}
