//! `filevault generate-password`: print or copy a random password.

use crate::cli::{output, workspace, Cli};
use crate::crypto::generate_password;
use crate::errors::{Result, VaultError};

/// Execute the `generate-password` command.
pub fn execute(cli: &Cli, length: Option<usize>, copy: bool) -> Result<()> {
    let length = match length {
        Some(n) => n,
        None => workspace(cli)?.settings.password_length,
    };
    if length == 0 {
        return Err(VaultError::CommandFailed(
            "password length must be at least 1".into(),
        ));
    }

    let password = zeroize::Zeroizing::new(generate_password(length));

    if copy {
        let mut clipboard = arboard::Clipboard::new()
            .map_err(|e| VaultError::CommandFailed(format!("clipboard unavailable: {e}")))?;
        clipboard
            .set_text(password.as_str())
            .map_err(|e| VaultError::CommandFailed(format!("clipboard write: {e}")))?;
        output::success(&format!("Copied a {length}-character password to the clipboard"));
    } else {
        println!("{}", password.as_str());
    }

    Ok(())
}
