//! `filevault list`: display every file in the vault.

use crate::cli::output;
use crate::cli::{unlock, workspace, Cli};
use crate::errors::Result;

/// Execute the `list` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let ws = workspace(cli)?;
    unlock(&ws)?;

    let files = ws.store().list()?;

    output::info(&format!("{} file(s) in the vault", files.len()));
    output::print_files_table(&files);

    Ok(())
}
