//! `filevault search`: show the version history of one file.

use crate::cli::output;
use crate::cli::{unlock, workspace, Cli};
use crate::errors::{Result, VaultError};

/// Execute the `search` command.
pub fn execute(cli: &Cli, name: &str, json: bool) -> Result<()> {
    let ws = workspace(cli)?;
    unlock(&ws)?;

    let history = ws.store().search(name)?;
    ws.audit("search", Some(name), None, None);

    if json {
        let rendered = serde_json::to_string_pretty(&history)
            .map_err(|e| VaultError::SerializationError(e.to_string()))?;
        println!("{rendered}");
        return Ok(());
    }

    output::info(&format!("'{name}' has {} version(s)", history.len()));
    output::print_history_table(&history);
    output::tip(&format!(
        "Run `filevault decrypt {name} --name --version <VERSION>` to restore one."
    ));

    Ok(())
}
