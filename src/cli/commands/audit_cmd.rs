//! `filevault audit`: display the audit log.
//!
//! Usage:
//!   filevault audit               # show last 50 entries
//!   filevault audit --last 20     # show last 20

use crate::cli::{unlock, workspace, Cli};
use crate::errors::Result;

/// Execute the `audit` command.
#[cfg(feature = "audit-log")]
pub fn execute(cli: &Cli, last: usize) -> Result<()> {
    use crate::audit::AuditLog;
    use crate::cli::output;
    use crate::errors::VaultError;

    let ws = workspace(cli)?;
    unlock(&ws)?;

    let audit = AuditLog::open(&ws.vault_dir())
        .ok_or_else(|| VaultError::AuditError("failed to open audit database".into()))?;

    let entries = audit.query(last)?;

    if entries.is_empty() {
        output::info("No audit entries found.");
        return Ok(());
    }

    print_audit_table(&entries);

    Ok(())
}

#[cfg(not(feature = "audit-log"))]
pub fn execute(cli: &Cli, _last: usize) -> Result<()> {
    let ws = workspace(cli)?;
    unlock(&ws)?;
    Err(crate::errors::VaultError::AuditError(
        "filevault was built without the `audit-log` feature".into(),
    ))
}

/// Print audit entries in a formatted table.
#[cfg(feature = "audit-log")]
pub fn print_audit_table(entries: &[crate::audit::AuditEntry]) {
    use comfy_table::{ContentArrangement, Table};
    use console::style;

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Time", "Operation", "File", "Version", "Details"]);

    for entry in entries {
        let time = entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string();
        table.add_row(vec![
            time,
            colorize_operation(&entry.operation),
            entry.file_name.as_deref().unwrap_or("-").to_string(),
            entry.version.as_deref().unwrap_or("-").to_string(),
            entry.details.as_deref().unwrap_or("-").to_string(),
        ]);
    }

    println!(
        "{}",
        style(format!("{} audit entries:", entries.len())).bold()
    );
    println!("{table}");
}

/// Colorize operation names for display.
#[cfg(feature = "audit-log")]
fn colorize_operation(op: &str) -> String {
    use console::style;

    match op {
        "init" => style(op).green().to_string(),
        "encrypt" => style(op).blue().to_string(),
        "decrypt" | "preview" => style(op).cyan().to_string(),
        "shred" => style(op).magenta().to_string(),
        "unlock" | "integrity-failure" => style(op).red().to_string(),
        "search" => style(op).yellow().to_string(),
        _ => op.to_string(),
    }
}
