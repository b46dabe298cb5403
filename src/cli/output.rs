//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::vault::{FileHistory, FileSummary};

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Print one row per vault file (Name, Versions, Latest).
pub fn print_files_table(files: &[FileSummary]) {
    if files.is_empty() {
        info("No files in this vault yet.");
        tip("Run `filevault encrypt <PATH>` to add your first file.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Name", "Versions", "Latest"]);

    for f in files {
        table.add_row(vec![
            f.name.clone(),
            f.versions.to_string(),
            f.latest_version.clone(),
        ]);
    }

    println!("{table}");
}

/// Print every version of one file, oldest first.
pub fn print_history_table(history: &FileHistory) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Version", "Encrypted file", "SHA-256", "Timestamp", "KDF"]);

    for (id, record) in history {
        let kdf = if record.kdf.is_some() {
            "argon2id"
        } else {
            "sha256"
        };
        table.add_row(vec![
            id.clone(),
            record.encrypted_path.display().to_string(),
            short_hash(&record.content_hash),
            record.created_at.clone(),
            kdf.to_string(),
        ]);
    }

    println!("{table}");
}

/// First 12 hex characters, for table display.
fn short_hash(hash: &str) -> String {
    hash.chars().take(12).collect()
}
