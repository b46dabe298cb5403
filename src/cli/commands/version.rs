//! `filevault version`: display version information.

use console::style;

use crate::errors::Result;

/// Execute the `version` command.
pub fn execute() -> Result<()> {
    let current = env!("CARGO_PKG_VERSION");
    println!("filevault {current}");

    let audit = if cfg!(feature = "audit-log") {
        style("enabled").green()
    } else {
        style("disabled").dim()
    };
    println!("  audit log: {audit}");

    Ok(())
}
