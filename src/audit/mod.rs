//! Audit log: SQLite-based operation history.
//!
//! Stores a record of every vault operation (encrypt, decrypt, search, ...)
//! in a local SQLite database at `<vault_dir>/audit.db`.
//!
//! Designed for graceful degradation: if the database can't be opened or
//! written to, operations silently continue without logging. Compiled only
//! with the `audit-log` feature; without it [`log_audit`] is a no-op.

use std::path::{Path, PathBuf};

#[cfg(feature = "audit-log")]
pub use sqlite::{AuditEntry, AuditLog};

/// Return the path to the audit database (for testing/display).
pub fn db_path(vault_dir: &Path) -> PathBuf {
    vault_dir.join("audit.db")
}

/// Convenience helper: log an audit event for the vault at `vault_dir`.
///
/// Opens the audit database, logs the event, and silently ignores any errors.
/// This is safe to call from any command; it never fails the parent operation.
#[cfg(feature = "audit-log")]
pub fn log_audit(
    vault_dir: &Path,
    op: &str,
    file_name: Option<&str>,
    version: Option<&str>,
    details: Option<&str>,
) {
    if let Some(audit) = AuditLog::open(vault_dir) {
        audit.log(op, file_name, version, details);
    }
}

#[cfg(not(feature = "audit-log"))]
pub fn log_audit(
    _vault_dir: &Path,
    _op: &str,
    _file_name: Option<&str>,
    _version: Option<&str>,
    _details: Option<&str>,
) {
}

#[cfg(feature = "audit-log")]
mod sqlite {
    use std::path::Path;

    use chrono::{DateTime, Utc};
    use rusqlite::Connection;

    use crate::errors::{Result, VaultError};

    /// A single audit log entry.
    #[derive(Debug, Clone)]
    pub struct AuditEntry {
        pub id: i64,
        pub timestamp: DateTime<Utc>,
        pub operation: String,
        pub file_name: Option<String>,
        pub version: Option<String>,
        pub details: Option<String>,
    }

    /// SQLite-backed audit log.
    pub struct AuditLog {
        conn: Connection,
    }

    impl AuditLog {
        /// Open (or create) the audit database at `<vault_dir>/audit.db`.
        ///
        /// Returns `None` if the database can't be opened; callers should
        /// treat this as "audit logging unavailable" and continue normally.
        pub fn open(vault_dir: &Path) -> Option<Self> {
            let db_path = super::db_path(vault_dir);
            let conn = Connection::open(&db_path).ok()?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let perms = std::fs::Permissions::from_mode(0o600);
                let _ = std::fs::set_permissions(&db_path, perms);
            }

            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS audit_log (
                    id        INTEGER PRIMARY KEY AUTOINCREMENT,
                    timestamp TEXT NOT NULL,
                    operation TEXT NOT NULL,
                    file_name TEXT,
                    version   TEXT,
                    details   TEXT
                );",
            )
            .ok()?;

            Some(Self { conn })
        }

        /// Record an operation. Fire-and-forget; errors are silently ignored.
        pub fn log(
            &self,
            operation: &str,
            file_name: Option<&str>,
            version: Option<&str>,
            details: Option<&str>,
        ) {
            let now = Utc::now().to_rfc3339();
            if let Err(e) = self.conn.execute(
                "INSERT INTO audit_log (timestamp, operation, file_name, version, details)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![now, operation, file_name, version, details],
            ) {
                tracing::debug!(error = %e, "audit insert failed");
            }
        }

        /// Most recent entries first, at most `limit`.
        pub fn query(&self, limit: usize) -> Result<Vec<AuditEntry>> {
            let limit_i64 = i64::try_from(limit).unwrap_or(i64::MAX);

            let mut stmt = self
                .conn
                .prepare(
                    "SELECT id, timestamp, operation, file_name, version, details
                     FROM audit_log
                     ORDER BY id DESC
                     LIMIT ?1",
                )
                .map_err(|e| VaultError::AuditError(format!("query prepare: {e}")))?;

            let rows = stmt
                .query_map([limit_i64], |row| {
                    let ts_str: String = row.get(1)?;
                    let timestamp = DateTime::parse_from_rfc3339(&ts_str)
                        .map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc));

                    Ok(AuditEntry {
                        id: row.get(0)?,
                        timestamp,
                        operation: row.get(2)?,
                        file_name: row.get(3)?,
                        version: row.get(4)?,
                        details: row.get(5)?,
                    })
                })
                .map_err(|e| VaultError::AuditError(format!("query exec: {e}")))?;

            let entries = rows
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| VaultError::AuditError(format!("row parse: {e}")))?;
            Ok(entries)
        }
    }

}
