//! Keeps the vault directory (metadata, master hash, ciphertexts) out of
//! git when `init` runs inside a project that already has a `.gitignore`.

use std::fs;
use std::path::Path;

/// What [`ignore_vault_dir`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreOutcome {
    /// No `.gitignore` in the project; nothing was created.
    NoGitignore,
    /// Some rule already covers the vault directory.
    AlreadyIgnored,
    /// A rule for the vault directory was appended.
    Added,
    /// The file could not be read or written.
    Failed,
}

/// Ensure `vault_dir` (relative to `project_dir`) is ignored.
pub fn ignore_vault_dir(project_dir: &Path, vault_dir: &str) -> IgnoreOutcome {
    let path = project_dir.join(".gitignore");
    if !path.exists() {
        return IgnoreOutcome::NoGitignore;
    }
    let Ok(existing) = fs::read_to_string(&path) else {
        return IgnoreOutcome::Failed;
    };

    let dir = vault_dir.trim_matches('/');
    if existing.lines().any(|line| covers(line, dir)) {
        return IgnoreOutcome::AlreadyIgnored;
    }

    let mut patched = existing;
    if !patched.is_empty() && !patched.ends_with('\n') {
        patched.push('\n');
    }
    patched.push_str(&format!("# filevault\n{dir}/\n"));

    match fs::write(&path, patched) {
        Ok(()) => IgnoreOutcome::Added,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "cannot patch .gitignore");
            IgnoreOutcome::Failed
        }
    }
}

/// `.filevault`, `.filevault/`, `/.filevault` and `/.filevault/` all match.
fn covers(line: &str, dir: &str) -> bool {
    let rule = line.trim();
    !rule.starts_with('#') && !rule.starts_with('!') && rule.trim_matches('/') == dir
}
