//! Integration tests for the FileVault CLI.
//!
//! These tests exercise the binary end-to-end using `assert_cmd`.
//! Passwords are supplied through `FILEVAULT_MASTER_PASSWORD` and
//! `FILEVAULT_PASSWORD` so no interactive prompt is reached.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

const MASTER: &str = "correct horse battery";
const FILE_PW: &str = "Tr0ub4dor&3";

/// Helper: get a Command pointing at the filevault binary.
fn filevault() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("filevault").expect("binary should exist");
    cmd.env_remove("FILEVAULT_PASSWORD")
        .env_remove("FILEVAULT_MASTER_PASSWORD")
        .env_remove("FILEVAULT_LOG");
    cmd
}

/// Helper: a command in `dir` with both passwords set.
fn unlocked(dir: &TempDir) -> Command {
    let mut cmd = filevault();
    cmd.current_dir(dir.path())
        .env("FILEVAULT_MASTER_PASSWORD", MASTER)
        .env("FILEVAULT_PASSWORD", FILE_PW);
    cmd
}

fn init_vault(dir: &TempDir) {
    unlocked(dir).arg("init").assert().success();
}

#[test]
fn help_flag_shows_usage() {
    filevault()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Encrypted personal file vault"))
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("encrypt"))
        .stdout(predicate::str::contains("decrypt"))
        .stdout(predicate::str::contains("search"))
        .stdout(predicate::str::contains("generate-password"));
}

#[test]
fn version_flag_shows_version() {
    filevault()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("filevault"));
}

#[test]
fn no_args_shows_help() {
    filevault()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn generate_password_prints_requested_length() {
    filevault()
        .args(["generate-password", "--length", "24"])
        .assert()
        .success()
        .stdout(
            predicate::function(|out: &str| out.trim_end_matches('\n').len() == 24).from_utf8(),
        );
}

#[test]
fn init_creates_vault_layout() {
    let tmp = TempDir::new().unwrap();
    init_vault(&tmp);

    let config = std::fs::read_to_string(tmp.child(".filevault/config.json").path()).unwrap();
    assert!(config.contains("master_hash"));
    assert!(!config.contains(MASTER));
    tmp.child(".filevault/encrypted_files")
        .assert(predicate::path::is_dir());
}

#[test]
fn init_twice_fails() {
    let tmp = TempDir::new().unwrap();
    init_vault(&tmp);

    unlocked(&tmp)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already configured"));
}

#[test]
fn init_rejects_short_master_password() {
    let tmp = TempDir::new().unwrap();
    filevault()
        .current_dir(tmp.path())
        .env("FILEVAULT_MASTER_PASSWORD", "short")
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least 8"));
}

#[test]
fn commands_require_an_initialised_vault() {
    let tmp = TempDir::new().unwrap();
    unlocked(&tmp)
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("filevault init"));
}

#[test]
fn wrong_master_password_is_denied() {
    let tmp = TempDir::new().unwrap();
    init_vault(&tmp);

    filevault()
        .current_dir(tmp.path())
        .env("FILEVAULT_MASTER_PASSWORD", "not the master")
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Access denied"));
}

#[test]
fn encrypt_list_search_decrypt_roundtrip() {
    let tmp = TempDir::new().unwrap();
    init_vault(&tmp);
    tmp.child("notes.txt").write_str("hello").unwrap();

    unlocked(&tmp)
        .args(["encrypt", "notes.txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Encrypted notes.txt"));

    unlocked(&tmp)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("notes.txt"));

    unlocked(&tmp)
        .args(["search", "notes.txt", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824",
        ))
        .stdout(predicate::str::contains("encrypted_file"));

    unlocked(&tmp)
        .args(["decrypt", "notes.txt", "--name", "--preview"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hello"));

    unlocked(&tmp)
        .args(["decrypt", "notes.txt", "--name"])
        .assert()
        .success();
    tmp.child("decrypted_notes.txt").assert("hello");
}

#[test]
fn decrypt_with_wrong_file_password_fails() {
    let tmp = TempDir::new().unwrap();
    init_vault(&tmp);
    tmp.child("notes.txt").write_str("hello").unwrap();
    unlocked(&tmp).args(["encrypt", "notes.txt"]).assert().success();

    unlocked(&tmp)
        .env("FILEVAULT_PASSWORD", "password123")
        .args(["decrypt", "notes.txt", "--name"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("wrong password"));
    tmp.child("decrypted_notes.txt").assert(predicate::path::missing());
}

#[test]
fn encrypt_with_shred_removes_original() {
    let tmp = TempDir::new().unwrap();
    init_vault(&tmp);
    let notes = tmp.child("notes.txt");
    notes.write_str("hello").unwrap();

    unlocked(&tmp)
        .args(["encrypt", "notes.txt", "--shred"])
        .assert()
        .success();
    notes.assert(predicate::path::missing());
}

#[test]
fn encrypt_reports_missing_files() {
    let tmp = TempDir::new().unwrap();
    init_vault(&tmp);
    tmp.child("a.txt").write_str("a").unwrap();

    unlocked(&tmp)
        .args(["encrypt", "a.txt", "missing.txt"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Encrypted a.txt"))
        .stderr(predicate::str::contains("1 of 2"));
}

#[test]
fn decrypt_version_requires_name() {
    filevault()
        .args(["decrypt", "a.enc", "--version", "20240101_000000"])
        .assert()
        .failure();
}

#[test]
fn encrypting_the_project_root_keeps_the_vault_intact() {
    let tmp = TempDir::new().unwrap();
    init_vault(&tmp);
    tmp.child("notes.txt").write_str("hello").unwrap();

    unlocked(&tmp)
        .args(["encrypt", ".", "--shred"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Encrypted notes.txt"))
        .stdout(predicate::str::contains("config.json").not());

    tmp.child(".filevault/config.json").assert(predicate::path::exists());
    tmp.child("notes.txt").assert(predicate::path::missing());

    unlocked(&tmp)
        .args(["decrypt", "notes.txt", "--name", "--preview"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hello"));
}

#[cfg(feature = "audit-log")]
#[test]
fn decrypt_by_encrypted_name_audits_the_resolved_version() {
    let tmp = TempDir::new().unwrap();
    init_vault(&tmp);
    tmp.child("notes.txt").write_str("hello").unwrap();
    unlocked(&tmp).args(["encrypt", "notes.txt"]).assert().success();

    let raw = std::fs::read_to_string(tmp.path().join(".filevault/metadata.json")).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let (version, record) = doc["notes.txt"].as_object().unwrap().iter().next().unwrap();
    let encrypted = std::path::Path::new(record["encrypted_file"].as_str().unwrap())
        .file_name()
        .unwrap()
        .to_string_lossy()
        .into_owned();

    unlocked(&tmp)
        .args(["decrypt", &encrypted, "--preview"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hello"));

    let audit = filevault::audit::AuditLog::open(&tmp.path().join(".filevault")).unwrap();
    let latest = &audit.query(1).unwrap()[0];
    assert_eq!(latest.operation, "preview");
    assert_eq!(latest.file_name.as_deref(), Some("notes.txt"));
    assert_eq!(latest.version.as_deref(), Some(version.as_str()));
}
