//! End-to-end tests of the encryption and decryption pipelines.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use filevault::crypto::Argon2Params;
use filevault::crypto::KdfMode;
use filevault::errors::VaultError;
use filevault::vault::{
    decrypt_by_encrypted_name, decrypt_file, encrypt_file, encrypt_file_at, encrypt_paths,
    DecryptMode, Decrypted, EncryptOptions, MetadataStore, ShredStatus,
};
use tempfile::TempDir;

const PASSWORD: &str = "Tr0ub4dor&3";
const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

struct Fixture {
    dir: TempDir,
    store: MetadataStore,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let store = MetadataStore::open_json(dir.path().join("vault").join("metadata.json"));
        Self { dir, store }
    }

    fn write(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
        path
    }

    fn opts(&self) -> EncryptOptions {
        EncryptOptions::new(self.dir.path().join("vault").join("encrypted_files"))
    }

    fn restore_dir(&self) -> PathBuf {
        self.dir.path().join("restored")
    }
}

fn written(result: Decrypted) -> PathBuf {
    match result {
        Decrypted::Written(path) => path,
        other => panic!("expected a written file, got {other:?}"),
    }
}

fn flip_byte(path: &Path, index: usize) {
    let mut bytes = fs::read(path).unwrap();
    bytes[index] ^= 0x01;
    fs::write(path, bytes).unwrap();
}

#[test]
fn notes_scenario_roundtrip() {
    let fx = Fixture::new();
    let source = fx.write("notes.txt", b"hello");
    let now = NaiveDate::from_ymd_opt(2024, 5, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap();

    let outcome = encrypt_file_at(&fx.store, &source, PASSWORD, &fx.opts(), now).unwrap();
    assert_eq!(outcome.version_id, "20240501_120000");
    assert_eq!(outcome.record.content_hash, HELLO_SHA256);
    assert!(outcome
        .encrypted_path()
        .ends_with("encrypted_files/notes.txt_20240501_120000.enc"));
    assert_eq!(fs::read(outcome.encrypted_path()).unwrap().len(), 29 + 5);

    let restored = written(
        decrypt_file(
            &fx.store,
            "notes.txt",
            PASSWORD,
            None,
            &DecryptMode::WriteTo(fx.restore_dir()),
        )
        .unwrap(),
    );
    assert_eq!(restored, fx.restore_dir().join("decrypted_notes.txt"));
    assert_eq!(fs::read(&restored).unwrap(), b"hello");
}

#[test]
fn wrong_password_fails_authentication_and_writes_nothing() {
    let fx = Fixture::new();
    let source = fx.write("notes.txt", b"hello");
    encrypt_file(&fx.store, &source, PASSWORD, &fx.opts()).unwrap();

    let result = decrypt_file(
        &fx.store,
        "notes.txt",
        "password123",
        None,
        &DecryptMode::WriteTo(fx.restore_dir()),
    );
    assert!(matches!(result, Err(VaultError::AuthenticationFailed)));
    assert!(!fx.restore_dir().join("decrypted_notes.txt").exists());
}

#[test]
fn tampered_ciphertext_fails_authentication() {
    let fx = Fixture::new();
    let source = fx.write("notes.txt", b"hello");
    let outcome = encrypt_file(&fx.store, &source, PASSWORD, &fx.opts()).unwrap();

    flip_byte(outcome.encrypted_path(), 20);

    let result = decrypt_file(&fx.store, "notes.txt", PASSWORD, None, &DecryptMode::Preview);
    assert!(matches!(result, Err(VaultError::AuthenticationFailed)));
}

#[test]
fn edited_metadata_hash_is_an_integrity_mismatch() {
    let fx = Fixture::new();
    let source = fx.write("notes.txt", b"hello");
    let outcome = encrypt_file(&fx.store, &source, PASSWORD, &fx.opts()).unwrap();

    fx.store
        .update(|doc| {
            let mut record = doc.latest("notes.txt").unwrap().1.clone();
            record.content_hash = "0".repeat(64);
            doc.insert_version("notes.txt", &outcome.version_id, record);
            Ok(())
        })
        .unwrap();

    let result = decrypt_file(
        &fx.store,
        "notes.txt",
        PASSWORD,
        None,
        &DecryptMode::WriteTo(fx.restore_dir()),
    );
    assert!(matches!(result, Err(VaultError::IntegrityMismatch { .. })));
    // The suspicious output is left in place for inspection.
    assert!(fx.restore_dir().join("decrypted_notes.txt").exists());
}

#[test]
fn preview_skips_hash_check_and_writes_nothing() {
    let fx = Fixture::new();
    let source = fx.write("notes.txt", b"caf\xc3\xa9 \xff");
    let outcome = encrypt_file(&fx.store, &source, PASSWORD, &fx.opts()).unwrap();

    fx.store
        .update(|doc| {
            let mut record = doc.latest("notes.txt").unwrap().1.clone();
            record.content_hash = "0".repeat(64);
            doc.insert_version("notes.txt", &outcome.version_id, record);
            Ok(())
        })
        .unwrap();

    let result = decrypt_file(&fx.store, "notes.txt", PASSWORD, None, &DecryptMode::Preview).unwrap();
    assert_eq!(result, Decrypted::Preview("café \u{fffd}".to_string()));
    assert!(!fx.restore_dir().exists());
}

#[test]
fn explicit_version_restores_older_content() {
    let fx = Fixture::new();
    let source = fx.write("notes.txt", b"first draft");
    let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();

    encrypt_file_at(
        &fx.store,
        &source,
        PASSWORD,
        &fx.opts(),
        day.and_hms_opt(9, 0, 0).unwrap(),
    )
    .unwrap();
    fs::write(&source, b"second draft").unwrap();
    encrypt_file_at(
        &fx.store,
        &source,
        PASSWORD,
        &fx.opts(),
        day.and_hms_opt(17, 30, 0).unwrap(),
    )
    .unwrap();

    let latest = decrypt_file(&fx.store, "notes.txt", PASSWORD, Some(""), &DecryptMode::Preview).unwrap();
    assert_eq!(latest, Decrypted::Preview("second draft".into()));

    let older = decrypt_file(
        &fx.store,
        "notes.txt",
        PASSWORD,
        Some("20240501_090000"),
        &DecryptMode::Preview,
    )
    .unwrap();
    assert_eq!(older, Decrypted::Preview("first draft".into()));

    let missing = decrypt_file(
        &fx.store,
        "notes.txt",
        PASSWORD,
        Some("20240501_000000"),
        &DecryptMode::Preview,
    );
    assert!(matches!(missing, Err(VaultError::VersionNotFound { .. })));
}

#[test]
fn decrypt_by_encrypted_name_resolves_the_version() {
    let fx = Fixture::new();
    let source = fx.write("report.md", b"# Q3");
    let outcome = encrypt_file(&fx.store, &source, PASSWORD, &fx.opts()).unwrap();
    let basename = outcome
        .encrypted_path()
        .file_name()
        .unwrap()
        .to_string_lossy()
        .into_owned();

    let restored = written(
        decrypt_by_encrypted_name(
            &fx.store,
            &basename,
            PASSWORD,
            &DecryptMode::WriteTo(fx.restore_dir()),
        )
        .unwrap(),
    );
    assert_eq!(fs::read(restored).unwrap(), b"# Q3");

    let unknown = decrypt_by_encrypted_name(&fx.store, "nope.enc", PASSWORD, &DecryptMode::Preview);
    assert!(matches!(unknown, Err(VaultError::EncryptedFileNotFound(_))));
}

#[test]
fn shredded_source_still_decrypts() {
    let fx = Fixture::new();
    let source = fx.write("diary.txt", b"dear diary");
    let opts = EncryptOptions {
        shred: true,
        ..fx.opts()
    };

    let outcome = encrypt_file(&fx.store, &source, PASSWORD, &opts).unwrap();
    assert_eq!(outcome.shred, ShredStatus::Shredded);
    assert!(!source.exists());

    let text = decrypt_file(&fx.store, "diary.txt", PASSWORD, None, &DecryptMode::Preview).unwrap();
    assert_eq!(text, Decrypted::Preview("dear diary".into()));
}

#[test]
fn argon2id_versions_roundtrip_and_record_their_salt() {
    let fx = Fixture::new();
    let source = fx.write("keys.txt", b"ssh stuff");
    let opts = EncryptOptions {
        kdf: KdfMode::Argon2id(Argon2Params {
            memory_kib: 8_192,
            iterations: 1,
            parallelism: 1,
        }),
        ..fx.opts()
    };

    let outcome = encrypt_file(&fx.store, &source, PASSWORD, &opts).unwrap();
    assert!(outcome.record.kdf.is_some());

    let raw = fs::read_to_string(fx.dir.path().join("vault").join("metadata.json")).unwrap();
    assert!(raw.contains("\"argon2id\""));

    let text = decrypt_file(&fx.store, "keys.txt", PASSWORD, None, &DecryptMode::Preview).unwrap();
    assert_eq!(text, Decrypted::Preview("ssh stuff".into()));

    let wrong = decrypt_file(&fx.store, "keys.txt", "nope", None, &DecryptMode::Preview);
    assert!(matches!(wrong, Err(VaultError::AuthenticationFailed)));
}

#[test]
fn batch_encrypts_folders_and_reports_failures() {
    let fx = Fixture::new();
    fx.write("docs/a.txt", b"a");
    fx.write("docs/sub/b.txt", b"b");
    let loose = fx.write("c.txt", b"c");
    let missing = fx.dir.path().join("missing.txt");

    let report = encrypt_paths(
        &fx.store,
        &[fx.dir.path().join("docs"), loose, missing.clone()],
        PASSWORD,
        &fx.opts(),
    );

    assert!(!report.is_complete_success());
    assert_eq!(report.encrypted.len(), 3);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, missing);
    assert!(matches!(report.failed[0].1, VaultError::Io(_)));

    let names: Vec<_> = fx.store.list().unwrap().into_iter().map(|f| f.name).collect();
    assert_eq!(names, vec!["a.txt", "b.txt", "c.txt"]);
}

#[test]
fn batch_does_not_re_encrypt_its_own_output() {
    let fx = Fixture::new();
    fx.write("project/a.txt", b"a");
    let project = fx.dir.path().join("project");
    let opts = EncryptOptions::new(project.join("out"));
    fs::create_dir_all(&opts.destination_dir).unwrap();
    fs::write(opts.destination_dir.join("stale.enc"), b"x").unwrap();

    let report = encrypt_paths(&fx.store, &[project], PASSWORD, &opts);

    assert!(report.is_complete_success());
    let names: Vec<_> = report.encrypted.iter().map(|o| o.original_name.as_str()).collect();
    assert_eq!(names, vec!["a.txt"]);
}

#[test]
fn batch_over_project_root_leaves_the_vault_alone() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().to_path_buf();
    let vault_dir = root.join(".filevault");
    let store = MetadataStore::open_json(vault_dir.join("metadata.json"));
    let opts = EncryptOptions {
        shred: true,
        exclude: vec![vault_dir.clone()],
        ..EncryptOptions::new(vault_dir.join("encrypted_files"))
    };

    fs::write(root.join("first.txt"), b"round one").unwrap();
    let first = encrypt_paths(&store, &[root.join("first.txt")], PASSWORD, &opts);
    assert!(first.is_complete_success());
    fs::write(vault_dir.join("config.json"), b"{\"master_hash\": \"x\"}").unwrap();
    fs::write(root.join("second.txt"), b"round two").unwrap();

    let report = encrypt_paths(&store, &[root.clone()], PASSWORD, &opts);

    assert!(report.is_complete_success());
    let sources: Vec<_> = report.encrypted.iter().map(|o| o.source.clone()).collect();
    assert_eq!(sources, vec![root.join("second.txt")]);
    assert!(vault_dir.join("config.json").exists());
    assert!(vault_dir.join("metadata.json").exists());

    let names: Vec<_> = store.list().unwrap().into_iter().map(|f| f.name).collect();
    assert_eq!(names, vec!["first.txt", "second.txt"]);
    let text = decrypt_file(&store, "first.txt", PASSWORD, None, &DecryptMode::Preview).unwrap();
    assert_eq!(text, Decrypted::Preview("round one".into()));
}

#[test]
fn batch_refuses_the_store_document_as_explicit_input() {
    let fx = Fixture::new();
    let source = fx.write("a.txt", b"a");
    encrypt_file(&fx.store, &source, PASSWORD, &fx.opts()).unwrap();
    let metadata = fx.dir.path().join("vault").join("metadata.json");

    let report = encrypt_paths(&fx.store, &[metadata.clone()], PASSWORD, &fx.opts());

    assert!(report.encrypted.is_empty());
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, metadata);
    assert!(matches!(report.failed[0].1, VaultError::Io(_)));
    assert_eq!(fx.store.list().unwrap().len(), 1);
}

#[test]
fn same_basename_in_one_batch_keeps_both_plaintexts_safe() {
    let fx = Fixture::new();
    let a = fx.write("docs/a/notes.txt", b"AAAA precious");
    let b = fx.write("docs/b/notes.txt", b"BBBB other");
    let opts = EncryptOptions {
        shred: true,
        ..fx.opts()
    };
    let now = NaiveDate::from_ymd_opt(2024, 5, 1)
        .unwrap()
        .and_hms_opt(10, 9, 48)
        .unwrap();

    let kept = encrypt_file_at(&fx.store, &a, PASSWORD, &opts, now).unwrap();
    let clash = encrypt_file_at(&fx.store, &b, PASSWORD, &opts, now);

    assert!(matches!(clash, Err(VaultError::Io(_))));
    assert!(!a.exists());
    assert!(b.exists());
    assert_eq!(fs::read(&b).unwrap(), b"BBBB other");

    let by_name = kept
        .encrypted_path()
        .file_name()
        .unwrap()
        .to_string_lossy()
        .into_owned();
    let text = decrypt_by_encrypted_name(&fx.store, &by_name, PASSWORD, &DecryptMode::Preview).unwrap();
    assert_eq!(text, Decrypted::Preview("AAAA precious".into()));
}

#[test]
fn batch_never_shreds_a_source_without_its_own_artifact() {
    let fx = Fixture::new();
    fx.write("docs/a/notes.txt", b"AAAA precious");
    fx.write("docs/b/notes.txt", b"BBBB other");
    let opts = EncryptOptions {
        shred: true,
        ..fx.opts()
    };

    let report = encrypt_paths(&fx.store, &[fx.dir.path().join("docs")], PASSWORD, &opts);
    assert_eq!(report.encrypted.len() + report.failed.len(), 2);

    for outcome in &report.encrypted {
        let expected: &[u8] = if outcome.source.ends_with("a/notes.txt") {
            b"AAAA precious"
        } else {
            b"BBBB other"
        };
        let restored = written(
            decrypt_by_encrypted_name(
                &fx.store,
                &outcome.encrypted_path().file_name().unwrap().to_string_lossy(),
                PASSWORD,
                &DecryptMode::WriteTo(fx.restore_dir()),
            )
            .unwrap(),
        );
        assert_eq!(fs::read(restored).unwrap(), expected);
    }
    for (source, _) in &report.failed {
        assert!(source.exists());
    }
}
