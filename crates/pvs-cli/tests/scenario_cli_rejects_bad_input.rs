//! The CLI fails fast on bad operator input, before any archive or network
//! access.
//!
//! Every case runs in an empty temp dir (no `.env.local`) with the credential
//! and archive env vars cleared.

use assert_cmd::Command;
use predicates::prelude::*;

fn pvsync(dir: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("pvsync").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("PVOUTPUT_API_KEY")
        .env_remove("PVOUTPUT_SYSTEM_ID")
        .env_remove("PVSYNC_ARCHIVE_URL");
    cmd
}

#[test]
fn missing_credentials_fail() {
    let dir = tempfile::tempdir().unwrap();
    pvsync(&dir)
        .args(["sync", "--date", "2024-06-01", "--archive", "sqlite://nowhere.sdb"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("CREDENTIALS_MISSING"))
        .stderr(predicate::str::contains("PVOUTPUT_API_KEY"));
}

#[test]
fn malformed_date_fails() {
    let dir = tempfile::tempdir().unwrap();
    pvsync(&dir)
        .args(["sync", "--date", "2024/06/01", "--api-key", "k", "--system-id", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("YYYY-MM-DD"));
}

#[test]
fn negative_epsilon_fails() {
    let dir = tempfile::tempdir().unwrap();
    pvsync(&dir)
        .args([
            "sync",
            "--date",
            "2024-06-01",
            "--epsilon-secs=-5",
            "--api-key",
            "k",
            "--system-id",
            "1",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("epsilon"));
}

#[test]
fn missing_archive_fails() {
    let dir = tempfile::tempdir().unwrap();
    pvsync(&dir)
        .args(["sync", "--date", "2024-06-01", "--api-key", "k", "--system-id", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no archive configured"));
}

#[test]
fn dry_run_and_interactive_conflict() {
    let dir = tempfile::tempdir().unwrap();
    pvsync(&dir)
        .args(["sync", "--dry-run", "--interactive"])
        .assert()
        .failure();
}

#[test]
fn config_with_literal_key_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("station.yaml");
    std::fs::write(
        &path,
        "station:\n  keys_env:\n    api_key: 0123456789abcdef0123456789abcdef01234567\n",
    )
    .unwrap();

    pvsync(&dir)
        .args(["config-hash", path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("CONFIG_SECRET_DETECTED"));
}

#[test]
fn config_hash_prints_hash() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("station.yaml");
    std::fs::write(&path, "station:\n  timezone: Australia/Brisbane\n").unwrap();

    pvsync(&dir)
        .args(["config-hash", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::is_match("config_hash=[0-9a-f]{64}").unwrap())
        .stdout(predicate::str::contains("Australia/Brisbane"));
}
