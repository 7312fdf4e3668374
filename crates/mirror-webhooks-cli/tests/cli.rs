//! End-to-end tests of the `mirror-webhooks` binary.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn sign_prints_prefixed_signature() {
    // HMAC-SHA256("key", "The quick brown fox jumps over the lazy dog")
    Command::cargo_bin("mirror-webhooks")
        .unwrap()
        .args([
            "sign",
            "--secret",
            "key",
            "--data",
            "The quick brown fox jumps over the lazy dog",
        ])
        .assert()
        .success()
        .stdout(
            "sha256=f7bc83f430538424b13298e6aa6fb143ef4d59a14946175997479dbc2d1a3cd8\n",
        );
}

#[test]
fn sign_reads_secret_from_environment() {
    Command::cargo_bin("mirror-webhooks")
        .unwrap()
        .env("WEBHOOK_SECRET", "key")
        .args(["sign", "--data", "The quick brown fox jumps over the lazy dog"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("sha256=f7bc83f4"));
}

#[test]
fn config_check_reports_missing_database_settings() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("service.yaml");
    std::fs::write(&path, "server:\n  port: 8080\n").unwrap();

    Command::cargo_bin("mirror-webhooks")
        .unwrap()
        .env_remove("MIRROR_CONFIG_FILE")
        .env_remove("SUPABASE_URL")
        .env_remove("SUPABASE_SERVICE_ROLE_KEY")
        .args(["config", "check", "--file"])
        .arg(&path)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("database.url"));
}

#[test]
fn config_check_applies_deployment_environment() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("service.yaml");
    std::fs::write(&path, "server:\n  port: 8080\n").unwrap();

    Command::cargo_bin("mirror-webhooks")
        .unwrap()
        .env("SUPABASE_URL", "https://project.example.co")
        .env("SUPABASE_SERVICE_ROLE_KEY", "service-role-key")
        .args(["config", "check", "--file"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration OK"));
}
