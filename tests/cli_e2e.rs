//! End-to-end tests for the CLI binary.

use assert_cmd::Command;
use predicates::prelude::*;

fn cli() -> Command {
    let mut cmd = Command::cargo_bin("lecture-downloader").unwrap();
    cmd.env_remove("LECTURE_DL_USER")
        .env_remove("LECTURE_DL_PASSWORD")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_binary_help_lists_commands() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("courses"))
        .stdout(predicate::str::contains("materials"))
        .stdout(predicate::str::contains("download"))
        .stdout(predicate::str::contains("--push"));
}

#[test]
fn test_binary_version() {
    cli()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_binary_without_user_fails() {
    cli()
        .args(["--base-url", "http://127.0.0.1:9", "courses"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no user given"));
}

#[test]
fn test_binary_password_sign_in_needs_env() {
    cli()
        .args(["--base-url", "http://127.0.0.1:9", "--user", "2024000001", "courses"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("LECTURE_DL_PASSWORD"));
}

#[test]
fn test_binary_download_requires_course() {
    cli()
        .arg("download")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--course"));
}
