//! End-to-end tests of the `dbexport` binary that need no database server.
//!
//! These tests verify exit codes, the single `Error:` line on stderr, and
//! that a failed run leaves no output behind.

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

use std::path::Path;
use std::process::{Command, Output};

const SENSITIVE_PASSWORD: &str = "super_secret_password_123";

fn dbexport(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_dbexport"))
        .current_dir(dir)
        .args(args)
        .env_remove("DBEXPORT_CONFIG")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run dbexport")
}

fn write_config(dir: &Path, database: &serde_json::Value) {
    let document = serde_json::json!({ "database": database });
    std::fs::write(dir.join("config.json"), document.to_string()).unwrap();
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_cli_help_exits_zero() {
    let temp = tempfile::tempdir().unwrap();
    let output = dbexport(temp.path(), &["--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--date"));
    assert!(stdout.contains("OUTPUT"));
}

#[test]
fn test_cli_version_exits_zero() {
    let temp = tempfile::tempdir().unwrap();
    let output = dbexport(temp.path(), &["--version"]);

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_unknown_flag_fails() {
    let temp = tempfile::tempdir().unwrap();
    let output = dbexport(temp.path(), &["--no-such-flag"]);

    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_cli_missing_config_fails_without_output() {
    let temp = tempfile::tempdir().unwrap();
    let output = dbexport(temp.path(), &["-q", "--date", "out"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = stderr(&output);
    assert!(stderr.starts_with("Error: Configuration error"), "{}", stderr);
    assert_eq!(stderr.lines().count(), 1, "{}", stderr);
    assert!(output.stdout.is_empty());
    assert!(!temp.path().join("out").exists());
}

#[test]
fn test_cli_config_without_password_fails() {
    let temp = tempfile::tempdir().unwrap();
    write_config(
        temp.path(),
        &serde_json::json!({
            "host": "localhost",
            "port": 3306,
            "user": "wwdtm",
            "database": "wwdtm"
        }),
    );

    let output = dbexport(temp.path(), &["-q", "out"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = stderr(&output);
    assert!(stderr.contains("password"), "{}", stderr);
    assert!(!temp.path().join("out").exists());
}

#[test]
fn test_cli_config_flag_overrides_default_location() {
    let temp = tempfile::tempdir().unwrap();
    std::fs::write(temp.path().join("elsewhere.json"), "{ not json").unwrap();

    let output = dbexport(temp.path(), &["-q", "--config", "elsewhere.json"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = stderr(&output);
    assert!(stderr.contains("invalid configuration"), "{}", stderr);
}

#[test]
fn test_cli_unreachable_host_fails_without_output() {
    let temp = tempfile::tempdir().unwrap();
    write_config(
        temp.path(),
        &serde_json::json!({
            "host": "127.0.0.1",
            "port": 1,
            "user": "wwdtm",
            "password": SENSITIVE_PASSWORD,
            "database": "wwdtm",
            "connect_timeout_secs": 2
        }),
    );

    let output = dbexport(temp.path(), &["--date", "out"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = stderr(&output);
    assert!(stderr.contains("Error: Database connection failed"), "{}", stderr);
    let error_line = stderr
        .lines()
        .find(|line| line.starts_with("Error: "))
        .unwrap();
    assert!(
        error_line.contains("Connection refused"),
        "Cause missing from error line: {}",
        error_line
    );
    assert!(
        !stderr.contains(SENSITIVE_PASSWORD),
        "Password leaked in error output: {}",
        stderr
    );
    assert!(!temp.path().join("out").exists());
}
