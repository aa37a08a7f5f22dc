//! Integration tests for the upnotify CLI

use std::process::Command;

fn upnotify() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_upnotify"));
    // Keep the host configuration out of the tests
    command
        .env_remove("UPNOTIFY_OUTPUT")
        .env_remove("UPNOTIFY_PRIVILEGE_WRAPPER")
        .env_remove("RUST_LOG");
    command
}

#[test]
fn test_cli_version() {
    let output = upnotify()
        .arg("--version")
        .output()
        .expect("Failed to execute upnotify");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("upnotify"));
}

#[test]
fn test_cli_help() {
    let output = upnotify()
        .arg("--help")
        .output()
        .expect("Failed to execute upnotify");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Update notifier"));
    assert!(stdout.contains("--upgrades"));
    assert!(stdout.contains("--upgrader-sw"));
    assert!(stdout.contains("--release-upgrade"));
}

#[test]
fn test_nothing_to_report_exits_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(
        &config,
        format!(
            "[paths]\nreboot_marker = \"{}\"\n",
            dir.path().join("no-reboot-marker").display()
        ),
    )
    .unwrap();

    let output = upnotify()
        .args(["-u", "0", "--config"])
        .arg(&config)
        .output()
        .expect("Failed to execute upnotify");

    assert!(output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn test_missing_config_fails() {
    let output = upnotify()
        .args(["-u", "1", "--config", "/nonexistent/upnotify.toml"])
        .output()
        .expect("Failed to execute upnotify");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Configuration error"));
}

#[test]
fn test_invalid_flag() {
    let output = upnotify()
        .arg("--no-such-flag")
        .output()
        .expect("Failed to execute upnotify");

    assert!(!output.status.success());
}
