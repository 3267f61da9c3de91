//! Integration tests for the command-line interface.
//!
//! These tests run the exporter binary in its one-shot modes
//! (`--check-config`, `--show-config`, `test`).

use std::io::Write;
use std::process::{Command, Output};
use tempfile::NamedTempFile;

/// Helper to get the binary path
fn binary_path() -> std::path::PathBuf {
    std::path::PathBuf::from(env!("CARGO_BIN_EXE_process-group-exporter"))
}

fn run(args: &[&str], port_env: Option<&str>) -> Output {
    let mut cmd = Command::new(binary_path());
    cmd.arg("--no-config").args(args).env_remove("PORT");
    if let Some(port) = port_env {
        cmd.env("PORT", port);
    }
    cmd.output().expect("Failed to execute command")
}

fn combined(output: &Output) -> String {
    format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}

#[test]
fn test_default_config_is_valid() {
    let output = run(&["--check-config"], None);
    assert!(output.status.success(), "got: {}", combined(&output));
    assert!(combined(&output).contains("Configuration is valid"));
}

#[test]
fn test_zero_collect_timeout_is_rejected() {
    let output = run(&["--collect-timeout", "0", "--check-config"], None);
    assert!(!output.status.success());
    assert!(
        combined(&output).contains("collect_timeout_secs must be greater than 0"),
        "got: {}",
        combined(&output)
    );
}

#[test]
fn test_missing_test_data_file_is_rejected() {
    let output = run(
        &["--test-data-file", "/nonexistent/processes.json", "--check-config"],
        None,
    );
    assert!(!output.status.success());
    assert!(combined(&output).contains("Test data file not found"));
}

#[test]
fn test_default_port_and_loopback_bind() {
    let output = run(&["--show-config"], None);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("port: 19002"), "got: {}", stdout);
    assert!(stdout.contains("127.0.0.1"), "got: {}", stdout);
}

#[test]
fn test_port_environment_variable() {
    let output = run(&["--show-config"], Some("9191"));
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("port: 9191"), "got: {}", stdout);
}

#[test]
fn test_port_flag_beats_environment() {
    let output = run(&["--port", "9292", "--show-config"], Some("9191"));
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(stdout.contains("port: 9292"), "got: {}", stdout);
}

#[test]
fn test_invalid_port_environment_fails() {
    let output = run(&["--show-config"], Some("not-a-port"));
    assert!(!output.status.success());
}

#[test]
fn test_config_file_values_are_used() {
    let mut file = NamedTempFile::with_suffix(".yaml").unwrap();
    writeln!(file, "port: 19555\nroot_supervisor: \"init\"").unwrap();

    let output = Command::new(binary_path())
        .args(["--config", file.path().to_str().unwrap(), "--show-config"])
        .env_remove("PORT")
        .output()
        .expect("Failed to execute command");
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "got: {}", combined(&output));
    assert!(stdout.contains("port: 19555"), "got: {}", stdout);
    assert!(stdout.contains("init"), "got: {}", stdout);
}

#[test]
fn test_test_command_prints_groups() {
    let mut file = NamedTempFile::with_suffix(".json").unwrap();
    write!(
        file,
        r#"{{"processes": [
            {{"pid": 1, "name": "launchd", "user_seconds": 1.0, "system_seconds": 1.0, "memory_percent": 0.1}},
            {{"pid": 10, "name": "Terminal", "ppid": 1, "user_seconds": 2.0, "system_seconds": 1.0, "memory_percent": 1.5}},
            {{"pid": 11, "name": "zsh", "ppid": 10, "user_seconds": 0.5, "system_seconds": 0.5, "memory_percent": 0.2}}
        ]}}"#
    )
    .unwrap();

    let output = run(
        &[
            "--log-level",
            "off",
            "--root-supervisor",
            "launchd",
            "--test-data-file",
            file.path().to_str().unwrap(),
            "test",
        ],
        None,
    );
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "got: {}", combined(&output));
    assert!(stdout.contains("Aggregated: 3 processes into 3 groups"), "got: {}", stdout);
    assert!(stdout.contains("zsh"));
    assert!(stdout.contains("Terminal"));
}
