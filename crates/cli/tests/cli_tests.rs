//! CLI integration tests

use std::process::{Command, Output};

fn scanctl(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_scanctl"))
        .args(args)
        .env("HOME", "/nonexistent-scanctl-home")
        .env("NO_COLOR", "1")
        .env_remove("SCANCTL_API_URL")
        .output()
        .expect("Failed to execute command")
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = scanctl(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("Wi-Fi scan daemon"), "Should show app name");
    assert!(stdout.contains("scan"), "Should show scan command");
    assert!(stdout.contains("abort"), "Should show abort command");
    assert!(stdout.contains("results"), "Should show results command");
    assert!(stdout.contains("pno"), "Should show pno command");
    assert!(stdout.contains("status"), "Should show status command");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = scanctl(&["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("scanctl"), "Should show binary name");
}

/// Test global options
#[test]
fn test_global_options() {
    let output = scanctl(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(stdout.contains("--api-url"), "Should show api-url option");
    assert!(stdout.contains("SCANCTL_API_URL"), "Should show env var");
    assert!(stdout.contains("--interface"), "Should show interface option");
    assert!(stdout.contains("--format"), "Should show format option");
    assert!(stdout.contains("table"), "Should show table format");
    assert!(stdout.contains("json"), "Should show json format");
}

/// Test scan subcommand help
#[test]
fn test_scan_help() {
    let output = scanctl(&["scan", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Scan help should succeed");
    assert!(stdout.contains("--type"), "Should show type option");
    assert!(stdout.contains("low-power"), "Should list scan types");
    assert!(stdout.contains("--ssid"), "Should show ssid option");
    assert!(stdout.contains("--freq"), "Should show freq option");
    assert!(stdout.contains("--randomize-mac"), "Should show randomize-mac option");
}

/// Test pno start subcommand help
#[test]
fn test_pno_start_help() {
    let output = scanctl(&["pno", "start", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "PNO start help should succeed");
    assert!(stdout.contains("--interval-ms"), "Should show interval option");
    assert!(stdout.contains("--match"), "Should show match option");
}

/// Test invalid command error handling
#[test]
fn test_invalid_command() {
    let output = scanctl(&["invalid-command"]);
    assert!(!output.status.success(), "Invalid command should fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("error") || stderr.contains("invalid"),
        "Should show error message"
    );
}

/// Test missing required argument error handling
#[test]
fn test_missing_interval() {
    let output = scanctl(&["pno", "start"]);
    assert!(!output.status.success(), "Missing argument should fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--interval-ms"), "Should name the missing argument");
}

/// Test that an unknown scan type is rejected before any request is made
#[test]
fn test_invalid_scan_type() {
    let output = scanctl(&["scan", "--type", "turbo"]);
    assert!(!output.status.success(), "Unknown scan type should fail");
}

/// Test a scan against a mocked daemon
#[test]
fn test_scan_against_daemon() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/v1/interfaces/wlan1/scan")
        .match_body(mockito::Matcher::PartialJson(serde_json::json!({
            "scan_type": "low_span",
            "frequencies": [2412, 5180],
            "randomize_mac": true,
        })))
        .with_header("content-type", "application/json")
        .with_body(r#"{"ok": true}"#)
        .create();

    let url = server.url();
    let output = scanctl(&[
        "--api-url",
        &url,
        "-i",
        "wlan1",
        "scan",
        "--type",
        "low-span",
        "--freq",
        "2412",
        "--freq",
        "5180",
        "--randomize-mac",
    ]);

    assert!(output.status.success(), "Scan should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Scan started on wlan1"));
    mock.assert();
}

/// Test that a rejected scan exits non-zero
#[test]
fn test_rejected_scan_fails() {
    let mut server = mockito::Server::new();
    server
        .mock("POST", "/v1/interfaces/wlan0/scan")
        .with_header("content-type", "application/json")
        .with_body(r#"{"ok": false}"#)
        .create();

    let url = server.url();
    let output = scanctl(&["--api-url", &url, "scan"]);

    assert!(!output.status.success(), "Rejected scan should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("rejected"));
}

/// Test JSON output of PNO results
#[test]
fn test_pno_results_json() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/v1/interfaces/wlan0/pno/results")
        .with_header("content-type", "application/json")
        .with_body(
            r#"[{"bssid": "02:1a:11:00:00:01", "ssid": "HomeNetwork", "frequency_mhz": 5180,
                 "signal_dbm": -48, "capability": 1041, "timestamp_us": 1200000, "associated": true}]"#,
        )
        .create();

    let url = server.url();
    let output = scanctl(&["--api-url", &url, "--format", "json", "pno", "results"]);

    assert!(output.status.success(), "PNO results should succeed");
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed[0]["ssid"], "HomeNetwork");
    assert_eq!(parsed[0]["signal_dbm"], -48);
}

/// Test unknown interface error surfaces the daemon's message
#[test]
fn test_unknown_interface() {
    let mut server = mockito::Server::new();
    server
        .mock("POST", "/v1/interfaces/wlan9/pno/stop")
        .with_status(404)
        .with_body(r#"{"error": "unknown interface: wlan9"}"#)
        .create();

    let url = server.url();
    let output = scanctl(&["--api-url", &url, "-i", "wlan9", "pno", "stop"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown interface: wlan9"));
}

/// Test that an unreachable daemon is reported as an error
#[test]
fn test_unreachable_daemon() {
    let output = scanctl(&["--api-url", "http://127.0.0.1:1", "status"]);
    assert!(!output.status.success(), "Unreachable daemon should fail");
}
