//! CLI integration tests

use std::process::{Command, Output};
use tempfile::TempDir;

/// Run eactl with an isolated home directory
fn eactl(home: &TempDir, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_eactl"))
        .args(args)
        .env("HOME", home.path())
        .env("NO_COLOR", "1")
        .env_remove("EACTL_API_URL")
        .output()
        .expect("Failed to execute command")
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let home = TempDir::new().unwrap();
    let output = eactl(&home, &["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("Energy Agent"), "Should show app name");
    assert!(stdout.contains("estimate"), "Should show estimate command");
    assert!(stdout.contains("energy"), "Should show energy command");
    assert!(stdout.contains("sustainability"), "Should show sustainability command");
    assert!(stdout.contains("allocate"), "Should show allocate command");
    assert!(stdout.contains("status"), "Should show status command");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let home = TempDir::new().unwrap();
    let output = eactl(&home, &["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("eactl"), "Should show binary name");
}

#[test]
fn test_allocate_help() {
    let home = TempDir::new().unwrap();
    let output = eactl(&home, &["allocate", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("--cpu-request"));
    assert!(stdout.contains("--memory-request"));
    assert!(stdout.contains("--priority"));
    assert!(stdout.contains("--max-energy"));
}

#[test]
fn test_estimate_json_output() {
    let home = TempDir::new().unwrap();
    let output = eactl(
        &home,
        &[
            "--format", "json", "estimate", "--class", "t3.medium", "--cpu", "50", "--region",
            "us-east-1",
        ],
    );

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["energy_consumption_watts"], 14.0);
    assert!((result["carbon_footprint_kg"].as_f64().unwrap() - 0.0056).abs() < 1e-12);
    assert_eq!(result["instance_class"], "t3.medium");
}

#[test]
fn test_estimate_unknown_class_uses_fallback() {
    let home = TempDir::new().unwrap();
    let output = eactl(
        &home,
        &["-f", "json", "estimate", "--class", "x9.huge", "--cpu", "100", "--region", "nowhere"],
    );

    assert!(output.status.success());
    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    // 5 W idle, 12.5 W at full load
    assert_eq!(result["energy_consumption_watts"], 12.5);
}

#[test]
fn test_estimate_table_output() {
    let home = TempDir::new().unwrap();
    let output = eactl(&home, &["estimate", "--class", "t3.micro", "--cpu", "0"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("Energy Estimate"));
    assert!(stdout.contains("2.00 W"));
}

#[test]
fn test_unreachable_agent_fails() {
    let home = TempDir::new().unwrap();
    let output = eactl(&home, &["--api-url", "http://127.0.0.1:1", "status"]);

    assert!(!output.status.success(), "Status should fail without an agent");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to send request"));
}

#[test]
fn test_config_set_and_show() {
    let home = TempDir::new().unwrap();

    let output = eactl(
        &home,
        &["config", "set", "--api-url", "http://agent:8000", "--default-format", "json"],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(home.path().join(".config/eactl/config.json").exists());

    // default_format = json now applies without --format
    let output = eactl(&home, &["config", "show"]);
    assert!(output.status.success());
    let config: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(config["api_url"], "http://agent:8000");
    assert_eq!(config["default_format"], "json");
}

#[test]
fn test_config_set_rejects_unknown_format() {
    let home = TempDir::new().unwrap();
    let output = eactl(&home, &["config", "set", "--default-format", "yaml"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown output format"));
}
