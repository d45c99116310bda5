use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

fn ageing_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("ageing"))
}

fn write_config(config_path: &std::path::Path, config: &str) {
    fs::write(config_path.join("config.toml"), config).unwrap();
}

// Backend URL that refuses connections immediately; no test talks to a
// real backend.
const UNREACHABLE: &str = r#"[backend]
url = "http://127.0.0.1:1"
timeout_secs = 1

[export]
output_dir = "output"
"#;

#[test]
fn test_help() {
    ageing_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "CLI client for partner ageing statement of account reports",
        ));
}

#[test]
fn test_version() {
    ageing_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("ageing"));
}

#[test]
fn test_init_creates_config() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("ageing-config");

    ageing_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized ageing config"));

    // Check files were created
    assert!(config_path.join("config.toml").exists());
    assert!(config_path.join("output").exists());
}

#[test]
fn test_init_fails_if_exists() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("ageing-config");

    // First init should succeed
    ageing_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .success();

    // Second init should fail
    ageing_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_show_without_init() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("nonexistent");

    ageing_cmd()
        .args(["-C", config_path.to_str().unwrap(), "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_show_invalid_date() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("ageing-config");

    ageing_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .success();

    ageing_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "show",
            "--as-of",
            "junk",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid date"));
}

#[test]
fn test_show_invalid_posting_state() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("ageing-config");

    ageing_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .success();

    ageing_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "show",
            "--state",
            "bogus",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid posting state"));
}

#[test]
fn test_show_invalid_account_type() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("ageing-config");

    ageing_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .success();

    ageing_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "show",
            "--account-type",
            "vendorish",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid account type"));
}

#[test]
fn test_show_session_create_failure_is_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("ageing-config");

    ageing_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .success();
    write_config(&config_path, UNREACHABLE);

    ageing_cmd()
        .args(["-C", config_path.to_str().unwrap(), "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not create a report session"));
}

#[test]
fn test_partners_surfaces_transport_error() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("ageing-config");

    ageing_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .success();
    write_config(&config_path, UNREACHABLE);

    ageing_cmd()
        .args(["-C", config_path.to_str().unwrap(), "partners"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not load the report"));
}

#[test]
fn test_export_sheet_fails_without_session() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("ageing-config");

    ageing_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .success();
    write_config(&config_path, UNREACHABLE);

    ageing_cmd()
        .args(["-C", config_path.to_str().unwrap(), "export-sheet"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not create a report session"));
}

#[test]
fn test_open_entry_url_only() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("ageing-config");

    ageing_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .success();

    ageing_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "open-entry",
            "42",
            "--url-only",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("web#model=account.move&id=42"));
}
