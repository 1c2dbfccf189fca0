//! CLI options interaction tests
//!
//! These tests run the `nst` binary against a mock speed test server and
//! check output formats, option handling and exit codes.

use assert_cmd::prelude::*;
use network_speed_tester::{
    config::EnvManager,
    models::config::mb_to_bytes,
    payload::{generate_payload, OCTET_STREAM},
};
use predicates::prelude::*;
use serde_json::{json, Value};
use std::process::Command;
use tempfile::TempDir;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

/// Helper function to create a test command isolated from local .env files
fn create_test_cmd(workdir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("nst").unwrap();
    cmd.current_dir(workdir.path());
    for (var, _, _) in EnvManager::get_supported_env_vars() {
        cmd.env_remove(var);
    }
    cmd
}

async fn healthy_server() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/ping-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/speed-test/download"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(generate_payload(mb_to_bytes(0.25)).to_vec(), OCTET_STREAM),
        )
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/speed-test/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .mount(&server)
        .await;

    server
}

fn speed_test_args(server: &MockServer) -> Vec<String> {
    vec![
        "--url".to_string(),
        format!("{}/api", server.uri()),
        "--download-size".to_string(),
        "0.25".to_string(),
        "--upload-size".to_string(),
        "0.125".to_string(),
        "--timeout".to_string(),
        "5".to_string(),
    ]
}

#[tokio::test(flavor = "multi_thread")]
async fn test_json_output_is_parseable() {
    let server = healthy_server().await;
    let workdir = TempDir::new().unwrap();

    let output = create_test_cmd(&workdir)
        .args(speed_test_args(&server))
        .arg("--json")
        .output()
        .unwrap();

    assert!(output.status.success());
    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["phase"], "complete");
    assert_eq!(report["progress"], 100);
    assert_eq!(report["pingPhase"]["status"], "success");
    assert!(report["results"]["downloadSpeed"].as_f64().unwrap() > 0.0);
    assert!(report["results"]["uploadSpeed"].as_f64().unwrap() > 0.0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_plain_table_output() {
    let server = healthy_server().await;
    let workdir = TempDir::new().unwrap();

    create_test_cmd(&workdir)
        .args(speed_test_args(&server))
        .args(["--no-color", "--raw"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Speed Test Results"))
        .stdout(predicate::str::contains("| Ping"))
        .stdout(predicate::str::contains("Raw"))
        .stdout(predicate::str::contains("\x1b[").not())
        .stderr(predicate::str::contains("[100%]"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_verbose_output_shows_phase_errors() {
    let server = MockServer::start().await;
    Mock::given(path("/api/ping-test"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(path("/api/speed-test/download"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(path("/api/speed-test/upload"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    let workdir = TempDir::new().unwrap();

    create_test_cmd(&workdir)
        .args(speed_test_args(&server))
        .args(["--no-color", "--verbose"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Download: Unexpected HTTP status: 503"))
        .stdout(predicate::str::contains("WARNING: 2 of 3 measurements completed"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_all_phases_failing_exits_with_test_error() {
    let server = MockServer::start().await;
    Mock::given(path("/api/ping-test"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let workdir = TempDir::new().unwrap();

    create_test_cmd(&workdir)
        .args(speed_test_args(&server))
        .arg("--no-color")
        .assert()
        .code(6)
        .stdout(predicate::str::contains("Failed"))
        .stderr(predicate::str::contains("No measurement succeeded"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_env_file_supplies_server_url() {
    let server = healthy_server().await;
    let workdir = TempDir::new().unwrap();
    std::fs::write(
        workdir.path().join(".env"),
        format!(
            "SPEED_TEST_URL={}/api\nDOWNLOAD_FILE_SIZE_MB=0.25\nUPLOAD_FILE_SIZE_MB=0.125\n",
            server.uri()
        ),
    )
    .unwrap();

    let output = create_test_cmd(&workdir).arg("--json").output().unwrap();

    assert!(output.status.success());
    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["downloadPhase"]["status"], "success");
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[test]
fn test_env_help() {
    let workdir = TempDir::new().unwrap();

    create_test_cmd(&workdir)
        .arg("--env-help")
        .assert()
        .success()
        .stdout(predicate::str::contains("SPEED_TEST_URL"))
        .stdout(predicate::str::contains("MIN_PING_MS"));
}

#[test]
fn test_env_help_reports_invalid_env_file() {
    let workdir = TempDir::new().unwrap();
    std::fs::write(
        workdir.path().join(".env"),
        "SPEED_TEST_URL=http://localhost:3000/api\nPHASE_TIMEOUT_SECONDS=0\n",
    )
    .unwrap();

    create_test_cmd(&workdir)
        .arg("--env-help")
        .assert()
        .success()
        .stdout(predicate::str::contains(".env: 1 invalid value(s)"))
        .stdout(predicate::str::contains("PHASE_TIMEOUT_SECONDS=0"));
}

#[test]
fn test_generate_env_writes_loadable_file() {
    let workdir = TempDir::new().unwrap();

    create_test_cmd(&workdir)
        .args(["--generate-env", ".env"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote example configuration to .env"));

    let content = std::fs::read_to_string(workdir.path().join(".env")).unwrap();
    assert!(content.contains("# SPEED_TEST_URL="));

    create_test_cmd(&workdir)
        .arg("--env-help")
        .assert()
        .success()
        .stdout(predicate::str::contains(".env: all values are valid"));
}

#[test]
fn test_generate_env_into_missing_directory_fails() {
    let workdir = TempDir::new().unwrap();

    create_test_cmd(&workdir)
        .args(["--generate-env", "missing/dir/.env"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to write example .env file"));
}

#[test]
fn test_conflicting_color_flags() {
    let workdir = TempDir::new().unwrap();

    create_test_cmd(&workdir)
        .args(["--color", "--no-color"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Cannot specify both --color and --no-color"));
}

#[test]
fn test_invalid_option_values() {
    let workdir = TempDir::new().unwrap();

    create_test_cmd(&workdir)
        .args(["--timeout", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Duration must be greater than 0"));

    create_test_cmd(&workdir)
        .args(["--download-size", "abc"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid size"));

    create_test_cmd(&workdir)
        .args(["--url", "ftp://speed.example.com"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("URL must use http or https"));
}

#[test]
fn test_invalid_env_value_is_config_error() {
    let workdir = TempDir::new().unwrap();

    create_test_cmd(&workdir)
        .env("DOWNLOAD_CALIBRATION_FACTOR", "fast")
        .args(["--no-color", "--timeout", "1"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("DOWNLOAD_CALIBRATION_FACTOR"));
}

#[test]
fn test_version_flag() {
    let workdir = TempDir::new().unwrap();

    create_test_cmd(&workdir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("nst"));
}
