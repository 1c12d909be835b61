//! CLI integration tests
//!
//! Runs the `rivian-telemetry` binary with an isolated environment, against
//! a mock gateway where a network round trip is needed.

mod common;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use common::{MockData, MockServerFactory};
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::MockServer;

const SCRUBBED_VARS: [&str; 14] = [
    "RIVIAN_CONFIG",
    "RIVIAN_SESSION",
    "RIVIAN_SESSION_FILE",
    "RIVIAN_VEHICLE_ID",
    "RIVIAN_GATEWAY_URL",
    "RIVIAN_USERNAME",
    "RIVIAN_PASSWORD",
    "RIVIAN_POLL_INTERVAL",
    "RIVIAN_INACTIVITY_WAIT",
    "RIVIAN_SLEEP_WAIT",
    "HTTPS_PROXY",
    "HTTP_PROXY",
    "ALL_PROXY",
    "RUST_LOG",
];

/// Command with an empty config file, a private session path and no
/// inherited telemetry variables
fn isolated_cmd(dir: &TempDir) -> Command {
    let config = dir.path().join("config.toml");
    std::fs::write(&config, "").unwrap();

    let mut cmd = cargo_bin_cmd!("rivian-telemetry");
    for var in SCRUBBED_VARS {
        cmd.env_remove(var);
    }
    cmd.env("RIVIAN_SESSION_FILE", dir.path().join("session.json"))
        .arg("--config")
        .arg(config);
    cmd
}

fn against(cmd: &mut Command, server: &MockServer) {
    cmd.env("RIVIAN_GATEWAY_URL", format!("{}/graphql", server.uri()));
}

#[test]
fn test_version_flag() {
    let mut cmd = cargo_bin_cmd!("rivian-telemetry");
    cmd.arg("--version");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_help_lists_subcommands() {
    let mut cmd = cargo_bin_cmd!("rivian-telemetry");
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("poll"))
        .stdout(predicate::str::contains("state"))
        .stdout(predicate::str::contains("last-seen"));
}

#[test]
fn test_poll_help_lists_options() {
    let mut cmd = cargo_bin_cmd!("rivian-telemetry");
    cmd.args(["poll", "--help"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--inactivity-wait"))
        .stdout(predicate::str::contains("--sleep-wait"))
        .stdout(predicate::str::contains("--privacy"))
        .stdout(predicate::str::contains("required unless RIVIAN_VEHICLE_ID"));
}

#[test]
fn test_missing_subcommand_fails() {
    let mut cmd = cargo_bin_cmd!("rivian-telemetry");
    cmd.assert().failure();
}

#[test]
fn test_poll_without_session_asks_for_login() {
    let dir = TempDir::new().unwrap();
    let mut cmd = isolated_cmd(&dir);
    cmd.args(["poll", "--vehicle-id", "v1", "--query"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("rivian-telemetry login"));
}

#[test]
fn test_poll_without_vehicle_id_fails() {
    let dir = TempDir::new().unwrap();
    let mut cmd = isolated_cmd(&dir);
    cmd.env("RIVIAN_SESSION", "a:r:u").args(["poll", "--query"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("--vehicle-id"));
}

#[test]
fn test_malformed_session_variable_is_reported() {
    let dir = TempDir::new().unwrap();
    let mut cmd = isolated_cmd(&dir);
    cmd.env("RIVIAN_SESSION", "only-one-part")
        .args(["state", "--vehicle-id", "v1"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("RIVIAN_SESSION"));
}

#[test]
fn test_invalid_interval_override_fails() {
    let dir = TempDir::new().unwrap();
    let mut cmd = isolated_cmd(&dir);
    cmd.args(["poll", "--vehicle-id", "v1", "--interval", "0"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("poll_interval"));
}

#[test]
fn test_missing_rivian_config_file_is_reported() {
    let dir = TempDir::new().unwrap();
    let mut cmd = cargo_bin_cmd!("rivian-telemetry");
    for var in SCRUBBED_VARS {
        cmd.env_remove(var);
    }
    cmd.env("HOME", dir.path())
        .env("XDG_CONFIG_HOME", dir.path())
        .env("RIVIAN_CONFIG", dir.path().join("missing.toml"))
        .args(["poll", "--query"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("RIVIAN_CONFIG points to non-existent file"));
}

#[test]
fn test_missing_config_flag_file_is_reported() {
    let dir = TempDir::new().unwrap();
    let mut cmd = cargo_bin_cmd!("rivian-telemetry");
    for var in SCRUBBED_VARS {
        cmd.env_remove(var);
    }
    cmd.arg("--config")
        .arg(dir.path().join("missing.toml"))
        .args(["poll", "--query"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("configuration file not found"));
}

#[test]
fn test_login_requires_credentials() {
    let dir = TempDir::new().unwrap();
    let mut cmd = isolated_cmd(&dir);
    cmd.arg("login");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("RIVIAN_USERNAME"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_poll_query_prints_header_and_one_record() {
    let server = MockServerFactory::new().await;
    MockServerFactory::setup_csrf(&server).await;
    MockServerFactory::setup_vehicle_state(&server, MockData::vehicle_state("ready", 16093.44))
        .await;

    let dir = TempDir::new().unwrap();
    let mut cmd = isolated_cmd(&dir);
    against(&mut cmd, &server);
    cmd.env("RIVIAN_SESSION", "access-1:refresh-1:user-session-1")
        .args(["poll", "--vehicle-id", "v1", "--query", "--privacy"]);

    let output = tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap();
    assert!(output.status.success(), "{:?}", output);

    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2, "{}", stdout);
    assert!(lines[0].starts_with("timestamp,Power,"));
    assert!(!lines[0].contains("Latitude"));
    assert!(lines[1].contains(",ready,everyday,park,10.0,"), "{}", lines[1]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_state_minimal_prints_json() {
    let server = MockServerFactory::new().await;
    MockServerFactory::setup_csrf(&server).await;
    MockServerFactory::setup_vehicle_state(&server, MockData::vehicle_state("sleep", 100.0)).await;

    let dir = TempDir::new().unwrap();
    let mut cmd = isolated_cmd(&dir);
    against(&mut cmd, &server);
    cmd.env("RIVIAN_SESSION", "access-1:refresh-1:user-session-1")
        .args(["state", "--vehicle-id", "v1", "--minimal"]);

    let output = tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap();
    assert!(output.status.success(), "{:?}", output);

    let state: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(state["powerState"], "sleep");
    assert_eq!(state["batteryLevelPct"], 81.5);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_last_seen_prints_timestamp() {
    let server = MockServerFactory::new().await;
    MockServerFactory::setup_csrf(&server).await;
    MockServerFactory::setup_operation(
        &server,
        "GetVehicleLastConnection",
        json!({ "data": { "vehicleState": {
            "cloudConnection": { "lastSync": "2024-03-01T17:22:05Z" }
        } } }),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let mut cmd = isolated_cmd(&dir);
    against(&mut cmd, &server);
    cmd.env("RIVIAN_SESSION", "access-1:refresh-1:user-session-1")
        .args(["last-seen", "--vehicle-id", "v1"]);

    let output = tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap();
    assert!(output.status.success(), "{:?}", output);

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("Vehicle last seen: 2024-03-0"), "{}", stdout);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_login_with_otp_writes_session_file() {
    let server = MockServerFactory::new().await;
    MockServerFactory::setup_csrf(&server).await;
    MockServerFactory::setup_operation(&server, "Login", MockData::mfa_response()).await;
    MockServerFactory::setup_operation(&server, "LoginWithOTP", MockData::otp_response()).await;

    let dir = TempDir::new().unwrap();
    let session_path = dir.path().join("session.json");
    let mut cmd = isolated_cmd(&dir);
    against(&mut cmd, &server);
    cmd.args([
        "login",
        "--username",
        "me@example.com",
        "--password",
        "hunter2",
        "--otp",
        "123456",
    ]);

    let output = tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap();
    assert!(output.status.success(), "{:?}", output);
    assert!(String::from_utf8_lossy(&output.stdout).contains("Logged in"));

    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(session_path).unwrap()).unwrap();
    assert_eq!(saved["userSessionToken"], "user-session-otp");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejected_session_exits_with_login_hint() {
    let server = MockServerFactory::new().await;
    MockServerFactory::setup_csrf(&server).await;
    MockServerFactory::setup_operation(
        &server,
        "GetVehicleState",
        MockData::graphql_error("token expired", "UNAUTHENTICATED"),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let mut cmd = isolated_cmd(&dir);
    against(&mut cmd, &server);
    cmd.env("RIVIAN_SESSION", "access-1:refresh-1:user-session-1")
        .args(["poll", "--vehicle-id", "v1"]);

    let output = tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("rivian-telemetry login"));
}
