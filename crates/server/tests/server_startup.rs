//! Start-up failure tests against the real binary.

use std::io::Write;
use std::time::Duration;

use tempfile::NamedTempFile;
use tokio::time::timeout;

async fn run_with_config(config_path: &std::path::Path) -> std::process::ExitStatus {
    let mut child = tokio::process::Command::new(env!("CARGO_BIN_EXE_nics-processors"))
        .env("NICS_PROC_CONFIG", config_path)
        .env("RUST_LOG", "error") // Quiet logs during tests
        .kill_on_drop(true)
        .spawn()
        .expect("Failed to spawn server");

    timeout(Duration::from_secs(10), child.wait())
        .await
        .expect("Server did not exit")
        .expect("Failed to wait for server")
}

#[tokio::test]
async fn test_missing_config_exits_with_error() {
    let status = run_with_config(std::path::Path::new("/nonexistent/nics.toml")).await;
    assert_eq!(status.code(), Some(1));
}

#[tokio::test]
async fn test_invalid_rooms_config_exits_with_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[server]
host = "127.0.0.1"
port = 18085

[provisioner]
rooms = "not json"

[provisioner.emapi]
url = "http://127.0.0.1:9/em-api/v1"
identity_user = "nics-service@example.org"
identity_org_id = 1
"#
    )
    .unwrap();

    let status = run_with_config(file.path()).await;
    assert_eq!(status.code(), Some(1));
}

#[tokio::test]
async fn test_unreachable_emapi_exits_with_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[server]
host = "127.0.0.1"
port = 18086

[provisioner]
rooms = '{{"rooms": [{{"roomName": "Working Map"}}]}}'

[provisioner.emapi]
url = "http://127.0.0.1:9/em-api/v1"
identity_user = "nics-service@example.org"
identity_org_id = 1
timeout_secs = 2
"#
    )
    .unwrap();

    let status = run_with_config(file.path()).await;
    assert_eq!(status.code(), Some(1));
}
