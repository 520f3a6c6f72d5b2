// tests/integration/sync_test.rs

//! Tests for the registry sync launcher.

use reginabox::config::SyncConfig;
use reginabox::core::tasks::sync::RegistrySyncTask;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tokio::sync::broadcast;
use tokio::time::{Duration, timeout};

fn sync_config(command: &str) -> SyncConfig {
    SyncConfig {
        enabled: true,
        command: command.to_string(),
        domain: "localhost".to_string(),
        shutdown_grace_secs: 2,
    }
}

/// Writes an executable shell script and returns its path.
fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[test]
fn test_sync_arguments() {
    let task = RegistrySyncTask::new(&sync_config("registry-static"), PathBuf::from("/srv/registry"));
    assert_eq!(task.args(), vec!["-o", "/srv/registry", "-d", "localhost"]);
}

#[tokio::test]
async fn test_sync_passes_output_dir_and_domain() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("args.txt");
    let cmd = script(dir.path(), "fake-sync", &format!("echo \"$@\" > {}", out.display()));

    let task = RegistrySyncTask::new(
        &sync_config(cmd.to_str().unwrap()),
        dir.path().join("registry"),
    );
    let (_tx, rx) = broadcast::channel(1);
    timeout(Duration::from_secs(10), task.run(rx)).await.unwrap();

    let args = std::fs::read_to_string(out).unwrap();
    assert_eq!(
        args.trim(),
        format!("-o {} -d localhost", dir.path().join("registry").display())
    );
}

#[tokio::test]
async fn test_missing_sync_command_does_not_panic() {
    let task = RegistrySyncTask::new(
        &sync_config("/definitely/not/a/real/registry-static"),
        PathBuf::from("registry"),
    );
    let (_tx, rx) = broadcast::channel(1);
    timeout(Duration::from_secs(5), task.run(rx)).await.unwrap();
}

#[tokio::test]
async fn test_failing_sync_command_is_tolerated() {
    let dir = tempfile::tempdir().unwrap();
    let cmd = script(dir.path(), "failing-sync", "exit 3");
    let task = RegistrySyncTask::new(&sync_config(cmd.to_str().unwrap()), dir.path().to_path_buf());
    let (_tx, rx) = broadcast::channel(1);
    timeout(Duration::from_secs(10), task.run(rx)).await.unwrap();
}

#[tokio::test]
async fn test_shutdown_stops_long_running_sync() {
    let dir = tempfile::tempdir().unwrap();
    let cmd = script(dir.path(), "slow-sync", "exec sleep 60");
    let task = RegistrySyncTask::new(&sync_config(cmd.to_str().unwrap()), dir.path().to_path_buf());

    let (tx, rx) = broadcast::channel(1);
    let handle = tokio::spawn(task.run(rx));
    tokio::time::sleep(Duration::from_millis(200)).await;
    tx.send(()).unwrap();

    timeout(Duration::from_secs(10), handle)
        .await
        .expect("sync task should stop after shutdown")
        .unwrap();
}
