// src/core/tasks/sync.rs

//! Launches the external registry sync process that populates the output
//! directory, and stops it when the server shuts down.

use crate::config::SyncConfig;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::sync::broadcast;
use tracing::{error, info, warn};

pub struct RegistrySyncTask {
    command: String,
    domain: String,
    output_dir: PathBuf,
    shutdown_grace: Duration,
}

impl RegistrySyncTask {
    pub fn new(config: &SyncConfig, output_dir: PathBuf) -> Self {
        Self {
            command: config.command.clone(),
            domain: config.domain.clone(),
            output_dir,
            shutdown_grace: Duration::from_secs(config.shutdown_grace_secs),
        }
    }

    /// The arguments passed to the sync command.
    pub fn args(&self) -> Vec<String> {
        vec![
            "-o".to_string(),
            self.output_dir.display().to_string(),
            "-d".to_string(),
            self.domain.clone(),
        ]
    }

    fn spawn(&self) -> std::io::Result<Child> {
        Command::new(&self.command)
            .args(self.args())
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
    }

    /// Runs the sync process to completion, or until shutdown is signalled.
    /// A failing or missing sync command is logged but never stops the server.
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) {
        info!(
            "Starting registry sync: {} {}",
            self.command,
            self.args().join(" ")
        );
        let mut child = match self.spawn() {
            Ok(child) => child,
            Err(e) => {
                error!("Failed to start registry sync '{}': {}", self.command, e);
                return;
            }
        };

        tokio::select! {
            status = child.wait() => log_exit(status),
            _ = shutdown_rx.recv() => {
                info!("Stopping registry sync.");
                self.stop(&mut child).await;
            }
        }
    }

    /// Interrupts the child like a terminal Ctrl-C would, then kills it if it
    /// is still running after the grace period.
    async fn stop(&self, child: &mut Child) {
        interrupt(child);
        match tokio::time::timeout(self.shutdown_grace, child.wait()).await {
            Ok(status) => log_exit(status),
            Err(_) => {
                warn!(
                    "Registry sync did not exit within {:?}, killing it.",
                    self.shutdown_grace
                );
                if let Err(e) = child.kill().await {
                    error!("Failed to kill registry sync: {}", e);
                }
            }
        }
    }
}

#[cfg(unix)]
fn interrupt(child: &Child) {
    if let Some(pid) = child.id() {
        // SAFETY: `kill` only sends a signal; the pid belongs to our own child.
        let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGINT) };
        if rc != 0 {
            warn!(
                "Failed to send SIGINT to registry sync: {}",
                std::io::Error::last_os_error()
            );
        }
    }
}

#[cfg(not(unix))]
fn interrupt(_child: &Child) {}

fn log_exit(status: std::io::Result<ExitStatus>) {
    match status {
        Ok(s) if s.success() => info!("Registry sync finished."),
        Ok(s) => warn!("Registry sync exited with {}", s),
        Err(e) => error!("Failed to wait for registry sync: {}", e),
    }
}
