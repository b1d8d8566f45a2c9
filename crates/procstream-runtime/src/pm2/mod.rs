//! PM2 process-control adapter.
//!
//! Talks to PM2 through its CLI: `pm2 jlist` for listings and
//! `pm2 start|stop|restart <name>` for lifecycle commands. Calls are
//! serialized so concurrent requests never race on the PM2 daemon socket.

mod parse;

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use procstream_core::{ProcessControlError, ProcessControlPort, ProcessInfo};
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub use parse::parse_process_list;

/// Binary name used when none is configured.
pub const DEFAULT_PM2_BIN: &str = "pm2";

/// [`ProcessControlPort`] backed by the `pm2` CLI.
#[derive(Debug)]
pub struct Pm2Supervisor {
    binary: PathBuf,
    lock: Mutex<()>,
}

impl Default for Pm2Supervisor {
    fn default() -> Self {
        Self::new(DEFAULT_PM2_BIN)
    }
}

impl Pm2Supervisor {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            lock: Mutex::new(()),
        }
    }

    /// Run `pm2 <args>` and return its stdout.
    async fn run(&self, args: &[&str]) -> Result<String, ProcessControlError> {
        let _serialized = self.lock.lock().await;
        debug!(binary = %self.binary.display(), ?args, "Running pm2");

        let output = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                ProcessControlError::SupervisorUnavailable(format!(
                    "failed to run {}: {e}",
                    self.binary.display()
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(?args, status = %output.status, stderr = %stderr.trim(), "pm2 command failed");
            return Err(ProcessControlError::SupervisorUnavailable(format!(
                "pm2 {} exited with {}: {}",
                args.join(" "),
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn lifecycle(&self, command: &str, name: &str) -> Result<(), ProcessControlError> {
        // pm2 reports unknown names only in free-form text; check first
        self.describe_process(name).await?;
        self.run(&[command, name]).await?;
        info!(process = %name, command, "pm2 command succeeded");
        Ok(())
    }
}

#[async_trait]
impl ProcessControlPort for Pm2Supervisor {
    async fn list_processes(&self) -> Result<Vec<ProcessInfo>, ProcessControlError> {
        let stdout = self.run(&["jlist"]).await?;
        parse_process_list(&stdout)
    }

    async fn describe_process(&self, name: &str) -> Result<ProcessInfo, ProcessControlError> {
        self.list_processes()
            .await?
            .into_iter()
            .find(|p| p.name == name)
            .ok_or_else(|| ProcessControlError::ProcessNotFound(name.to_string()))
    }

    async fn start_process(&self, name: &str) -> Result<(), ProcessControlError> {
        self.lifecycle("start", name).await
    }

    async fn stop_process(&self, name: &str) -> Result<(), ProcessControlError> {
        self.lifecycle("stop", name).await
    }

    async fn restart_process(&self, name: &str) -> Result<(), ProcessControlError> {
        self.lifecycle("restart", name).await
    }
}
