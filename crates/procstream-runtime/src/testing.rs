//! In-memory process-control implementation.
//!
//! Serves a fixed process table and records lifecycle commands. Used by the
//! test suites of this crate and the adapter crates.

use std::sync::Mutex;

use async_trait::async_trait;
use procstream_core::{ProcessControlError, ProcessControlPort, ProcessInfo, ProcessStatus};

/// A process table held in memory.
#[derive(Debug, Default)]
pub struct StaticProcesses {
    processes: Mutex<Vec<ProcessInfo>>,
    unavailable: bool,
}

impl StaticProcesses {
    pub fn new(processes: Vec<ProcessInfo>) -> Self {
        Self {
            processes: Mutex::new(processes),
            unavailable: false,
        }
    }

    /// A supervisor that fails every call with `SupervisorUnavailable`.
    pub fn unavailable() -> Self {
        Self {
            processes: Mutex::new(Vec::new()),
            unavailable: true,
        }
    }

    fn check(&self) -> Result<(), ProcessControlError> {
        if self.unavailable {
            return Err(ProcessControlError::SupervisorUnavailable(
                "supervisor offline".to_string(),
            ));
        }
        Ok(())
    }

    fn update(
        &self,
        name: &str,
        apply: impl FnOnce(&mut ProcessInfo),
    ) -> Result<(), ProcessControlError> {
        self.check()?;
        let mut processes = self
            .processes
            .lock()
            .map_err(|_| ProcessControlError::SupervisorUnavailable("poisoned".to_string()))?;
        let process = processes
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or_else(|| ProcessControlError::ProcessNotFound(name.to_string()))?;
        apply(process);
        Ok(())
    }
}

#[async_trait]
impl ProcessControlPort for StaticProcesses {
    async fn list_processes(&self) -> Result<Vec<ProcessInfo>, ProcessControlError> {
        self.check()?;
        self.processes
            .lock()
            .map(|p| p.clone())
            .map_err(|_| ProcessControlError::SupervisorUnavailable("poisoned".to_string()))
    }

    async fn describe_process(&self, name: &str) -> Result<ProcessInfo, ProcessControlError> {
        self.list_processes()
            .await?
            .into_iter()
            .find(|p| p.name == name)
            .ok_or_else(|| ProcessControlError::ProcessNotFound(name.to_string()))
    }

    async fn start_process(&self, name: &str) -> Result<(), ProcessControlError> {
        self.update(name, |p| p.status = ProcessStatus::Online)
    }

    async fn stop_process(&self, name: &str) -> Result<(), ProcessControlError> {
        self.update(name, |p| p.status = ProcessStatus::Stopped)
    }

    async fn restart_process(&self, name: &str) -> Result<(), ProcessControlError> {
        self.update(name, |p| {
            p.status = ProcessStatus::Online;
            p.restarts += 1;
        })
    }
}
