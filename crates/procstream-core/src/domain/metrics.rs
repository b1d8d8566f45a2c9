//! Fleet metrics snapshot.
//!
//! Snapshots are derived on demand from a process listing and never stored.

use serde::{Deserialize, Serialize};

use super::{ProcessInfo, ProcessStatus};

/// Per-process row of a metrics snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessMetric {
    pub name: String,
    pub status: ProcessStatus,
    pub cpu: f64,
    pub memory: u64,
    pub uptime: u64,
    pub restarts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
}

impl From<&ProcessInfo> for ProcessMetric {
    fn from(p: &ProcessInfo) -> Self {
        Self {
            name: p.name.clone(),
            status: p.status,
            cpu: p.cpu,
            memory: p.memory,
            uptime: p.uptime,
            restarts: p.restarts,
            port: p.port,
            pid: p.pid,
        }
    }
}

/// Aggregate view over the whole supervised fleet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub total_processes: usize,
    /// Processes with status `online`
    pub running_processes: usize,
    /// Processes with status `stopped`
    pub stopped_processes: usize,
    /// Processes with status `errored`
    pub erroring_processes: usize,
    /// Sum of per-process CPU percentages
    pub total_cpu: f64,
    /// Sum of per-process memory in bytes
    pub total_memory: u64,
    pub processes: Vec<ProcessMetric>,
}

impl MetricsSnapshot {
    /// Compute a snapshot from a process listing.
    pub fn from_processes(processes: &[ProcessInfo]) -> Self {
        let count = |status: ProcessStatus| processes.iter().filter(|p| p.status == status).count();

        Self {
            total_processes: processes.len(),
            running_processes: count(ProcessStatus::Online),
            stopped_processes: count(ProcessStatus::Stopped),
            erroring_processes: count(ProcessStatus::Errored),
            total_cpu: processes.iter().map(|p| p.cpu).sum(),
            total_memory: processes.iter().map(|p| p.memory).sum(),
            processes: processes.iter().map(ProcessMetric::from).collect(),
        }
    }
}
