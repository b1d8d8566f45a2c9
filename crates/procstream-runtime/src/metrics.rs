//! Fleet metrics sampling.

use std::sync::Arc;

use procstream_core::{MetricsSnapshot, ProcessControlPort, StreamResult};
use tracing::debug;

/// Builds [`MetricsSnapshot`]s from the process-control collaborator.
///
/// Every call re-queries the supervisor; nothing is cached. Periodic
/// sampling is driven by the caller.
#[derive(Clone)]
pub struct MetricsSampler {
    control: Arc<dyn ProcessControlPort>,
}

impl std::fmt::Debug for MetricsSampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsSampler").finish_non_exhaustive()
    }
}

impl MetricsSampler {
    pub fn new(control: Arc<dyn ProcessControlPort>) -> Self {
        Self { control }
    }

    pub async fn sample(&self) -> StreamResult<MetricsSnapshot> {
        let processes = self.control.list_processes().await?;
        let snapshot = MetricsSnapshot::from_processes(&processes);
        debug!(
            total = snapshot.total_processes,
            running = snapshot.running_processes,
            "Sampled fleet metrics"
        );
        Ok(snapshot)
    }
}
