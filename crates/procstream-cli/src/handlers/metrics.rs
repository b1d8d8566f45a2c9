//! Metrics command handler.

use std::fmt::Write;

use anyhow::Result;
use procstream_core::MetricsSnapshot;

use crate::bootstrap::CliContext;
use crate::presentation::{format_bytes, truncate_string};

/// Execute the metrics command.
pub async fn execute(ctx: &CliContext, json: bool) -> Result<()> {
    let snapshot = ctx.gateway().sampler().sample().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print!("{}", summary(&snapshot));
    }
    Ok(())
}

fn summary(snapshot: &MetricsSnapshot) -> String {
    let mut out = format!(
        "Processes: {} total, {} running, {} stopped, {} errored\nCPU: {:.1}%  Memory: {}\n",
        snapshot.total_processes,
        snapshot.running_processes,
        snapshot.stopped_processes,
        snapshot.erroring_processes,
        snapshot.total_cpu,
        format_bytes(snapshot.total_memory),
    );

    for process in &snapshot.processes {
        let _ = writeln!(
            out,
            "  {:<24} {:<10} {:>5.1}% {:>10}",
            truncate_string(&process.name, 24),
            process.status.as_str(),
            process.cpu,
            format_bytes(process.memory),
        );
    }
    out
}
