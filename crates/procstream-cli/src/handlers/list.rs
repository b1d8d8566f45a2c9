//! List command handler.

use anyhow::Result;
use chrono::Utc;
use procstream_core::ProcessInfo;

use crate::bootstrap::CliContext;
use crate::presentation::{
    format_bytes, format_optional, format_uptime, print_separator, truncate_string,
};

/// Execute the list command.
pub async fn execute(ctx: &CliContext, json: bool) -> Result<()> {
    let processes = ctx.control().list_processes().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&processes)?);
        return Ok(());
    }

    if processes.is_empty() {
        println!("No processes are managed by the supervisor.");
        return Ok(());
    }

    println!("Found {} process(es):\n", processes.len());
    println!(
        "{:<24} {:<10} {:>6} {:>10} {:>9} {:>8} {:>8} {:>6}",
        "Name", "Status", "CPU", "Memory", "Uptime", "Restarts", "PID", "Port"
    );
    print_separator(88);

    let now = Utc::now().timestamp_millis();
    for process in &processes {
        println!("{}", process_row(process, now));
    }

    Ok(())
}

fn process_row(process: &ProcessInfo, now_ms: i64) -> String {
    format!(
        "{:<24} {:<10} {:>5.1}% {:>10} {:>9} {:>8} {:>8} {:>6}",
        truncate_string(&process.name, 24),
        process.status.as_str(),
        process.cpu,
        format_bytes(process.memory),
        format_uptime(process.uptime, now_ms),
        process.restarts,
        format_optional(process.pid, "--"),
        format_optional(process.port, "--"),
    )
}
