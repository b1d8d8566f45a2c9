//! Search command handler.

use anyhow::Result;
use procstream_core::StreamKind;

use crate::bootstrap::CliContext;

/// Execute the search command.
pub async fn execute(
    ctx: &CliContext,
    process: &str,
    pattern: &str,
    stream: StreamKind,
) -> Result<()> {
    let outcome = ctx.gateway().search(process, pattern, stream).await?;

    if outcome.count == 0 {
        println!("No matches for '{pattern}' in {process} ({stream}).");
        return Ok(());
    }

    println!(
        "{} match(es) for '{pattern}' in {process} ({stream}), limit {}:\n",
        outcome.count,
        ctx.gateway().settings().search_max_results
    );
    for line in &outcome.lines {
        println!("{line}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use procstream_core::{ProcessInfo, ProcessStatus, StreamSettings};
    use procstream_runtime::testing::StaticProcesses;
    use tempfile::TempDir;

    fn context(dir: &TempDir) -> CliContext {
        let api = ProcessInfo::new("api", ProcessStatus::Online).with_log_paths(
            dir.path().join("api-out.log"),
            dir.path().join("api-error.log"),
        );
        CliContext::new(
            Arc::new(StaticProcesses::new(vec![api])),
            StreamSettings::default(),
        )
    }

    #[tokio::test]
    async fn search_of_existing_log_succeeds() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("api-out.log"), "GET /a\nGET /b\n").unwrap();

        execute(&context(&dir), "api", "GET", StreamKind::Out)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn search_of_unknown_process_fails() {
        let dir = TempDir::new().unwrap();
        let err = execute(&context(&dir), "ghost", "x", StreamKind::Out)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Process ghost not found");
    }
}
