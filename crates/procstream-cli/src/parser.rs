//! Main CLI parser and global stream options.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser};
use procstream_core::{
    DEFAULT_INITIAL_LINES, DEFAULT_OUTBOUND_BUFFER, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_SEARCH_MAX_RESULTS, RotationPolicy, StreamSettings,
};
use procstream_runtime::pm2::DEFAULT_PM2_BIN;

use crate::commands::Commands;

/// Live log streaming for PM2-supervised processes.
#[derive(Parser)]
#[command(name = "procstream")]
#[command(about = "Stream, search and inspect logs of PM2-managed processes")]
#[command(version)]
pub struct Cli {
    /// Path or name of the pm2 binary
    #[arg(long = "pm2-bin", env = "PM2_BIN", default_value = DEFAULT_PM2_BIN, global = true)]
    pub pm2_bin: PathBuf,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub stream: StreamArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Tailing, search and fan-out tunables.
#[derive(Debug, Clone, Args)]
pub struct StreamArgs {
    /// Lines of backlog sent when a subscription starts
    #[arg(long, env = "INITIAL_LOG_LINES", default_value_t = DEFAULT_INITIAL_LINES, global = true)]
    pub initial_lines: usize,

    /// Maximum number of search results per request
    #[arg(long, env = "SEARCH_MAX_RESULTS", default_value_t = DEFAULT_SEARCH_MAX_RESULTS, global = true)]
    pub search_max_results: usize,

    /// Tailer poll interval in milliseconds
    #[arg(long, env = "LOG_POLL_INTERVAL_MS", default_value_t = DEFAULT_POLL_INTERVAL_MS, global = true)]
    pub poll_interval_ms: u64,

    /// What a tailer does when its file is rotated: reopen or ignore
    #[arg(long, env = "LOG_ROTATION", default_value_t = RotationPolicy::Reopen, global = true)]
    pub rotation: RotationPolicy,

    /// Per-connection outbound queue capacity (events)
    #[arg(long, env = "OUTBOUND_BUFFER", default_value_t = DEFAULT_OUTBOUND_BUFFER, global = true)]
    pub outbound_buffer: usize,

    /// Push metrics to every connection at this interval (seconds)
    #[arg(long = "metrics-interval", env = "METRICS_INTERVAL_SECS", global = true)]
    pub metrics_interval_secs: Option<u64>,
}

impl StreamArgs {
    /// Settings built from the parsed flags; validated at bootstrap.
    pub fn to_settings(&self) -> StreamSettings {
        StreamSettings::default()
            .with_initial_lines(self.initial_lines)
            .with_search_max_results(self.search_max_results)
            .with_poll_interval(Duration::from_millis(self.poll_interval_ms))
            .with_rotation(self.rotation)
            .with_outbound_buffer(self.outbound_buffer)
            .with_metrics_interval(self.metrics_interval_secs.map(Duration::from_secs))
    }
}
