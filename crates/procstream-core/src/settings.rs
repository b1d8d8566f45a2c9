//! Streaming engine tunables and validation.
//!
//! These are pure values with no infrastructure dependencies. Adapters build
//! them from flags or environment variables and hand them to the runtime.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of backlog lines sent to a newly subscribed connection.
pub const DEFAULT_INITIAL_LINES: usize = 100;

/// Maximum number of matches returned by a search.
pub const DEFAULT_SEARCH_MAX_RESULTS: usize = 100;

/// Interval between tailer polls, in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 250;

/// Capacity of each connection's outbound event queue.
pub const DEFAULT_OUTBOUND_BUFFER: usize = 256;

/// What a tailer does when the followed file is truncated or replaced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationPolicy {
    /// Reopen the path and follow the new file from offset 0.
    #[default]
    Reopen,
    /// Keep following the original descriptor.
    Ignore,
}

impl RotationPolicy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reopen => "reopen",
            Self::Ignore => "ignore",
        }
    }
}

impl fmt::Display for RotationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RotationPolicy {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reopen" => Ok(Self::Reopen),
            "ignore" => Ok(Self::Ignore),
            _ => Err(SettingsError::InvalidRotationPolicy(s.to_string())),
        }
    }
}

/// Settings shared by the tailer, search executor and subscription manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSettings {
    /// Backlog size sent once per successful subscription.
    pub initial_lines: usize,

    /// Cap on search results.
    pub search_max_results: usize,

    /// How often a tailer checks its file for new bytes.
    pub poll_interval: Duration,

    /// Truncation/replacement behaviour.
    pub rotation: RotationPolicy,

    /// Per-connection outbound queue capacity.
    pub outbound_buffer: usize,

    /// Server-driven metrics push interval. `None` disables pushing.
    pub metrics_interval: Option<Duration>,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            initial_lines: DEFAULT_INITIAL_LINES,
            search_max_results: DEFAULT_SEARCH_MAX_RESULTS,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            rotation: RotationPolicy::default(),
            outbound_buffer: DEFAULT_OUTBOUND_BUFFER,
            metrics_interval: None,
        }
    }
}

impl StreamSettings {
    #[must_use]
    pub const fn with_initial_lines(mut self, lines: usize) -> Self {
        self.initial_lines = lines;
        self
    }

    #[must_use]
    pub const fn with_search_max_results(mut self, max: usize) -> Self {
        self.search_max_results = max;
        self
    }

    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    #[must_use]
    pub const fn with_rotation(mut self, rotation: RotationPolicy) -> Self {
        self.rotation = rotation;
        self
    }

    #[must_use]
    pub const fn with_outbound_buffer(mut self, capacity: usize) -> Self {
        self.outbound_buffer = capacity;
        self
    }

    #[must_use]
    pub const fn with_metrics_interval(mut self, interval: Option<Duration>) -> Self {
        self.metrics_interval = interval;
        self
    }

    /// Validate settings values.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.poll_interval.is_zero() {
            return Err(SettingsError::ZeroPollInterval);
        }

        // tokio::sync::mpsc panics on a zero capacity
        if self.outbound_buffer == 0 {
            return Err(SettingsError::ZeroOutboundBuffer);
        }

        if self.metrics_interval.is_some_and(|d| d.is_zero()) {
            return Err(SettingsError::ZeroMetricsInterval);
        }

        Ok(())
    }
}

/// Settings validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("Poll interval must be greater than zero")]
    ZeroPollInterval,

    #[error("Outbound buffer must hold at least one event")]
    ZeroOutboundBuffer,

    #[error("Metrics interval must be greater than zero when set")]
    ZeroMetricsInterval,

    #[error("Unknown rotation policy '{0}' (expected 'reopen' or 'ignore')")]
    InvalidRotationPolicy(String),
}
