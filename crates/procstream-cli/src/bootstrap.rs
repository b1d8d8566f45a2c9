//! CLI bootstrap - the composition root.
//!
//! The PM2 supervisor and the streaming gateway are instantiated here;
//! command handlers only see the composed [`CliContext`].

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use procstream_core::{ProcessControlPort, StreamSettings};
use procstream_runtime::{Pm2Supervisor, StreamGateway};

/// Bootstrap configuration for the CLI.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Path or name of the pm2 binary.
    pub pm2_bin: PathBuf,
    /// Tailing, search and fan-out tunables.
    pub settings: StreamSettings,
}

/// Fully composed application context for CLI commands.
pub struct CliContext {
    /// Process-control collaborator.
    pub control: Arc<dyn ProcessControlPort>,
    /// Streaming gateway, used for search and metrics.
    pub gateway: StreamGateway,
}

impl CliContext {
    pub fn new(control: Arc<dyn ProcessControlPort>, settings: StreamSettings) -> Self {
        Self {
            gateway: StreamGateway::new(Arc::clone(&control), settings),
            control,
        }
    }

    pub fn control(&self) -> &Arc<dyn ProcessControlPort> {
        &self.control
    }

    pub const fn gateway(&self) -> &StreamGateway {
        &self.gateway
    }
}

/// Bootstrap the CLI application.
pub fn bootstrap(config: CliConfig) -> Result<CliContext> {
    config.settings.validate()?;
    let control: Arc<dyn ProcessControlPort> = Arc::new(Pm2Supervisor::new(config.pm2_bin));
    Ok(CliContext::new(control, config.settings))
}
