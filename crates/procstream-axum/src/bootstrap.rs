//! Axum server bootstrap - the composition root.
//!
//! This module is the ONLY place where infrastructure is wired together
//! for the web adapter: the PM2 supervisor is instantiated here and handed
//! to the streaming gateway as a trait object.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use procstream_core::{ProcessControlPort, StreamSettings};
use procstream_runtime::StreamGateway;
use procstream_runtime::pm2::{DEFAULT_PM2_BIN, Pm2Supervisor};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 3001;

/// Default bind address.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// CORS configuration for the web server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CorsConfig {
    /// Allow all origins (development mode).
    #[default]
    AllowAll,
    /// Allow specific origins (production mode).
    AllowOrigins(Vec<String>),
}

impl CorsConfig {
    /// Parse a comma-separated origin list.
    ///
    /// An empty list or a `*` entry allows every origin.
    pub fn from_origin_list(raw: &str) -> Self {
        let origins: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect();

        if origins.is_empty() || origins.iter().any(|o| o == "*") {
            Self::AllowAll
        } else {
            Self::AllowOrigins(origins)
        }
    }
}

/// Server configuration for the Axum adapter.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address for the HTTP server.
    pub host: String,
    /// Port for the HTTP server.
    pub port: u16,
    /// Path or name of the `pm2` binary.
    pub pm2_bin: PathBuf,
    /// Tailing, search and fan-out tunables.
    pub settings: StreamSettings,
    /// Optional path to static assets for SPA serving.
    pub static_dir: Option<PathBuf>,
    /// CORS configuration.
    pub cors: CorsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            pm2_bin: PathBuf::from(DEFAULT_PM2_BIN),
            settings: StreamSettings::default(),
            static_dir: None,
            cors: CorsConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Set the static directory for SPA serving.
    #[must_use]
    pub fn with_static_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.static_dir = Some(path.into());
        self
    }

    /// Set CORS to allow specific origins.
    #[must_use]
    pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.cors = CorsConfig::AllowOrigins(origins);
        self
    }

    #[must_use]
    pub fn with_settings(mut self, settings: StreamSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Socket address string the server binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Application context for the Axum adapter.
pub struct AxumContext {
    /// Connection-facing streaming facade.
    pub gateway: StreamGateway,
    /// Process-control collaborator for the REST surface.
    pub control: Arc<dyn ProcessControlPort>,
    /// Cancelled when the server shuts down; open sockets close with it.
    pub shutdown: CancellationToken,
}

impl AxumContext {
    pub fn new(control: Arc<dyn ProcessControlPort>, settings: StreamSettings) -> Self {
        Self {
            gateway: StreamGateway::new(Arc::clone(&control), settings),
            control,
            shutdown: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }
}

/// Bootstrap the Axum server with the PM2 supervisor.
///
/// An unreachable supervisor is logged, not fatal: requests report it per
/// call until PM2 comes back.
pub async fn bootstrap(config: &ServerConfig) -> Result<AxumContext> {
    config.settings.validate()?;

    info!(
        pm2_bin = %config.pm2_bin.display(),
        initial_lines = config.settings.initial_lines,
        search_max_results = config.settings.search_max_results,
        poll_interval = ?config.settings.poll_interval,
        rotation = %config.settings.rotation,
        outbound_buffer = config.settings.outbound_buffer,
        "Axum bootstrap resolved settings"
    );

    let control: Arc<dyn ProcessControlPort> = Arc::new(Pm2Supervisor::new(&config.pm2_bin));

    match control.list_processes().await {
        Ok(processes) => info!(processes = processes.len(), "Process supervisor reachable"),
        Err(e) => warn!(error = %e, "Process supervisor not reachable at startup"),
    }

    Ok(AxumContext::new(control, config.settings.clone()))
}

/// Start the web server and run until `shutdown` is cancelled.
///
/// If `config.static_dir` is set, serves static assets with SPA fallback.
/// Otherwise, serves only the API endpoints.
pub async fn start_server(config: ServerConfig, shutdown: CancellationToken) -> Result<()> {
    use tokio::net::TcpListener;

    let ctx = bootstrap(&config).await?.with_shutdown(shutdown.clone());

    let app = if let Some(ref static_dir) = config.static_dir {
        info!("Serving static assets from: {}", static_dir.display());
        crate::routes::create_spa_router(ctx, static_dir, &config.cors)
    } else {
        crate::routes::create_router(ctx, &config.cors)
    };

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("procstream server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    info!("procstream server shut down");
    Ok(())
}
