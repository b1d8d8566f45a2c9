//! Serve command handler.

use anyhow::Result;
use procstream_axum::{ServerConfig, start_server};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Run the server until Ctrl+C.
pub async fn execute(config: ServerConfig) -> Result<()> {
    let shutdown = CancellationToken::new();

    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Shutdown signal received");
                    shutdown.cancel();
                }
                Err(e) => warn!(error = %e, "Failed to listen for Ctrl+C"),
            }
        }
    });

    println!();
    println!("  procstream server starting...");
    println!();
    if let Some(ref dir) = config.static_dir {
        println!("  Serving UI from: {}", dir.display());
    }
    println!("  API:       http://localhost:{}/api", config.port);
    println!("  WebSocket: ws://localhost:{}/api/ws", config.port);
    println!();
    println!("  Press Ctrl+C to stop");
    println!();

    start_server(config, shutdown).await
}
