//! CLI entry point - the composition root.
//!
//! Logging and `.env` are set up here; command dispatch routes to handlers.

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use procstream_axum::{CorsConfig, ServerConfig};
use procstream_cli::{Cli, CliConfig, Commands, bootstrap, handlers};

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .compact()
        .try_init()
        .ok();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before clap reads its env fallbacks
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let settings = cli.stream.to_settings();

    match command {
        Commands::Serve {
            host,
            port,
            cors_origin,
            static_dir,
        } => {
            let config = ServerConfig {
                host,
                port,
                pm2_bin: cli.pm2_bin,
                settings,
                static_dir,
                cors: CorsConfig::from_origin_list(&cors_origin),
            };
            handlers::serve::execute(config).await?;
        }
        Commands::List { json } => {
            let ctx = bootstrap(CliConfig {
                pm2_bin: cli.pm2_bin,
                settings,
            })?;
            handlers::list::execute(&ctx, json).await?;
        }
        Commands::Metrics { json } => {
            let ctx = bootstrap(CliConfig {
                pm2_bin: cli.pm2_bin,
                settings,
            })?;
            handlers::metrics::execute(&ctx, json).await?;
        }
        Commands::Search {
            process,
            pattern,
            stream,
        } => {
            let ctx = bootstrap(CliConfig {
                pm2_bin: cli.pm2_bin,
                settings,
            })?;
            handlers::search::execute(&ctx, &process, &pattern, stream).await?;
        }
    }

    Ok(())
}
