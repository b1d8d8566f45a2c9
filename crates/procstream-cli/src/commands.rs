//! Main commands enum.

use std::path::PathBuf;

use clap::Subcommand;
use procstream_axum::bootstrap::{DEFAULT_HOST, DEFAULT_PORT};
use procstream_core::StreamKind;

/// Available procstream commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP/WebSocket streaming server
    Serve {
        /// Address to bind
        #[arg(long, env = "HOST", default_value = DEFAULT_HOST)]
        host: String,
        /// Port to listen on
        #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
        port: u16,
        /// Allowed CORS origins, comma-separated (`*` allows all)
        #[arg(long, env = "CORS_ORIGIN", default_value = "*")]
        cors_origin: String,
        /// Serve a built frontend from this directory
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },

    /// List supervised processes
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show an aggregated fleet snapshot
    Metrics {
        /// Print JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Search a process log for a literal pattern
    Search {
        /// Process name as known to the supervisor
        process: String,
        /// Literal substring to look for
        pattern: String,
        /// Which log to search: out or error
        #[arg(short, long, default_value_t = StreamKind::Out)]
        stream: StreamKind,
    },
}

#[cfg(test)]
mod tests {
    use crate::parser::Cli;
    use clap::Parser;
    use procstream_core::StreamKind;

    use super::Commands;

    #[test]
    fn search_accepts_stream_aliases() {
        let cli = Cli::parse_from(["procstream", "search", "api", "ERROR", "--stream", "stderr"]);
        match cli.command {
            Some(Commands::Search {
                process,
                pattern,
                stream,
            }) => {
                assert_eq!(process, "api");
                assert_eq!(pattern, "ERROR");
                assert_eq!(stream, StreamKind::Error);
            }
            _ => panic!("expected search command"),
        }
    }

    #[test]
    fn serve_defaults() {
        let cli = Cli::parse_from(["procstream", "serve", "--port", "4000"]);
        match cli.command {
            Some(Commands::Serve {
                port, static_dir, ..
            }) => {
                assert_eq!(port, 4000);
                assert!(static_dir.is_none());
            }
            _ => panic!("expected serve command"),
        }
    }
}
