//! Axum web adapter for procstream.
//!
//! Exposes the streaming gateway over a WebSocket at `GET /api/ws` and a
//! thin REST surface over the process supervisor:
//!
//! | Method | Path | Handler |
//! |---|---|---|
//! | GET | `/health` | liveness probe |
//! | GET | `/api/ws` | log streaming connection |
//! | GET | `/api/processes` | list processes |
//! | GET | `/api/processes/{name}` | describe one process |
//! | POST | `/api/processes/{name}/start` | start |
//! | POST | `/api/processes/{name}/stop` | stop |
//! | POST | `/api/processes/{name}/restart` | restart |
//! | GET | `/api/processes/{name}/logs/search` | bounded log search |
//! | GET | `/api/metrics` | fleet snapshot |

#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

// Dev-dependencies used only by the integration suites
#[cfg(test)]
use http_body_util as _;
#[cfg(test)]
use tempfile as _;
#[cfg(test)]
use tower as _;

pub mod bootstrap;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

// Re-export primary types
pub use bootstrap::{AxumContext, CorsConfig, ServerConfig, bootstrap, start_server};
pub use error::HttpError;
pub use routes::{create_router, create_spa_router};
pub use state::AppState;
