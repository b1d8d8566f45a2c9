//! Process handlers - listing, lifecycle commands and log search.

use axum::Json;
use axum::extract::{Path, Query, State};
use procstream_core::{ProcessInfo, StreamKind};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::HttpError;
use crate::state::AppState;

/// Result of a lifecycle command.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
}

impl ActionResponse {
    fn done(name: &str, verb: &str) -> Self {
        Self {
            success: true,
            message: format!("Process {name} {verb}"),
        }
    }
}

/// List all supervised processes.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<ProcessInfo>>, HttpError> {
    Ok(Json(state.control.list_processes().await?))
}

/// Describe one process.
pub async fn get(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ProcessInfo>, HttpError> {
    Ok(Json(state.control.describe_process(&name).await?))
}

pub async fn start(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ActionResponse>, HttpError> {
    state.control.start_process(&name).await?;
    info!(process = %name, "Process started via API");
    Ok(Json(ActionResponse::done(&name, "started")))
}

pub async fn stop(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ActionResponse>, HttpError> {
    state.control.stop_process(&name).await?;
    info!(process = %name, "Process stopped via API");
    Ok(Json(ActionResponse::done(&name, "stopped")))
}

pub async fn restart(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ActionResponse>, HttpError> {
    state.control.restart_process(&name).await?;
    info!(process = %name, "Process restarted via API");
    Ok(Json(ActionResponse::done(&name, "restarted")))
}

// ============================================================================
// Log search
// ============================================================================

/// Query string for `GET /api/processes/{name}/logs/search`.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub pattern: Option<String>,
    /// `out` (default) or `error`
    #[serde(default)]
    pub stream: StreamKind,
}

/// Search response, shaped like the `searchResults` connection event.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub process_name: String,
    pub pattern: String,
    pub results: Vec<String>,
    pub count: usize,
}

/// Bounded literal search over one process stream's log file.
pub async fn search_logs(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, HttpError> {
    let pattern = query
        .pattern
        .ok_or_else(|| HttpError::BadRequest("Missing pattern query parameter".to_string()))?;

    let outcome = state.gateway.search(&name, &pattern, query.stream).await?;
    Ok(Json(SearchResponse {
        process_name: name,
        pattern,
        count: outcome.count,
        results: outcome.lines,
    }))
}
