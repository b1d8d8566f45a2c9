//! Fleet metrics handler.

use axum::Json;
use axum::extract::State;
use procstream_core::MetricsSnapshot;

use crate::error::HttpError;
use crate::state::AppState;

/// Sample the supervisor and return an aggregated snapshot.
pub async fn snapshot(State(state): State<AppState>) -> Result<Json<MetricsSnapshot>, HttpError> {
    Ok(Json(state.gateway.sampler().sample().await?))
}
