//! `GET /status`, `/health`, and the two documented-but-unspecified stub
//! routes `/events` and `/changelog` (§4.10).

use std::time::Instant;

use axum::extract::State;
use axum::Json;

use crate::model::{AccessMode, ResponseMeta};
use crate::web::responses::{HealthResponse, StatusResponse};
use crate::web::AppState;

pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let started = Instant::now();
    let uptime = state.started_at.elapsed().as_secs();
    let extractors = state.extractors.supported_platforms();
    let meta = ResponseMeta::new(started, AccessMode::Public, false);
    Json(StatusResponse::online(uptime, extractors, meta))
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

/// Server-sent notices aren't part of this deployment; an empty feed keeps
/// clients that poll it from treating a 404 as an error.
pub async fn events() -> Json<Vec<serde_json::Value>> {
    Json(Vec::new())
}

/// Same rationale as [`events`]: nothing to report, but the route exists.
pub async fn changelog() -> Json<Vec<serde_json::Value>> {
    Json(Vec::new())
}
