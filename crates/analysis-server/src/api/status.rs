//! Liveness and readiness.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

/// Response for `GET /`.
#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: &'static str,
    pub status: &'static str,
}

/// Response for `GET /health`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// `"healthy"` with a running engine, `"degraded"` otherwise.
    pub status: &'static str,
    pub engine_available: bool,
}

/// GET /
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Chess Analysis Service",
        status: "running",
    })
}

/// GET /health
///
/// Always answers 200; a missing or dead engine shows up as `degraded`.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let engine_available = state
        .service
        .as_ref()
        .is_some_and(|service| service.engine_available());

    Json(HealthResponse {
        status: if engine_available { "healthy" } else { "degraded" },
        engine_available,
    })
}
