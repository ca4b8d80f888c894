//! API handlers for the analysis server.
//!
//! Every failure is answered with a JSON body of the form
//! `{"detail": "..."}`.

pub mod ai_move;
pub mod analysis;
pub mod moves;
pub mod placeholders;
pub mod status;

use std::sync::Arc;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chess_analysis::{AnalysisService, ServiceError};
use serde_json::json;
use thiserror::Error;

use crate::AppState;

/// Errors returned by API handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The engine failed to start, so the server runs without one.
    #[error("Chess engine not available")]
    EngineNotStarted,
    /// The request body was missing or not the expected JSON.
    #[error(transparent)]
    Rejected(#[from] JsonRejection),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::EngineNotStarted => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Rejected(rejection) => rejection.status(),
            ApiError::Service(err) => match err {
                ServiceError::InvalidPosition(_)
                | ServiceError::IllegalMove(_)
                | ServiceError::InvalidRequest(_)
                | ServiceError::NoLegalMoves => StatusCode::BAD_REQUEST,
                ServiceError::EngineUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                ServiceError::Engine(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            ApiError::Rejected(rejection) => rejection.body_text(),
            ApiError::Service(ServiceError::EngineUnavailable(source)) => {
                tracing::error!(error = %source, "Engine unavailable");
                self.to_string()
            }
            ApiError::Service(ServiceError::Engine(source)) => {
                tracing::error!(error = %source, "Engine error");
                "Internal engine error".to_string()
            }
            _ => self.to_string(),
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

impl AppState {
    /// The analysis service, or `EngineNotStarted` in degraded mode.
    pub(crate) fn service(&self) -> Result<&Arc<AnalysisService>, ApiError> {
        self.service.as_ref().ok_or(ApiError::EngineNotStarted)
    }
}
