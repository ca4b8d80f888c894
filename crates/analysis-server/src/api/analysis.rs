//! Position analysis endpoint.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use chess_analysis::config::DEFAULT_DEPTH;
use chess_analysis::Evaluation;
use serde::{Deserialize, Serialize};

use super::ApiError;
use crate::AppState;

/// Request body for `POST /analyze`.
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    /// Position in FEN notation.
    pub fen: String,
    /// Search depth (default: 15).
    #[serde(default = "default_depth")]
    pub depth: u32,
}

fn default_depth() -> u32 {
    DEFAULT_DEPTH
}

/// Analysis response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    /// Score from the side to move's point of view.
    pub evaluation: Evaluation,
    /// Best move in UCI notation.
    pub best_move: String,
    /// Principal variation in SAN.
    pub principal_variation: Vec<String>,
    pub depth: u32,
}

/// POST /analyze
///
/// Analyzes a position at full engine strength.
///
/// # Errors
/// * 400 Bad Request - Invalid FEN, depth out of range, or no legal moves
/// * 503 Service Unavailable - Engine not running
/// * 500 Internal Server Error - Engine misbehaved
pub async fn analyze(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let Json(request) = payload?;
    let service = state.service()?;

    let result = service.analyze_position(&request.fen, request.depth).await?;

    Ok(Json(AnalyzeResponse {
        evaluation: result.evaluation,
        best_move: result.best_move,
        principal_variation: result.principal_variation,
        depth: result.depth,
    }))
}
