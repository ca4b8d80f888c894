//! Computer opponent endpoint.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use chess_analysis::service::time_budget_from_secs;
use serde::{Deserialize, Serialize};

use super::ApiError;
use crate::AppState;

/// Request body for `POST /ai-move`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiMoveRequest {
    pub fen: String,
    /// Opponent strength as an Elo-like rating (default: 1500).
    #[serde(default = "default_difficulty")]
    pub difficulty: i32,
    /// Thinking time in seconds (default: 1.0).
    #[serde(default = "default_time_limit")]
    pub time_limit: f64,
}

fn default_difficulty() -> i32 {
    1500
}

fn default_time_limit() -> f64 {
    1.0
}

/// Opponent move response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AiMoveResponse {
    /// The move in UCI notation.
    #[serde(rename = "move")]
    pub mv: String,
    /// Pawns from the side to move's point of view; ±999 for forced mates.
    pub evaluation: f64,
    /// Seconds spent on the request.
    pub thinking_time: f64,
}

/// POST /ai-move
///
/// Picks a move at a strength derived from `difficulty`.
///
/// # Errors
/// * 400 Bad Request - Invalid FEN, bad time limit, or no legal moves
/// * 503 Service Unavailable - Engine not running
/// * 500 Internal Server Error - Engine misbehaved
pub async fn ai_move(
    State(state): State<AppState>,
    payload: Result<Json<AiMoveRequest>, JsonRejection>,
) -> Result<Json<AiMoveResponse>, ApiError> {
    let Json(request) = payload?;
    let service = state.service()?;
    let time_budget = time_budget_from_secs(request.time_limit)?;

    let reply = service
        .generate_opponent_move(&request.fen, request.difficulty, time_budget)
        .await?;

    Ok(Json(AiMoveResponse {
        mv: reply.mv,
        evaluation: reply.evaluation,
        thinking_time: reply.thinking_time.as_secs_f64(),
    }))
}
