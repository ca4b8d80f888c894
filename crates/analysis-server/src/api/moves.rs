//! Move validation endpoint.

use axum::{extract::rejection::JsonRejection, Json};
use chess_analysis::validate_move as check_move;
use serde::{Deserialize, Serialize};

use super::ApiError;

/// Request body for `POST /validate-move`.
#[derive(Debug, Deserialize)]
pub struct ValidateMoveRequest {
    pub fen: String,
    /// Candidate move in UCI notation.
    #[serde(rename = "move")]
    pub mv: String,
}

/// A legal move and the position it leads to.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidMove {
    pub valid: bool,
    pub new_fen: String,
    pub san: String,
    pub is_check: bool,
    pub is_checkmate: bool,
    pub is_stalemate: bool,
}

/// Why a move was rejected.
#[derive(Debug, Serialize)]
pub struct InvalidMove {
    pub valid: bool,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ValidateMoveResponse {
    Valid(ValidMove),
    Invalid(InvalidMove),
}

/// POST /validate-move
///
/// Board-only; answers even when the engine is down. A bad position or move
/// is reported in the body with `valid: false`, not as an HTTP error.
pub async fn validate_move(
    payload: Result<Json<ValidateMoveRequest>, JsonRejection>,
) -> Result<Json<ValidateMoveResponse>, ApiError> {
    let Json(request) = payload?;

    let response = match check_move(&request.fen, &request.mv) {
        Ok(outcome) => ValidateMoveResponse::Valid(ValidMove {
            valid: true,
            new_fen: outcome.position.fen(),
            san: outcome.san,
            is_check: outcome.is_check,
            is_checkmate: outcome.is_checkmate,
            is_stalemate: outcome.is_stalemate,
        }),
        Err(err) => ValidateMoveResponse::Invalid(InvalidMove {
            valid: false,
            error: err.to_string(),
        }),
    };

    Ok(Json(response))
}
