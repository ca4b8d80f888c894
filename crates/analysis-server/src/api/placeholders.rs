//! Endpoints reserved for features that are not built yet. They answer with
//! fixed, empty results so clients can integrate against the final shape.

use axum::{extract::Path, Json};
use serde::Serialize;

/// Response for `GET /opening-book/*fen`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpeningBookResponse {
    pub moves: Vec<String>,
    pub opening_name: String,
    pub eco_code: String,
}

#[derive(Debug, Serialize)]
pub struct Accuracy {
    pub white: f64,
    pub black: f64,
}

/// Response for `POST /game-analysis`.
#[derive(Debug, Serialize)]
pub struct GameAnalysisResponse {
    pub accuracy: Accuracy,
    pub moves: Vec<String>,
    pub opening: String,
    pub result: String,
}

/// GET /opening-book/*fen
///
/// The FEN is captured as a wildcard since it contains slashes.
pub async fn opening_book(Path(fen): Path<String>) -> Json<OpeningBookResponse> {
    tracing::debug!(%fen, "Opening book lookup (not implemented)");
    Json(OpeningBookResponse {
        moves: Vec::new(),
        opening_name: "Unknown".to_string(),
        eco_code: String::new(),
    })
}

/// POST /game-analysis
///
/// Any request body is accepted and ignored.
pub async fn game_analysis() -> Json<GameAnalysisResponse> {
    Json(GameAnalysisResponse {
        accuracy: Accuracy {
            white: 0.0,
            black: 0.0,
        },
        moves: Vec::new(),
        opening: "Unknown".to_string(),
        result: "*".to_string(),
    })
}
