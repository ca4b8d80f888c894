//! Chess Analysis Server Library
//!
//! HTTP routes, configuration, and middleware for the analysis service.
//! The binary in `main.rs` owns engine startup and shutdown.

pub mod api;
pub mod config;
pub mod middleware;

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use chess_analysis::AnalysisService;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};

use crate::config::ServerConfig;
use crate::middleware::{timing_layer, SlowRequestThreshold};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// `None` when the engine failed to start; engine-backed endpoints then
    /// answer 503.
    pub service: Option<Arc<AnalysisService>>,
}

/// Build the application router.
pub fn router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/", get(api::status::root))
        .route("/health", get(api::status::health))
        .route("/analyze", post(api::analysis::analyze))
        .route("/ai-move", post(api::ai_move::ai_move))
        .route("/validate-move", post(api::moves::validate_move))
        .route("/opening-book/*fen", get(api::placeholders::opening_book))
        .route("/game-analysis", post(api::placeholders::game_analysis))
        .with_state(state)
        .layer(axum::middleware::from_fn_with_state(
            SlowRequestThreshold(config.slow_request_threshold()),
            timing_layer,
        ))
        .layer(cors_layer(&config.allowed_origins))
}

/// CORS for the configured browser origins, with credentials.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            // A wildcard cannot be combined with credentials.
            Ok(value) if value != "*" => Some(value),
            _ => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}
