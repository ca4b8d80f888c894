//! Chess Analysis Server
//!
//! Serves position analysis and computer-opponent moves over HTTP, backed
//! by a single Stockfish process. If the engine cannot be started the
//! server still runs in degraded mode: engine-backed endpoints answer 503
//! and `/health` reports `degraded`.

use std::sync::Arc;

use analysis_server::config::ServerConfig;
use analysis_server::{router, AppState};
use anyhow::Context;
use chess_analysis::{locate, AnalysisService};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::load().context("Failed to load configuration")?;

    let engine = locate::start_engine(
        config.engine.path.as_deref(),
        &config.engine.fallback_paths,
        &config.engine.settings(),
    )
    .await;

    let service = match engine {
        Ok(engine) => {
            tracing::info!(
                engine = %engine.name(),
                path = %engine.path().display(),
                "Chess engine initialized"
            );
            Some(Arc::new(AnalysisService::new(Box::new(engine))))
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialize chess engine, running in degraded mode");
            None
        }
    };

    let app = router(
        AppState {
            service: service.clone(),
        },
        &config,
    );

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;
    tracing::info!("Server running on http://{}", config.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(service) = service {
        if let Err(e) = service.shutdown().await {
            tracing::warn!(error = %e, "Engine did not shut down cleanly");
        }
    }
    tracing::info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
