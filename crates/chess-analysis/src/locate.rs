//! Engine executable discovery and startup.

use std::path::{Path, PathBuf};

use crate::engine::EngineError;
use crate::uci_engine::{EngineSettings, UciEngine};

/// Where to look for Stockfish when no usable path is configured, in order.
/// Bare names are looked up on `PATH`.
pub const FALLBACK_PATHS: &[&str] = &[
    "/usr/local/bin/stockfish",
    "/opt/homebrew/bin/stockfish",
    "/usr/bin/stockfish",
    "/usr/games/stockfish",
    "stockfish",
];

pub fn default_fallback_paths() -> Vec<PathBuf> {
    FALLBACK_PATHS.iter().map(PathBuf::from).collect()
}

/// Existing engine executables, configured path first, without duplicates.
///
/// # Errors
///
/// Returns `EngineError::NotFound` listing every location tried when none
/// exists.
pub fn locate_engine(configured: Option<&Path>, fallbacks: &[PathBuf]) -> Result<Vec<PathBuf>, EngineError> {
    let mut found: Vec<PathBuf> = Vec::new();
    for path in configured.into_iter().chain(fallbacks.iter().map(PathBuf::as_path)) {
        match resolve(path) {
            Some(resolved) if !found.contains(&resolved) => found.push(resolved),
            Some(_) => {}
            None => tracing::debug!(path = %path.display(), "No engine executable here"),
        }
    }
    if found.is_empty() {
        return Err(not_found(configured, fallbacks));
    }
    Ok(found)
}

/// Start the first candidate that completes the UCI handshake.
///
/// A configured path that is missing or fails to start is logged and skipped
/// in favour of the fallbacks.
pub async fn start_engine(
    configured: Option<&Path>,
    fallbacks: &[PathBuf],
    settings: &EngineSettings,
) -> Result<UciEngine, EngineError> {
    let mut last_error = None;

    for path in locate_engine(configured, fallbacks)? {
        match UciEngine::spawn(&path, settings).await {
            Ok(engine) => return Ok(engine),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to start engine");
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| not_found(configured, fallbacks)))
}

fn not_found(configured: Option<&Path>, fallbacks: &[PathBuf]) -> EngineError {
    let tried: Vec<String> = configured
        .into_iter()
        .chain(fallbacks.iter().map(PathBuf::as_path))
        .map(|p| p.display().to_string())
        .collect();
    EngineError::NotFound(tried.join(", "))
}

/// An existing file at `path`, or for a bare program name, on `PATH`.
fn resolve(path: &Path) -> Option<PathBuf> {
    if path.is_absolute() || path.components().count() > 1 {
        return path.is_file().then(|| path.to_path_buf());
    }
    let search = std::env::var_os("PATH")?;
    std::env::split_paths(&search)
        .map(|dir| dir.join(path))
        .find(|candidate| candidate.is_file())
}
