//! Engine adapter.
//!
//! [`EngineSession`] is the seam between the analysis service and a running
//! engine. [`UciEngine`](crate::uci_engine::UciEngine) implements it over a
//! Stockfish process; tests use a scripted double.

use async_trait::async_trait;
use thiserror::Error;

use crate::board::{self, Position};
use crate::config::EngineConfig;
use crate::Evaluation;

/// Errors that can occur when working with chess engines.
#[derive(Error, Debug)]
pub enum EngineError {
    /// No engine executable was found at any candidate location.
    #[error("Engine not found at path: {0}")]
    NotFound(String),
    /// Failed to spawn the engine process.
    #[error("Failed to spawn engine: {0}")]
    SpawnError(#[source] std::io::Error),
    /// Engine failed to initialize properly (UCI handshake failed).
    #[error("Engine initialization failed: {0}")]
    InitFailed(String),
    /// Engine did not answer in time.
    #[error("Engine timed out: {0}")]
    Timeout(String),
    /// The engine process exited or closed its output.
    #[error("Engine closed unexpectedly")]
    Terminated,
    /// Reading from or writing to the engine failed.
    #[error("Engine I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// A query was made before any position was loaded.
    #[error("No position loaded")]
    NoPosition,
    /// Engine returned an invalid or unexpected response.
    #[error("Invalid engine response: {0}")]
    InvalidResponse(String),
}

impl EngineError {
    /// Whether the engine can no longer be used at all, as opposed to having
    /// sent a response we could not make sense of.
    pub fn is_unavailable(&self) -> bool {
        !matches!(
            self,
            EngineError::InvalidResponse(_) | EngineError::NoPosition
        )
    }
}

/// A line of play with its evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct Variation {
    /// Moves, in UCI notation for raw engine lines and SAN once decoded.
    pub moves: Vec<String>,
    pub evaluation: Evaluation,
}

/// One analysis session with an external engine.
///
/// Queries apply to the most recently loaded position under the most
/// recently applied configuration. Sessions are not reentrant; callers
/// serialize access.
#[async_trait]
pub trait EngineSession: Send {
    /// Apply search depth, skill level, and time budget.
    async fn configure(&mut self, config: &EngineConfig) -> Result<(), EngineError>;

    /// Load a position.
    async fn set_position(&mut self, position: &Position) -> Result<(), EngineError>;

    /// The engine's choice in UCI notation, or `None` if the side to move
    /// has no legal moves.
    async fn best_move(&mut self) -> Result<Option<String>, EngineError>;

    /// The engine's score for the loaded position.
    async fn evaluate(&mut self) -> Result<Evaluation, EngineError>;

    /// Up to `n` best lines in UCI notation, best first.
    async fn top_lines(&mut self, n: usize) -> Result<Vec<Variation>, EngineError>;

    /// Whether the engine is still running.
    fn is_alive(&mut self) -> bool;

    /// Stop the engine. The session is unusable afterwards.
    async fn shutdown(&mut self) -> Result<(), EngineError>;
}

/// Up to `n` best lines from `position`, converted to SAN.
///
/// Each line is replayed move by move from `position`; a line whose moves
/// stop making sense is cut at the last legal move rather than dropped.
/// `position` must be the position currently loaded in `session`.
pub async fn top_variations(
    session: &mut dyn EngineSession,
    position: &Position,
    n: usize,
) -> Result<Vec<Variation>, EngineError> {
    let lines = session.top_lines(n).await?;

    Ok(lines
        .into_iter()
        .map(|line| Variation {
            moves: board::decode_line(position, &line.moves),
            evaluation: line.evaluation,
        })
        .collect())
}
