//! Chess position analysis backed by an external UCI engine.
//!
//! Search and evaluation are delegated entirely to the engine (Stockfish);
//! this crate validates positions and moves, drives the engine process, and
//! normalizes what it reports.
//!
//! # Overview
//!
//! - [`board`] - FEN parsing, move legality, SAN conversion
//! - [`EngineSession`] - The seam between the service and a running engine
//! - [`UciEngine`] - A UCI engine running as a child process
//! - [`AnalysisService`] - Position analysis and opponent moves over one engine
//! - [`Evaluation`] - Position evaluation (centipawn or mate score)
//!
//! # Example
//!
//! ```ignore
//! use chess_analysis::{locate, AnalysisService, EngineSettings};
//!
//! let engine = locate::start_engine(None, &locate::default_fallback_paths(), &EngineSettings::default()).await?;
//! let service = AnalysisService::new(Box::new(engine));
//! let result = service.analyze_position("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1", 15).await?;
//! println!("{} ({:?})", result.best_move, result.evaluation);
//! ```

pub mod board;
pub mod config;
pub mod engine;
pub mod evaluation;
pub mod locate;
pub mod service;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;
pub mod uci_engine;

pub use board::{BoardError, MoveOutcome, Position};
pub use config::EngineConfig;
pub use engine::{EngineError, EngineSession, Variation};
pub use evaluation::Evaluation;
pub use service::{validate_move, AnalysisResult, AnalysisService, OpponentMove, ServiceError};
pub use uci_engine::{EngineSettings, UciEngine};
