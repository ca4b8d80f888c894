//! Analysis service.
//!
//! Orchestrates board validation and the shared engine session for the two
//! engine-backed operations: full position analysis and opponent move
//! generation. Every request runs parse, configure, query, and normalize in
//! that order while holding the session lock, so no request observes another
//! request's engine configuration.

use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::Mutex;

use crate::board::{self, BoardError, MoveOutcome};
use crate::config::{EngineConfig, MAX_SEARCH_DEPTH, MAX_TIME_BUDGET};
use crate::engine::{self, EngineError, EngineSession};
use crate::Evaluation;

/// Errors surfaced by [`AnalysisService`] operations.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Invalid FEN position: {0}")]
    InvalidPosition(String),
    #[error("{0}")]
    IllegalMove(String),
    /// A request parameter is out of range.
    #[error("{0}")]
    InvalidRequest(String),
    #[error("No legal moves available")]
    NoLegalMoves,
    /// The engine never started or has stopped responding.
    #[error("Chess engine not available")]
    EngineUnavailable(#[source] EngineError),
    /// The engine is running but answered with something unusable.
    #[error("Engine error: {0}")]
    Engine(#[source] EngineError),
}

impl From<BoardError> for ServiceError {
    fn from(err: BoardError) -> Self {
        match err {
            BoardError::InvalidPosition(detail) => ServiceError::InvalidPosition(detail),
            other @ (BoardError::MalformedMove(_) | BoardError::IllegalMove(_)) => {
                ServiceError::IllegalMove(other.to_string())
            }
        }
    }
}

impl From<EngineError> for ServiceError {
    fn from(err: EngineError) -> Self {
        if err.is_unavailable() {
            ServiceError::EngineUnavailable(err)
        } else {
            ServiceError::Engine(err)
        }
    }
}

/// Result of a full-strength position analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    /// Best move in UCI notation.
    pub best_move: String,
    pub evaluation: Evaluation,
    /// The engine's best line in SAN, possibly truncated.
    pub principal_variation: Vec<String>,
    /// Depth the analysis was requested at.
    pub depth: u32,
}

/// A move chosen by the engine playing at reduced strength.
#[derive(Debug, Clone, PartialEq)]
pub struct OpponentMove {
    /// The move in UCI notation.
    pub mv: String,
    /// Normalized evaluation, see [`Evaluation::normalized`].
    pub evaluation: f64,
    /// Wall-clock time spent on the whole request.
    pub thinking_time: Duration,
}

/// Convert a client-supplied thinking time in seconds to a time budget.
///
/// # Errors
///
/// Returns [`ServiceError::InvalidRequest`] unless `seconds` is finite,
/// positive, and at most [`MAX_TIME_BUDGET`].
pub fn time_budget_from_secs(seconds: f64) -> Result<Duration, ServiceError> {
    let budget = Duration::try_from_secs_f64(seconds).map_err(|_| invalid_time_budget(seconds))?;
    if budget.is_zero() || budget > MAX_TIME_BUDGET {
        return Err(invalid_time_budget(seconds));
    }
    Ok(budget)
}

fn check_time_budget(budget: Duration) -> Result<(), ServiceError> {
    time_budget_from_secs(budget.as_secs_f64()).map(|_| ())
}

fn invalid_time_budget(seconds: f64) -> ServiceError {
    ServiceError::InvalidRequest(format!(
        "Time limit must be between 0 and {} seconds, got {}",
        MAX_TIME_BUDGET.as_secs(),
        seconds
    ))
}

fn check_depth(depth: u32) -> Result<(), ServiceError> {
    if depth == 0 || depth > MAX_SEARCH_DEPTH {
        return Err(ServiceError::InvalidRequest(format!(
            "Depth must be between 1 and {}, got {}",
            MAX_SEARCH_DEPTH, depth
        )));
    }
    Ok(())
}

/// Check `move_text` against the legal moves of `fen`. Board-only, so it
/// works without an engine.
///
/// # Errors
///
/// `InvalidPosition` for a bad FEN, `IllegalMove` for a malformed or
/// illegal move.
pub fn validate_move(fen: &str, move_text: &str) -> Result<MoveOutcome, ServiceError> {
    let position = board::parse_position(fen)?;
    Ok(board::apply_move(&position, move_text)?)
}

/// Position analysis and opponent moves over a single engine session.
pub struct AnalysisService {
    engine: Mutex<Box<dyn EngineSession>>,
}

impl AnalysisService {
    /// Take ownership of a started engine session.
    pub fn new(engine: Box<dyn EngineSession>) -> Self {
        Self {
            engine: Mutex::new(engine),
        }
    }

    /// Best move, evaluation, and principal variation at full strength.
    ///
    /// # Errors
    ///
    /// - `InvalidPosition` if `fen` does not parse; the engine is not touched
    /// - `InvalidRequest` if `depth` is outside `1..=MAX_SEARCH_DEPTH`
    /// - `NoLegalMoves` if the side to move is mated or stalemated
    /// - `EngineUnavailable` / `Engine` on engine failure
    pub async fn analyze_position(&self, fen: &str, depth: u32) -> Result<AnalysisResult, ServiceError> {
        let position = board::parse_position(fen)?;
        check_depth(depth)?;

        let mut engine = self.engine.lock().await;
        engine.configure(&EngineConfig::analysis(depth)).await?;
        engine.set_position(&position).await?;

        let best_move = engine.best_move().await?.ok_or(ServiceError::NoLegalMoves)?;
        let evaluation = engine.evaluate().await?;
        let principal_variation = engine::top_variations(&mut **engine, &position, 1)
            .await?
            .into_iter()
            .next()
            .map(|line| line.moves)
            .unwrap_or_default();
        drop(engine);

        tracing::debug!(%fen, depth, %best_move, ?evaluation, "Position analyzed");

        Ok(AnalysisResult {
            best_move,
            evaluation,
            principal_variation,
            depth,
        })
    }

    /// A move for a computer opponent playing at roughly `rating` strength.
    ///
    /// # Errors
    ///
    /// - `InvalidPosition` if `fen` does not parse; the engine is not touched
    /// - `InvalidRequest` if `time_budget` is zero or above `MAX_TIME_BUDGET`
    /// - `NoLegalMoves` if the side to move is mated or stalemated
    /// - `EngineUnavailable` / `Engine` on engine failure
    pub async fn generate_opponent_move(
        &self,
        fen: &str,
        rating: i32,
        time_budget: Duration,
    ) -> Result<OpponentMove, ServiceError> {
        let started = Instant::now();
        let position = board::parse_position(fen)?;
        check_time_budget(time_budget)?;
        let config = EngineConfig::opponent(rating, time_budget);

        let mut engine = self.engine.lock().await;
        engine.configure(&config).await?;
        engine.set_position(&position).await?;

        let mv = engine.best_move().await?.ok_or(ServiceError::NoLegalMoves)?;
        let evaluation = engine.evaluate().await?.normalized();
        drop(engine);

        let thinking_time = started.elapsed();
        tracing::debug!(
            %fen,
            rating,
            skill_level = config.skill_level,
            %mv,
            evaluation,
            thinking_ms = thinking_time.as_millis() as u64,
            "Opponent move generated"
        );

        Ok(OpponentMove {
            mv,
            evaluation,
            thinking_time,
        })
    }

    /// Whether the engine process is running.
    ///
    /// A session busy with another request is running by definition.
    pub fn engine_available(&self) -> bool {
        match self.engine.try_lock() {
            Ok(mut engine) => engine.is_alive(),
            Err(_) => true,
        }
    }

    /// Stop the engine. Waits for any in-flight request to finish first.
    pub async fn shutdown(&self) -> Result<(), EngineError> {
        self.engine.lock().await.shutdown().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{EngineCall, ScriptedEngine};

    const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
    const FOOLS_MATE: &str = "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3";

    fn uci(moves: &[&str]) -> Vec<String> {
        moves.iter().map(|s| s.to_string()).collect()
    }

    fn service(engine: ScriptedEngine) -> AnalysisService {
        AnalysisService::new(Box::new(engine))
    }

    #[tokio::test]
    async fn analyze_start_position() {
        let engine = ScriptedEngine::new()
            .with_best_move("e2e4")
            .with_evaluation(Evaluation::Centipawns(35))
            .with_line(uci(&["e2e4", "e7e5", "g1f3"]), Evaluation::Centipawns(35));
        let log = engine.log();

        let result = service(engine).analyze_position(START, 12).await.unwrap();
        assert_eq!(result.best_move, "e2e4");
        assert_eq!(result.evaluation, Evaluation::Centipawns(35));
        assert_eq!(result.principal_variation, vec!["e4", "e5", "Nf3"]);
        assert_eq!(result.depth, 12);

        assert_eq!(
            log.calls(),
            vec![
                EngineCall::Configure(EngineConfig::analysis(12)),
                EngineCall::SetPosition(START.to_string()),
                EngineCall::BestMove,
                EngineCall::Evaluate,
                EngineCall::TopLines(1),
            ]
        );
    }

    #[tokio::test]
    async fn analyze_truncates_undecodable_variation() {
        let engine = ScriptedEngine::new()
            .with_best_move("d2d4")
            .with_line(uci(&["d2d4", "d7d5", "zzzz", "c2c4"]), Evaluation::Centipawns(20));

        let result = service(engine).analyze_position(START, 10).await.unwrap();
        assert_eq!(result.principal_variation, vec!["d4", "d5"]);
    }

    #[tokio::test]
    async fn analyze_without_lines_has_empty_variation() {
        let engine = ScriptedEngine::new().with_best_move("e2e4");
        let result = service(engine).analyze_position(START, 10).await.unwrap();
        assert!(result.principal_variation.is_empty());
    }

    #[tokio::test]
    async fn invalid_fen_never_reaches_engine() {
        let engine = ScriptedEngine::new().with_best_move("e2e4");
        let log = engine.log();
        let service = service(engine);

        let err = service.analyze_position("not a fen", 15).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidPosition(_)));

        // No white king
        let err = service
            .generate_opponent_move(
                "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQ1BNR w kq - 0 1",
                1500,
                Duration::from_secs(1),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidPosition(_)));

        assert!(log.is_empty());
    }

    #[tokio::test]
    async fn depth_out_of_range_is_rejected() {
        let engine = ScriptedEngine::new().with_best_move("e2e4");
        let log = engine.log();
        let service = service(engine);

        for depth in [0, MAX_SEARCH_DEPTH + 1] {
            let err = service.analyze_position(START, depth).await.unwrap_err();
            assert!(matches!(err, ServiceError::InvalidRequest(_)), "depth {}", depth);
        }
        assert!(log.is_empty());
    }

    #[tokio::test]
    async fn checkmated_side_has_no_moves() {
        let service = service(ScriptedEngine::new());

        let err = service.analyze_position(FOOLS_MATE, 15).await.unwrap_err();
        assert!(matches!(err, ServiceError::NoLegalMoves));

        let err = service
            .generate_opponent_move(FOOLS_MATE, 1500, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NoLegalMoves));
    }

    #[tokio::test]
    async fn opponent_move_configures_before_querying() {
        let engine = ScriptedEngine::new()
            .with_best_move("g1f3")
            .with_evaluation(Evaluation::Centipawns(-120));
        let log = engine.log();

        let reply = service(engine)
            .generate_opponent_move(START, 2000, Duration::from_millis(500))
            .await
            .unwrap();
        assert_eq!(reply.mv, "g1f3");
        assert_eq!(reply.evaluation, -1.2);

        let calls = log.calls();
        assert_eq!(calls.len(), 4);
        match &calls[0] {
            EngineCall::Configure(config) => {
                assert_eq!(config.skill_level, 12);
                assert_eq!(config.time_budget, Some(Duration::from_millis(500)));
            }
            other => panic!("Expected Configure first, got {:?}", other),
        }
        assert_eq!(calls[1], EngineCall::SetPosition(START.to_string()));
        assert_eq!(calls[2], EngineCall::BestMove);
        assert_eq!(calls[3], EngineCall::Evaluate);
    }

    #[tokio::test]
    async fn opponent_move_normalizes_mate() {
        let engine = ScriptedEngine::new()
            .with_best_move("e2e4")
            .with_evaluation(Evaluation::Mate(-2));

        let reply = service(engine)
            .generate_opponent_move(START, 800, Duration::from_millis(100))
            .await
            .unwrap();
        assert_eq!(reply.evaluation, -999.0);
    }

    #[tokio::test]
    async fn opponent_move_rejects_bad_time_budget() {
        let service = service(ScriptedEngine::new().with_best_move("e2e4"));

        for budget in [Duration::ZERO, MAX_TIME_BUDGET + Duration::from_millis(1)] {
            let err = service
                .generate_opponent_move(START, 1500, budget)
                .await
                .unwrap_err();
            assert!(matches!(err, ServiceError::InvalidRequest(_)));
        }
    }

    #[test]
    fn time_budget_conversion() {
        assert_eq!(time_budget_from_secs(1.0).unwrap(), Duration::from_secs(1));
        assert_eq!(time_budget_from_secs(0.25).unwrap(), Duration::from_millis(250));
        assert_eq!(time_budget_from_secs(60.0).unwrap(), MAX_TIME_BUDGET);

        for seconds in [0.0, -1.0, 60.5, f64::NAN, f64::INFINITY] {
            assert!(
                matches!(time_budget_from_secs(seconds), Err(ServiceError::InvalidRequest(_))),
                "accepted {}",
                seconds
            );
        }
    }

    #[tokio::test]
    async fn time_limit_errors_read_the_same_on_both_paths() {
        let service = service(ScriptedEngine::new().with_best_move("e2e4"));

        let from_request = time_budget_from_secs(75.0).unwrap_err().to_string();
        let from_service = service
            .generate_opponent_move(START, 1500, Duration::from_secs(75))
            .await
            .unwrap_err()
            .to_string();
        assert_eq!(from_request, from_service);
        assert!(from_request.contains("between 0 and 60 seconds, got 75"));
    }

    #[tokio::test]
    async fn dead_engine_is_unavailable() {
        let service = service(ScriptedEngine::new().terminated());
        assert!(!service.engine_available());

        let err = service.analyze_position(START, 15).await.unwrap_err();
        assert!(matches!(err, ServiceError::EngineUnavailable(EngineError::Terminated)));
    }

    #[tokio::test]
    async fn garbled_engine_is_an_internal_error() {
        let service = service(ScriptedEngine::new().garbled("bestmove ???"));
        assert!(service.engine_available());

        let err = service
            .generate_opponent_move(START, 1500, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Engine(EngineError::InvalidResponse(_))));
    }

    #[test]
    fn validate_move_is_board_only() {
        let outcome = validate_move(START, "e2e4").unwrap();
        assert_eq!(outcome.san, "e4");
        assert!(!outcome.is_check);

        assert!(matches!(
            validate_move(START, "e2e5"),
            Err(ServiceError::IllegalMove(_))
        ));
        assert!(matches!(
            validate_move(START, "xyz"),
            Err(ServiceError::IllegalMove(_))
        ));
        assert!(matches!(
            validate_move("garbage", "e2e4"),
            Err(ServiceError::InvalidPosition(_))
        ));
    }

    #[tokio::test]
    async fn shutdown_reaches_engine() {
        let engine = ScriptedEngine::new();
        let log = engine.log();

        service(engine).shutdown().await.unwrap();
        assert_eq!(log.calls(), vec![EngineCall::Shutdown]);
    }

    #[test]
    fn engine_errors_are_classified() {
        assert!(matches!(
            ServiceError::from(EngineError::Timeout("go".to_string())),
            ServiceError::EngineUnavailable(_)
        ));
        assert!(matches!(
            ServiceError::from(EngineError::InvalidResponse("?".to_string())),
            ServiceError::Engine(_)
        ));
    }
}
