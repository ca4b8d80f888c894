//! Integration tests against a real engine.
//!
//! These tests require Stockfish to be installed and available in PATH.
//! Run with: `cargo test -p chess-analysis --test integration -- --ignored`

use std::path::Path;
use std::time::Duration;

use chess_analysis::board::{self, parse_position};
use chess_analysis::engine::top_variations;
use chess_analysis::{AnalysisService, EngineConfig, EngineSession, EngineSettings, Evaluation, UciEngine};

const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Check if Stockfish is available in PATH.
fn stockfish_available() -> bool {
    std::process::Command::new("stockfish")
        .arg("--version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .is_ok()
}

async fn stockfish() -> UciEngine {
    UciEngine::spawn(Path::new("stockfish"), &EngineSettings::default())
        .await
        .expect("Failed to start Stockfish")
}

#[tokio::test]
#[ignore = "requires Stockfish"]
async fn test_engine_handshake_reports_name() {
    if !stockfish_available() {
        eprintln!("Skipping test: Stockfish not available");
        return;
    }

    let mut engine = stockfish().await;
    assert!(
        engine.name().to_lowercase().contains("stockfish"),
        "Engine name should contain 'Stockfish', got: {}",
        engine.name()
    );
    assert!(engine.is_alive());

    engine.shutdown().await.unwrap();
    assert!(!engine.is_alive());
}

#[tokio::test]
#[ignore = "requires Stockfish"]
async fn test_start_position_best_move_is_legal() {
    if !stockfish_available() {
        eprintln!("Skipping test: Stockfish not available");
        return;
    }

    let position = parse_position(START).unwrap();
    let legal = board::legal_moves(&position);
    assert_eq!(legal.len(), 20);

    let mut engine = stockfish().await;
    engine.configure(&EngineConfig::analysis(8)).await.unwrap();
    engine.set_position(&position).await.unwrap();

    let best = engine.best_move().await.unwrap().expect("start position has moves");
    assert!(legal.contains(&best), "{} is not a legal opening move", best);

    let evaluation = engine.evaluate().await.unwrap();
    assert!(
        matches!(evaluation, Evaluation::Centipawns(cp) if cp.abs() < 200),
        "Start position should be roughly level, got {:?}",
        evaluation
    );

    engine.shutdown().await.unwrap();
}

#[tokio::test]
#[ignore = "requires Stockfish"]
async fn test_mate_in_one_is_found() {
    if !stockfish_available() {
        eprintln!("Skipping test: Stockfish not available");
        return;
    }

    // Back rank: Ra8#
    let position = parse_position("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1").unwrap();
    let mut engine = stockfish().await;
    engine.configure(&EngineConfig::analysis(6)).await.unwrap();
    engine.set_position(&position).await.unwrap();

    assert_eq!(engine.best_move().await.unwrap().as_deref(), Some("a1a8"));
    assert_eq!(engine.evaluate().await.unwrap(), Evaluation::Mate(1));

    engine.shutdown().await.unwrap();
}

#[tokio::test]
#[ignore = "requires Stockfish"]
async fn test_multipv_lines_decode_to_san() {
    if !stockfish_available() {
        eprintln!("Skipping test: Stockfish not available");
        return;
    }

    let position = parse_position(START).unwrap();
    let mut engine = stockfish().await;
    engine.configure(&EngineConfig::analysis(8)).await.unwrap();
    engine.set_position(&position).await.unwrap();

    let lines = top_variations(&mut engine, &position, 3).await.unwrap();
    assert_eq!(lines.len(), 3);
    for line in &lines {
        assert!(!line.moves.is_empty());
    }

    engine.shutdown().await.unwrap();
}

#[tokio::test]
#[ignore = "requires Stockfish"]
async fn test_service_end_to_end() {
    if !stockfish_available() {
        eprintln!("Skipping test: Stockfish not available");
        return;
    }

    let service = AnalysisService::new(Box::new(stockfish().await));
    assert!(service.engine_available());

    let analysis = service.analyze_position(START, 10).await.unwrap();
    assert_eq!(analysis.depth, 10);
    assert!(!analysis.principal_variation.is_empty());

    let reply = service
        .generate_opponent_move(START, 1200, Duration::from_millis(200))
        .await
        .unwrap();
    let legal = board::legal_moves(&parse_position(START).unwrap());
    assert!(legal.contains(&reply.mv));
    assert!(reply.thinking_time > Duration::ZERO);

    service.shutdown().await.unwrap();
    assert!(!service.engine_available());
}
