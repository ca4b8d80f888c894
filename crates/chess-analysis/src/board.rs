//! Board validation.
//!
//! Parses FEN into structurally legal positions and checks candidate moves
//! against the legal-move set before anything reaches the engine. The chess
//! rules themselves come from `shakmaty`.

use std::fmt;
use std::str::FromStr;

use shakmaty::fen::Fen;
use shakmaty::san::SanPlus;
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Move, Position as _};
use thiserror::Error;

/// Errors produced while validating positions and moves.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    /// The FEN is malformed or describes an impossible position.
    #[error("Invalid position: {0}")]
    InvalidPosition(String),
    /// The move text is not in UCI notation.
    #[error("Invalid move format: {0}")]
    MalformedMove(String),
    /// The move is well-formed but not legal in the position.
    #[error("Illegal move: {0}")]
    IllegalMove(String),
}

/// A structurally legal chess position.
#[derive(Debug, Clone)]
pub struct Position(Chess);

impl Position {
    /// The position rendered back to FEN.
    pub fn fen(&self) -> String {
        Fen::from_position(self.0.clone(), EnPassantMode::Legal).to_string()
    }

    /// Side to move.
    pub fn turn(&self) -> Color {
        self.0.turn()
    }

    pub fn is_check(&self) -> bool {
        self.0.is_check()
    }

    pub fn is_checkmate(&self) -> bool {
        self.0.is_checkmate()
    }

    pub fn is_stalemate(&self) -> bool {
        self.0.is_stalemate()
    }

    /// Whether the side to move has at least one legal move.
    pub fn has_legal_moves(&self) -> bool {
        !self.0.legal_moves().is_empty()
    }

    /// Resolve UCI move text to a legal move in this position.
    fn resolve(&self, move_text: &str) -> Result<Move, BoardError> {
        let uci = UciMove::from_ascii(move_text.trim().as_bytes())
            .map_err(|_| BoardError::MalformedMove(move_text.to_string()))?;
        uci.to_move(&self.0)
            .map_err(|_| BoardError::IllegalMove(move_text.to_string()))
    }
}

impl FromStr for Position {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_position(s)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fen())
    }
}

/// Result of playing a legal move.
#[derive(Debug, Clone)]
pub struct MoveOutcome {
    /// The position after the move.
    pub position: Position,
    /// The move in standard algebraic notation, with `+`/`#` suffix.
    pub san: String,
    pub is_check: bool,
    pub is_checkmate: bool,
    pub is_stalemate: bool,
}

/// Parse a FEN string into a structurally legal position.
///
/// # Errors
///
/// Returns [`BoardError::InvalidPosition`] if the text is not valid FEN or
/// the position it describes could not arise (missing kings, pawns on the
/// back rank, the side not to move in check, ...).
pub fn parse_position(text: &str) -> Result<Position, BoardError> {
    let fen: Fen = text
        .trim()
        .parse()
        .map_err(|e: shakmaty::fen::ParseFenError| BoardError::InvalidPosition(e.to_string()))?;
    let chess: Chess = fen
        .into_position(CastlingMode::Standard)
        .map_err(|e| BoardError::InvalidPosition(e.to_string()))?;
    Ok(Position(chess))
}

/// Play `move_text` (UCI notation) in `position`.
///
/// # Errors
///
/// - [`BoardError::MalformedMove`] if the text is not a UCI move
/// - [`BoardError::IllegalMove`] if the move is not legal in `position`
pub fn apply_move(position: &Position, move_text: &str) -> Result<MoveOutcome, BoardError> {
    let mv = position.resolve(move_text)?;
    let mut next = position.0.clone();
    let san = SanPlus::from_move_and_play_unchecked(&mut next, &mv);
    let next = Position(next);

    Ok(MoveOutcome {
        san: san.to_string(),
        is_check: next.is_check(),
        is_checkmate: next.is_checkmate(),
        is_stalemate: next.is_stalemate(),
        position: next,
    })
}

/// Convert a UCI move to disambiguated SAN at `position`.
///
/// # Errors
///
/// Fails with the same errors as [`apply_move`] unless the move is legal.
pub fn to_standard_notation(position: &Position, move_text: &str) -> Result<String, BoardError> {
    apply_move(position, move_text).map(|outcome| outcome.san)
}

/// Convert a line of UCI moves to SAN, walking forward from `position`.
///
/// Stops at the first move that cannot be decoded or is illegal and returns
/// the SAN of the moves before it.
pub fn decode_line(position: &Position, moves: &[String]) -> Vec<String> {
    let mut current = position.clone();
    let mut san_moves = Vec::with_capacity(moves.len());

    for move_text in moves {
        match apply_move(&current, move_text) {
            Ok(outcome) => {
                san_moves.push(outcome.san);
                current = outcome.position;
            }
            Err(e) => {
                tracing::debug!(error = %e, decoded = san_moves.len(), "Truncating engine line");
                break;
            }
        }
    }

    san_moves
}

/// All legal moves in UCI notation.
pub fn legal_moves(position: &Position) -> Vec<String> {
    position
        .0
        .legal_moves()
        .iter()
        .map(|m| m.to_uci(CastlingMode::Standard).to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
    const FOOLS_MATE: &str = "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3";
    const STALEMATE: &str = "7k/5Q2/6K1/8/8/8/8/8 b - - 0 1";

    #[test]
    fn parse_start_position() {
        let position = parse_position(START).unwrap();
        assert_eq!(position.fen(), START);
        assert_eq!(position.turn(), Color::White);
        assert_eq!(legal_moves(&position).len(), 20);
    }

    #[test]
    fn parse_trims_whitespace() {
        assert!(parse_position(&format!("  {}\n", START)).is_ok());
    }

    #[test]
    fn reject_malformed_fen() {
        for fen in ["", "not a fen", "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP w KQkq - 0 1"] {
            assert!(
                matches!(parse_position(fen), Err(BoardError::InvalidPosition(_))),
                "accepted {:?}",
                fen
            );
        }
    }

    #[test]
    fn reject_structurally_illegal_positions() {
        let cases = [
            // No white king
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQ1BNR w kq - 0 1",
            // Two white kings
            "rnbqkbnr/pppppppp/8/8/8/3K4/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            // Pawn on the back rank
            "rnbqkbnP/pppppppp/8/8/8/8/PPPPPPP1/RNBQKBNR w KQq - 0 1",
            // Side not to move is in check
            "4k3/8/8/8/8/8/8/4R1K1 w - - 0 1",
        ];

        for fen in cases {
            assert!(
                matches!(parse_position(fen), Err(BoardError::InvalidPosition(_))),
                "accepted {}",
                fen
            );
        }
    }

    #[test]
    fn apply_move_switches_side_to_move() {
        let position = parse_position(START).unwrap();
        let outcome = apply_move(&position, "e2e4").unwrap();
        assert_eq!(outcome.san, "e4");
        assert_eq!(outcome.position.turn(), Color::Black);
        assert_ne!(outcome.position.turn(), position.turn());
        assert_eq!(
            outcome.position.fen(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
        );
        assert!(!outcome.is_check);
    }

    #[test]
    fn apply_move_distinguishes_malformed_from_illegal() {
        let position = parse_position(START).unwrap();
        assert_eq!(
            apply_move(&position, "hello").unwrap_err(),
            BoardError::MalformedMove("hello".to_string())
        );
        assert_eq!(
            apply_move(&position, "e2e5").unwrap_err(),
            BoardError::IllegalMove("e2e5".to_string())
        );
    }

    #[test]
    fn apply_move_reports_checkmate() {
        let position =
            parse_position("rnbqkbnr/pppp1ppp/8/4p3/6P1/5P2/PPPPP2P/RNBQKBNR b KQkq - 0 2").unwrap();
        let outcome = apply_move(&position, "d8h4").unwrap();
        assert_eq!(outcome.san, "Qh4#");
        assert!(outcome.is_check);
        assert!(outcome.is_checkmate);
        assert!(!outcome.is_stalemate);
        assert!(!outcome.position.has_legal_moves());
    }

    #[test]
    fn apply_move_reports_stalemate() {
        let position = parse_position("7k/8/6K1/8/8/8/8/5Q2 w - - 0 1").unwrap();
        let outcome = apply_move(&position, "f1f7").unwrap();
        assert!(outcome.is_stalemate);
        assert!(!outcome.is_check);
        assert!(!outcome.is_checkmate);
    }

    #[test]
    fn terminal_positions_have_no_legal_moves() {
        let mated = parse_position(FOOLS_MATE).unwrap();
        assert!(mated.is_checkmate());
        assert!(legal_moves(&mated).is_empty());

        let stalemate = parse_position(STALEMATE).unwrap();
        assert!(stalemate.is_stalemate());
        assert!(!stalemate.has_legal_moves());
    }

    #[test]
    fn standard_notation_disambiguates() {
        // Both rooks reach d1.
        let position = parse_position("4k3/8/8/8/8/8/8/R4RK1 w - - 0 1").unwrap();
        assert_eq!(to_standard_notation(&position, "a1d1").unwrap(), "Rad1");
        assert_eq!(to_standard_notation(&position, "f1d1").unwrap(), "Rfd1");
    }

    #[test]
    fn standard_notation_castling() {
        let position = parse_position("4k3/8/8/8/8/8/8/R3K2R w KQ - 0 1").unwrap();
        assert_eq!(to_standard_notation(&position, "e1g1").unwrap(), "O-O");
        assert_eq!(to_standard_notation(&position, "e1c1").unwrap(), "O-O-O");
    }

    #[test]
    fn standard_notation_promotion() {
        let position = parse_position("8/4P3/8/8/8/8/k7/4K3 w - - 0 1").unwrap();
        assert_eq!(to_standard_notation(&position, "e7e8q").unwrap(), "e8=Q");
    }

    #[test]
    fn standard_notation_rejects_illegal_move() {
        let position = parse_position(START).unwrap();
        assert!(matches!(
            to_standard_notation(&position, "e1e2"),
            Err(BoardError::IllegalMove(_))
        ));
    }

    #[test]
    fn decode_full_line() {
        let position = parse_position(START).unwrap();
        let line: Vec<String> = ["e2e4", "e7e5", "g1f3", "b8c6"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(decode_line(&position, &line), vec!["e4", "e5", "Nf3", "Nc6"]);
    }

    #[test]
    fn decode_stops_at_first_bad_move() {
        let position = parse_position(START).unwrap();
        let line: Vec<String> = ["e2e4", "e7e5", "e4e5", "g1f3"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(decode_line(&position, &line), vec!["e4", "e5"]);

        let garbage: Vec<String> = ["d2d4", "??", "d7d5"].iter().map(|s| s.to_string()).collect();
        assert_eq!(decode_line(&position, &garbage), vec!["d4"]);
    }

    #[test]
    fn position_from_str() {
        let position: Position = START.parse().unwrap();
        assert_eq!(position.to_string(), START);
    }
}
