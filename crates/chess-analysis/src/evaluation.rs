//! Chess position evaluation types.

use serde::{Deserialize, Serialize};
use uci::Score;

/// Normalized score reported for any forced mate.
pub const MATE_SCORE: f64 = 999.0;

/// Represents a chess position evaluation.
///
/// Both variants are from the point of view of the side to move, which is
/// how UCI engines report them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Evaluation {
    /// Centipawn evaluation (positive = side to move is better)
    #[serde(rename = "cp")]
    Centipawns(i32),
    /// Mate in N moves (positive = side to move mates, zero or negative =
    /// side to move is mated)
    #[serde(rename = "mate")]
    Mate(i32),
}

impl Evaluation {
    /// Score on a single pawn scale: centipawns / 100, mates pinned to
    /// `±MATE_SCORE`.
    pub fn normalized(&self) -> f64 {
        match *self {
            Evaluation::Centipawns(cp) => f64::from(cp) / 100.0,
            Evaluation::Mate(n) if n > 0 => MATE_SCORE,
            Evaluation::Mate(_) => -MATE_SCORE,
        }
    }
}

impl From<Score> for Evaluation {
    fn from(score: Score) -> Self {
        match score {
            Score::Cp(cp) => Evaluation::Centipawns(cp),
            Score::Mate(n) => Evaluation::Mate(n),
        }
    }
}
