//! Per-request engine configuration.

use std::time::Duration;

/// Lowest Stockfish `Skill Level`.
pub const MIN_SKILL_LEVEL: u8 = 0;
/// Highest Stockfish `Skill Level` (full strength).
pub const MAX_SKILL_LEVEL: u8 = 20;
/// Default search depth for position analysis.
pub const DEFAULT_DEPTH: u32 = 15;
/// Deepest search a client may request.
pub const MAX_SEARCH_DEPTH: u32 = 99;
/// Longest thinking time a client may request.
pub const MAX_TIME_BUDGET: Duration = Duration::from_secs(60);

/// Search settings applied to the engine before a query.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Maximum search depth in plies. Used when no time budget is set.
    pub depth: u32,
    /// Engine skill level, `MIN_SKILL_LEVEL..=MAX_SKILL_LEVEL`.
    pub skill_level: u8,
    /// Fixed thinking time. Takes precedence over `depth`.
    pub time_budget: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            depth: DEFAULT_DEPTH,
            skill_level: MAX_SKILL_LEVEL,
            time_budget: None,
        }
    }
}

impl EngineConfig {
    /// Full-strength search to the given depth.
    pub fn analysis(depth: u32) -> Self {
        Self {
            depth,
            ..Self::default()
        }
    }

    /// Reduced-strength search for a playing opponent of the given rating.
    pub fn opponent(rating: i32, time_budget: Duration) -> Self {
        Self {
            skill_level: skill_level_for_rating(rating),
            time_budget: Some(time_budget),
            ..Self::default()
        }
    }
}

/// Maps an Elo-like strength rating to a skill level:
/// `clamp((rating - 800) / 100, 0, 20)`, rounding down.
pub fn skill_level_for_rating(rating: i32) -> u8 {
    let level = (i64::from(rating) - 800).div_euclid(100);
    level.clamp(i64::from(MIN_SKILL_LEVEL), i64::from(MAX_SKILL_LEVEL)) as u8
}
