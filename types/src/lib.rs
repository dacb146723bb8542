pub mod achievement;
pub mod difficulty;
pub mod game_type;
pub mod hint;
pub mod leaderboard;
pub mod player;
pub mod scoring;
pub mod scramble;
pub mod session;

pub use achievement::{evaluate_achievements, AchievementContext, AchievementType};
pub use difficulty::Difficulty;
pub use game_type::GameType;
pub use hint::{hint_penalty, HintLevel, MAX_HINTS};
pub use leaderboard::{assign_ranks, RankEntry};
pub use player::Role;
pub use scoring::{accuracy, calculate_score, ScoreBreakdown, ScoreInput, ScoringError};
pub use scramble::{idiom_tiles, is_correct, scramble_tiles, Tile};
pub use session::{is_stale, SessionStatus, TransitionError};

/// Returned when a stored or submitted string doesn't name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value:?}")]
pub struct ParseVariantError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseVariantError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
