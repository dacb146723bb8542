use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Difficulty, GameType, ParseVariantError};

pub const HIGH_SCORE_THRESHOLD: u32 = 1000;
pub const SCHOLAR_GAME_COUNT: u32 = 10;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AchievementType {
    FirstSteps,
    NoHintsNeeded,
    SpeedDemon,
    ExpertClear,
    HighScorer,
    IdiomScholar,
    SentenceMaster,
}

/// What just happened, plus the running totals the rules need.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AchievementContext {
    pub game_type: GameType,
    pub difficulty: Difficulty,
    pub correct: bool,
    pub hints_used: u8,
    pub elapsed_secs: u32,
    pub total_score: u32,
    /// Correct answers in this game type, including this one.
    pub correct_games: u32,
}

impl AchievementType {
    pub const ALL: [AchievementType; 7] = [
        AchievementType::FirstSteps,
        AchievementType::NoHintsNeeded,
        AchievementType::SpeedDemon,
        AchievementType::ExpertClear,
        AchievementType::HighScorer,
        AchievementType::IdiomScholar,
        AchievementType::SentenceMaster,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AchievementType::FirstSteps => "FIRST_STEPS",
            AchievementType::NoHintsNeeded => "NO_HINTS_NEEDED",
            AchievementType::SpeedDemon => "SPEED_DEMON",
            AchievementType::ExpertClear => "EXPERT_CLEAR",
            AchievementType::HighScorer => "HIGH_SCORER",
            AchievementType::IdiomScholar => "IDIOM_SCHOLAR",
            AchievementType::SentenceMaster => "SENTENCE_MASTER",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            AchievementType::FirstSteps => "Answer a puzzle correctly for the first time",
            AchievementType::NoHintsNeeded => "Solve a puzzle without using any hints",
            AchievementType::SpeedDemon => "Solve a puzzle within a quarter of its time limit",
            AchievementType::ExpertClear => "Solve an expert puzzle",
            AchievementType::HighScorer => "Earn 1000 points or more from a single puzzle",
            AchievementType::IdiomScholar => "Solve 10 idiom puzzles",
            AchievementType::SentenceMaster => "Solve 10 sentence puzzles",
        }
    }

    fn is_earned(self, ctx: &AchievementContext) -> bool {
        if !ctx.correct {
            return false;
        }
        match self {
            AchievementType::FirstSteps => true,
            AchievementType::NoHintsNeeded => ctx.hints_used == 0,
            AchievementType::SpeedDemon => {
                ctx.elapsed_secs.saturating_mul(4) <= ctx.difficulty.time_limit_secs()
            }
            AchievementType::ExpertClear => ctx.difficulty == Difficulty::Expert,
            AchievementType::HighScorer => ctx.total_score >= HIGH_SCORE_THRESHOLD,
            AchievementType::IdiomScholar => {
                ctx.game_type == GameType::Idiom && ctx.correct_games >= SCHOLAR_GAME_COUNT
            }
            AchievementType::SentenceMaster => {
                ctx.game_type == GameType::Sentence && ctx.correct_games >= SCHOLAR_GAME_COUNT
            }
        }
    }
}

/// Every achievement the context satisfies. Callers filter out ones already unlocked.
pub fn evaluate_achievements(ctx: &AchievementContext) -> Vec<AchievementType> {
    AchievementType::ALL
        .into_iter()
        .filter(|achievement| achievement.is_earned(ctx))
        .collect()
}

impl Display for AchievementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AchievementType {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        AchievementType::ALL
            .into_iter()
            .find(|a| a.as_str() == wanted)
            .ok_or_else(|| ParseVariantError::new("achievement type", s))
    }
}
