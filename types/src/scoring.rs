//! Score calculation shared by the HTTP service and the terminal client.
//!
//! A correct answer earns the tier's base points plus a time bonus, scaled
//! by the tier multiplier, minus the accumulated hint penalty. Incorrect
//! answers score nothing.

use serde::{Deserialize, Serialize};

use crate::{
    difficulty::TIME_BONUS_CEILING,
    hint::{hint_penalty, MAX_HINTS},
    Difficulty,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ScoringError {
    #[error("{0} hints used, at most {MAX_HINTS} are allowed")]
    TooManyHints(u8),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreInput {
    pub difficulty: Difficulty,
    pub elapsed_secs: u32,
    pub hints_used: u8,
    pub correct: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub base_points: u32,
    pub time_bonus: u32,
    pub difficulty_multiplier: f64,
    pub hint_penalty: u32,
    pub total_score: u32,
}

pub fn calculate_score(input: ScoreInput) -> Result<ScoreBreakdown, ScoringError> {
    let penalty = hint_penalty(input.hints_used).ok_or(ScoringError::TooManyHints(input.hints_used))?;
    if !input.correct {
        return Ok(ScoreBreakdown::default());
    }

    let difficulty = input.difficulty;
    let limit = difficulty.time_limit_secs();
    let remaining = limit.saturating_sub(input.elapsed_secs);
    let time_bonus =
        (f64::from(remaining) / f64::from(limit) * f64::from(TIME_BONUS_CEILING)).floor() as u32;

    let base_points = difficulty.base_points();
    let multiplier = difficulty.multiplier();
    let scaled = (f64::from(base_points + time_bonus) * multiplier).floor() as u32;

    Ok(ScoreBreakdown {
        base_points,
        time_bonus,
        difficulty_multiplier: multiplier,
        hint_penalty: penalty,
        total_score: scaled.saturating_sub(penalty),
    })
}

/// Fraction of positions where the submitted tile matches the expected one.
pub fn accuracy<T: PartialEq>(expected: &[T], submitted: &[T]) -> f64 {
    if expected.is_empty() {
        return 0.0;
    }
    let matching = expected
        .iter()
        .zip(submitted)
        .filter(|(want, got)| want == got)
        .count();
    matching as f64 / expected.len() as f64
}
