use std::fmt::Display;

use serde::{Deserialize, Serialize};

pub const MAX_HINTS: u8 = 3;

/// Escalating reveal tiers. Each level costs more than the one before it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HintLevel {
    /// English meaning of the answer.
    First,
    /// Pinyin of the answer.
    Second,
    /// Leading tiles of the answer.
    Third,
}

impl HintLevel {
    pub const ALL: [HintLevel; 3] = [HintLevel::First, HintLevel::Second, HintLevel::Third];

    /// Level for the `n`th hint of a session, 1-based.
    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(HintLevel::First),
            2 => Some(HintLevel::Second),
            3 => Some(HintLevel::Third),
            _ => None,
        }
    }

    /// The level that follows `hints_used` earlier hints, if any remain.
    pub fn next_after(hints_used: u8) -> Option<Self> {
        hints_used.checked_add(1).and_then(Self::from_number)
    }

    pub fn number(self) -> u8 {
        match self {
            HintLevel::First => 1,
            HintLevel::Second => 2,
            HintLevel::Third => 3,
        }
    }

    pub fn penalty(self) -> u32 {
        match self {
            HintLevel::First => 10,
            HintLevel::Second => 20,
            HintLevel::Third => 30,
        }
    }
}

impl Display for HintLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Level {}", self.number())
    }
}

/// Sum of the penalties for levels `1..=hints_used`, or `None` past the last level.
pub fn hint_penalty(hints_used: u8) -> Option<u32> {
    if hints_used > MAX_HINTS {
        return None;
    }
    Some(
        HintLevel::ALL
            .iter()
            .take(hints_used as usize)
            .map(|level| level.penalty())
            .sum(),
    )
}
