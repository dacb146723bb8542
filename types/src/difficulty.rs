use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::ParseVariantError;

/// Upper bound of the time bonus, reached when the answer comes in instantly.
pub const TIME_BONUS_CEILING: u32 = 100;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Expert,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::Expert,
    ];

    pub fn base_points(self) -> u32 {
        match self {
            Difficulty::Easy => 100,
            Difficulty::Medium => 200,
            Difficulty::Hard => 300,
            Difficulty::Expert => 500,
        }
    }

    /// Seconds allowed before the time bonus runs out.
    pub fn time_limit_secs(self) -> u32 {
        match self {
            Difficulty::Easy => 180,
            Difficulty::Medium => 150,
            Difficulty::Hard => 120,
            Difficulty::Expert => 90,
        }
    }

    pub fn multiplier(self) -> f64 {
        match self {
            Difficulty::Easy => 1.0,
            Difficulty::Medium => 1.5,
            Difficulty::Hard => 2.0,
            Difficulty::Expert => 3.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "EASY",
            Difficulty::Medium => "MEDIUM",
            Difficulty::Hard => "HARD",
            Difficulty::Expert => "EXPERT",
        }
    }
}

impl Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EASY" => Ok(Difficulty::Easy),
            "MEDIUM" => Ok(Difficulty::Medium),
            "HARD" => Ok(Difficulty::Hard),
            "EXPERT" => Ok(Difficulty::Expert),
            _ => Err(ParseVariantError::new("difficulty", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiers_escalate() {
        for pair in Difficulty::ALL.windows(2) {
            let (lower, higher) = (pair[0], pair[1]);
            assert!(lower.base_points() < higher.base_points());
            assert!(lower.time_limit_secs() > higher.time_limit_secs());
            assert!(lower.multiplier() < higher.multiplier());
        }
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("hard".parse::<Difficulty>(), Ok(Difficulty::Hard));
        assert_eq!(" Expert ".parse::<Difficulty>(), Ok(Difficulty::Expert));
        assert!("legendary".parse::<Difficulty>().is_err());
    }

    #[test]
    fn test_serde_uses_upper_case_names() {
        let json = serde_json::to_string(&Difficulty::Medium).unwrap();
        assert_eq!(json, "\"MEDIUM\"");
        let back: Difficulty = serde_json::from_str("\"EASY\"").unwrap();
        assert_eq!(back, Difficulty::Easy);
    }
}
