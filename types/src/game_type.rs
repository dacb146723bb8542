use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::ParseVariantError;

/// The two playable modes: reorder the characters of an idiom, or the words
/// of a sentence.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameType {
    Idiom,
    Sentence,
}

impl GameType {
    pub const ALL: [GameType; 2] = [GameType::Idiom, GameType::Sentence];

    pub fn as_str(self) -> &'static str {
        match self {
            GameType::Idiom => "IDIOM",
            GameType::Sentence => "SENTENCE",
        }
    }

    /// Name of the feature flag that gates this mode.
    pub fn feature_flag(self) -> &'static str {
        match self {
            GameType::Idiom => "idiom_game",
            GameType::Sentence => "sentence_game",
        }
    }
}

impl Display for GameType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for GameType {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "IDIOM" => Ok(GameType::Idiom),
            "SENTENCE" => Ok(GameType::Sentence),
            _ => Err(ParseVariantError::new("game type", s)),
        }
    }
}
