//! The idioms and sentences players are asked to put back in order.

use std::path::Path;

use itertools::Itertools;
use rand::{seq::SliceRandom, Rng};
use serde::Deserialize;
use types::{scramble::idiom_tiles, Difficulty, GameType, HintLevel, Tile};

use crate::GameError;

const BUILTIN_LIBRARY: &str = include_str!("../content/library.yaml");

#[derive(Debug, Clone, Deserialize)]
pub struct Idiom {
    pub id: String,
    pub characters: String,
    pub pinyin: String,
    pub meaning: String,
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Sentence {
    pub id: String,
    pub words: Vec<String>,
    pub pinyin: String,
    pub translation: String,
    pub difficulty: Difficulty,
}

/// One playable item, whichever game it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct Puzzle {
    pub id: String,
    pub game_type: GameType,
    pub difficulty: Difficulty,
    pub answer: Vec<Tile>,
    pub pinyin: String,
    pub meaning: String,
}

impl Puzzle {
    pub fn hint(&self, level: HintLevel) -> String {
        match level {
            HintLevel::First => self.meaning.clone(),
            HintLevel::Second => self.pinyin.clone(),
            HintLevel::Third => {
                let shown = (self.answer.len() / 2).max(1);
                let separator = match self.game_type {
                    GameType::Idiom => "",
                    GameType::Sentence => " ",
                };
                format!("Starts with: {}", self.answer.iter().take(shown).join(separator))
            }
        }
    }
}

impl From<&Idiom> for Puzzle {
    fn from(idiom: &Idiom) -> Self {
        Self {
            id: idiom.id.clone(),
            game_type: GameType::Idiom,
            difficulty: idiom.difficulty,
            answer: idiom_tiles(&idiom.characters),
            pinyin: idiom.pinyin.clone(),
            meaning: idiom.meaning.clone(),
        }
    }
}

impl From<&Sentence> for Puzzle {
    fn from(sentence: &Sentence) -> Self {
        Self {
            id: sentence.id.clone(),
            game_type: GameType::Sentence,
            difficulty: sentence.difficulty,
            answer: sentence.words.clone(),
            pinyin: sentence.pinyin.clone(),
            meaning: sentence.translation.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentLibrary {
    #[serde(default)]
    pub idioms: Vec<Idiom>,
    #[serde(default)]
    pub sentences: Vec<Sentence>,
}

impl ContentLibrary {
    pub fn builtin() -> Result<Self, GameError> {
        Self::from_yaml(BUILTIN_LIBRARY)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, GameError> {
        let library: ContentLibrary = serde_yaml::from_str(yaml)?;
        library.check()?;
        Ok(library)
    }

    pub fn from_path(path: &Path) -> Result<Self, GameError> {
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            GameError::Validation(format!("could not read {}: {e}", path.display()))
        })?;
        Self::from_yaml(&yaml)
    }

    fn check(&self) -> Result<(), GameError> {
        let all = self.all_puzzles();
        if let Some(dup) = all.iter().map(|p| &p.id).duplicates().next() {
            return Err(GameError::Validation(format!("duplicate content id {dup}")));
        }
        // a single distinct tile can't be scrambled out of order
        if let Some(short) = all.iter().find(|p| p.answer.iter().unique().count() < 2) {
            return Err(GameError::Validation(format!(
                "content {} needs at least two distinct tiles",
                short.id
            )));
        }
        Ok(())
    }

    fn all_puzzles(&self) -> Vec<Puzzle> {
        self.idioms
            .iter()
            .map(Puzzle::from)
            .chain(self.sentences.iter().map(Puzzle::from))
            .collect()
    }

    pub fn puzzle(&self, game_type: GameType, id: &str) -> Option<Puzzle> {
        match game_type {
            GameType::Idiom => self.idioms.iter().find(|i| i.id == id).map(Puzzle::from),
            GameType::Sentence => self.sentences.iter().find(|s| s.id == id).map(Puzzle::from),
        }
    }

    pub fn puzzles(&self, game_type: GameType, difficulty: Difficulty) -> Vec<Puzzle> {
        match game_type {
            GameType::Idiom => self
                .idioms
                .iter()
                .filter(|i| i.difficulty == difficulty)
                .map(Puzzle::from)
                .collect(),
            GameType::Sentence => self
                .sentences
                .iter()
                .filter(|s| s.difficulty == difficulty)
                .map(Puzzle::from)
                .collect(),
        }
    }

    /// A random puzzle of the tier, skipping ids in `avoid` unless nothing else is left.
    pub fn pick<R: Rng + ?Sized>(
        &self,
        game_type: GameType,
        difficulty: Difficulty,
        avoid: &[String],
        rng: &mut R,
    ) -> Option<Puzzle> {
        let candidates = self.puzzles(game_type, difficulty);
        let fresh = candidates
            .iter()
            .filter(|p| !avoid.contains(&p.id))
            .collect_vec();
        if fresh.is_empty() {
            candidates.choose(rng).cloned()
        } else {
            fresh.choose(rng).map(|p| (*p).clone())
        }
    }
}
