use database::{DatabaseError, Retryable};
use thiserror::Error;
use types::MAX_HINTS;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum GameError {
    #[error("Player not found: {0}")]
    PlayerNotFound(String),

    #[error("Game session not found: {0}")]
    GameSessionNotFound(Uuid),

    #[error("Player already exists: {0}")]
    DuplicatePlayer(String),

    #[error("Invalid game state: {0}")]
    InvalidGameState(String),

    #[error("All {MAX_HINTS} hints already used in session {0}")]
    MaxHintsExceeded(Uuid),

    #[error("Feature flag not found: {0}")]
    FeatureFlagNotFound(String),

    #[error("Feature flag already exists: {0}")]
    DuplicateFeatureFlag(String),

    #[error("Configuration not found: {0}")]
    ConfigurationNotFound(String),

    #[error("Content not found: {0}")]
    ContentNotFound(String),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error("Content library error: {0}")]
    ContentLoad(#[from] serde_yaml::Error),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<argon2::password_hash::Error> for GameError {
    fn from(err: argon2::password_hash::Error) -> Self {
        GameError::PasswordHash(err.to_string())
    }
}

impl Retryable for GameError {
    fn is_retryable(&self) -> bool {
        matches!(self, GameError::Database(err) if err.is_retryable())
    }

    fn exhausted(self, attempts: usize) -> Self {
        match self {
            GameError::Database(err) => GameError::Database(err.exhausted(attempts)),
            other => other,
        }
    }
}
