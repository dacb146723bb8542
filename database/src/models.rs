use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use types::{AchievementType, Difficulty, GameType, Role, SessionStatus, Tile, MAX_HINTS};
use uuid::Uuid;

use crate::DatabaseError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewPlayer {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// One submitted answer. Written once, never updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub id: Option<i64>,
    pub player_id: Uuid,
    pub game_type: GameType,
    pub content_id: String,
    pub score: i64,
    pub difficulty: Difficulty,
    pub time_taken_secs: i64,
    pub hints_used: i64,
    pub accuracy: f64,
    pub correct: bool,
    pub created_at: DateTime<Utc>,
}

impl ScoreRecord {
    pub fn validate(&self) -> Result<(), DatabaseError> {
        if self.score < 0 {
            return Err(DatabaseError::Validation(format!(
                "score must not be negative, got {}",
                self.score
            )));
        }
        if !(0..=i64::from(MAX_HINTS)).contains(&self.hints_used) {
            return Err(DatabaseError::Validation(format!(
                "hints used must be between 0 and {MAX_HINTS}, got {}",
                self.hints_used
            )));
        }
        if !(0.0..=1.0).contains(&self.accuracy) {
            return Err(DatabaseError::Validation(format!(
                "accuracy must be between 0 and 1, got {}",
                self.accuracy
            )));
        }
        if self.time_taken_secs < 0 {
            return Err(DatabaseError::Validation(format!(
                "time taken must not be negative, got {}",
                self.time_taken_secs
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardRecord {
    pub id: i64,
    pub player_id: Uuid,
    pub username: String,
    pub game_type: GameType,
    pub difficulty: Difficulty,
    pub total_score: i64,
    pub games_played: i64,
    pub average_score: f64,
    pub best_score: i64,
    pub rank: i64,
    #[serde(skip_serializing)]
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AchievementRecord {
    pub id: i64,
    pub player_id: Uuid,
    pub achievement_type: AchievementType,
    pub unlocked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureFlagRecord {
    pub name: String,
    pub enabled: bool,
    pub description: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSessionRecord {
    pub id: Uuid,
    pub player_id: Uuid,
    pub game_type: GameType,
    pub difficulty: Difficulty,
    pub content_id: String,
    /// Tiles in the scrambled order handed to the player.
    pub tiles: Vec<Tile>,
    pub hints_used: u8,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HintUsageRecord {
    pub id: Option<i64>,
    pub session_id: Uuid,
    pub player_id: Uuid,
    pub level: u8,
    pub penalty: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
    pub description: Option<String>,
    pub updated_at: DateTime<Utc>,
}
