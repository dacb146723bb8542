pub mod config;
pub mod error;
pub mod models;
pub mod repositories;
pub mod retry;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::DatabaseConfig;
pub use error::DatabaseError;
pub use models::{
    AchievementRecord, ConfigEntry, FeatureFlagRecord, GameSessionRecord, HintUsageRecord,
    LeaderboardRecord, NewPlayer, PlayerRecord, ScoreRecord,
};
pub use repositories::{
    AchievementRepository, ConfigRepository, FeatureFlagRepository, LeaderboardRepository,
    PlayerRepository, ScoreRepository, SessionRepository,
};
pub use retry::{retry_with_backoff, Retryable};

pub use sqlx::{SqliteConnection, SqlitePool};

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), DatabaseError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
