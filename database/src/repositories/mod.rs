pub mod achievements;
pub mod config_entries;
pub mod feature_flags;
pub mod leaderboard;
pub mod players;
pub mod scores;
pub mod sessions;

pub use achievements::AchievementRepository;
pub use config_entries::ConfigRepository;
pub use feature_flags::FeatureFlagRepository;
pub use leaderboard::LeaderboardRepository;
pub use players::PlayerRepository;
pub use scores::ScoreRepository;
pub use sessions::SessionRepository;

use std::str::FromStr;

use sqlx::{sqlite::SqliteRow, Row};
use uuid::Uuid;

use crate::DatabaseError;

pub(crate) fn uuid_column(row: &SqliteRow, column: &str) -> Result<Uuid, DatabaseError> {
    let raw: String = row.try_get(column)?;
    Ok(Uuid::parse_str(&raw)?)
}

/// Reads a TEXT column holding one of the upper-case enum names from `types`.
pub(crate) fn enum_column<T>(row: &SqliteRow, column: &str) -> Result<T, DatabaseError>
where
    T: FromStr<Err = types::ParseVariantError>,
{
    let raw: String = row.try_get(column)?;
    Ok(raw.parse()?)
}
