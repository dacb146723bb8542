use chrono::{DateTime, Utc};
use sqlx::{Row, SqliteConnection, SqlitePool};
use types::AchievementType;
use uuid::Uuid;

use super::{enum_column, uuid_column};
use crate::{AchievementRecord, DatabaseError};

#[derive(Clone)]
pub struct AchievementRepository {
    pool: SqlitePool,
}

impl AchievementRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Returns true only the first time a player unlocks `achievement`.
    pub async fn unlock(
        &self,
        player_id: Uuid,
        achievement: AchievementType,
        at: DateTime<Utc>,
    ) -> Result<bool, DatabaseError> {
        let mut conn = self.pool.acquire().await?;
        Self::unlock_in(&mut conn, player_id, achievement, at).await
    }

    pub async fn unlock_in(
        conn: &mut SqliteConnection,
        player_id: Uuid,
        achievement: AchievementType,
        at: DateTime<Utc>,
    ) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO achievements (player_id, achievement_type, unlocked_at) VALUES (?, ?, ?)",
        )
        .bind(player_id.to_string())
        .bind(achievement.as_str())
        .bind(at)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn for_player(&self, player_id: Uuid) -> Result<Vec<AchievementRecord>, DatabaseError> {
        let rows = sqlx::query(
            "SELECT id, player_id, achievement_type, unlocked_at FROM achievements
             WHERE player_id = ? ORDER BY id",
        )
        .bind(player_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<AchievementRecord, DatabaseError> {
                Ok(AchievementRecord {
                    id: row.try_get("id")?,
                    player_id: uuid_column(row, "player_id")?,
                    achievement_type: enum_column(row, "achievement_type")?,
                    unlocked_at: row.try_get("unlocked_at")?,
                })
            })
            .collect()
    }
}
