use chrono::{DateTime, Utc};
use database::{AchievementRecord, AchievementRepository, SqliteConnection, SqlitePool};
use serde::Serialize;
use types::{evaluate_achievements, AchievementContext, AchievementType};
use uuid::Uuid;

use crate::GameError;

#[derive(Debug, Clone, Serialize)]
pub struct AchievementInfo {
    pub achievement_type: AchievementType,
    pub description: &'static str,
}

#[derive(Clone)]
pub struct AchievementService {
    pool: SqlitePool,
    achievements: AchievementRepository,
}

impl AchievementService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            achievements: AchievementRepository::new(pool.clone()),
            pool,
        }
    }

    /// Unlocks whatever `ctx` earns and returns only the achievements that
    /// were not already held.
    pub async fn check_and_unlock(
        &self,
        player_id: Uuid,
        ctx: &AchievementContext,
        at: DateTime<Utc>,
    ) -> Result<Vec<AchievementType>, GameError> {
        let mut conn = self.pool.acquire().await.map_err(database::DatabaseError::from)?;
        self.check_and_unlock_in(&mut conn, player_id, ctx, at).await
    }

    pub async fn check_and_unlock_in(
        &self,
        conn: &mut SqliteConnection,
        player_id: Uuid,
        ctx: &AchievementContext,
        at: DateTime<Utc>,
    ) -> Result<Vec<AchievementType>, GameError> {
        let mut unlocked = Vec::new();
        for achievement in evaluate_achievements(ctx) {
            if AchievementRepository::unlock_in(conn, player_id, achievement, at).await? {
                tracing::info!("Player {player_id} unlocked {achievement}");
                unlocked.push(achievement);
            }
        }
        Ok(unlocked)
    }

    pub async fn for_player(&self, player_id: Uuid) -> Result<Vec<AchievementRecord>, GameError> {
        Ok(self.achievements.for_player(player_id).await?)
    }

    pub fn catalog(&self) -> Vec<AchievementInfo> {
        AchievementType::ALL
            .into_iter()
            .map(|achievement_type| AchievementInfo {
                achievement_type,
                description: achievement_type.description(),
            })
            .collect()
    }
}
