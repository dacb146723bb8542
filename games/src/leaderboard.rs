use std::time::Duration;

use chrono::{DateTime, Utc};
use database::{
    retry_with_backoff, LeaderboardRecord, LeaderboardRepository, SqliteConnection, SqlitePool,
};
use types::{Difficulty, GameType};
use uuid::Uuid;

use crate::{config::LEADERBOARD_DEFAULT_LIMIT, ConfigService, GameError};

// enough for every other writer in a busy bucket to commit first
const RECORD_RETRIES: usize = 8;
const RECORD_RETRY_DELAY: Duration = Duration::from_millis(5);
const FALLBACK_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

#[derive(Clone)]
pub struct LeaderboardService {
    leaderboard: LeaderboardRepository,
    config: ConfigService,
}

impl LeaderboardService {
    pub fn new(pool: SqlitePool, config: ConfigService) -> Self {
        Self {
            leaderboard: LeaderboardRepository::new(pool),
            config,
        }
    }

    /// Folds one score into the player's bucket row and re-ranks the bucket.
    /// Lost optimistic-lock races and busy-database errors are retried a few
    /// times before giving up.
    pub async fn record(
        &self,
        player_id: Uuid,
        game_type: GameType,
        difficulty: Difficulty,
        score: u32,
        at: DateTime<Utc>,
    ) -> Result<LeaderboardRecord, GameError> {
        let repo = self.leaderboard.clone();
        let record = retry_with_backoff(
            move || {
                let repo = repo.clone();
                Box::pin(async move {
                    repo.add_score(player_id, game_type, difficulty, i64::from(score), at)
                        .await
                })
            },
            RECORD_RETRIES,
            RECORD_RETRY_DELAY,
        )
        .await?;
        tracing::debug!(
            "Player {player_id} now rank {} in {game_type}/{difficulty} with {} points",
            record.rank,
            record.total_score
        );
        Ok(record)
    }

    /// [`record`](Self::record) as part of the caller's transaction. Nothing
    /// is retried here; a failure should roll the whole transaction back.
    pub async fn record_in(
        &self,
        conn: &mut SqliteConnection,
        player_id: Uuid,
        game_type: GameType,
        difficulty: Difficulty,
        score: u32,
        at: DateTime<Utc>,
    ) -> Result<LeaderboardRecord, GameError> {
        Ok(LeaderboardRepository::add_score_in(
            conn,
            player_id,
            game_type,
            difficulty,
            i64::from(score),
            at,
        )
        .await?)
    }

    /// Best rows of one bucket. Without a limit the `leaderboard.default_limit`
    /// config entry is used; any limit is capped at [`MAX_LIMIT`].
    pub async fn top(
        &self,
        game_type: GameType,
        difficulty: Difficulty,
        limit: Option<u32>,
    ) -> Result<Vec<LeaderboardRecord>, GameError> {
        let limit = match limit {
            Some(limit) => limit,
            None => {
                self.config
                    .get_or(LEADERBOARD_DEFAULT_LIMIT, FALLBACK_LIMIT)
                    .await?
            }
        };
        if limit == 0 {
            return Err(GameError::Validation("limit must be at least 1".to_string()));
        }
        Ok(self
            .leaderboard
            .bucket(game_type, difficulty, limit.min(MAX_LIMIT))
            .await?)
    }

    pub async fn for_player(&self, player_id: Uuid) -> Result<Vec<LeaderboardRecord>, GameError> {
        Ok(self.leaderboard.for_player(player_id).await?)
    }
}
