use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqliteConnection, SqlitePool};
use types::{assign_ranks, Difficulty, GameType, RankEntry};
use uuid::Uuid;

use super::{enum_column, uuid_column};
use crate::{DatabaseError, LeaderboardRecord};

const LEADERBOARD_SELECT: &str = "SELECT l.id, l.player_id, p.username, l.game_type, l.difficulty, l.total_score,
        l.games_played, l.average_score, l.best_score, l.rank, l.version, l.updated_at
     FROM leaderboard l JOIN players p ON p.id = l.player_id";

#[derive(Clone)]
pub struct LeaderboardRepository {
    pool: SqlitePool,
}

impl LeaderboardRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Adds one score to the player's row in its bucket, then renumbers the bucket.
    ///
    /// The row's `version` is checked on update; if another writer got there
    /// first this fails with [`DatabaseError::Conflict`] and nothing is written.
    pub async fn add_score(
        &self,
        player_id: Uuid,
        game_type: GameType,
        difficulty: Difficulty,
        score: i64,
        at: DateTime<Utc>,
    ) -> Result<LeaderboardRecord, DatabaseError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DatabaseError::Transaction(e.to_string()))?;
        let record = Self::add_score_in(&mut tx, player_id, game_type, difficulty, score, at).await?;
        // commit can hit a busy database, which callers may retry
        tx.commit().await?;
        Ok(record)
    }

    /// [`add_score`](Self::add_score) inside the caller's transaction. On error
    /// the caller must roll back, as earlier statements may have been applied.
    pub async fn add_score_in(
        conn: &mut SqliteConnection,
        player_id: Uuid,
        game_type: GameType,
        difficulty: Difficulty,
        score: i64,
        at: DateTime<Utc>,
    ) -> Result<LeaderboardRecord, DatabaseError> {
        let existing = sqlx::query(
            "SELECT total_score, games_played, best_score, version FROM leaderboard
             WHERE player_id = ? AND game_type = ? AND difficulty = ?",
        )
        .bind(player_id.to_string())
        .bind(game_type.as_str())
        .bind(difficulty.as_str())
        .fetch_optional(&mut *conn)
        .await?;

        match existing {
            None => {
                let bucket_size: i64 = sqlx::query_scalar(
                    "SELECT COUNT(*) FROM leaderboard WHERE game_type = ? AND difficulty = ?",
                )
                .bind(game_type.as_str())
                .bind(difficulty.as_str())
                .fetch_one(&mut *conn)
                .await?;

                sqlx::query(
                    "INSERT INTO leaderboard (player_id, game_type, difficulty, total_score, games_played,
                        average_score, best_score, rank, version, updated_at)
                     VALUES (?, ?, ?, ?, 1, ?, ?, ?, 0, ?)",
                )
                .bind(player_id.to_string())
                .bind(game_type.as_str())
                .bind(difficulty.as_str())
                .bind(score)
                .bind(score as f64)
                .bind(score)
                .bind(bucket_size + 1)
                .bind(at)
                .execute(&mut *conn)
                .await
                .map_err(|e| match DatabaseError::from(e) {
                    // someone inserted this row between our read and write
                    DatabaseError::UniqueViolation(msg) => DatabaseError::Conflict(msg),
                    other => other,
                })?;
            }
            Some(row) => {
                let total: i64 = row.try_get::<i64, _>("total_score")? + score;
                let games: i64 = row.try_get::<i64, _>("games_played")? + 1;
                let best: i64 = row.try_get::<i64, _>("best_score")?.max(score);
                let version: i64 = row.try_get("version")?;

                let updated = sqlx::query(
                    "UPDATE leaderboard SET total_score = ?, games_played = ?, average_score = ?,
                        best_score = ?, version = version + 1, updated_at = ?
                     WHERE player_id = ? AND game_type = ? AND difficulty = ? AND version = ?",
                )
                .bind(total)
                .bind(games)
                .bind(total as f64 / games as f64)
                .bind(best)
                .bind(at)
                .bind(player_id.to_string())
                .bind(game_type.as_str())
                .bind(difficulty.as_str())
                .bind(version)
                .execute(&mut *conn)
                .await?;

                if updated.rows_affected() != 1 {
                    return Err(DatabaseError::Conflict(format!(
                        "leaderboard row for {player_id} in {game_type}/{difficulty}"
                    )));
                }
            }
        }

        recompute_ranks(conn, game_type, difficulty).await?;

        let row = sqlx::query(&format!(
            "{LEADERBOARD_SELECT} WHERE l.player_id = ? AND l.game_type = ? AND l.difficulty = ?"
        ))
        .bind(player_id.to_string())
        .bind(game_type.as_str())
        .bind(difficulty.as_str())
        .fetch_optional(&mut *conn)
        .await?;
        row.as_ref()
            .map(leaderboard_from_row)
            .transpose()?
            .ok_or_else(|| DatabaseError::Query("leaderboard row missing after update".to_string()))
    }

    pub async fn get(
        &self,
        player_id: Uuid,
        game_type: GameType,
        difficulty: Difficulty,
    ) -> Result<Option<LeaderboardRecord>, DatabaseError> {
        let row = sqlx::query(&format!(
            "{LEADERBOARD_SELECT} WHERE l.player_id = ? AND l.game_type = ? AND l.difficulty = ?"
        ))
        .bind(player_id.to_string())
        .bind(game_type.as_str())
        .bind(difficulty.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(leaderboard_from_row).transpose()
    }

    /// The first `limit` rows of a bucket, best first.
    pub async fn bucket(
        &self,
        game_type: GameType,
        difficulty: Difficulty,
        limit: u32,
    ) -> Result<Vec<LeaderboardRecord>, DatabaseError> {
        let rows = sqlx::query(&format!(
            "{LEADERBOARD_SELECT} WHERE l.game_type = ? AND l.difficulty = ? ORDER BY l.rank LIMIT ?"
        ))
        .bind(game_type.as_str())
        .bind(difficulty.as_str())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(leaderboard_from_row).collect()
    }

    pub async fn for_player(&self, player_id: Uuid) -> Result<Vec<LeaderboardRecord>, DatabaseError> {
        let rows = sqlx::query(&format!(
            "{LEADERBOARD_SELECT} WHERE l.player_id = ? ORDER BY l.game_type, l.difficulty"
        ))
        .bind(player_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(leaderboard_from_row).collect()
    }
}

async fn recompute_ranks(
    conn: &mut SqliteConnection,
    game_type: GameType,
    difficulty: Difficulty,
) -> Result<(), DatabaseError> {
    let rows = sqlx::query(
        "SELECT player_id, total_score, updated_at, rank FROM leaderboard
         WHERE game_type = ? AND difficulty = ?",
    )
    .bind(game_type.as_str())
    .bind(difficulty.as_str())
    .fetch_all(&mut *conn)
    .await?;

    let mut entries = rows
        .iter()
        .map(|row| -> Result<RankEntry, DatabaseError> {
            let rank: i64 = row.try_get("rank")?;
            Ok(RankEntry {
                player_id: uuid_column(row, "player_id")?,
                total_score: row.try_get("total_score")?,
                updated_at: row.try_get("updated_at")?,
                rank: rank as u32,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    let previous: Vec<(Uuid, u32)> = entries.iter().map(|e| (e.player_id, e.rank)).collect();

    assign_ranks(&mut entries);

    for entry in &entries {
        let unchanged = previous
            .iter()
            .any(|(id, rank)| *id == entry.player_id && *rank == entry.rank);
        if unchanged {
            continue;
        }
        sqlx::query(
            "UPDATE leaderboard SET rank = ? WHERE player_id = ? AND game_type = ? AND difficulty = ?",
        )
        .bind(i64::from(entry.rank))
        .bind(entry.player_id.to_string())
        .bind(game_type.as_str())
        .bind(difficulty.as_str())
        .execute(&mut *conn)
        .await?;
    }
    tracing::debug!(
        "Ranked {} rows in {game_type}/{difficulty}",
        entries.len()
    );
    Ok(())
}

fn leaderboard_from_row(row: &SqliteRow) -> Result<LeaderboardRecord, DatabaseError> {
    Ok(LeaderboardRecord {
        id: row.try_get("id")?,
        player_id: uuid_column(row, "player_id")?,
        username: row.try_get("username")?,
        game_type: enum_column(row, "game_type")?,
        difficulty: enum_column(row, "difficulty")?,
        total_score: row.try_get("total_score")?,
        games_played: row.try_get("games_played")?,
        average_score: row.try_get("average_score")?,
        best_score: row.try_get("best_score")?,
        rank: row.try_get("rank")?,
        version: row.try_get("version")?,
        updated_at: row.try_get("updated_at")?,
    })
}
