use sqlx::{sqlite::SqliteRow, Row, SqliteConnection, SqlitePool};
use types::GameType;
use uuid::Uuid;

use super::{enum_column, uuid_column};
use crate::{DatabaseError, ScoreRecord};

/// Score rows live in one table per game type with identical columns.
fn table(game_type: GameType) -> &'static str {
    match game_type {
        GameType::Idiom => "idiom_scores",
        GameType::Sentence => "sentence_scores",
    }
}

#[derive(Clone)]
pub struct ScoreRepository {
    pool: SqlitePool,
}

impl ScoreRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts the row as given. Range checks are left to the table's
    /// CHECK constraints; call [`ScoreRecord::validate`] first to fail earlier.
    pub async fn insert(&self, score: &ScoreRecord) -> Result<i64, DatabaseError> {
        let mut conn = self.pool.acquire().await?;
        Self::insert_in(&mut conn, score).await
    }

    pub async fn insert_in(
        conn: &mut SqliteConnection,
        score: &ScoreRecord,
    ) -> Result<i64, DatabaseError> {
        let result = sqlx::query(&format!(
            "INSERT INTO {} (player_id, content_id, score, difficulty, time_taken_secs, hints_used, accuracy, correct, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            table(score.game_type)
        ))
        .bind(score.player_id.to_string())
        .bind(&score.content_id)
        .bind(score.score)
        .bind(score.difficulty.as_str())
        .bind(score.time_taken_secs)
        .bind(score.hints_used)
        .bind(score.accuracy)
        .bind(score.correct)
        .bind(score.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Most recent first.
    pub async fn by_player(
        &self,
        game_type: GameType,
        player_id: Uuid,
        limit: u32,
    ) -> Result<Vec<ScoreRecord>, DatabaseError> {
        let rows = sqlx::query(&format!(
            "SELECT id, player_id, content_id, score, difficulty, time_taken_secs, hints_used, accuracy, correct, created_at
             FROM {} WHERE player_id = ? ORDER BY id DESC LIMIT ?",
            table(game_type)
        ))
        .bind(player_id.to_string())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| score_from_row(row, game_type))
            .collect()
    }

    pub async fn count_correct(
        &self,
        game_type: GameType,
        player_id: Uuid,
    ) -> Result<u32, DatabaseError> {
        let mut conn = self.pool.acquire().await?;
        Self::count_correct_in(&mut conn, game_type, player_id).await
    }

    pub async fn count_correct_in(
        conn: &mut SqliteConnection,
        game_type: GameType,
        player_id: Uuid,
    ) -> Result<u32, DatabaseError> {
        let count: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM {} WHERE player_id = ? AND correct = 1",
            table(game_type)
        ))
        .bind(player_id.to_string())
        .fetch_one(&mut *conn)
        .await?;
        Ok(count as u32)
    }
}

fn score_from_row(row: &SqliteRow, game_type: GameType) -> Result<ScoreRecord, DatabaseError> {
    Ok(ScoreRecord {
        id: Some(row.try_get("id")?),
        player_id: uuid_column(row, "player_id")?,
        game_type,
        content_id: row.try_get("content_id")?,
        score: row.try_get("score")?,
        difficulty: enum_column(row, "difficulty")?,
        time_taken_secs: row.try_get("time_taken_secs")?,
        hints_used: row.try_get("hints_used")?,
        accuracy: row.try_get("accuracy")?,
        correct: row.try_get("correct")?,
        created_at: row.try_get("created_at")?,
    })
}
