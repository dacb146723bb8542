use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqliteConnection, SqlitePool};
use types::{GameType, SessionStatus};
use uuid::Uuid;

use super::{enum_column, uuid_column};
use crate::{DatabaseError, GameSessionRecord, HintUsageRecord};

const SESSION_COLUMNS: &str = "id, player_id, game_type, difficulty, content_id, tiles, hints_used, status, started_at, last_activity_at, ended_at";

#[derive(Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, session: &GameSessionRecord) -> Result<(), DatabaseError> {
        let tiles_json = serde_json::to_string(&session.tiles)?;
        sqlx::query(&format!(
            "INSERT INTO game_sessions ({SESSION_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(session.id.to_string())
        .bind(session.player_id.to_string())
        .bind(session.game_type.as_str())
        .bind(session.difficulty.as_str())
        .bind(&session.content_id)
        .bind(tiles_json)
        .bind(i64::from(session.hints_used))
        .bind(session.status.as_str())
        .bind(session.started_at)
        .bind(session.last_activity_at)
        .bind(session.ended_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<GameSessionRecord>, DatabaseError> {
        let row = sqlx::query(&format!(
            "SELECT {SESSION_COLUMNS} FROM game_sessions WHERE id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(session_from_row).transpose()
    }

    pub async fn active(&self) -> Result<Vec<GameSessionRecord>, DatabaseError> {
        let rows = sqlx::query(&format!(
            "SELECT {SESSION_COLUMNS} FROM game_sessions WHERE status = 'ACTIVE'"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(session_from_row).collect()
    }

    /// Content ids the player was most recently given in this game type, newest first.
    pub async fn recent_content(
        &self,
        player_id: Uuid,
        game_type: GameType,
        limit: u32,
    ) -> Result<Vec<String>, DatabaseError> {
        let ids = sqlx::query_scalar(
            "SELECT content_id FROM game_sessions WHERE player_id = ? AND game_type = ?
             ORDER BY rowid DESC LIMIT ?",
        )
        .bind(player_id.to_string())
        .bind(game_type.as_str())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    /// Stores a revealed hint and bumps the session's counter in one transaction.
    ///
    /// Returns false, writing nothing, if the session is no longer active or
    /// another hint was recorded since `expected_hints_used` was read.
    pub async fn record_hint(
        &self,
        hint: &HintUsageRecord,
        expected_hints_used: u8,
    ) -> Result<bool, DatabaseError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DatabaseError::Transaction(e.to_string()))?;

        let updated = sqlx::query(
            "UPDATE game_sessions SET hints_used = hints_used + 1, last_activity_at = ?
             WHERE id = ? AND status = 'ACTIVE' AND hints_used = ?",
        )
        .bind(hint.created_at)
        .bind(hint.session_id.to_string())
        .bind(i64::from(expected_hints_used))
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() != 1 {
            tx.rollback()
                .await
                .map_err(|e| DatabaseError::Transaction(e.to_string()))?;
            return Ok(false);
        }

        sqlx::query(
            "INSERT INTO hint_usage (session_id, player_id, level, penalty, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(hint.session_id.to_string())
        .bind(hint.player_id.to_string())
        .bind(i64::from(hint.level))
        .bind(hint.penalty)
        .bind(hint.created_at)
        .execute(&mut *tx)
        .await?;

        // commit can hit a busy database, which callers may retry
        tx.commit().await?;
        Ok(true)
    }

    pub async fn hints(&self, session_id: Uuid) -> Result<Vec<HintUsageRecord>, DatabaseError> {
        let rows = sqlx::query(
            "SELECT id, session_id, player_id, level, penalty, created_at FROM hint_usage
             WHERE session_id = ? ORDER BY level",
        )
        .bind(session_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<HintUsageRecord, DatabaseError> {
                let level: i64 = row.try_get("level")?;
                Ok(HintUsageRecord {
                    id: Some(row.try_get("id")?),
                    session_id: uuid_column(row, "session_id")?,
                    player_id: uuid_column(row, "player_id")?,
                    level: level as u8,
                    penalty: row.try_get("penalty")?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect()
    }

    /// Moves an active session into a terminal state. Returns false if it was
    /// already finished (or doesn't exist), leaving it untouched.
    pub async fn finish(
        &self,
        id: Uuid,
        status: SessionStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, DatabaseError> {
        let mut conn = self.pool.acquire().await?;
        Ok(Self::close_in(&mut conn, id, status, at).await?.is_some())
    }

    /// [`finish`](Self::finish) on the caller's connection. Returns the session
    /// as it was closed, so counters read from it cannot move afterwards.
    pub async fn close_in(
        conn: &mut SqliteConnection,
        id: Uuid,
        status: SessionStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<GameSessionRecord>, DatabaseError> {
        let row = sqlx::query(&format!(
            "UPDATE game_sessions SET status = ?, ended_at = ?, last_activity_at = ?
             WHERE id = ? AND status = 'ACTIVE'
             RETURNING {SESSION_COLUMNS}"
        ))
        .bind(status.as_str())
        .bind(at)
        .bind(at)
        .bind(id.to_string())
        .fetch_optional(&mut *conn)
        .await?;
        row.as_ref().map(session_from_row).transpose()
    }
}

fn session_from_row(row: &SqliteRow) -> Result<GameSessionRecord, DatabaseError> {
    let tiles: String = row.try_get("tiles")?;
    let hints_used: i64 = row.try_get("hints_used")?;
    Ok(GameSessionRecord {
        id: uuid_column(row, "id")?,
        player_id: uuid_column(row, "player_id")?,
        game_type: enum_column(row, "game_type")?,
        difficulty: enum_column(row, "difficulty")?,
        content_id: row.try_get("content_id")?,
        tiles: serde_json::from_str(&tiles)?,
        hints_used: hints_used as u8,
        status: enum_column(row, "status")?,
        started_at: row.try_get("started_at")?,
        last_activity_at: row.try_get("last_activity_at")?,
        ended_at: row.try_get("ended_at")?,
    })
}
