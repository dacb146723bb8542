use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use types::Role;
use uuid::Uuid;

use super::{enum_column, uuid_column};
use crate::{DatabaseError, NewPlayer, PlayerRecord};

const PLAYER_COLUMNS: &str =
    "id, username, email, password_hash, role, active, created_at, updated_at, last_login";

#[derive(Clone)]
pub struct PlayerRepository {
    pool: SqlitePool,
}

impl PlayerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, player: &NewPlayer) -> Result<PlayerRecord, DatabaseError> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO players (id, username, email, password_hash, role, active, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, 1, ?, ?)",
        )
        .bind(id.to_string())
        .bind(&player.username)
        .bind(&player.email)
        .bind(&player.password_hash)
        .bind(player.role.as_str())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        tracing::debug!("Inserted player {} ({id})", player.username);
        Ok(PlayerRecord {
            id,
            username: player.username.clone(),
            email: player.email.clone(),
            password_hash: player.password_hash.clone(),
            role: player.role,
            active: true,
            created_at: now,
            updated_at: now,
            last_login: None,
        })
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<PlayerRecord>, DatabaseError> {
        let row = sqlx::query(&format!("SELECT {PLAYER_COLUMNS} FROM players WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(player_from_row).transpose()
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<PlayerRecord>, DatabaseError> {
        let row = sqlx::query(&format!(
            "SELECT {PLAYER_COLUMNS} FROM players WHERE username = ?"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(player_from_row).transpose()
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<PlayerRecord>, DatabaseError> {
        let row = sqlx::query(&format!("SELECT {PLAYER_COLUMNS} FROM players WHERE email = ?"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(player_from_row).transpose()
    }

    pub async fn list(&self) -> Result<Vec<PlayerRecord>, DatabaseError> {
        let rows = sqlx::query(&format!(
            "SELECT {PLAYER_COLUMNS} FROM players ORDER BY username"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(player_from_row).collect()
    }

    /// Returns false when no player has this id.
    pub async fn update_profile(
        &self,
        id: Uuid,
        username: &str,
        email: &str,
    ) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE players SET username = ?, email = ?, updated_at = ? WHERE id = ?",
        )
        .bind(username)
        .bind(email)
        .bind(Utc::now())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn set_role(&self, id: Uuid, role: Role) -> Result<bool, DatabaseError> {
        let result = sqlx::query("UPDATE players SET role = ?, updated_at = ? WHERE id = ?")
            .bind(role.as_str())
            .bind(Utc::now())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn set_active(&self, id: Uuid, active: bool) -> Result<bool, DatabaseError> {
        let result = sqlx::query("UPDATE players SET active = ?, updated_at = ? WHERE id = ?")
            .bind(active)
            .bind(Utc::now())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, DatabaseError> {
        let result = sqlx::query("UPDATE players SET last_login = ? WHERE id = ?")
            .bind(at)
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Deletes the player and, through the foreign keys, everything they own.
    pub async fn delete(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM players WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}

fn player_from_row(row: &SqliteRow) -> Result<PlayerRecord, DatabaseError> {
    Ok(PlayerRecord {
        id: uuid_column(row, "id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        role: enum_column(row, "role")?,
        active: row.try_get("active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        last_login: row.try_get("last_login")?,
    })
}
