use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::{ConfigEntry, DatabaseError};

#[derive(Clone)]
pub struct ConfigRepository {
    pool: SqlitePool,
}

impl ConfigRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, key: &str) -> Result<Option<ConfigEntry>, DatabaseError> {
        let row = sqlx::query("SELECT key, value, description, updated_at FROM config_cache WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| -> Result<ConfigEntry, DatabaseError> {
            Ok(ConfigEntry {
                key: r.try_get("key")?,
                value: r.try_get("value")?,
                description: r.try_get("description")?,
                updated_at: r.try_get("updated_at")?,
            })
        })
        .transpose()
    }

    /// Inserts or replaces the value; an existing description is kept unless a new one is given.
    pub async fn upsert(
        &self,
        key: &str,
        value: &str,
        description: Option<&str>,
    ) -> Result<ConfigEntry, DatabaseError> {
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO config_cache (key, value, description, updated_at) VALUES (?, ?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                description = COALESCE(excluded.description, config_cache.description),
                updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(description)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get(key)
            .await?
            .ok_or_else(|| DatabaseError::Query(format!("config entry {key} vanished after upsert")))
    }
}
