use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use crate::{DatabaseError, FeatureFlagRecord};

#[derive(Clone)]
pub struct FeatureFlagRepository {
    pool: SqlitePool,
}

impl FeatureFlagRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<FeatureFlagRecord>, DatabaseError> {
        let rows = sqlx::query("SELECT name, enabled, description, updated_at FROM feature_flags ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(flag_from_row).collect()
    }

    pub async fn get(&self, name: &str) -> Result<Option<FeatureFlagRecord>, DatabaseError> {
        let row = sqlx::query(
            "SELECT name, enabled, description, updated_at FROM feature_flags WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(flag_from_row).transpose()
    }

    pub async fn insert(
        &self,
        name: &str,
        enabled: bool,
        description: Option<&str>,
    ) -> Result<FeatureFlagRecord, DatabaseError> {
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO feature_flags (name, enabled, description, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(name)
        .bind(enabled)
        .bind(description)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(FeatureFlagRecord {
            name: name.to_string(),
            enabled,
            description: description.map(str::to_string),
            updated_at: now,
        })
    }

    /// Returns false when the flag doesn't exist.
    pub async fn set_enabled(&self, name: &str, enabled: bool) -> Result<bool, DatabaseError> {
        let result = sqlx::query("UPDATE feature_flags SET enabled = ?, updated_at = ? WHERE name = ?")
            .bind(enabled)
            .bind(Utc::now())
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}

fn flag_from_row(row: &SqliteRow) -> Result<FeatureFlagRecord, DatabaseError> {
    Ok(FeatureFlagRecord {
        name: row.try_get("name")?,
        enabled: row.try_get("enabled")?,
        description: row.try_get("description")?,
        updated_at: row.try_get("updated_at")?,
    })
}
