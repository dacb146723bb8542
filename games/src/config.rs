use std::{str::FromStr, time::Duration};

use database::{ConfigEntry, ConfigRepository, SqlitePool};

use crate::{GameError, TtlCache};

pub const LEADERBOARD_DEFAULT_LIMIT: &str = "leaderboard.default_limit";
pub const SESSION_STALE_MINUTES: &str = "session.stale_minutes";

/// Runtime settings stored in the `config_cache` table, read through a TTL cache.
#[derive(Clone)]
pub struct ConfigService {
    entries: ConfigRepository,
    cache: TtlCache<String, ConfigEntry>,
}

impl ConfigService {
    pub fn new(pool: SqlitePool, cache_ttl: Duration, cache_max_entries: usize) -> Self {
        Self {
            entries: ConfigRepository::new(pool),
            cache: TtlCache::new(cache_ttl, cache_max_entries),
        }
    }

    pub async fn get(&self, key: &str) -> Result<ConfigEntry, GameError> {
        let cache_key = key.to_string();
        if let Some(entry) = self.cache.get(&cache_key) {
            return Ok(entry);
        }
        let entry = self
            .entries
            .get(key)
            .await?
            .ok_or_else(|| GameError::ConfigurationNotFound(key.to_string()))?;
        self.cache.insert(cache_key, entry.clone());
        Ok(entry)
    }

    pub async fn get_parsed<T: FromStr>(&self, key: &str) -> Result<T, GameError> {
        let entry = self.get(key).await?;
        entry.value.trim().parse().map_err(|_| {
            GameError::Validation(format!("config {key} has unusable value {:?}", entry.value))
        })
    }

    /// Like [`ConfigService::get_parsed`] but falls back to `default` when the
    /// key is missing or malformed.
    pub async fn get_or<T: FromStr>(&self, key: &str, default: T) -> Result<T, GameError> {
        match self.get_parsed(key).await {
            Ok(value) => Ok(value),
            Err(GameError::ConfigurationNotFound(_)) | Err(GameError::Validation(_)) => Ok(default),
            Err(other) => Err(other),
        }
    }

    pub async fn set(
        &self,
        key: &str,
        value: &str,
        description: Option<&str>,
    ) -> Result<ConfigEntry, GameError> {
        if key.trim().is_empty() {
            return Err(GameError::Validation("config key must not be empty".to_string()));
        }
        let entry = self.entries.upsert(key, value, description).await?;
        self.cache.invalidate(&key.to_string());
        tracing::info!("Config {key} set to {value:?}");
        Ok(entry)
    }
}
