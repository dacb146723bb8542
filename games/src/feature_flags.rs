use std::{sync::OnceLock, time::Duration};

use database::{DatabaseError, FeatureFlagRecord, FeatureFlagRepository, SqlitePool};
use regex::Regex;

use crate::{GameError, TtlCache};

pub const HINTS_FLAG: &str = "hints";

fn flag_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z0-9_.]{1,64}$").expect("Valid flag name regex"))
}

#[derive(Clone)]
pub struct FeatureFlagService {
    flags: FeatureFlagRepository,
    cache: TtlCache<String, Option<FeatureFlagRecord>>,
}

impl FeatureFlagService {
    pub fn new(pool: SqlitePool, cache_ttl: Duration, cache_max_entries: usize) -> Self {
        Self {
            flags: FeatureFlagRepository::new(pool),
            cache: TtlCache::new(cache_ttl, cache_max_entries),
        }
    }

    pub async fn list(&self) -> Result<Vec<FeatureFlagRecord>, GameError> {
        Ok(self.flags.list().await?)
    }

    pub async fn get(&self, name: &str) -> Result<FeatureFlagRecord, GameError> {
        self.lookup(name)
            .await?
            .ok_or_else(|| GameError::FeatureFlagNotFound(name.to_string()))
    }

    /// Flags nobody has created yet count as enabled.
    pub async fn is_enabled(&self, name: &str) -> Result<bool, GameError> {
        Ok(self.lookup(name).await?.map(|f| f.enabled).unwrap_or(true))
    }

    pub async fn set(&self, name: &str, enabled: bool) -> Result<FeatureFlagRecord, GameError> {
        let updated = self.flags.set_enabled(name, enabled).await?;
        self.cache.invalidate(&name.to_string());
        if !updated {
            return Err(GameError::FeatureFlagNotFound(name.to_string()));
        }
        tracing::info!("Feature flag {name} set to {enabled}");
        self.get(name).await
    }

    pub async fn create(
        &self,
        name: &str,
        enabled: bool,
        description: Option<&str>,
    ) -> Result<FeatureFlagRecord, GameError> {
        if !flag_name_regex().is_match(name) {
            return Err(GameError::Validation(format!(
                "flag name {name:?} must be lower-case letters, digits, '_' or '.'"
            )));
        }
        let flag = self
            .flags
            .insert(name, enabled, description)
            .await
            .map_err(|err| match err {
                DatabaseError::UniqueViolation(_) => GameError::DuplicateFeatureFlag(name.to_string()),
                other => GameError::Database(other),
            })?;
        self.cache.invalidate(&name.to_string());
        Ok(flag)
    }

    async fn lookup(&self, name: &str) -> Result<Option<FeatureFlagRecord>, GameError> {
        let key = name.to_string();
        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached);
        }
        let flag = self.flags.get(name).await?;
        self.cache.insert(key, flag.clone());
        Ok(flag)
    }
}
