use std::{str::FromStr, time::Duration};

use serde::Deserialize;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::{retry_with_backoff, DatabaseError};

const DEFAULT_POOL_SIZE: usize = 20;
const CONNECT_RETRIES: usize = 3;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
}

fn default_pool_size() -> usize {
    DEFAULT_POOL_SIZE
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            pool_size: DEFAULT_POOL_SIZE,
        }
    }
}

impl DatabaseConfig {
    pub fn from_cli_or_env_or_yaml(cli_arg: Option<String>, yaml_config: Option<String>) -> Self {
        let url = if let Some(arg) = cli_arg {
            arg
        } else if let Ok(env) = std::env::var("DATABASE_URL") {
            env
        } else if let Some(yaml) = yaml_config {
            yaml
        } else {
            "sqlite::memory:".to_string()
        };

        Self {
            url,
            pool_size: DEFAULT_POOL_SIZE,
        }
    }

    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size.max(1);
        self
    }

    pub fn is_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }

    pub async fn create_pool(&self) -> Result<SqlitePool, DatabaseError> {
        let mut options = SqliteConnectOptions::from_str(&self.url)
            .map_err(|e| DatabaseError::Connection(e.to_string()))?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT);
        if !self.is_memory() {
            // readers don't block the single writer
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        // an in-memory database lives only as long as its connection
        let pool_options = if self.is_memory() {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(self.pool_size as u32)
        };

        pool_options
            .connect_with(options)
            .await
            .map_err(|e| DatabaseError::Connection(e.to_string()))
    }

    /// Opens the pool, retrying transient failures, and applies pending migrations.
    pub async fn connect(&self) -> Result<SqlitePool, DatabaseError> {
        let config = self.clone();
        let pool = retry_with_backoff(
            move || {
                let config = config.clone();
                Box::pin(async move { config.create_pool().await })
            },
            CONNECT_RETRIES,
            Duration::from_millis(200),
        )
        .await?;
        crate::run_migrations(&pool).await?;
        tracing::info!("Connected to {} and applied migrations", self.url);
        Ok(pool)
    }
}
