use std::{path::PathBuf, time::Duration};

use clap::Parser;
use database::DatabaseConfig;
use games::ServiceSettings;
use serde::Deserialize;

#[derive(Parser, Debug, Default)]
#[command(about = "Hanzi Quest HTTP server")]
pub struct Cli {
    /// Address to listen on, e.g. 0.0.0.0:8080.
    #[arg(long, env = "HANZI_BIND")]
    pub bind: Option<String>,
    #[arg(long)]
    pub database_url: Option<String>,
    /// YAML settings file.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_secs: u64,
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 60,
            max_entries: 256,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub stale_minutes: i64,
    pub sweep_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            stale_minutes: 30,
            sweep_interval_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub bind: String,
    pub database: DatabaseConfig,
    /// Empty means any origin.
    pub cors_origins: Vec<String>,
    pub cache: CacheConfig,
    pub sessions: SessionConfig,
    /// Replaces the built-in content library.
    pub content_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
            database: DatabaseConfig::default(),
            cors_origins: Vec::new(),
            cache: CacheConfig::default(),
            sessions: SessionConfig::default(),
            content_path: None,
        }
    }
}

impl AppConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// YAML file first, then CLI flags and env on top.
    pub fn load(cli: Cli) -> anyhow::Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::from_yaml(&std::fs::read_to_string(path)?)?,
            None => Self::default(),
        };
        if let Some(bind) = cli.bind {
            config.bind = bind;
        }
        let yaml_url = config.database.url.clone();
        config.database = DatabaseConfig::from_cli_or_env_or_yaml(cli.database_url, Some(yaml_url))
            .with_pool_size(config.database.pool_size);
        Ok(config)
    }

    pub fn service_settings(&self) -> ServiceSettings {
        ServiceSettings {
            cache_ttl: Duration::from_secs(self.cache.ttl_secs),
            cache_max_entries: self.cache.max_entries,
            stale_window: chrono::Duration::minutes(self.sessions.stale_minutes),
        }
    }
}
