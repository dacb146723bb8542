use std::{sync::Arc, time::Duration};

use anyhow::Context;
use clap::Parser;
use games::{config::SESSION_STALE_MINUTES, ConfigService, ContentLibrary, Services};
use server::{app, AppConfig, AppState, Cli};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .init();

    let config = AppConfig::load(Cli::parse())?;
    tracing::info!("config: {config:?}");

    let pool = config
        .database
        .connect()
        .await
        .context("connecting to the database")?;
    let library = match &config.content_path {
        Some(path) => ContentLibrary::from_path(path)?,
        None => ContentLibrary::builtin()?,
    };

    let mut settings = config.service_settings();
    // the stored setting wins over the file so admins can change it at runtime
    let stale_minutes = ConfigService::new(pool.clone(), settings.cache_ttl, settings.cache_max_entries)
        .get_or(SESSION_STALE_MINUTES, config.sessions.stale_minutes)
        .await?;
    settings.stale_window = chrono::Duration::minutes(stale_minutes);
    let services = Services::new(pool, Arc::new(library), settings);

    let sweeper = services
        .sweeper()
        .spawn(Duration::from_secs(config.sessions.sweep_interval_secs.max(1)));

    let app = app(AppState::new(services), &config.cors_origins);
    let listener = TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("binding {}", config.bind))?;
    tracing::info!("listening on http://{}", config.bind);
    axum::serve(listener, app).await?;

    sweeper.abort();
    Ok(())
}
