//! Helpers for tests in this and downstream crates.

use sqlx::SqlitePool;

use crate::DatabaseConfig;

/// A fresh in-memory database with every migration applied.
pub async fn memory_pool() -> SqlitePool {
    DatabaseConfig::default()
        .connect()
        .await
        .expect("Failed to create test database pool")
}

/// A migrated database in a new file under the temp dir, served by several
/// connections so transactions really do overlap.
pub async fn file_pool(connections: usize) -> SqlitePool {
    let path = std::env::temp_dir().join(format!("hanzi-test-{}.db", uuid::Uuid::new_v4()));
    DatabaseConfig::from_cli_or_env_or_yaml(Some(format!("sqlite://{}", path.display())), None)
        .with_pool_size(connections)
        .connect()
        .await
        .expect("Failed to create file-backed test database")
}
