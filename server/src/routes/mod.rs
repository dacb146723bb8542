pub mod achievements;
pub mod config;
pub mod features;
pub mod games;
pub mod leaderboards;
pub mod players;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

use crate::AppState;

pub fn api() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/api/players", players::router())
        .nest("/api/games", games::router())
        .nest("/api/leaderboards", leaderboards::router())
        .nest("/api/achievements", achievements::router())
        .nest("/api/features", features::router())
        .nest("/api/config", config::router())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
