use axum::{
    extract::State,
    routing::get,
    Router,
};
use database::LeaderboardRecord;
use games::GameError;
use serde::Deserialize;
use types::{Difficulty, GameType};
use uuid::Uuid;

use crate::{
    error::ApiResult,
    extract::{Json, Path, Query},
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct BucketQuery {
    pub game_type: String,
    pub difficulty: String,
    pub limit: Option<u32>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(top))
        .route("/player/:id", get(for_player))
}

/// Query values are matched case-insensitively, so `idiom` and `IDIOM` both work.
async fn top(
    State(state): State<AppState>,
    Query(query): Query<BucketQuery>,
) -> ApiResult<Json<Vec<LeaderboardRecord>>> {
    let game_type = query
        .game_type
        .parse::<GameType>()
        .map_err(|e| GameError::Validation(e.to_string()))?;
    let difficulty = query
        .difficulty
        .parse::<Difficulty>()
        .map_err(|e| GameError::Validation(e.to_string()))?;
    Ok(Json(
        state
            .services
            .leaderboard
            .top(game_type, difficulty, query.limit)
            .await?,
    ))
}

async fn for_player(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<LeaderboardRecord>>> {
    state.services.players.get(id).await?;
    Ok(Json(state.services.leaderboard.for_player(id).await?))
}
