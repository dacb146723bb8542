use axum::{
    extract::State,
    routing::get,
    Router,
};
use database::AchievementRecord;
use games::AchievementInfo;
use uuid::Uuid;

use crate::{
    error::ApiResult,
    extract::{Json, Path},
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(catalog))
        .route("/player/:id", get(for_player))
}

async fn catalog(State(state): State<AppState>) -> Json<Vec<AchievementInfo>> {
    Json(state.services.achievements.catalog())
}

async fn for_player(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<AchievementRecord>>> {
    // unknown players get a 404 instead of an empty list
    state.services.players.get(id).await?;
    Ok(Json(state.services.achievements.for_player(id).await?))
}
