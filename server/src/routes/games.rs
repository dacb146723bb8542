use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Router,
};
use database::{GameSessionRecord, ScoreRecord};
use games::{GameService, RevealedHint, StartedGame, SubmissionResult};
use serde::Deserialize;
use types::{Difficulty, GameType, Tile};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    extract::{Json, Path, Query},
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct StartRequest {
    pub player_id: Uuid,
    pub difficulty: Difficulty,
}

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub tiles: Vec<Tile>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<u32>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:game/start", post(start))
        .route("/:game/sessions/:id", get(session))
        .route("/:game/sessions/:id/hint", post(hint))
        .route("/:game/sessions/:id/submit", post(submit))
        .route("/:game/sessions/:id/abandon", post(abandon))
        .route("/:game/history/:player_id", get(history))
}

/// Only `idiom` and `sentence` are routable game names.
fn game<'a>(state: &'a AppState, name: &str) -> Result<&'a GameService, ApiError> {
    let game_type = name
        .parse::<GameType>()
        .map_err(|_| ApiError::NotFound(format!("game {name}")))?;
    Ok(state.services.game(game_type))
}

async fn start(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(req): Json<StartRequest>,
) -> ApiResult<(StatusCode, Json<StartedGame>)> {
    let started = game(&state, &name)?
        .start_game(req.player_id, req.difficulty)
        .await?;
    Ok((StatusCode::CREATED, Json(started)))
}

async fn session(
    State(state): State<AppState>,
    Path((name, id)): Path<(String, Uuid)>,
) -> ApiResult<Json<GameSessionRecord>> {
    Ok(Json(game(&state, &name)?.session(id).await?))
}

async fn hint(
    State(state): State<AppState>,
    Path((name, id)): Path<(String, Uuid)>,
) -> ApiResult<Json<RevealedHint>> {
    Ok(Json(game(&state, &name)?.request_hint(id).await?))
}

async fn submit(
    State(state): State<AppState>,
    Path((name, id)): Path<(String, Uuid)>,
    Json(req): Json<SubmitRequest>,
) -> ApiResult<Json<SubmissionResult>> {
    Ok(Json(game(&state, &name)?.submit_answer(id, req.tiles).await?))
}

async fn abandon(
    State(state): State<AppState>,
    Path((name, id)): Path<(String, Uuid)>,
) -> ApiResult<Json<GameSessionRecord>> {
    Ok(Json(game(&state, &name)?.abandon(id).await?))
}

async fn history(
    State(state): State<AppState>,
    Path((name, player_id)): Path<(String, Uuid)>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<Vec<ScoreRecord>>> {
    Ok(Json(game(&state, &name)?.history(player_id, query.limit).await?))
}
