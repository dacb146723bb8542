use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Router,
};
use database::PlayerRecord;
use games::{ProfileUpdate, Registration};
use serde::Deserialize;
use types::Role;
use uuid::Uuid;

use crate::{
    error::ApiResult,
    extract::{Json, Path},
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct ActiveRequest {
    pub active: bool,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(register).get(list))
        .route("/login", post(login))
        .route("/:id", get(get_player).put(update).delete(delete))
        .route("/:id/role", put(change_role))
        .route("/:id/active", put(set_active))
}

async fn register(
    State(state): State<AppState>,
    Json(registration): Json<Registration>,
) -> ApiResult<(StatusCode, Json<PlayerRecord>)> {
    let player = state.services.players.register(registration).await?;
    Ok((StatusCode::CREATED, Json(player)))
}

async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<PlayerRecord>>> {
    Ok(Json(state.services.players.list().await?))
}

async fn get_player(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<PlayerRecord>> {
    Ok(Json(state.services.players.get(id).await?))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<ProfileUpdate>,
) -> ApiResult<Json<PlayerRecord>> {
    Ok(Json(state.services.players.update_profile(id, update).await?))
}

async fn delete(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    state.services.players.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<PlayerRecord>> {
    Ok(Json(
        state.services.players.login(&req.username, &req.password).await?,
    ))
}

async fn change_role(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<RoleRequest>,
) -> ApiResult<Json<PlayerRecord>> {
    Ok(Json(state.services.players.change_role(id, req.role).await?))
}

async fn set_active(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ActiveRequest>,
) -> ApiResult<Json<PlayerRecord>> {
    Ok(Json(state.services.players.set_active(id, req.active).await?))
}
