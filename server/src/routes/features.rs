use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Router,
};
use database::FeatureFlagRecord;
use serde::Deserialize;

use crate::{
    error::ApiResult,
    extract::{Json, Path},
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct CreateFlag {
    pub name: String,
    #[serde(default)]
    pub enabled: bool,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ToggleFlag {
    pub enabled: bool,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:name", get(get_flag).put(toggle))
}

async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<FeatureFlagRecord>>> {
    Ok(Json(state.services.features.list().await?))
}

async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateFlag>,
) -> ApiResult<(StatusCode, Json<FeatureFlagRecord>)> {
    let flag = state
        .services
        .features
        .create(&req.name, req.enabled, req.description.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(flag)))
}

async fn get_flag(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<FeatureFlagRecord>> {
    Ok(Json(state.services.features.get(&name).await?))
}

async fn toggle(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(req): Json<ToggleFlag>,
) -> ApiResult<Json<FeatureFlagRecord>> {
    Ok(Json(state.services.features.set(&name, req.enabled).await?))
}
