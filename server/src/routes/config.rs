use axum::{
    extract::State,
    routing::get,
    Router,
};
use database::ConfigEntry;
use serde::Deserialize;

use crate::{
    error::ApiResult,
    extract::{Json, Path},
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct SetConfig {
    pub value: String,
    pub description: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/:key", get(get_entry).put(set_entry))
}

async fn get_entry(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Json<ConfigEntry>> {
    Ok(Json(state.services.config.get(&key).await?))
}

async fn set_entry(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(req): Json<SetConfig>,
) -> ApiResult<Json<ConfigEntry>> {
    Ok(Json(
        state
            .services
            .config
            .set(&key, &req.value, req.description.as_deref())
            .await?,
    ))
}
