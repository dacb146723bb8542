use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use database::DatabaseError;
use games::GameError;
use serde_json::json;

#[derive(Debug)]
pub enum ApiError {
    Game(GameError),
    NotFound(String),
    /// The request could not be parsed: bad JSON, a malformed path segment
    /// or query string.
    BadRequest(String),
}

impl From<GameError> for ApiError {
    fn from(err: GameError) -> Self {
        ApiError::Game(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Game(err) => match err {
                GameError::PlayerNotFound(_)
                | GameError::GameSessionNotFound(_)
                | GameError::FeatureFlagNotFound(_)
                | GameError::ConfigurationNotFound(_)
                | GameError::ContentNotFound(_) => StatusCode::NOT_FOUND,
                GameError::DuplicatePlayer(_) | GameError::DuplicateFeatureFlag(_) => {
                    StatusCode::CONFLICT
                }
                GameError::InvalidGameState(_)
                | GameError::MaxHintsExceeded(_)
                | GameError::Validation(_) => StatusCode::BAD_REQUEST,
                GameError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                GameError::Database(DatabaseError::Busy(_) | DatabaseError::RetryExhausted(_)) => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                GameError::PasswordHash(_) | GameError::ContentLoad(_) | GameError::Database(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::NotFound(what) => format!("Not found: {what}"),
            ApiError::BadRequest(reason) => reason.clone(),
            ApiError::Game(err) if status == StatusCode::SERVICE_UNAVAILABLE => {
                tracing::warn!("Request gave up on a busy database: {err}");
                "Database is busy, try again shortly".to_string()
            }
            ApiError::Game(err) if status.is_server_error() => {
                tracing::error!("Request failed: {err}");
                "Internal server error".to_string()
            }
            ApiError::Game(err) => err.to_string(),
        };
        let body = json!({
            "status": status.as_u16(),
            "error": status.canonical_reason().unwrap_or("Error"),
            "message": message,
            "timestamp": Utc::now(),
        });
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from(GameError::PlayerNotFound("x".into())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::BadRequest("bad uuid".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(GameError::Database(DatabaseError::RetryExhausted("busy".into()))).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::from(GameError::Database(DatabaseError::Query("boom".into()))).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
