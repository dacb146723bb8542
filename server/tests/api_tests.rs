use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use database::testing::memory_pool;
use games::{ContentLibrary, ServiceSettings, Services};
use serde_json::{json, Value};
use server::{router, AppState};
use tower::ServiceExt;

async fn test_app() -> Router {
    let services = Services::new(
        memory_pool().await,
        Arc::new(ContentLibrary::builtin().unwrap()),
        ServiceSettings::default(),
    );
    router(AppState::new(services))
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(match body {
            Some(body) => Body::from(body.to_string()),
            None => Body::empty(),
        })
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn register(app: &Router, username: &str) -> String {
    let (status, body) = call(
        app,
        Method::POST,
        "/api/players",
        Some(json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": "nihao-shijie",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

fn answer(game_type: types::GameType, content_id: &str) -> Vec<String> {
    ContentLibrary::builtin()
        .unwrap()
        .puzzle(game_type, content_id)
        .unwrap()
        .answer
}

#[tokio::test]
async fn test_health() {
    let app = test_app().await;
    let (status, body) = call(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_player_lifecycle() {
    let app = test_app().await;
    let id = register(&app, "xiaolong").await;

    let (status, body) = call(&app, Method::GET, &format!("/api/players/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "xiaolong");
    assert_eq!(body["role"], "PLAYER");
    assert!(body.get("password_hash").is_none());

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/players",
        Some(json!({"username": "xiaolong", "email": "other@example.com", "password": "longenough"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], 409);
    assert!(body["timestamp"].is_string());

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/players/login",
        Some(json!({"username": "xiaolong", "password": "wrong-password"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = call(
        &app,
        Method::PUT,
        &format!("/api/players/{id}/role"),
        Some(json!({"role": "ADMIN"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "ADMIN");

    let (status, body) = call(
        &app,
        Method::PUT,
        &format!("/api/players/{id}"),
        Some(json!({"email": "new@example.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "new@example.com");

    let (status, _) = call(&app, Method::DELETE, &format!("/api/players/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body) = call(&app, Method::GET, &format!("/api/players/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not Found");
}

#[tokio::test]
async fn test_registration_validation() {
    let app = test_app().await;
    let (status, body) = call(
        &app,
        Method::POST,
        "/api/players",
        Some(json!({"username": "ab", "email": "not-an-email", "password": "short"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
}

#[tokio::test]
async fn test_game_round_over_http() {
    let app = test_app().await;
    let player = register(&app, "meimei").await;

    let (status, started) = call(
        &app,
        Method::POST,
        "/api/games/idiom/start",
        Some(json!({"player_id": player, "difficulty": "EASY"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(started["hints_remaining"], 3);
    let session = started["session_id"].as_str().unwrap().to_string();
    let content_id = started["content_id"].as_str().unwrap();

    let (status, hint) = call(
        &app,
        Method::POST,
        &format!("/api/games/idiom/sessions/{session}/hint"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(hint["level"], 1);
    assert_eq!(hint["penalty"], 10);

    let (status, result) = call(
        &app,
        Method::POST,
        &format!("/api/games/idiom/sessions/{session}/submit"),
        Some(json!({"tiles": answer(types::GameType::Idiom, content_id)})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["correct"], true);
    assert_eq!(result["leaderboard_rank"], 1);
    assert_eq!(result["breakdown"]["hint_penalty"], 10);

    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/api/games/idiom/sessions/{session}/abandon"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, history) = call(
        &app,
        Method::GET,
        &format!("/api/games/idiom/history/{player}?limit=5"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history.as_array().unwrap().len(), 1);

    let (status, board) = call(
        &app,
        Method::GET,
        "/api/leaderboards?game_type=idiom&difficulty=easy",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(board[0]["username"], "meimei");
    assert_eq!(board[0]["rank"], 1);

    let (status, achievements) = call(
        &app,
        Method::GET,
        &format!("/api/achievements/player/{player}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(achievements
        .as_array()
        .unwrap()
        .iter()
        .any(|a| a["achievement_type"] == "FIRST_STEPS"));
}

#[tokio::test]
async fn test_hints_run_out() {
    let app = test_app().await;
    let player = register(&app, "dawei").await;
    let (_, started) = call(
        &app,
        Method::POST,
        "/api/games/sentence/start",
        Some(json!({"player_id": player, "difficulty": "HARD"})),
    )
    .await;
    let session = started["session_id"].as_str().unwrap().to_string();
    let uri = format!("/api/games/sentence/sessions/{session}/hint");
    for _ in 0..3 {
        let (status, _) = call(&app, Method::POST, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, body) = call(&app, Method::POST, &uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Bad Request");
}

#[tokio::test]
async fn test_unknown_game_and_session() {
    let app = test_app().await;
    let player = register(&app, "lili").await;
    let (status, _) = call(
        &app,
        Method::POST,
        "/api/games/chess/start",
        Some(json!({"player_id": player, "difficulty": "EASY"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/api/games/idiom/sessions/{}/hint", uuid::Uuid::new_v4()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_feature_flags_and_config() {
    let app = test_app().await;
    let player = register(&app, "fang").await;

    let (status, flags) = call(&app, Method::GET, "/api/features", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(flags.as_array().unwrap().len(), 3);

    let (status, flag) = call(
        &app,
        Method::PUT,
        "/api/features/idiom_game",
        Some(json!({"enabled": false})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(flag["enabled"], false);

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/games/idiom/start",
        Some(json!({"player_id": player, "difficulty": "EASY"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/features",
        Some(json!({"name": "daily_challenge", "enabled": true, "description": "Daily puzzle"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = call(
        &app,
        Method::POST,
        "/api/features",
        Some(json!({"name": "daily_challenge"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = call(&app, Method::GET, "/api/features/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, entry) = call(
        &app,
        Method::PUT,
        "/api/config/leaderboard.default_limit",
        Some(json!({"value": "1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(entry["value"], "1");
    let (status, _) = call(&app, Method::GET, "/api/config/missing.key", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_leaderboard_rejects_unknown_bucket() {
    let app = test_app().await;
    let (status, _) = call(
        &app,
        Method::GET,
        "/api/leaderboards?game_type=idiom&difficulty=impossible",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, catalog) = call(&app, Method::GET, "/api/achievements", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(catalog.as_array().unwrap().len(), 7);
}

#[tokio::test]
async fn test_unparseable_requests_get_json_errors() {
    let app = test_app().await;

    // missing a required field
    let (status, body) = call(
        &app,
        Method::POST,
        "/api/players",
        Some(json!({"username": "xiaoming", "password": "nihao-shijie"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
    assert_eq!(body["error"], "Bad Request");
    assert!(body["message"].as_str().unwrap().contains("email"));

    let (status, body) = call(&app, Method::GET, "/api/players/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
    assert!(body["timestamp"].is_string());

    let player = register(&app, "xiaoming").await;
    let (status, body) = call(
        &app,
        Method::GET,
        &format!("/api/games/idiom/history/{player}?limit=lots"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
}

#[tokio::test]
async fn test_malformed_json_body_is_rejected() {
    let app = test_app().await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/players")
        .header("content-type", "application/json")
        .body(Body::from("{\"username\": "))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "Bad Request");
}

#[tokio::test]
async fn test_leaderboard_for_unknown_player_is_not_found() {
    let app = test_app().await;
    let (status, body) = call(
        &app,
        Method::GET,
        &format!("/api/leaderboards/player/{}", uuid::Uuid::new_v4()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], 404);

    let player = register(&app, "chen").await;
    let (status, body) = call(
        &app,
        Method::GET,
        &format!("/api/leaderboards/player/{player}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());
}
