//! Repository tests against an in-memory SQLite database with the real migrations.

use chrono::{Duration, Utc};
use database::{
    AchievementRepository, ConfigRepository, DatabaseConfig, DatabaseError,
    FeatureFlagRepository, GameSessionRecord, HintUsageRecord, LeaderboardRepository, NewPlayer,
    PlayerRecord, PlayerRepository, ScoreRecord, ScoreRepository, SessionRepository,
};
use itertools::Itertools;
use sqlx::SqlitePool;
use types::{AchievementType, Difficulty, GameType, Role, SessionStatus};
use uuid::Uuid;

async fn memory_pool() -> SqlitePool {
    DatabaseConfig::default().connect().await.unwrap()
}

async fn make_player(pool: &SqlitePool, name: &str) -> PlayerRecord {
    PlayerRepository::new(pool.clone())
        .insert(&NewPlayer {
            username: name.to_string(),
            email: format!("{name}@example.com"),
            password_hash: "hash".to_string(),
            role: Role::Player,
        })
        .await
        .expect("Failed to insert player")
}

fn score_for(player_id: Uuid, score: i64, hints_used: i64) -> ScoreRecord {
    ScoreRecord {
        id: None,
        player_id,
        game_type: GameType::Idiom,
        content_id: "idiom-001".to_string(),
        score,
        difficulty: Difficulty::Easy,
        time_taken_secs: 42,
        hints_used,
        accuracy: 1.0,
        correct: true,
        created_at: Utc::now(),
    }
}

fn session_for(player_id: Uuid) -> GameSessionRecord {
    let now = Utc::now();
    GameSessionRecord {
        id: Uuid::new_v4(),
        player_id,
        game_type: GameType::Sentence,
        difficulty: Difficulty::Medium,
        content_id: "sentence-001".to_string(),
        tiles: vec!["喝".to_string(), "我".to_string(), "茶".to_string()],
        hints_used: 0,
        status: SessionStatus::Active,
        started_at: now,
        last_activity_at: now,
        ended_at: None,
    }
}

#[tokio::test]
async fn test_player_round_trip_and_uniqueness() {
    let pool = memory_pool().await;
    let players = PlayerRepository::new(pool.clone());
    let alice = make_player(&pool, "alice").await;

    let fetched = players.get(alice.id).await.unwrap().expect("alice exists");
    assert_eq!(fetched.username, "alice");
    assert_eq!(fetched.role, Role::Player);
    assert!(fetched.active);
    assert_eq!(
        players.get_by_email("alice@example.com").await.unwrap().map(|p| p.id),
        Some(alice.id)
    );

    let duplicate = players
        .insert(&NewPlayer {
            username: "alice".to_string(),
            email: "other@example.com".to_string(),
            password_hash: "hash".to_string(),
            role: Role::Player,
        })
        .await;
    assert!(matches!(duplicate, Err(DatabaseError::UniqueViolation(_))));
}

#[tokio::test]
async fn test_player_updates() {
    let pool = memory_pool().await;
    let players = PlayerRepository::new(pool.clone());
    let bob = make_player(&pool, "bob").await;

    assert!(players.set_role(bob.id, Role::Admin).await.unwrap());
    assert!(players.set_active(bob.id, false).await.unwrap());
    assert!(players.record_login(bob.id, Utc::now()).await.unwrap());
    assert!(players.update_profile(bob.id, "bobby", "bobby@example.com").await.unwrap());

    let bob = players.get(bob.id).await.unwrap().unwrap();
    assert_eq!(bob.role, Role::Admin);
    assert!(!bob.active);
    assert!(bob.last_login.is_some());
    assert_eq!(bob.username, "bobby");

    assert!(!players.set_role(Uuid::new_v4(), Role::Admin).await.unwrap());
}

#[tokio::test]
async fn test_score_insert_and_history() {
    let pool = memory_pool().await;
    let scores = ScoreRepository::new(pool.clone());
    let player = make_player(&pool, "carol").await;

    for score in [100, 150, 0] {
        let mut record = score_for(player.id, score, 0);
        record.correct = score > 0;
        scores.insert(&record).await.unwrap();
    }

    let history = scores.by_player(GameType::Idiom, player.id, 2).await.unwrap();
    assert_eq!(history.iter().map(|s| s.score).collect_vec(), vec![0, 150]);
    assert_eq!(scores.count_correct(GameType::Idiom, player.id).await.unwrap(), 2);
    assert_eq!(scores.count_correct(GameType::Sentence, player.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_four_hints_rejected_by_check_constraint() {
    let pool = memory_pool().await;
    let scores = ScoreRepository::new(pool.clone());
    let player = make_player(&pool, "dave").await;

    let result = scores.insert(&score_for(player.id, 100, 4)).await;
    assert!(matches!(result, Err(DatabaseError::ConstraintViolation(_))));
}

#[tokio::test]
async fn test_negative_score_rejected_by_check_constraint() {
    let pool = memory_pool().await;
    let scores = ScoreRepository::new(pool.clone());
    let player = make_player(&pool, "erin").await;

    let result = scores.insert(&score_for(player.id, -5, 0)).await;
    assert!(matches!(result, Err(DatabaseError::ConstraintViolation(_))));
}

#[tokio::test]
async fn test_leaderboard_accumulates_and_ranks() {
    let pool = memory_pool().await;
    let board = LeaderboardRepository::new(pool.clone());
    let a = make_player(&pool, "a_player").await;
    let b = make_player(&pool, "b_player").await;
    let c = make_player(&pool, "c_player").await;
    let now = Utc::now();

    board.add_score(a.id, GameType::Idiom, Difficulty::Easy, 100, now).await.unwrap();
    board.add_score(b.id, GameType::Idiom, Difficulty::Easy, 300, now).await.unwrap();
    board.add_score(c.id, GameType::Idiom, Difficulty::Easy, 200, now).await.unwrap();
    let a_row = board
        .add_score(a.id, GameType::Idiom, Difficulty::Easy, 250, now + Duration::seconds(1))
        .await
        .unwrap();

    assert_eq!(a_row.total_score, 350);
    assert_eq!(a_row.games_played, 2);
    assert_eq!(a_row.best_score, 250);
    assert!((a_row.average_score - 175.0).abs() < f64::EPSILON);
    assert_eq!(a_row.rank, 1);

    let bucket = board.bucket(GameType::Idiom, Difficulty::Easy, 10).await.unwrap();
    assert_eq!(
        bucket.iter().map(|r| r.username.as_str()).collect_vec(),
        vec!["a_player", "b_player", "c_player"]
    );
    assert_eq!(bucket.iter().map(|r| r.rank).collect_vec(), vec![1, 2, 3]);
    let max = bucket.iter().map(|r| r.total_score).max().unwrap();
    assert_eq!(bucket[0].total_score, max);
}

#[tokio::test]
async fn test_leaderboard_buckets_are_independent() {
    let pool = memory_pool().await;
    let board = LeaderboardRepository::new(pool.clone());
    let player = make_player(&pool, "frank").await;
    let now = Utc::now();

    board.add_score(player.id, GameType::Idiom, Difficulty::Easy, 100, now).await.unwrap();
    board.add_score(player.id, GameType::Idiom, Difficulty::Hard, 600, now).await.unwrap();
    board.add_score(player.id, GameType::Sentence, Difficulty::Easy, 150, now).await.unwrap();

    let rows = board.for_player(player.id).await.unwrap();
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|r| r.rank == 1 && r.games_played == 1));
    assert!(board
        .bucket(GameType::Sentence, Difficulty::Hard, 10)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_achievement_unlocks_once() {
    let pool = memory_pool().await;
    let achievements = AchievementRepository::new(pool.clone());
    let player = make_player(&pool, "grace").await;

    assert!(achievements.unlock(player.id, AchievementType::FirstSteps, Utc::now()).await.unwrap());
    assert!(!achievements.unlock(player.id, AchievementType::FirstSteps, Utc::now()).await.unwrap());
    assert!(achievements.unlock(player.id, AchievementType::SpeedDemon, Utc::now()).await.unwrap());

    let unlocked = achievements.for_player(player.id).await.unwrap();
    assert_eq!(
        unlocked.iter().map(|a| a.achievement_type).collect_vec(),
        vec![AchievementType::FirstSteps, AchievementType::SpeedDemon]
    );
}

#[tokio::test]
async fn test_feature_flags_seeded_and_toggled() {
    let pool = memory_pool().await;
    let flags = FeatureFlagRepository::new(pool);

    let names = flags.list().await.unwrap().into_iter().map(|f| f.name).collect_vec();
    assert_eq!(names, vec!["hints", "idiom_game", "sentence_game"]);

    assert!(flags.set_enabled("hints", false).await.unwrap());
    assert!(!flags.get("hints").await.unwrap().unwrap().enabled);
    assert!(!flags.set_enabled("missing", true).await.unwrap());

    flags.insert("dark_mode", false, Some("UI theme")).await.unwrap();
    assert!(matches!(
        flags.insert("dark_mode", true, None).await,
        Err(DatabaseError::UniqueViolation(_))
    ));
}

#[tokio::test]
async fn test_config_upsert_keeps_description() {
    let pool = memory_pool().await;
    let config = ConfigRepository::new(pool);

    let seeded = config.get("session.stale_minutes").await.unwrap().unwrap();
    assert_eq!(seeded.value, "30");

    let updated = config.upsert("session.stale_minutes", "45", None).await.unwrap();
    assert_eq!(updated.value, "45");
    assert_eq!(updated.description, seeded.description);
    assert!(config.get("no.such.key").await.unwrap().is_none());
}

#[tokio::test]
async fn test_session_hints_and_finish() {
    let pool = memory_pool().await;
    let sessions = SessionRepository::new(pool.clone());
    let player = make_player(&pool, "heidi").await;
    let session = session_for(player.id);
    sessions.insert(&session).await.unwrap();

    let hint = HintUsageRecord {
        id: None,
        session_id: session.id,
        player_id: player.id,
        level: 1,
        penalty: 10,
        created_at: Utc::now(),
    };
    assert!(sessions.record_hint(&hint, 0).await.unwrap());
    // stale expected count
    assert!(!sessions.record_hint(&HintUsageRecord { level: 2, ..hint.clone() }, 0).await.unwrap());

    let stored = sessions.get(session.id).await.unwrap().unwrap();
    assert_eq!(stored.hints_used, 1);
    assert_eq!(stored.tiles, session.tiles);
    assert_eq!(sessions.hints(session.id).await.unwrap().len(), 1);

    assert!(sessions.finish(session.id, SessionStatus::Completed, Utc::now()).await.unwrap());
    assert!(!sessions.finish(session.id, SessionStatus::Abandoned, Utc::now()).await.unwrap());
    let stored = sessions.get(session.id).await.unwrap().unwrap();
    assert_eq!(stored.status, SessionStatus::Completed);
    assert!(stored.ended_at.is_some());
    assert!(sessions.active().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_close_returns_session_as_committed() {
    let pool = memory_pool().await;
    let sessions = SessionRepository::new(pool.clone());
    let player = make_player(&pool, "jade").await;
    let session = session_for(player.id);
    sessions.insert(&session).await.unwrap();
    let hint = HintUsageRecord {
        id: None,
        session_id: session.id,
        player_id: player.id,
        level: 1,
        penalty: 10,
        created_at: Utc::now(),
    };
    assert!(sessions.record_hint(&hint, 0).await.unwrap());

    let mut conn = pool.acquire().await.unwrap();
    let closed = SessionRepository::close_in(&mut conn, session.id, SessionStatus::Completed, Utc::now())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(closed.hints_used, 1);
    assert_eq!(closed.status, SessionStatus::Completed);
    assert!(SessionRepository::close_in(&mut conn, session.id, SessionStatus::Expired, Utc::now())
        .await
        .unwrap()
        .is_none());
    drop(conn);

    // a closed session takes no more hints
    let late = HintUsageRecord { level: 2, ..hint };
    assert!(!sessions.record_hint(&late, 1).await.unwrap());
    assert_eq!(sessions.hints(session.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_rolled_back_submission_leaves_nothing_behind() {
    let pool = memory_pool().await;
    let sessions = SessionRepository::new(pool.clone());
    let scores = ScoreRepository::new(pool.clone());
    let player = make_player(&pool, "kai").await;
    let session = session_for(player.id);
    sessions.insert(&session).await.unwrap();

    let mut tx = pool.begin().await.unwrap();
    SessionRepository::close_in(&mut tx, session.id, SessionStatus::Completed, Utc::now())
        .await
        .unwrap()
        .unwrap();
    ScoreRepository::insert_in(&mut tx, &score_for(player.id, 120, 0))
        .await
        .unwrap();
    LeaderboardRepository::add_score_in(&mut tx, player.id, GameType::Idiom, Difficulty::Easy, 120, Utc::now())
        .await
        .unwrap();
    assert!(AchievementRepository::unlock_in(&mut tx, player.id, AchievementType::FirstSteps, Utc::now())
        .await
        .unwrap());
    tx.rollback().await.unwrap();

    let stored = sessions.get(session.id).await.unwrap().unwrap();
    assert_eq!(stored.status, SessionStatus::Active);
    assert!(stored.ended_at.is_none());
    assert!(scores.by_player(GameType::Idiom, player.id, 10).await.unwrap().is_empty());
    assert!(LeaderboardRepository::new(pool.clone())
        .for_player(player.id)
        .await
        .unwrap()
        .is_empty());
    assert!(AchievementRepository::new(pool.clone())
        .for_player(player.id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_deleting_player_cascades() {
    let pool = memory_pool().await;
    let player = make_player(&pool, "ivan").await;
    let sessions = SessionRepository::new(pool.clone());
    let session = session_for(player.id);
    sessions.insert(&session).await.unwrap();
    ScoreRepository::new(pool.clone())
        .insert(&score_for(player.id, 100, 0))
        .await
        .unwrap();
    LeaderboardRepository::new(pool.clone())
        .add_score(player.id, GameType::Idiom, Difficulty::Easy, 100, Utc::now())
        .await
        .unwrap();

    assert!(PlayerRepository::new(pool.clone()).delete(player.id).await.unwrap());

    assert!(sessions.get(session.id).await.unwrap().is_none());
    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM idiom_scores")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(remaining, 0);
    assert!(LeaderboardRepository::new(pool)
        .for_player(player.id)
        .await
        .unwrap()
        .is_empty());
}
