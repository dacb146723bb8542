use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use database::{
    retry_with_backoff, DatabaseError, GameSessionRecord, HintUsageRecord, PlayerRepository,
    ScoreRecord, ScoreRepository, SessionRepository, SqlitePool,
};
use rand::thread_rng;
use serde::Serialize;
use types::{
    accuracy, calculate_score, is_correct, is_stale, scramble_tiles, AchievementContext,
    AchievementType, Difficulty, GameType, HintLevel, ScoreBreakdown, ScoreInput, SessionStatus,
    Tile, MAX_HINTS,
};
use uuid::Uuid;

use crate::{
    feature_flags::HINTS_FLAG, AchievementService, ContentLibrary, FeatureFlagService, GameError,
    LeaderboardService, Puzzle,
};

const DEFAULT_HISTORY_LIMIT: u32 = 20;
const MAX_HISTORY_LIMIT: u32 = 100;
/// How many of the player's latest puzzles `start_game` tries not to repeat.
const RECENT_CONTENT_WINDOW: u32 = 1;
const WRITE_RETRIES: usize = 8;
const WRITE_RETRY_DELAY: std::time::Duration = std::time::Duration::from_millis(5);

#[derive(Debug, Clone, Serialize)]
pub struct StartedGame {
    pub session_id: Uuid,
    pub game_type: GameType,
    pub difficulty: Difficulty,
    pub content_id: String,
    pub tiles: Vec<Tile>,
    pub time_limit_secs: u32,
    pub base_points: u32,
    pub hints_remaining: u8,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RevealedHint {
    pub session_id: Uuid,
    pub level: u8,
    pub hint: String,
    pub penalty: u32,
    pub hints_remaining: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionResult {
    pub session_id: Uuid,
    pub correct: bool,
    pub accuracy: f64,
    pub time_taken_secs: u32,
    pub breakdown: ScoreBreakdown,
    pub correct_answer: Vec<Tile>,
    pub new_achievements: Vec<AchievementType>,
    pub leaderboard_rank: i64,
    pub score_id: i64,
}

/// One game mode. The idiom and sentence games differ only in their
/// [`GameType`], which picks the content, the feature flag and the score table.
#[derive(Clone)]
pub struct GameService {
    game_type: GameType,
    pool: SqlitePool,
    library: Arc<ContentLibrary>,
    players: PlayerRepository,
    sessions: SessionRepository,
    scores: ScoreRepository,
    leaderboard: LeaderboardService,
    achievements: AchievementService,
    features: FeatureFlagService,
    stale_window: Duration,
}

#[derive(Clone)]
pub struct GameDeps {
    pub library: Arc<ContentLibrary>,
    pub leaderboard: LeaderboardService,
    pub achievements: AchievementService,
    pub features: FeatureFlagService,
    pub stale_window: Duration,
}

impl GameService {
    pub fn new(game_type: GameType, pool: SqlitePool, deps: GameDeps) -> Self {
        Self {
            game_type,
            pool: pool.clone(),
            library: deps.library,
            players: PlayerRepository::new(pool.clone()),
            sessions: SessionRepository::new(pool.clone()),
            scores: ScoreRepository::new(pool),
            leaderboard: deps.leaderboard,
            achievements: deps.achievements,
            features: deps.features,
            stale_window: deps.stale_window,
        }
    }

    pub fn idiom(pool: SqlitePool, deps: GameDeps) -> Self {
        Self::new(GameType::Idiom, pool, deps)
    }

    pub fn sentence(pool: SqlitePool, deps: GameDeps) -> Self {
        Self::new(GameType::Sentence, pool, deps)
    }

    pub fn game_type(&self) -> GameType {
        self.game_type
    }

    pub async fn start_game(
        &self,
        player_id: Uuid,
        difficulty: Difficulty,
    ) -> Result<StartedGame, GameError> {
        if !self.features.is_enabled(self.game_type.feature_flag()).await? {
            return Err(GameError::InvalidGameState(format!(
                "{} game is currently disabled",
                self.game_type
            )));
        }
        let player = self
            .players
            .get(player_id)
            .await?
            .ok_or_else(|| GameError::PlayerNotFound(player_id.to_string()))?;
        if !player.active {
            return Err(GameError::InvalidGameState(format!(
                "player {} is deactivated",
                player.username
            )));
        }

        let recent = self
            .sessions
            .recent_content(player_id, self.game_type, RECENT_CONTENT_WINDOW)
            .await?;
        let (puzzle, tiles) = {
            let mut rng = thread_rng();
            let puzzle = self
                .library
                .pick(self.game_type, difficulty, &recent, &mut rng)
                .ok_or_else(|| {
                    GameError::ContentNotFound(format!("no {} content for {difficulty}", self.game_type))
                })?;
            let tiles = scramble_tiles(&puzzle.answer, &mut rng);
            (puzzle, tiles)
        };

        let now = Utc::now();
        let session = GameSessionRecord {
            id: Uuid::new_v4(),
            player_id,
            game_type: self.game_type,
            difficulty,
            content_id: puzzle.id.clone(),
            tiles,
            hints_used: 0,
            status: SessionStatus::Active,
            started_at: now,
            last_activity_at: now,
            ended_at: None,
        };
        self.sessions.insert(&session).await?;
        tracing::info!(
            "Player {} started {} session {} on {}",
            player.username,
            self.game_type,
            session.id,
            puzzle.id
        );

        Ok(StartedGame {
            session_id: session.id,
            game_type: self.game_type,
            difficulty,
            content_id: session.content_id,
            tiles: session.tiles,
            time_limit_secs: difficulty.time_limit_secs(),
            base_points: difficulty.base_points(),
            hints_remaining: MAX_HINTS,
            started_at: now,
        })
    }

    pub async fn session(&self, session_id: Uuid) -> Result<GameSessionRecord, GameError> {
        self.sessions
            .get(session_id)
            .await?
            .filter(|s| s.game_type == self.game_type)
            .ok_or(GameError::GameSessionNotFound(session_id))
    }

    pub async fn request_hint(&self, session_id: Uuid) -> Result<RevealedHint, GameError> {
        self.request_hint_at(session_id, Utc::now()).await
    }

    pub async fn request_hint_at(
        &self,
        session_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<RevealedHint, GameError> {
        if !self.features.is_enabled(HINTS_FLAG).await? {
            return Err(GameError::InvalidGameState("hints are currently disabled".to_string()));
        }
        let session = self.active_session(session_id, now).await?;
        let level = HintLevel::next_after(session.hints_used)
            .ok_or(GameError::MaxHintsExceeded(session_id))?;
        let puzzle = self
            .library
            .puzzle(self.game_type, &session.content_id)
            .ok_or_else(|| GameError::ContentNotFound(session.content_id.clone()))?;

        let usage = HintUsageRecord {
            id: None,
            session_id,
            player_id: session.player_id,
            level: level.number(),
            penalty: i64::from(level.penalty()),
            created_at: now,
        };
        let sessions = self.sessions.clone();
        let expected = session.hints_used;
        let recorded = retry_with_backoff(
            move || {
                let sessions = sessions.clone();
                let usage = usage.clone();
                Box::pin(async move { sessions.record_hint(&usage, expected).await })
            },
            WRITE_RETRIES,
            WRITE_RETRY_DELAY,
        )
        .await?;
        if !recorded {
            return Err(GameError::InvalidGameState(format!(
                "session {session_id} changed while revealing a hint"
            )));
        }
        tracing::debug!("Session {session_id} revealed hint level {}", level.number());

        Ok(RevealedHint {
            session_id,
            level: level.number(),
            hint: puzzle.hint(level),
            penalty: level.penalty(),
            hints_remaining: MAX_HINTS - level.number(),
        })
    }

    pub async fn submit_answer(
        &self,
        session_id: Uuid,
        submitted: Vec<Tile>,
    ) -> Result<SubmissionResult, GameError> {
        self.submit_answer_at(session_id, submitted, Utc::now()).await
    }

    pub async fn submit_answer_at(
        &self,
        session_id: Uuid,
        submitted: Vec<Tile>,
        now: DateTime<Utc>,
    ) -> Result<SubmissionResult, GameError> {
        let session = self.active_session(session_id, now).await?;
        let puzzle = self
            .library
            .puzzle(self.game_type, &session.content_id)
            .ok_or_else(|| GameError::ContentNotFound(session.content_id.clone()))?;
        if submitted.len() != puzzle.answer.len() {
            return Err(GameError::Validation(format!(
                "expected {} tiles, got {}",
                puzzle.answer.len(),
                submitted.len()
            )));
        }

        let trimmed = submitted.iter().map(|t| t.trim().to_string()).collect::<Vec<_>>();
        let service = self.clone();
        retry_with_backoff(
            move || {
                let service = service.clone();
                let puzzle = puzzle.clone();
                let trimmed = trimmed.clone();
                Box::pin(async move {
                    service
                        .commit_submission(session_id, &puzzle, &trimmed, now)
                        .await
                })
            },
            WRITE_RETRIES,
            WRITE_RETRY_DELAY,
        )
        .await
    }

    /// Closes the session and writes the score, the leaderboard row and any
    /// achievements in one transaction. Scoring reads the hint count from the
    /// close itself, so a hint racing the submission is either counted or refused.
    async fn commit_submission(
        &self,
        session_id: Uuid,
        puzzle: &Puzzle,
        submitted: &[Tile],
        now: DateTime<Utc>,
    ) -> Result<SubmissionResult, GameError> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::from)?;

        // Closing first makes a second submission fail instead of scoring twice.
        let session = SessionRepository::close_in(&mut tx, session_id, SessionStatus::Completed, now)
            .await?
            .ok_or_else(|| {
                GameError::InvalidGameState(format!("session {session_id} is no longer active"))
            })?;

        let elapsed_secs = u32::try_from((now - session.started_at).num_seconds().max(0))
            .unwrap_or(u32::MAX);
        let correct = is_correct(&puzzle.answer, submitted);
        let accuracy = accuracy(&puzzle.answer, submitted);
        let breakdown = calculate_score(ScoreInput {
            difficulty: session.difficulty,
            elapsed_secs,
            hints_used: session.hints_used,
            correct,
        })
        .map_err(|e| GameError::InvalidGameState(e.to_string()))?;

        let score = ScoreRecord {
            id: None,
            player_id: session.player_id,
            game_type: self.game_type,
            content_id: puzzle.id.clone(),
            score: i64::from(breakdown.total_score),
            difficulty: session.difficulty,
            time_taken_secs: i64::from(elapsed_secs),
            hints_used: i64::from(session.hints_used),
            accuracy,
            correct,
            created_at: now,
        };
        score.validate()?;
        let score_id = ScoreRepository::insert_in(&mut tx, &score).await?;

        let standing = self
            .leaderboard
            .record_in(
                &mut tx,
                session.player_id,
                self.game_type,
                session.difficulty,
                breakdown.total_score,
                now,
            )
            .await?;

        let new_achievements = if correct {
            let correct_games =
                ScoreRepository::count_correct_in(&mut tx, self.game_type, session.player_id)
                    .await?;
            let ctx = AchievementContext {
                game_type: self.game_type,
                difficulty: session.difficulty,
                correct,
                hints_used: session.hints_used,
                elapsed_secs,
                total_score: breakdown.total_score,
                correct_games,
            };
            self.achievements
                .check_and_unlock_in(&mut tx, session.player_id, &ctx, now)
                .await?
        } else {
            Vec::new()
        };

        tx.commit().await.map_err(DatabaseError::from)?;
        tracing::info!(
            "Session {session_id} submitted: correct={correct} score={} hints={} rank={}",
            breakdown.total_score,
            session.hints_used,
            standing.rank
        );

        Ok(SubmissionResult {
            session_id,
            correct,
            accuracy,
            time_taken_secs: elapsed_secs,
            breakdown,
            correct_answer: puzzle.answer.clone(),
            new_achievements,
            leaderboard_rank: standing.rank,
            score_id,
        })
    }

    pub async fn abandon(&self, session_id: Uuid) -> Result<GameSessionRecord, GameError> {
        let now = Utc::now();
        self.active_session(session_id, now).await?;
        if !self
            .sessions
            .finish(session_id, SessionStatus::Abandoned, now)
            .await?
        {
            return Err(GameError::InvalidGameState(format!(
                "session {session_id} is no longer active"
            )));
        }
        self.session(session_id).await
    }

    pub async fn history(
        &self,
        player_id: Uuid,
        limit: Option<u32>,
    ) -> Result<Vec<ScoreRecord>, GameError> {
        if self.players.get(player_id).await?.is_none() {
            return Err(GameError::PlayerNotFound(player_id.to_string()));
        }
        let limit = limit.unwrap_or(DEFAULT_HISTORY_LIMIT).clamp(1, MAX_HISTORY_LIMIT);
        Ok(self.scores.by_player(self.game_type, player_id, limit).await?)
    }

    /// Loads a session that can still be played. Sessions idle past the
    /// stale window are expired on the spot.
    async fn active_session(
        &self,
        session_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<GameSessionRecord, GameError> {
        let session = self.session(session_id).await?;
        if session.status != SessionStatus::Active {
            return Err(GameError::InvalidGameState(format!(
                "session {session_id} is {}",
                session.status
            )));
        }
        if is_stale(session.last_activity_at, now, self.stale_window) {
            self.sessions
                .finish(session_id, SessionStatus::Expired, now)
                .await?;
            return Err(GameError::InvalidGameState(format!(
                "session {session_id} expired after inactivity"
            )));
        }
        Ok(session)
    }
}
