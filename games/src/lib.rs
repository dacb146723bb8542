pub mod achievements;
pub mod cache;
pub mod config;
pub mod content;
pub mod error;
pub mod feature_flags;
pub mod game_service;
pub mod leaderboard;
pub mod players;
pub mod sweeper;

use std::{sync::Arc, time::Duration};

use database::SqlitePool;
use types::GameType;

pub use achievements::{AchievementInfo, AchievementService};
pub use cache::TtlCache;
pub use config::ConfigService;
pub use content::{ContentLibrary, Puzzle};
pub use error::GameError;
pub use feature_flags::FeatureFlagService;
pub use game_service::{GameDeps, GameService, RevealedHint, StartedGame, SubmissionResult};
pub use leaderboard::LeaderboardService;
pub use players::{PlayerService, ProfileUpdate, Registration};
pub use sweeper::SessionSweeper;

#[derive(Debug, Clone, Copy)]
pub struct ServiceSettings {
    pub cache_ttl: Duration,
    pub cache_max_entries: usize,
    pub stale_window: chrono::Duration,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(60),
            cache_max_entries: 256,
            stale_window: chrono::Duration::minutes(30),
        }
    }
}

/// Every service wired to one pool.
#[derive(Clone)]
pub struct Services {
    pub players: PlayerService,
    pub idiom: GameService,
    pub sentence: GameService,
    pub leaderboard: LeaderboardService,
    pub achievements: AchievementService,
    pub features: FeatureFlagService,
    pub config: ConfigService,
    pool: SqlitePool,
    stale_window: chrono::Duration,
}

impl Services {
    pub fn new(pool: SqlitePool, library: Arc<ContentLibrary>, settings: ServiceSettings) -> Self {
        let config = ConfigService::new(pool.clone(), settings.cache_ttl, settings.cache_max_entries);
        let features =
            FeatureFlagService::new(pool.clone(), settings.cache_ttl, settings.cache_max_entries);
        let leaderboard = LeaderboardService::new(pool.clone(), config.clone());
        let achievements = AchievementService::new(pool.clone());
        let deps = GameDeps {
            library,
            leaderboard: leaderboard.clone(),
            achievements: achievements.clone(),
            features: features.clone(),
            stale_window: settings.stale_window,
        };

        Self {
            players: PlayerService::new(pool.clone()),
            idiom: GameService::idiom(pool.clone(), deps.clone()),
            sentence: GameService::sentence(pool.clone(), deps),
            leaderboard,
            achievements,
            features,
            config,
            pool,
            stale_window: settings.stale_window,
        }
    }

    pub fn game(&self, game_type: GameType) -> &GameService {
        match game_type {
            GameType::Idiom => &self.idiom,
            GameType::Sentence => &self.sentence,
        }
    }

    pub fn sweeper(&self) -> SessionSweeper {
        SessionSweeper::new(self.pool.clone(), self.stale_window)
    }
}
