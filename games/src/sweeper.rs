use chrono::{DateTime, Duration, Utc};
use database::{SessionRepository, SqlitePool};
use tokio::task::JoinHandle;
use types::{is_stale, SessionStatus};

use crate::GameError;

/// Expires active sessions nobody has touched within the stale window.
#[derive(Clone)]
pub struct SessionSweeper {
    sessions: SessionRepository,
    stale_window: Duration,
}

impl SessionSweeper {
    pub fn new(pool: SqlitePool, stale_window: Duration) -> Self {
        Self {
            sessions: SessionRepository::new(pool),
            stale_window,
        }
    }

    /// Returns how many sessions were expired.
    pub async fn sweep_once(&self, now: DateTime<Utc>) -> Result<usize, GameError> {
        let mut expired = 0;
        for session in self.sessions.active().await? {
            if !is_stale(session.last_activity_at, now, self.stale_window) {
                continue;
            }
            // finish() only touches sessions still ACTIVE, so racing a submit is harmless
            if self
                .sessions
                .finish(session.id, SessionStatus::Expired, now)
                .await?
            {
                expired += 1;
            }
        }
        if expired > 0 {
            tracing::info!("Expired {expired} stale game sessions");
        }
        Ok(expired)
    }

    pub fn spawn(self, every: std::time::Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                if let Err(e) = self.sweep_once(Utc::now()).await {
                    tracing::warn!("Session sweep failed: {e}");
                }
            }
        })
    }
}
