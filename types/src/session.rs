use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::ParseVariantError;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Active,
    Completed,
    Abandoned,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot move a {from} session to {to}")]
pub struct TransitionError {
    pub from: SessionStatus,
    pub to: SessionStatus,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, SessionStatus::Active)
    }

    /// Only an active session may move, and only into a terminal state.
    pub fn transition(self, to: SessionStatus) -> Result<SessionStatus, TransitionError> {
        match (self, to) {
            (SessionStatus::Active, to) if to.is_terminal() => Ok(to),
            (from, to) => Err(TransitionError { from, to }),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Active => "ACTIVE",
            SessionStatus::Completed => "COMPLETED",
            SessionStatus::Abandoned => "ABANDONED",
            SessionStatus::Expired => "EXPIRED",
        }
    }
}

impl Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ACTIVE" => Ok(SessionStatus::Active),
            "COMPLETED" => Ok(SessionStatus::Completed),
            "ABANDONED" => Ok(SessionStatus::Abandoned),
            "EXPIRED" => Ok(SessionStatus::Expired),
            _ => Err(ParseVariantError::new("session status", s)),
        }
    }
}

pub fn is_stale(last_activity: DateTime<Utc>, now: DateTime<Utc>, window: Duration) -> bool {
    now - last_activity > window
}
