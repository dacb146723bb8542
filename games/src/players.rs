use std::sync::OnceLock;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use database::{DatabaseError, NewPlayer, PlayerRecord, PlayerRepository, SqlitePool};
use regex::Regex;
use serde::Deserialize;
use types::Role;
use uuid::Uuid;

use crate::GameError;

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
}

fn username_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_]{3,32}$").expect("Valid username regex"))
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("Valid email regex")
    })
}

fn validate_username(username: &str) -> Result<(), GameError> {
    if username_regex().is_match(username) {
        Ok(())
    } else {
        Err(GameError::Validation(format!(
            "username {username:?} must be 3-32 letters, digits or underscores"
        )))
    }
}

fn validate_email(email: &str) -> Result<(), GameError> {
    if email_regex().is_match(email) {
        Ok(())
    } else {
        Err(GameError::Validation(format!("{email:?} is not an email address")))
    }
}

pub fn hash_password(password: &str) -> Result<String, GameError> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(err) => {
            tracing::warn!("Stored password hash is unreadable: {err}");
            false
        }
    }
}

#[derive(Clone)]
pub struct PlayerService {
    players: PlayerRepository,
}

impl PlayerService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            players: PlayerRepository::new(pool),
        }
    }

    pub async fn register(&self, registration: Registration) -> Result<PlayerRecord, GameError> {
        let username = registration.username.trim().to_string();
        let email = registration.email.trim().to_lowercase();
        validate_username(&username)?;
        validate_email(&email)?;
        if registration.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(GameError::Validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        self.ensure_available(&username, &email, None).await?;

        let new_player = NewPlayer {
            username,
            email,
            password_hash: hash_password(&registration.password)?,
            role: Role::Player,
        };
        let player = self
            .players
            .insert(&new_player)
            .await
            .map_err(|err| duplicate_or(err, &new_player.username))?;
        tracing::info!("Registered player {} ({})", player.username, player.id);
        Ok(player)
    }

    pub async fn get(&self, id: Uuid) -> Result<PlayerRecord, GameError> {
        self.players
            .get(id)
            .await?
            .ok_or_else(|| GameError::PlayerNotFound(id.to_string()))
    }

    pub async fn get_by_username(&self, username: &str) -> Result<PlayerRecord, GameError> {
        self.players
            .get_by_username(username)
            .await?
            .ok_or_else(|| GameError::PlayerNotFound(username.to_string()))
    }

    pub async fn list(&self) -> Result<Vec<PlayerRecord>, GameError> {
        Ok(self.players.list().await?)
    }

    pub async fn update_profile(
        &self,
        id: Uuid,
        update: ProfileUpdate,
    ) -> Result<PlayerRecord, GameError> {
        let current = self.get(id).await?;
        let username = update
            .username
            .map(|u| u.trim().to_string())
            .unwrap_or(current.username);
        let email = update
            .email
            .map(|e| e.trim().to_lowercase())
            .unwrap_or(current.email);
        validate_username(&username)?;
        validate_email(&email)?;
        self.ensure_available(&username, &email, Some(id)).await?;

        self.players
            .update_profile(id, &username, &email)
            .await
            .map_err(|err| duplicate_or(err, &username))?;
        self.get(id).await
    }

    pub async fn change_role(&self, id: Uuid, role: Role) -> Result<PlayerRecord, GameError> {
        if !self.players.set_role(id, role).await? {
            return Err(GameError::PlayerNotFound(id.to_string()));
        }
        tracing::info!("Player {id} is now {role}");
        self.get(id).await
    }

    pub async fn set_active(&self, id: Uuid, active: bool) -> Result<PlayerRecord, GameError> {
        if !self.players.set_active(id, active).await? {
            return Err(GameError::PlayerNotFound(id.to_string()));
        }
        self.get(id).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), GameError> {
        if !self.players.delete(id).await? {
            return Err(GameError::PlayerNotFound(id.to_string()));
        }
        tracing::info!("Deleted player {id}");
        Ok(())
    }

    /// Checks the password and stamps the login time. Unknown users,
    /// wrong passwords and deactivated accounts all fail the same way.
    pub async fn login(&self, username: &str, password: &str) -> Result<PlayerRecord, GameError> {
        let Some(player) = self.players.get_by_username(username.trim()).await? else {
            return Err(GameError::InvalidCredentials);
        };
        if !player.active || !verify_password(password, &player.password_hash) {
            return Err(GameError::InvalidCredentials);
        }
        let now = Utc::now();
        self.players.record_login(player.id, now).await?;
        Ok(PlayerRecord {
            last_login: Some(now),
            ..player
        })
    }

    async fn ensure_available(
        &self,
        username: &str,
        email: &str,
        except: Option<Uuid>,
    ) -> Result<(), GameError> {
        if let Some(existing) = self.players.get_by_username(username).await? {
            if Some(existing.id) != except {
                return Err(GameError::DuplicatePlayer(format!("username {username}")));
            }
        }
        if let Some(existing) = self.players.get_by_email(email).await? {
            if Some(existing.id) != except {
                return Err(GameError::DuplicatePlayer(format!("email {email}")));
            }
        }
        Ok(())
    }
}

/// A racing registration can still trip the unique index after our checks.
fn duplicate_or(err: DatabaseError, username: &str) -> GameError {
    match err {
        DatabaseError::UniqueViolation(_) => GameError::DuplicatePlayer(username.to_string()),
        other => GameError::Database(other),
    }
}
