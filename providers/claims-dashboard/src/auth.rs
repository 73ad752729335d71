use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

#[cfg(test)]
use mockall::automock;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("missing bearer token")]
    MissingToken,

    #[error("unknown session token")]
    InvalidToken,

    #[error("session expired")]
    Expired,
}

/// Authenticated session handle returned to the browser
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub username: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn issue(username: impl Into<String>, ttl: Duration) -> Self {
        let issued_at = Utc::now();
        Self {
            token: Uuid::new_v4().simple().to_string(),
            username: username.into(),
            issued_at,
            expires_at: issued_at + ttl,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Verifies credentials and opens sessions (for mocking in tests)
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn authenticate(&self, username: &str, password: &str) -> Result<Session, AuthError>;
}

/// Single analyst account injected through configuration
pub struct ConfiguredCredentials {
    username: String,
    password: String,
    session_ttl: Duration,
}

impl ConfiguredCredentials {
    pub fn new(username: String, password: String, session_ttl: Duration) -> Self {
        Self {
            username,
            password,
            session_ttl,
        }
    }
}

#[async_trait]
impl AuthProvider for ConfiguredCredentials {
    async fn authenticate(&self, username: &str, password: &str) -> Result<Session, AuthError> {
        // Compare both fields fully so timing does not reveal which one failed
        let user_ok = constant_time_eq(username.as_bytes(), self.username.as_bytes());
        let pass_ok = constant_time_eq(password.as_bytes(), self.password.as_bytes());

        if !(user_ok & pass_ok) {
            warn!("Rejected login attempt for user: {}", username);
            return Err(AuthError::InvalidCredentials);
        }

        let session = Session::issue(username, self.session_ttl);
        info!(
            "Successfully authenticated user {} (expires {})",
            session.username, session.expires_at
        );
        Ok(session)
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    let mut diff = a.len() ^ b.len();
    for (i, byte) in a.iter().enumerate() {
        diff |= (byte ^ b.get(i % b.len().max(1)).copied().unwrap_or(0)) as usize;
    }
    diff == 0
}

/// Extract the token from an `Authorization: Bearer <token>` header value
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let value = header.ok_or(AuthError::MissingToken)?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(str::trim)
        .ok_or(AuthError::MissingToken)?;
    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(token)
}
