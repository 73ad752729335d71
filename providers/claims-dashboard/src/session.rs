use chrono::Utc;
use claims_analytics::ClaimsTable;
use claims_common::QaPair;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::auth::{AuthError, Session};

/// Everything one analyst session owns. Dropped with the session.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub session: Session,
    pub claims: Option<Arc<ClaimsTable>>,
    pub last_qa: Option<QaPair>,
    pub threshold: f64,
}

impl SessionState {
    pub fn new(session: Session, threshold: f64) -> Self {
        Self {
            session,
            claims: None,
            last_qa: None,
            threshold,
        }
    }
}

/// In-memory session store, the only state shared between requests
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, SessionState>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly authenticated session, pruning expired ones first
    pub async fn open(&self, session: Session, threshold: f64) {
        let mut sessions = self.sessions.write().await;
        prune_expired(&mut sessions);

        info!("Opened session for user: {}", session.username);
        sessions.insert(session.token.clone(), SessionState::new(session, threshold));
    }

    /// Snapshot of a live session. An expired session is removed and reported as such.
    pub async fn get(&self, token: &str) -> Result<SessionState, AuthError> {
        {
            let sessions = self.sessions.read().await;
            match sessions.get(token) {
                None => return Err(AuthError::InvalidToken),
                Some(state) if !state.session.is_expired() => return Ok(state.clone()),
                Some(_) => {}
            }
        }

        let mut sessions = self.sessions.write().await;
        sessions.remove(token);
        prune_expired(&mut sessions);
        Err(AuthError::Expired)
    }

    /// Apply `update` to a live session and return its result
    pub async fn update<F, R>(&self, token: &str, update: F) -> Result<R, AuthError>
    where
        F: FnOnce(&mut SessionState) -> R,
    {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(token) {
            None => Err(AuthError::InvalidToken),
            Some(state) if !state.session.is_expired() => Ok(update(state)),
            Some(_) => {
                sessions.remove(token);
                Err(AuthError::Expired)
            }
        }
    }

    /// Drop a session and everything it owns
    pub async fn close(&self, token: &str) -> bool {
        let removed = self.sessions.write().await.remove(token);
        if let Some(state) = &removed {
            info!("Closed session for user: {}", state.session.username);
        }
        removed.is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

fn prune_expired(sessions: &mut HashMap<String, SessionState>) {
    let now = Utc::now();
    let before = sessions.len();
    sessions.retain(|_, state| !state.session.is_expired_at(now));
    let pruned = before - sessions.len();
    if pruned > 0 {
        debug!("Pruned {} expired sessions", pruned);
    }
}
