//! Server-side admin sessions.
//!
//! The cookie carries a random 64-character token; only its SHA-256 hash is
//! kept. Sessions live in memory and, when a database is configured, are
//! mirrored to `admin_sessions` so they survive restarts.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::distr::{Alphanumeric, SampleString};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use thiserror::Error;
use tokio::sync::RwLock;

use super::VerifiedIdentity;
use crate::db::models::SessionRow;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub uid: String,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

pub struct SessionStore {
    ttl: Duration,
    sessions: RwLock<HashMap<String, Session>>,
    pool: Option<Arc<PgPool>>,
}

fn generate_token() -> String {
    Alphanumeric.sample_string(&mut rand::rng(), 64)
}

fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

impl SessionStore {
    pub fn new(ttl: Duration, pool: Option<Arc<PgPool>>) -> Self {
        Self {
            ttl,
            sessions: RwLock::new(HashMap::new()),
            pool,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Start a session for a verified identity; returns the raw token for the cookie.
    pub async fn issue(&self, identity: &VerifiedIdentity) -> Result<(String, Session), SessionError> {
        let token = generate_token();
        let token_hash = hash_token(&token);
        let session = Session {
            uid: identity.uid.clone(),
            email: identity.email.clone(),
            expires_at: Utc::now() + chrono::Duration::seconds(self.ttl.as_secs() as i64),
        };

        if let Some(pool) = &self.pool {
            sqlx::query(
                r#"
                INSERT INTO admin_sessions (token_hash, uid, email, expires_at)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(&token_hash)
            .bind(&session.uid)
            .bind(&session.email)
            .bind(session.expires_at)
            .execute(pool.as_ref())
            .await?;
        }

        self.sessions
            .write()
            .await
            .insert(token_hash, session.clone());

        Ok((token, session))
    }

    pub async fn resolve(&self, token: &str) -> Result<Option<Session>, SessionError> {
        self.resolve_at(token, Utc::now()).await
    }

    /// Look up a live session. Expired sessions are dropped on sight.
    pub async fn resolve_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>, SessionError> {
        if token.is_empty() {
            return Ok(None);
        }
        let token_hash = hash_token(token);

        let cached = self.sessions.read().await.get(&token_hash).cloned();
        let session = match (cached, &self.pool) {
            (Some(session), _) => Some(session),
            (None, Some(pool)) => {
                let row = sqlx::query_as::<_, SessionRow>(
                    "SELECT uid, email, expires_at FROM admin_sessions WHERE token_hash = $1",
                )
                .bind(&token_hash)
                .fetch_optional(pool.as_ref())
                .await?;

                row.map(|row| Session {
                    uid: row.uid,
                    email: row.email,
                    expires_at: row.expires_at,
                })
            }
            (None, None) => None,
        };

        match session {
            Some(session) if session.is_expired_at(now) => {
                self.forget(&token_hash).await?;
                Ok(None)
            }
            Some(session) => {
                self.sessions
                    .write()
                    .await
                    .insert(token_hash, session.clone());
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    pub async fn revoke(&self, token: &str) -> Result<(), SessionError> {
        self.forget(&hash_token(token)).await
    }

    /// Delete the persisted row first; the cached entry only goes once that succeeds.
    async fn forget(&self, token_hash: &str) -> Result<(), SessionError> {
        if let Some(pool) = &self.pool {
            sqlx::query("DELETE FROM admin_sessions WHERE token_hash = $1")
                .bind(token_hash)
                .execute(pool.as_ref())
                .await?;
        }
        self.sessions.write().await.remove(token_hash);
        Ok(())
    }

    /// Drop every expired session; returns how many were removed from memory.
    pub async fn purge_expired(&self) -> Result<usize, SessionError> {
        let now = Utc::now();
        let removed = {
            let mut sessions = self.sessions.write().await;
            let before = sessions.len();
            sessions.retain(|_, s| !s.is_expired_at(now));
            before - sessions.len()
        };

        if let Some(pool) = &self.pool {
            sqlx::query("DELETE FROM admin_sessions WHERE expires_at <= now()")
                .execute(pool.as_ref())
                .await?;
        }
        Ok(removed)
    }
}
