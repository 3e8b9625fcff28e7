//! Identity provider seam.
//!
//! Session verification and user lookups go through [`IdentityProvider`] so the
//! HTTP layer does not care where users live. [`LocalIdentityProvider`] keeps
//! them in the same SQLite file as the forms.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use subtle::ConstantTimeEq;

use crate::db::Repository;
use crate::models::{DecodedSession, UserRecord};

/// Failures reported by an identity provider.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// Cookie is malformed, unknown, tampered with or expired
    #[error("invalid session cookie")]
    InvalidSession,
    #[error("no user record corresponding to uid {0}")]
    UserNotFound(String),
    /// The provider itself failed; detail is for logs only
    #[error("identity backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verify a `__session` cookie value and return who it belongs to.
    async fn verify_session_cookie(&self, cookie: &str) -> Result<DecodedSession, IdentityError>;

    /// Look up a user by uid.
    async fn get_user(&self, uid: &str) -> Result<UserRecord, IdentityError>;
}

/// SQLite-backed identity provider.
#[derive(Clone)]
pub struct LocalIdentityProvider {
    repo: Arc<Repository>,
}

impl LocalIdentityProvider {
    pub fn new(repo: Arc<Repository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    async fn verify_session_cookie(&self, cookie: &str) -> Result<DecodedSession, IdentityError> {
        let (id, secret) = split_cookie(cookie).ok_or(IdentityError::InvalidSession)?;

        let session = self
            .repo
            .get_session(id)
            .await
            .map_err(|e| IdentityError::Backend(e.message()))?
            .ok_or(IdentityError::InvalidSession)?;

        if !constant_time_compare(secret, &session.secret) {
            tracing::warn!(session_id = %session.id, "Session secret mismatch");
            return Err(IdentityError::InvalidSession);
        }

        if session.is_expired(Utc::now()) {
            tracing::debug!(session_id = %session.id, "Session expired");
            return Err(IdentityError::InvalidSession);
        }

        Ok(DecodedSession {
            session_id: session.id,
            uid: session.uid,
            expires_at: session.expires_at,
        })
    }

    async fn get_user(&self, uid: &str) -> Result<UserRecord, IdentityError> {
        self.repo
            .get_user(uid)
            .await
            .map_err(|e| IdentityError::Backend(e.message()))?
            .ok_or_else(|| IdentityError::UserNotFound(uid.to_string()))
    }
}

/// Split `<id>.<secret>`; both halves must be non-empty.
fn split_cookie(cookie: &str) -> Option<(&str, &str)> {
    let (id, secret) = cookie.trim().split_once('.')?;
    if id.is_empty() || secret.is_empty() {
        return None;
    }
    Some((id, secret))
}

/// Perform constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
