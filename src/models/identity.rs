//! Identity provider records: users and their sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user known to the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub uid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Custom `admin` claim
    pub admin: bool,
    pub created_at: String,
}

/// A stored session row. The cookie handed to the browser is `<id>.<secret>`.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub id: String,
    pub secret: String,
    pub uid: String,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn cookie_value(&self) -> String {
        format!("{}.{}", self.id, self.secret)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// The verified content of a session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedSession {
    pub session_id: String,
    pub uid: String,
    pub expires_at: DateTime<Utc>,
}
