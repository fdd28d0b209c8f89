//! Session lookup against an identity collaborator
//!
//! Token formats belong to the collaborator; this side only forwards what the
//! browser presented and gets back a user or nothing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Error, Debug, Clone)]
pub enum AuthError {
    /// The identity collaborator could not be reached or answered badly
    #[error("Session lookup failed: {0}")]
    Lookup(String),

    #[error("Invalid session response: {0}")]
    InvalidResponse(String),
}

/// Authenticated user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl User {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            email: None,
        }
    }
}

/// Session as reported by the identity collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user: User,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(user: User) -> Self {
        Self {
            user,
            expires: None,
        }
    }

    /// A session without an expiry never lapses
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.expires.map_or(true, |expires| expires > now)
    }
}

/// Credentials lifted from an incoming request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionCredentials {
    /// `Authorization: Bearer <token>`
    pub bearer: Option<String>,
    /// Raw `Cookie` header
    pub cookie: Option<String>,
}

impl SessionCredentials {
    pub fn is_empty(&self) -> bool {
        self.bearer.is_none() && self.cookie.is_none()
    }
}

/// Resolves request credentials to a session
#[async_trait]
pub trait SessionResolver: Send + Sync {
    /// `Ok(None)` means "no valid session", not an error
    async fn resolve(&self, credentials: &SessionCredentials) -> AuthResult<Option<Session>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_session_expiry() {
        let now = Utc::now();
        let mut session = Session::new(User::new("u1"));
        assert!(session.is_active_at(now));

        session.expires = Some(now - Duration::seconds(1));
        assert!(!session.is_active_at(now));

        session.expires = Some(now + Duration::hours(1));
        assert!(session.is_active_at(now));
    }

    #[test]
    fn test_user_wire_shape_omits_missing_fields() {
        let value = serde_json::to_value(User::new("u1")).unwrap();
        assert_eq!(value, serde_json::json!({ "id": "u1" }));
    }
}
