//! Caller authentication
//!
//! Two resolvers: static bearer tokens from `[auth.tokens]`, and an HTTP
//! resolver that forwards the caller's `Cookie`/`Authorization` headers to an
//! external session endpoint. [`AuthenticatedUser`] runs before the request
//! body is read, so unauthenticated calls never reach the body parser.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode};
use chrono::{DateTime, Utc};
use deepsearch_config::{AuthConfig, AuthMode};
use deepsearch_core::traits::{AuthError, AuthResult, Session, SessionCredentials, SessionResolver, User};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::state::AppState;
use crate::{Result, WebError};

/// Build the resolver selected by `[auth] mode`
pub fn create_session_resolver(config: &AuthConfig) -> Result<Arc<dyn SessionResolver>> {
    match config.mode {
        AuthMode::Tokens => {
            if config.tokens.is_empty() {
                warn!("No auth tokens configured; every chat request will be rejected");
            }
            Ok(Arc::new(StaticTokenResolver::from_config(config)))
        }
        AuthMode::Http => {
            let url = config
                .session_url
                .clone()
                .ok_or_else(|| WebError::Config("auth.session_url is required for http mode".into()))?;
            let client = reqwest::Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs()))
                .build()
                .map_err(|e| WebError::Config(format!("session client: {e}")))?;
            Ok(Arc::new(HttpSessionResolver::new(client, url)))
        }
    }
}

/// Lift bearer token and cookie header from a request
pub fn credentials_from_headers(headers: &HeaderMap) -> SessionCredentials {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(String::from);
    let cookie = headers
        .get(COOKIE)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(String::from);
    SessionCredentials { bearer, cookie }
}

/// Resolve the request's session, treating lookup failures as "no session"
pub(crate) async fn resolve_user(
    resolver: &dyn SessionResolver,
    headers: &HeaderMap,
) -> Option<User> {
    let credentials = credentials_from_headers(headers);
    if credentials.is_empty() {
        return None;
    }
    match resolver.resolve(&credentials).await {
        Ok(Some(session)) if session.is_active_at(Utc::now()) => Some(session.user),
        Ok(Some(session)) => {
            debug!(user_id = %session.user.id, "Session expired");
            None
        }
        Ok(None) => None,
        Err(e) => {
            warn!(error = %e, "Session lookup failed");
            None
        }
    }
}

/// The authenticated caller of a request
///
/// Rejects with `401 Unauthorized` when no valid session is present.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = WebError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        resolve_user(state.sessions.as_ref(), &parts.headers)
            .await
            .map(AuthenticatedUser)
            .ok_or(WebError::Unauthorized)
    }
}

/// Bearer tokens mapped to users
#[derive(Debug, Clone, Default)]
pub struct StaticTokenResolver {
    tokens: HashMap<String, User>,
}

impl StaticTokenResolver {
    pub fn new(tokens: HashMap<String, User>) -> Self {
        Self { tokens }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        let tokens = config
            .tokens
            .iter()
            .map(|(token, user)| {
                (
                    token.clone(),
                    User {
                        id: user.id.clone(),
                        name: user.name.clone(),
                        email: user.email.clone(),
                    },
                )
            })
            .collect();
        Self { tokens }
    }

    /// Single token, for tests and local runs
    pub fn single(token: impl Into<String>, user: User) -> Self {
        Self::new(HashMap::from([(token.into(), user)]))
    }
}

#[async_trait]
impl SessionResolver for StaticTokenResolver {
    async fn resolve(&self, credentials: &SessionCredentials) -> AuthResult<Option<Session>> {
        Ok(credentials
            .bearer
            .as_ref()
            .and_then(|token| self.tokens.get(token))
            .cloned()
            .map(Session::new))
    }
}

/// Session lookup against an external identity endpoint
///
/// The endpoint answers `{ "user": {...}, "expires": "..." }` for a valid
/// session and `{}` (or `null`) otherwise.
#[derive(Debug, Clone)]
pub struct HttpSessionResolver {
    client: reqwest::Client,
    url: String,
}

impl HttpSessionResolver {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SessionBody {
    user: Option<SessionUser>,
    expires: Option<DateTime<Utc>>,
}

/// Identity endpoints often omit `id`; email or name stand in
#[derive(Debug, Deserialize)]
struct SessionUser {
    id: Option<String>,
    name: Option<String>,
    email: Option<String>,
}

#[async_trait]
impl SessionResolver for HttpSessionResolver {
    async fn resolve(&self, credentials: &SessionCredentials) -> AuthResult<Option<Session>> {
        let mut request = self.client.get(&self.url);
        if let Some(token) = &credentials.bearer {
            request = request.bearer_auth(token);
        }
        if let Some(cookie) = &credentials.cookie {
            request = request.header(COOKIE, cookie);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AuthError::Lookup(e.to_string()))?;

        let status = response.status();
        if matches!(
            status,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND
        ) {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(AuthError::Lookup(format!("session endpoint returned {status}")));
        }

        let body: Option<SessionBody> = response
            .json()
            .await
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))?;

        let Some(SessionBody {
            user: Some(user),
            expires,
        }) = body
        else {
            return Ok(None);
        };

        let Some(id) = user.id.clone().or_else(|| user.email.clone()).or_else(|| user.name.clone())
        else {
            return Err(AuthError::InvalidResponse("session user has no identity".into()));
        };

        Ok(Some(Session {
            user: User {
                id,
                name: user.name,
                email: user.email,
            },
            expires,
        }))
    }
}
