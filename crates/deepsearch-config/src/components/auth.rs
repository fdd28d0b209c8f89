//! Session authentication settings

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// How `/chat` callers are authenticated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// Bearer tokens listed in `[auth.tokens]`
    #[default]
    Tokens,
    /// Forward credentials to an external session endpoint
    Http,
}

/// User bound to a static token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub mode: AuthMode,
    /// token → user
    pub tokens: HashMap<String, AuthUser>,
    /// Session endpoint of the identity collaborator, for `mode = "http"`
    pub session_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl AuthConfig {
    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs.unwrap_or(10)
    }
}
