//! Credential resolution for provider secrets
//!
//! # Resolution Priority
//!
//! [`resolve_secret`] checks sources in this order:
//! 1. Environment variable (e.g., `OPENAI_API_KEY`)
//! 2. Config file value

use tracing::debug;

/// Model provider API key
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Serper search API key
pub const SERPER_API_KEY_ENV: &str = "SERPER_API_KEY";

/// SearXNG basic-auth password
pub const SEARXNG_PASSWORD_ENV: &str = "SEARXNG_PASSWORD";

/// Where a resolved secret came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    EnvVar,
    Config,
}

impl std::fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialSource::EnvVar => write!(f, "environment"),
            CredentialSource::Config => write!(f, "config file"),
        }
    }
}

/// Resolve a secret from the environment, falling back to the config value
///
/// Empty strings count as unset in both places.
pub fn resolve_secret(
    env_var: &str,
    config_value: Option<&str>,
) -> Option<(String, CredentialSource)> {
    if let Ok(value) = std::env::var(env_var) {
        if !value.is_empty() {
            debug!("Resolved {} from environment", env_var);
            return Some((value, CredentialSource::EnvVar));
        }
    }

    match config_value {
        Some(value) if !value.is_empty() => {
            debug!("Resolved {} fallback from config", env_var);
            Some((value.to_string(), CredentialSource::Config))
        }
        _ => None,
    }
}
