//! Web search settings

use serde::{Deserialize, Serialize};

use super::defaults;
use crate::credentials::{resolve_secret, SEARXNG_PASSWORD_ENV, SERPER_API_KEY_ENV};
use crate::error::{ConfigError, ConfigResult};

/// Supported search backends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchProviderType {
    #[default]
    Serper,
    Searxng,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub provider: SearchProviderType,
    /// Endpoint URL; Serper's public API when unset
    pub endpoint: Option<String>,
    /// Serper key fallback when `SERPER_API_KEY` is not set
    pub api_key: Option<String>,
    /// SearXNG basic-auth user
    pub username: Option<String>,
    /// SearXNG password fallback when `SEARXNG_PASSWORD` is not set
    pub password: Option<String>,
    /// Result cap per query, at most 10
    pub max_results: Option<usize>,
    pub timeout_secs: Option<u64>,
    /// Also emit each search hit as a source part
    pub sources_from_results: bool,
}

impl SearchConfig {
    pub fn search_endpoint(&self) -> String {
        self.endpoint.clone().unwrap_or_else(|| match self.provider {
            SearchProviderType::Serper => "https://google.serper.dev".to_string(),
            SearchProviderType::Searxng => "http://localhost:8888".to_string(),
        })
    }

    /// API key from `SERPER_API_KEY`, else from the file
    pub fn api_key(&self) -> Option<String> {
        resolve_secret(SERPER_API_KEY_ENV, self.api_key.as_deref()).map(|(key, _)| key)
    }

    pub fn require_api_key(&self) -> ConfigResult<String> {
        self.api_key().ok_or(ConfigError::MissingCredential {
            env_var: SERPER_API_KEY_ENV,
            field: "search.api_key",
        })
    }

    /// Password from `SEARXNG_PASSWORD`, else from the file
    pub fn password(&self) -> Option<String> {
        resolve_secret(SEARXNG_PASSWORD_ENV, self.password.as_deref()).map(|(key, _)| key)
    }

    pub fn max_results(&self) -> usize {
        self.max_results.unwrap_or(defaults::MAX_SEARCH_RESULTS)
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
            .unwrap_or(defaults::DEFAULT_SEARCH_TIMEOUT_SECS)
    }
}
