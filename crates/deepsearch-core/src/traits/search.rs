//! Web search abstraction

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Normalized search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub snippet: String,
}

impl SearchResult {
    pub fn new(
        title: impl Into<String>,
        link: impl Into<String>,
        snippet: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            snippet: snippet.into(),
        }
    }
}

/// Errors that can occur during search operations
#[derive(Error, Debug, Clone)]
pub enum SearchError {
    /// Provider answered with a non-success status
    #[error("Search provider returned {status}: {body}")]
    Upstream { status: u16, body: String },

    /// Transport failure before a response arrived
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// Failed to parse search results from provider
    #[error("Failed to parse search results: {0}")]
    Parse(String),

    /// Search provider is not configured
    #[error("Search provider not configured: {0}")]
    NotConfigured(String),

    #[error("Search cancelled")]
    Cancelled,
}

impl SearchError {
    /// Upstream or transport failure, as opposed to local misconfiguration
    pub fn is_upstream(&self) -> bool {
        matches!(self, SearchError::Upstream { .. } | SearchError::Request(_))
    }
}

/// Trait for web search providers
///
/// One outbound call per invocation, no retries. Results come back in
/// provider order, truncated to `max_results`.
#[async_trait]
pub trait WebSearchProvider: Send + Sync {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<SearchResult>, SearchError>;

    /// Provider name for logging
    fn name(&self) -> &str;
}
