//! Web search provider implementations

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use deepsearch_config::{SearchConfig, SearchProviderType};
use deepsearch_core::traits::{SearchError, SearchResult, WebSearchProvider};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Largest `num` the search API accepts
const PROVIDER_MAX_RESULTS: usize = 10;

/// Upstream error bodies are cut to this many characters for logs
const ERROR_BODY_LIMIT: usize = 200;

/// HTTP client shared by the search providers
pub fn create_client(timeout_secs: u64) -> Client {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(concat!("deepsearch/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|e| {
            warn!("Falling back to default HTTP client: {}", e);
            Client::new()
        })
}

/// Create the configured search provider
pub fn create_search_provider(
    config: &SearchConfig,
) -> Result<Arc<dyn WebSearchProvider>, SearchError> {
    let client = create_client(config.timeout_secs());
    match config.provider {
        SearchProviderType::Serper => {
            let api_key = config
                .require_api_key()
                .map_err(|e| SearchError::NotConfigured(e.to_string()))?;
            Ok(Arc::new(SerperProvider::new(
                client,
                config.search_endpoint(),
                api_key,
            )))
        }
        SearchProviderType::Searxng => Ok(Arc::new(SearxngProvider::new(
            client,
            config.search_endpoint(),
            config.username.clone(),
            config.password(),
        ))),
    }
}

/// Race a request against cancellation
///
/// A token that is already cancelled wins before any request is sent.
async fn cancellable<F>(
    cancel: &CancellationToken,
    request: F,
) -> Result<Vec<SearchResult>, SearchError>
where
    F: std::future::Future<Output = Result<Vec<SearchResult>, SearchError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(SearchError::Cancelled),
        result = request => result,
    }
}

/// Turn a non-success response into `SearchError::Upstream`
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, SearchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body: String = response
        .text()
        .await
        .unwrap_or_default()
        .chars()
        .take(ERROR_BODY_LIMIT)
        .collect();
    Err(SearchError::Upstream {
        status: status.as_u16(),
        body,
    })
}

/// Serper (Google results) search provider
pub struct SerperProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

impl SerperProvider {
    /// Create a new Serper provider
    #[must_use]
    pub fn new(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    async fn send(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>, SearchError> {
        let num = max_results.min(PROVIDER_MAX_RESULTS);
        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .header("X-API-KEY", &self.api_key)
            .json(&json!({ "q": query, "num": num }))
            .send()
            .await
            .map_err(|e| SearchError::Request(e.to_string()))?;

        let response = check_status(response).await?;
        let body: SerperResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Parse(e.to_string()))?;

        Ok(body
            .organic
            .into_iter()
            .take(max_results)
            .map(|r| SearchResult {
                title: r.title,
                link: r.link,
                snippet: r.snippet.unwrap_or_default(),
            })
            .collect())
    }
}

#[async_trait]
impl WebSearchProvider for SerperProvider {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<SearchResult>, SearchError> {
        debug!(query, max_results, "Serper search");
        cancellable(cancel, self.send(query, max_results)).await
    }

    fn name(&self) -> &str {
        "serper"
    }
}

/// Serper JSON response structure
#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SerperOrganic>,
}

#[derive(Debug, Deserialize)]
struct SerperOrganic {
    title: String,
    link: String,
    snippet: Option<String>,
}

/// `SearXNG` search provider
pub struct SearxngProvider {
    client: Client,
    base_url: String,
    auth_user: Option<String>,
    auth_password: Option<String>,
}

impl SearxngProvider {
    /// Create a new `SearXNG` provider
    #[must_use]
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        auth_user: Option<String>,
        auth_password: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth_user,
            auth_password,
        }
    }

    async fn send(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>, SearchError> {
        let url = format!(
            "{}/search?q={}&format=json&pageno=1",
            self.base_url,
            urlencoding::encode(query)
        );

        let mut request = self.client.get(&url);

        // Add basic auth if configured
        if let Some(user) = &self.auth_user {
            request = request.basic_auth(user, self.auth_password.as_ref());
        }

        let response = request
            .send()
            .await
            .map_err(|e| SearchError::Request(e.to_string()))?;
        let response = check_status(response).await?;
        let body: SearxngResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Parse(e.to_string()))?;

        Ok(body
            .results
            .into_iter()
            .take(max_results)
            .map(|r| SearchResult {
                title: r.title,
                link: r.url,
                snippet: r.content.unwrap_or_default(),
            })
            .collect())
    }
}

#[async_trait]
impl WebSearchProvider for SearxngProvider {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<SearchResult>, SearchError> {
        debug!(query, max_results, "SearXNG search");
        cancellable(cancel, self.send(query, max_results)).await
    }

    fn name(&self) -> &str {
        "searxng"
    }
}

/// `SearXNG` JSON response structure
#[derive(Debug, Deserialize)]
struct SearxngResponse {
    #[serde(default)]
    results: Vec<SearxngResult>,
}

#[derive(Debug, Deserialize)]
struct SearxngResult {
    title: String,
    url: String,
    content: Option<String>,
}
