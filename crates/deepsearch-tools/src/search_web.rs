//! The `searchWeb` tool
//!
//! Bridges a model-issued tool call to the configured search provider.
//! Arguments are validated against [`SearchWebParams`] and rejected when they
//! do not match, before any outbound request is made.

use std::sync::Arc;

use async_trait::async_trait;
use deepsearch_core::traits::{
    ExecutionContext, SearchError, ToolDefinition, ToolError, ToolExecutor, ToolResult,
    WebSearchProvider,
};
use deepsearch_core::SEARCH_WEB_TOOL;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

/// Fixed result cap for one `searchWeb` call
pub const SEARCH_WEB_MAX_RESULTS: usize = 10;

const DESCRIPTION: &str = "Search the web for up-to-date information";

/// Parameters for `searchWeb`
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SearchWebParams {
    /// The query to search the web for
    pub query: String,
}

/// Tool executor exposing `searchWeb`
pub struct SearchWebTool {
    provider: Arc<dyn WebSearchProvider>,
    max_results: usize,
}

impl SearchWebTool {
    pub fn new(provider: Arc<dyn WebSearchProvider>) -> Self {
        Self {
            provider,
            max_results: SEARCH_WEB_MAX_RESULTS,
        }
    }

    /// Lower the result cap; values outside `1..=10` are clamped
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results.clamp(1, SEARCH_WEB_MAX_RESULTS);
        self
    }

    /// JSON Schema for [`SearchWebParams`] as sent to the model
    pub fn parameters_schema() -> Value {
        let schema = schemars::schema_for!(SearchWebParams);
        let mut value = serde_json::to_value(schema).unwrap_or_default();
        if let Some(obj) = value.as_object_mut() {
            obj.remove("$schema");
            obj.remove("title");
        }
        value
    }

    pub fn definition() -> ToolDefinition {
        ToolDefinition::new(SEARCH_WEB_TOOL, DESCRIPTION).with_parameters(Self::parameters_schema())
    }

    fn parse_params(params: Value) -> ToolResult<SearchWebParams> {
        let params: SearchWebParams = serde_json::from_value(params)
            .map_err(|e| ToolError::InvalidParameters(e.to_string()))?;
        if params.query.trim().is_empty() {
            return Err(ToolError::InvalidParameters("query must not be empty".into()));
        }
        Ok(params)
    }
}

#[async_trait]
impl ToolExecutor for SearchWebTool {
    async fn execute_tool(
        &self,
        name: &str,
        params: Value,
        context: &ExecutionContext,
    ) -> ToolResult<Value> {
        if name != SEARCH_WEB_TOOL {
            return Err(ToolError::NotFound(name.to_string()));
        }
        let params = Self::parse_params(params)?;

        let results = self
            .provider
            .search(params.query.trim(), self.max_results, &context.cancel)
            .await
            .map_err(|e| match e {
                SearchError::Cancelled => ToolError::Cancelled,
                other => {
                    warn!(
                        provider = self.provider.name(),
                        tool_call_id = context.tool_call_id.as_deref().unwrap_or("-"),
                        error = %other,
                        "Web search failed"
                    );
                    ToolError::ExecutionFailed(other.to_string())
                }
            })?;

        info!(
            query = %params.query,
            result_count = results.len(),
            "Web search complete"
        );
        serde_json::to_value(results).map_err(|e| ToolError::ExecutionFailed(e.to_string()))
    }

    fn list_tools(&self) -> Vec<ToolDefinition> {
        vec![Self::definition()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deepsearch_core::test_support::{sample_results, FailingSearchProvider, StaticSearchProvider};
    use serde_json::json;
    use tokio_util::sync::CancellationToken;

    fn ctx() -> ExecutionContext {
        ExecutionContext::new(CancellationToken::new())
    }

    #[test]
    fn test_schema_declares_required_query() {
        let schema = SearchWebTool::parameters_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["query"]["type"], "string");
        assert_eq!(schema["required"], json!(["query"]));
        assert!(schema.get("$schema").is_none());
        assert!(schema.get("title").is_none());
    }

    #[tokio::test]
    async fn test_results_mapped_in_provider_order() {
        let provider = StaticSearchProvider::new(sample_results(3));
        let tool = SearchWebTool::new(Arc::new(provider.clone()));

        let result = tool
            .execute_tool("searchWeb", json!({ "query": "weather in Paris today" }), &ctx())
            .await
            .unwrap();

        assert_eq!(
            result[0],
            json!({ "title": "Result 1", "link": "https://example.com/1", "snippet": "Snippet 1" })
        );
        assert_eq!(result.as_array().unwrap().len(), 3);
        assert_eq!(provider.queries(), vec!["weather in Paris today".to_string()]);
    }

    #[tokio::test]
    async fn test_result_cap_is_ten() {
        let provider = StaticSearchProvider::new(sample_results(25));
        let tool = SearchWebTool::new(Arc::new(provider)).with_max_results(50);

        let result = tool
            .execute_tool("searchWeb", json!({ "query": "rust" }), &ctx())
            .await
            .unwrap();

        assert_eq!(result.as_array().unwrap().len(), 10);
    }

    #[tokio::test]
    async fn test_invalid_params_fail_closed() {
        let provider = StaticSearchProvider::new(sample_results(1));
        let tool = SearchWebTool::new(Arc::new(provider.clone()));

        for params in [
            json!({}),
            json!({ "query": 42 }),
            json!({ "query": "x", "extra": true }),
            json!({ "query": "   " }),
            json!("just a string"),
        ] {
            let err = tool.execute_tool("searchWeb", params, &ctx()).await.unwrap_err();
            assert!(matches!(err, ToolError::InvalidParameters(_)));
        }
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let tool = SearchWebTool::new(Arc::new(StaticSearchProvider::default()));
        let err = tool
            .execute_tool("fetchPage", json!({ "query": "x" }), &ctx())
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NotFound(name) if name == "fetchPage"));
    }

    #[tokio::test]
    async fn test_upstream_failure_becomes_execution_failure() {
        let provider = FailingSearchProvider::new(503);
        let tool = SearchWebTool::new(Arc::new(provider.clone()));

        let err = tool
            .execute_tool("searchWeb", json!({ "query": "x" }), &ctx())
            .await
            .unwrap_err();

        assert!(matches!(err, ToolError::ExecutionFailed(_)));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_context() {
        let tool = SearchWebTool::new(Arc::new(StaticSearchProvider::new(sample_results(1))));
        let token = CancellationToken::new();
        token.cancel();

        let err = tool
            .execute_tool("searchWeb", json!({ "query": "x" }), &ExecutionContext::new(token))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Cancelled));
    }

    #[test]
    fn test_list_tools() {
        let tool = SearchWebTool::new(Arc::new(StaticSearchProvider::default()));
        let tools = tool.list_tools();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "searchWeb");
    }
}
