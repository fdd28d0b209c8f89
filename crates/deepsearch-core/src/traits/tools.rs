//! Tool execution abstraction
//!
//! The orchestrator only sees tools through [`ToolExecutor`]; it never knows
//! which search backend answers a `searchWeb` call.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// Result type for tool operations
pub type ToolResult<T> = Result<T, ToolError>;

/// Tool execution errors
#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Tool call cancelled")]
    Cancelled,
}

impl ToolError {
    /// Message safe to hand to the model and the browser
    ///
    /// Provider details stay in the server log.
    pub fn public_message(&self) -> &'static str {
        match self {
            ToolError::NotFound(_) => "Unknown tool",
            ToolError::InvalidParameters(_) => "Invalid tool arguments",
            ToolError::ExecutionFailed(_) => "Search failed",
            ToolError::Cancelled => "Tool call cancelled",
        }
    }
}

/// Tool executor abstraction
///
/// Implementations must be Send + Sync; one executor is shared by every
/// request the server handles.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Execute a tool with JSON parameters
    async fn execute_tool(
        &self,
        name: &str,
        params: serde_json::Value,
        context: &ExecutionContext,
    ) -> ToolResult<serde_json::Value>;

    /// Tools advertised to the model
    fn list_tools(&self) -> Vec<ToolDefinition>;
}

/// Per-call context for tool invocations
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    /// Authenticated user the request runs for
    pub user_id: Option<String>,

    /// Model-assigned tool call id
    pub tool_call_id: Option<String>,

    /// Cancelled when the owning request goes away
    pub cancel: CancellationToken,
}

impl ExecutionContext {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            ..Default::default()
        }
    }

    /// Set the user ID
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Set the tool call ID
    pub fn with_tool_call(mut self, tool_call_id: impl Into<String>) -> Self {
        self.tool_call_id = Some(tool_call_id.into());
        self
    }
}

/// Tool definition metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name/identifier
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// Parameter schema (JSON Schema format)
    pub parameters: Option<serde_json::Value>,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: None,
        }
    }

    /// Set the parameters schema
    pub fn with_parameters(mut self, schema: serde_json::Value) -> Self {
        self.parameters = Some(schema);
        self
    }
}
