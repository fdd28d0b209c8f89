//! Provider abstractions
//!
//! Each external collaborator sits behind a trait so the orchestrator and the
//! transport can be exercised with scripted doubles.

pub mod llm;
pub mod search;
pub mod session;
pub mod tools;

pub use llm::{
    ChatCompletionChunk, ChatCompletionRequest, ChatMessageDelta, ChatProvider, FunctionCall,
    FunctionCallDelta, FunctionDefinition, LlmError, LlmMessage, LlmResult, LlmToolDefinition,
    MessageRole, ToolCall, ToolCallDelta,
};
pub use search::{SearchError, SearchResult, WebSearchProvider};
pub use session::{AuthError, AuthResult, Session, SessionCredentials, SessionResolver, User};
pub use tools::{ExecutionContext, ToolDefinition, ToolError, ToolExecutor, ToolResult};
