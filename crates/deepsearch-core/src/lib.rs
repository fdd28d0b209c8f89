//! Core types and abstractions for deepsearch
//!
//! This crate owns the data model shared by every other crate:
//!
//! - [`conversation`]: the client-facing `Conversation` / `Message` / `MessagePart` model
//! - [`events`]: the `OutputEvent` stream produced by a chat turn
//! - [`traits`]: provider abstractions (LLM, web search, tools, sessions)
//! - [`stream`]: line framing for SSE / NDJSON bodies
//!
//! Implementations live in the provider crates; core never depends on them.

pub mod conversation;
pub mod events;
pub mod stream;
pub mod traits;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;

pub use conversation::{
    Conversation, InvocationState, Message, MessagePart, Role, SourceRef, ToolInvocation,
};
pub use events::{FinishReason, OutputEvent};
pub use stream::LineBuffer;
pub use traits::{
    ChatProvider, ExecutionContext, SearchResult, SessionResolver, ToolDefinition, ToolExecutor,
    WebSearchProvider,
};

/// Name of the single tool exposed to the model
pub const SEARCH_WEB_TOOL: &str = "searchWeb";
