//! Chat-completion providers
//!
//! Both providers stream: OpenAI-compatible endpoints speak SSE, Ollama
//! speaks NDJSON. Each is normalized to
//! [`ChatCompletionChunk`](deepsearch_core::traits::ChatCompletionChunk)s so
//! the orchestrator never sees a wire format.

pub mod chat;

pub use chat::{create_chat_provider, OllamaChatProvider, OpenAIChatProvider};
