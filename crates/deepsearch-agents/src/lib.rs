//! Chat orchestration
//!
//! [`ChatOrchestrator::run`] turns a conversation into a stream of
//! [`OutputEvent`](deepsearch_core::OutputEvent)s: model text as it arrives,
//! tool calls as they are issued and resolved, and one terminal `done`.
//! Failures end the stream with an [`OrchestratorError`] instead.

pub mod convert;
pub mod error;
pub mod orchestrator;
pub mod prompt;

pub use convert::conversation_to_messages;
pub use error::{OrchestratorError, OrchestratorResult};
pub use orchestrator::{ChatOrchestrator, DEFAULT_MAX_STEPS};
pub use prompt::DEFAULT_SYSTEM_PROMPT;
