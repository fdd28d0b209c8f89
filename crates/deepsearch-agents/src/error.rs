use std::time::Duration;

use deepsearch_core::traits::LlmError;
use thiserror::Error;

/// Result type for orchestration
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

/// Failures that end a chat turn
///
/// None of these cross the HTTP boundary verbatim; the transport logs them
/// and sends a generic message.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("model stream failed: {0}")]
    Model(#[from] LlmError),

    #[error("chat turn cancelled")]
    Cancelled,

    #[error("chat turn exceeded {0:?}")]
    Timeout(Duration),

    #[error("internal error: {0}")]
    Internal(String),
}
