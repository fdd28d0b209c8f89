//! Output events produced by a chat turn and relayed to the browser via SSE

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::conversation::SourceRef;

/// Why a turn ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    /// The step budget ran out while the model still wanted tools
    StepLimit,
    Other,
}

impl FinishReason {
    /// Map a provider finish reason string
    pub fn from_provider(reason: Option<&str>) -> Self {
        match reason {
            Some("stop") | Some("end_turn") | None => FinishReason::Stop,
            Some("length") | Some("max_tokens") => FinishReason::Length,
            Some("tool_calls") | Some("function_call") => FinishReason::ToolCalls,
            Some(_) => FinishReason::Other,
        }
    }
}

/// Incremental output of one chat turn
///
/// A well-formed sequence ends with exactly one `Done` or `Error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum OutputEvent {
    /// A fragment of assistant text
    TextDelta { text: String },

    /// The model started emitting a tool call; arguments are incomplete
    #[serde(rename_all = "camelCase")]
    ToolCallStreamingStart {
        tool_call_id: String,
        tool_name: String,
    },

    /// A fragment of a tool call's JSON arguments
    #[serde(rename_all = "camelCase")]
    ToolCallDelta {
        tool_call_id: String,
        args_text_delta: String,
    },

    /// Tool call arguments are complete and the tool is about to run
    #[serde(rename_all = "camelCase")]
    ToolCallStart {
        tool_call_id: String,
        tool_name: String,
        args: Value,
    },

    /// Tool finished
    #[serde(rename_all = "camelCase")]
    ToolCallResult {
        tool_call_id: String,
        tool_name: String,
        result: Value,
        #[serde(default)]
        is_error: bool,
    },

    /// A cited source
    Source { source: SourceRef },

    /// Turn completed
    #[serde(rename_all = "camelCase")]
    Done {
        finish_reason: FinishReason,
        steps: u32,
    },

    /// Turn failed; the message is safe to show to users
    Error { message: String },
}

impl OutputEvent {
    pub fn error(message: impl Into<String>) -> Self {
        OutputEvent::Error {
            message: message.into(),
        }
    }

    /// SSE event name
    pub fn event_type(&self) -> &'static str {
        match self {
            OutputEvent::TextDelta { .. } => "text-delta",
            OutputEvent::ToolCallStreamingStart { .. } => "tool-call-streaming-start",
            OutputEvent::ToolCallDelta { .. } => "tool-call-delta",
            OutputEvent::ToolCallStart { .. } => "tool-call-start",
            OutputEvent::ToolCallResult { .. } => "tool-call-result",
            OutputEvent::Source { .. } => "source",
            OutputEvent::Done { .. } => "done",
            OutputEvent::Error { .. } => "error",
        }
    }

    /// Whether this event ends the stream
    pub fn is_terminal(&self) -> bool {
        matches!(self, OutputEvent::Done { .. } | OutputEvent::Error { .. })
    }

    /// Format as an SSE frame
    pub fn to_sse(&self) -> String {
        let data = serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string());
        format!("event: {}\ndata: {}\n\n", self.event_type(), data)
    }
}
