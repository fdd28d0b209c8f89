//! Conversation data model shared by the client and the transport endpoint
//!
//! The JSON shape follows the UI message format the browser client posts:
//!
//! ```json
//! { "id": "m1", "role": "user", "parts": [{ "type": "text", "text": "hi" }] }
//! ```
//!
//! A `ToolInvocation`'s `result` exists only in the `result` state. That is
//! encoded in [`InvocationState`] rather than checked at runtime.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Ordered chat history, oldest message first
pub type Conversation = Vec<Message>;

/// Author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single chat message made of ordered parts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default = "new_message_id")]
    pub id: String,
    pub role: Role,
    #[serde(default)]
    pub parts: Vec<MessagePart>,
}

fn new_message_id() -> String {
    Uuid::new_v4().to_string()
}

impl Message {
    /// Create a user message holding a single text part
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: new_message_id(),
            role: Role::User,
            parts: vec![MessagePart::text(text)],
        }
    }

    /// Create an empty assistant message that streaming output appends to
    pub fn assistant() -> Self {
        Self {
            id: new_message_id(),
            role: Role::Assistant,
            parts: Vec::new(),
        }
    }

    /// Concatenated text of every text part
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                MessagePart::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Tool invocations in part order
    pub fn tool_invocations(&self) -> impl Iterator<Item = &ToolInvocation> {
        self.parts.iter().filter_map(|part| match part {
            MessagePart::ToolInvocation { tool_invocation } => Some(tool_invocation),
            _ => None,
        })
    }

    /// Mutable lookup of a tool invocation by call id
    pub fn tool_invocation_mut(&mut self, tool_call_id: &str) -> Option<&mut ToolInvocation> {
        self.parts.iter_mut().find_map(|part| match part {
            MessagePart::ToolInvocation { tool_invocation }
                if tool_invocation.tool_call_id == tool_call_id =>
            {
                Some(tool_invocation)
            }
            _ => None,
        })
    }
}

/// One renderable piece of a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum MessagePart {
    Text {
        text: String,
    },
    ToolInvocation {
        #[serde(rename = "toolInvocation")]
        tool_invocation: ToolInvocation,
    },
    Source {
        source: SourceRef,
    },
}

impl MessagePart {
    pub fn text(text: impl Into<String>) -> Self {
        MessagePart::Text { text: text.into() }
    }

    pub fn tool_invocation(tool_invocation: ToolInvocation) -> Self {
        MessagePart::ToolInvocation { tool_invocation }
    }

    pub fn source(source: SourceRef) -> Self {
        MessagePart::Source { source }
    }

    /// Wire tag of the variant
    pub fn kind(&self) -> &'static str {
        match self {
            MessagePart::Text { .. } => "text",
            MessagePart::ToolInvocation { .. } => "tool-invocation",
            MessagePart::Source { .. } => "source",
        }
    }
}

/// A model-issued tool call as seen by the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolInvocation {
    pub tool_call_id: String,
    pub tool_name: String,
    #[serde(default)]
    pub args: Value,
    #[serde(flatten)]
    pub state: InvocationState,
}

/// Lifecycle of a tool invocation: `partial-call` → `call` → `result`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum InvocationState {
    /// Name known, arguments still streaming
    PartialCall {
        #[serde(
            default,
            rename = "argsText",
            skip_serializing_if = "String::is_empty"
        )]
        args_text: String,
    },
    /// Arguments complete, tool executing
    Call,
    /// Tool finished; `is_error` marks a failed execution
    Result {
        result: Value,
        #[serde(default, rename = "isError", skip_serializing_if = "std::ops::Not::not")]
        is_error: bool,
    },
}

impl InvocationState {
    /// Position in the lifecycle, used to reject backwards transitions
    pub fn rank(&self) -> u8 {
        match self {
            InvocationState::PartialCall { .. } => 0,
            InvocationState::Call => 1,
            InvocationState::Result { .. } => 2,
        }
    }

    /// Wire name of the state
    pub fn name(&self) -> &'static str {
        match self {
            InvocationState::PartialCall { .. } => "partial-call",
            InvocationState::Call => "call",
            InvocationState::Result { .. } => "result",
        }
    }
}

impl ToolInvocation {
    pub fn partial(tool_call_id: impl Into<String>, tool_name: impl Into<String>) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            tool_name: tool_name.into(),
            args: Value::Null,
            state: InvocationState::PartialCall {
                args_text: String::new(),
            },
        }
    }

    pub fn call(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        args: Value,
    ) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            tool_name: tool_name.into(),
            args,
            state: InvocationState::Call,
        }
    }

    /// Result value, present only in the `result` state
    pub fn result(&self) -> Option<&Value> {
        match &self.state {
            InvocationState::Result { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.state, InvocationState::Result { is_error: true, .. })
    }
}

/// A cited source attached to an assistant message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub id: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl SourceRef {
    /// Title when present, otherwise the URL
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.url)
    }
}
