use deepsearch_core::{Conversation, Message};

/// Where the current turn stands; drives input disablement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChatStatus {
    #[default]
    Idle,
    /// Request sent, nothing received yet
    Submitted,
    Streaming,
    /// The last turn failed
    Error,
}

impl ChatStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatStatus::Idle => "idle",
            ChatStatus::Submitted => "submitted",
            ChatStatus::Streaming => "streaming",
            ChatStatus::Error => "error",
        }
    }

    /// Input is accepted only between turns
    pub fn accepts_input(&self) -> bool {
        matches!(self, ChatStatus::Idle | ChatStatus::Error)
    }
}

/// Local conversation plus turn status
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatState {
    pub messages: Conversation,
    pub status: ChatStatus,
    /// Message of the last `error` event
    pub error: Option<String>,
}

impl ChatState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a user turn and mark it submitted
    pub fn submit(&mut self, text: impl Into<String>) {
        self.messages.push(Message::user(text));
        self.status = ChatStatus::Submitted;
        self.error = None;
    }

    /// The assistant message of the current or last turn
    pub fn last_assistant(&self) -> Option<&Message> {
        self.messages
            .last()
            .filter(|m| m.role == deepsearch_core::Role::Assistant)
    }
}
