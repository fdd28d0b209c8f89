//! Conversation → model messages
//!
//! Completed tool invocations are replayed as an assistant tool-call message
//! followed by one tool message per result, so the model sees what it
//! searched for in earlier turns. Invocations that never reached `result`
//! carry nothing the model can use and are dropped, as are source parts.

use deepsearch_core::traits::{LlmMessage, ToolCall};
use deepsearch_core::{InvocationState, Message, MessagePart, Role};

/// Convert client history into provider messages, oldest first
pub fn conversation_to_messages(history: &[Message]) -> Vec<LlmMessage> {
    let mut out = Vec::with_capacity(history.len());
    for message in history {
        match message.role {
            Role::User => {
                let text = message.text();
                if !text.trim().is_empty() {
                    out.push(LlmMessage::user(text));
                }
            }
            Role::Assistant => push_assistant(message, &mut out),
        }
    }
    out
}

fn push_assistant(message: &Message, out: &mut Vec<LlmMessage>) {
    let mut text = String::new();
    let mut calls: Vec<ToolCall> = Vec::new();
    let mut results: Vec<LlmMessage> = Vec::new();

    for part in &message.parts {
        match part {
            MessagePart::Text { text: fragment } => {
                if !calls.is_empty() {
                    flush(&mut text, &mut calls, &mut results, out);
                }
                text.push_str(fragment);
            }
            MessagePart::ToolInvocation { tool_invocation } => {
                if let InvocationState::Result { result, .. } = &tool_invocation.state {
                    calls.push(ToolCall::new(
                        tool_invocation.tool_call_id.clone(),
                        tool_invocation.tool_name.clone(),
                        tool_invocation.args.to_string(),
                    ));
                    results.push(LlmMessage::tool(
                        tool_invocation.tool_call_id.clone(),
                        result.to_string(),
                    ));
                }
            }
            MessagePart::Source { .. } => {}
        }
    }

    if !calls.is_empty() {
        flush(&mut text, &mut calls, &mut results, out);
    } else if !text.is_empty() {
        out.push(LlmMessage::assistant(text));
    }
}

fn flush(
    text: &mut String,
    calls: &mut Vec<ToolCall>,
    results: &mut Vec<LlmMessage>,
    out: &mut Vec<LlmMessage>,
) {
    out.push(LlmMessage::assistant_with_tools(
        std::mem::take(text),
        std::mem::take(calls),
    ));
    out.append(results);
}
