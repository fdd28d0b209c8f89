//! Pure state transitions for streamed chat events
//!
//! Every event lands in the trailing assistant message, which is created on
//! the first event of a turn. Parts are only ever appended or updated in
//! place, and a tool invocation never moves backwards through
//! `partial-call` → `call` → `result`.

use deepsearch_core::{InvocationState, Message, MessagePart, OutputEvent, Role, ToolInvocation};
use serde_json::Value;

use crate::state::{ChatState, ChatStatus};

/// Fold one event into `state`, returning the next state
pub fn reduce(mut state: ChatState, event: &OutputEvent) -> ChatState {
    apply_event(&mut state, event);
    state
}

/// In-place form of [`reduce`]
pub fn apply_event(state: &mut ChatState, event: &OutputEvent) {
    match event {
        OutputEvent::Done { .. } => {
            state.status = ChatStatus::Idle;
        }
        OutputEvent::Error { message } => {
            state.status = ChatStatus::Error;
            state.error = Some(message.clone());
        }
        OutputEvent::TextDelta { text } => {
            let message = streaming_message(state);
            match message.parts.last_mut() {
                Some(MessagePart::Text { text: existing }) => existing.push_str(text),
                _ => message.parts.push(MessagePart::text(text.clone())),
            }
        }
        OutputEvent::ToolCallStreamingStart {
            tool_call_id,
            tool_name,
        } => {
            let message = streaming_message(state);
            if message.tool_invocation_mut(tool_call_id).is_none() {
                message
                    .parts
                    .push(MessagePart::tool_invocation(ToolInvocation::partial(
                        tool_call_id.clone(),
                        tool_name.clone(),
                    )));
            }
        }
        OutputEvent::ToolCallDelta {
            tool_call_id,
            args_text_delta,
        } => {
            let message = streaming_message(state);
            if let Some(invocation) = message.tool_invocation_mut(tool_call_id) {
                if let InvocationState::PartialCall { args_text } = &mut invocation.state {
                    args_text.push_str(args_text_delta);
                }
            }
        }
        OutputEvent::ToolCallStart {
            tool_call_id,
            tool_name,
            args,
        } => {
            let message = streaming_message(state);
            advance(
                message,
                tool_call_id,
                tool_name,
                Some(args),
                InvocationState::Call,
            );
        }
        OutputEvent::ToolCallResult {
            tool_call_id,
            tool_name,
            result,
            is_error,
        } => {
            let message = streaming_message(state);
            advance(
                message,
                tool_call_id,
                tool_name,
                None,
                InvocationState::Result {
                    result: result.clone(),
                    is_error: *is_error,
                },
            );
        }
        OutputEvent::Source { source } => {
            let message = streaming_message(state);
            let seen = message
                .parts
                .iter()
                .any(|part| matches!(part, MessagePart::Source { source: s } if s.id == source.id));
            if !seen {
                message.parts.push(MessagePart::source(source.clone()));
            }
        }
    }
}

/// The trailing assistant message, created on first use in a turn
fn streaming_message(state: &mut ChatState) -> &mut Message {
    state.status = ChatStatus::Streaming;
    let needs_new = state
        .messages
        .last()
        .map_or(true, |message| message.role != Role::Assistant);
    if needs_new {
        state.messages.push(Message::assistant());
    }
    let last = state.messages.len() - 1;
    &mut state.messages[last]
}

/// Move an invocation forward to `next`, creating it if unseen
fn advance(
    message: &mut Message,
    tool_call_id: &str,
    tool_name: &str,
    args: Option<&Value>,
    next: InvocationState,
) {
    match message.tool_invocation_mut(tool_call_id) {
        Some(invocation) => {
            if invocation.state.rank() < next.rank() {
                if let Some(args) = args {
                    invocation.args = args.clone();
                }
                invocation.state = next;
            }
        }
        None => {
            message
                .parts
                .push(MessagePart::tool_invocation(ToolInvocation {
                    tool_call_id: tool_call_id.to_string(),
                    tool_name: tool_name.to_string(),
                    args: args.cloned().unwrap_or(Value::Null),
                    state: next,
                }));
        }
    }
}
