//! Reducer invariants over arbitrary event sequences

use std::collections::HashMap;

use deepsearch_client::{reduce, ChatState, ChatStatus};
use deepsearch_core::{FinishReason, MessagePart, OutputEvent, SourceRef};
use proptest::prelude::*;
use serde_json::json;

fn call_id() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["c1", "c2", "c3"]).prop_map(String::from)
}

fn event() -> impl Strategy<Value = OutputEvent> {
    prop_oneof![
        "[a-z ]{1,8}".prop_map(|text| OutputEvent::TextDelta { text }),
        call_id().prop_map(|id| OutputEvent::ToolCallStreamingStart {
            tool_call_id: id,
            tool_name: "searchWeb".into(),
        }),
        (call_id(), "[a-z{}\":]{1,6}").prop_map(|(id, delta)| OutputEvent::ToolCallDelta {
            tool_call_id: id,
            args_text_delta: delta,
        }),
        call_id().prop_map(|id| OutputEvent::ToolCallStart {
            tool_call_id: id,
            tool_name: "searchWeb".into(),
            args: json!({ "query": "q" }),
        }),
        (call_id(), any::<bool>()).prop_map(|(id, is_error)| OutputEvent::ToolCallResult {
            tool_call_id: id,
            tool_name: "searchWeb".into(),
            result: json!([]),
            is_error,
        }),
        (0u8..3).prop_map(|n| OutputEvent::Source {
            source: SourceRef {
                id: format!("s{n}"),
                url: format!("https://example.com/{n}"),
                title: None,
            },
        }),
    ]
}

fn submitted() -> ChatState {
    let mut state = ChatState::new();
    state.submit("What's the weather in Paris today?");
    state
}

fn ranks(state: &ChatState) -> HashMap<String, u8> {
    state
        .messages
        .iter()
        .flat_map(|m| m.tool_invocations())
        .map(|inv| (inv.tool_call_id.clone(), inv.state.rank()))
        .collect()
}

proptest! {
    #[test]
    fn invocation_states_never_move_backwards(events in prop::collection::vec(event(), 0..40)) {
        let mut state = submitted();
        let mut seen = HashMap::new();

        for event in &events {
            state = reduce(state, event);
            for (id, rank) in ranks(&state) {
                let previous = seen.insert(id, rank).unwrap_or(0);
                prop_assert!(rank >= previous);
            }
        }
    }

    #[test]
    fn parts_are_append_only(events in prop::collection::vec(event(), 0..40)) {
        let mut state = submitted();
        let mut previous: Vec<MessagePart> = Vec::new();

        for event in &events {
            state = reduce(state, event);
            let parts = state.last_assistant().map(|m| m.parts.clone()).unwrap_or_default();
            prop_assert!(parts.len() >= previous.len());
            for (old, new) in previous.iter().zip(parts.iter()) {
                prop_assert_eq!(old.kind(), new.kind());
            }
            previous = parts;
        }
    }

    #[test]
    fn result_present_only_in_result_state(events in prop::collection::vec(event(), 0..40)) {
        let state = events.iter().fold(submitted(), reduce);
        for invocation in state.messages.iter().flat_map(|m| m.tool_invocations()) {
            prop_assert_eq!(invocation.result().is_some(), invocation.state.name() == "result");
        }
    }

    #[test]
    fn text_is_the_concatenation_of_deltas(deltas in prop::collection::vec("[a-z ]{1,8}", 1..20)) {
        let state = deltas
            .iter()
            .map(|text| OutputEvent::TextDelta { text: text.clone() })
            .fold(submitted(), |state, event| reduce(state, &event));

        let assistant = state.last_assistant().unwrap();
        prop_assert_eq!(assistant.parts.len(), 1);
        prop_assert_eq!(assistant.text(), deltas.concat());
    }

    #[test]
    fn terminal_event_settles_status(events in prop::collection::vec(event(), 0..20), fail in any::<bool>()) {
        let mut state = events.iter().fold(submitted(), reduce);
        if !events.is_empty() {
            prop_assert_eq!(state.status, ChatStatus::Streaming);
        }

        let terminal = if fail {
            OutputEvent::error("Oops, an error occured!")
        } else {
            OutputEvent::Done { finish_reason: FinishReason::Stop, steps: 1 }
        };
        state = reduce(state, &terminal);

        prop_assert!(state.status.accepts_input());
        prop_assert_eq!(state.status == ChatStatus::Error, fail);
    }
}
