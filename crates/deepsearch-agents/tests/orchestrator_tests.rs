//! Orchestrator runs against scripted providers

use std::sync::Arc;
use std::time::Duration;

use deepsearch_agents::{ChatOrchestrator, OrchestratorError, OrchestratorResult};
use deepsearch_core::test_support::{
    sample_results, FailingSearchProvider, HangingSearchProvider, ScriptedChatProvider,
    ScriptedTurn, StaticSearchProvider,
};
use deepsearch_core::traits::{ExecutionContext, LlmError, MessageRole};
use deepsearch_core::{FinishReason, Message, OutputEvent};
use deepsearch_tools::SearchWebTool;
use futures::StreamExt;
use serde_json::json;
use tokio_util::sync::CancellationToken;

const PARIS_ARGS: &str = r#"{"query":"weather in Paris today"}"#;

fn orchestrator(
    provider: &ScriptedChatProvider,
    search: Arc<dyn deepsearch_core::WebSearchProvider>,
) -> ChatOrchestrator {
    ChatOrchestrator::new(Arc::new(provider.clone()), Arc::new(SearchWebTool::new(search)))
}

async fn collect(
    orchestrator: &ChatOrchestrator,
    history: &[Message],
    cancel: CancellationToken,
) -> Vec<OrchestratorResult<OutputEvent>> {
    orchestrator
        .run(history, ExecutionContext::new(cancel))
        .collect()
        .await
}

fn ok_events(items: Vec<OrchestratorResult<OutputEvent>>) -> Vec<OutputEvent> {
    items
        .into_iter()
        .map(|item| item.expect("unexpected error"))
        .collect()
}

fn types(events: &[OutputEvent]) -> Vec<&'static str> {
    events.iter().map(OutputEvent::event_type).collect()
}

#[tokio::test]
async fn test_weather_question_runs_search_then_answers() {
    let provider = ScriptedChatProvider::new(vec![
        ScriptedTurn::tool_call("call_1", "searchWeb", PARIS_ARGS),
        ScriptedTurn::text("It is sunny in Paris."),
    ]);
    let search = StaticSearchProvider::new(sample_results(3));
    let orch = orchestrator(&provider, Arc::new(search.clone()));

    let events = ok_events(
        collect(
            &orch,
            &[Message::user("What's the weather in Paris today?")],
            CancellationToken::new(),
        )
        .await,
    );

    assert_eq!(
        types(&events),
        vec![
            "tool-call-streaming-start",
            "tool-call-delta",
            "tool-call-delta",
            "tool-call-start",
            "tool-call-result",
            "text-delta",
            "text-delta",
            "text-delta",
            "text-delta",
            "text-delta",
            "done",
        ]
    );

    match &events[3] {
        OutputEvent::ToolCallStart { tool_call_id, args, .. } => {
            assert_eq!(tool_call_id, "call_1");
            assert_eq!(args, &json!({ "query": "weather in Paris today" }));
        }
        other => panic!("expected tool-call-start, got {other:?}"),
    }
    match &events[4] {
        OutputEvent::ToolCallResult { result, is_error, .. } => {
            assert!(!is_error);
            assert_eq!(result.as_array().unwrap().len(), 3);
        }
        other => panic!("expected tool-call-result, got {other:?}"),
    }
    assert_eq!(
        events.last(),
        Some(&OutputEvent::Done {
            finish_reason: FinishReason::Stop,
            steps: 2
        })
    );

    let deltas: String = events
        .iter()
        .filter_map(|e| match e {
            OutputEvent::ToolCallDelta { args_text_delta, .. } => Some(args_text_delta.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(deltas, PARIS_ARGS);
    assert_eq!(search.queries(), vec!["weather in Paris today".to_string()]);
}

#[tokio::test]
async fn test_tool_result_is_fed_back_to_model() {
    let provider = ScriptedChatProvider::new(vec![
        ScriptedTurn::tool_call("call_1", "searchWeb", PARIS_ARGS),
        ScriptedTurn::text("Done."),
    ]);
    let orch = orchestrator(&provider, Arc::new(StaticSearchProvider::new(sample_results(2))));

    collect(&orch, &[Message::user("weather?")], CancellationToken::new()).await;

    let requests = provider.requests();
    assert_eq!(requests.len(), 2);

    let first = &requests[0];
    assert_eq!(first.messages[0].role, MessageRole::System);
    assert_eq!(first.messages[1], deepsearch_core::traits::LlmMessage::user("weather?"));
    let tools = first.tools.as_ref().expect("tools offered");
    assert_eq!(tools[0].function.name, "searchWeb");

    let second = &requests[1].messages;
    assert_eq!(second.len(), 4);
    assert_eq!(second[2].role, MessageRole::Assistant);
    assert_eq!(second[2].tool_calls.as_ref().unwrap()[0].id, "call_1");
    assert_eq!(second[3].role, MessageRole::Tool);
    assert_eq!(second[3].tool_call_id.as_deref(), Some("call_1"));
    let fed_back: serde_json::Value = serde_json::from_str(&second[3].content).unwrap();
    assert_eq!(fed_back[0]["title"], "Result 1");
}

#[tokio::test]
async fn test_search_failure_surfaces_as_error_result() {
    let provider = ScriptedChatProvider::new(vec![
        ScriptedTurn::tool_call("call_1", "searchWeb", PARIS_ARGS),
        ScriptedTurn::text("I could not search right now."),
    ]);
    let search = FailingSearchProvider::new(503);
    let orch = orchestrator(&provider, Arc::new(search.clone()));

    let events = ok_events(collect(&orch, &[Message::user("weather?")], CancellationToken::new()).await);

    let result = events
        .iter()
        .find_map(|e| match e {
            OutputEvent::ToolCallResult { result, is_error, .. } => Some((result.clone(), *is_error)),
            _ => None,
        })
        .expect("tool result");
    assert_eq!(result, (json!({ "error": "Search failed" }), true));
    assert!(matches!(events.last(), Some(OutputEvent::Done { .. })));
    assert_eq!(search.calls(), 1);

    // The model sees the failure, not the upstream body
    let fed_back = &provider.requests()[1].messages[3].content;
    assert!(!fed_back.contains("Service Unavailable"));
}

#[tokio::test]
async fn test_step_limit_ends_run() {
    let turns = (0..12)
        .map(|i| ScriptedTurn::tool_call(format!("call_{i}"), "searchWeb", r#"{"query":"again"}"#))
        .collect();
    let provider = ScriptedChatProvider::new(turns);
    let orch = orchestrator(&provider, Arc::new(StaticSearchProvider::new(sample_results(1))))
        .with_max_steps(10);

    let events = ok_events(collect(&orch, &[Message::user("loop")], CancellationToken::new()).await);

    assert_eq!(provider.requests().len(), 10);
    assert_eq!(provider.remaining(), 2);
    assert_eq!(
        events.last(),
        Some(&OutputEvent::Done {
            finish_reason: FinishReason::StepLimit,
            steps: 10
        })
    );
    let results = events
        .iter()
        .filter(|e| matches!(e, OutputEvent::ToolCallResult { .. }))
        .count();
    assert_eq!(results, 10);
}

#[tokio::test]
async fn test_model_error_ends_stream() {
    let provider = ScriptedChatProvider::new(vec![ScriptedTurn::Error(LlmError::Api {
        status: 500,
        message: "boom".into(),
    })]);
    let orch = orchestrator(&provider, Arc::new(StaticSearchProvider::default()));

    let items = collect(&orch, &[Message::user("hi")], CancellationToken::new()).await;

    assert_eq!(items.len(), 1);
    assert!(matches!(
        &items[0],
        Err(OrchestratorError::Model(LlmError::Api { status: 500, .. }))
    ));
}

#[tokio::test]
async fn test_cancel_interrupts_hung_model() {
    let provider = ScriptedChatProvider::new(vec![ScriptedTurn::Hang]);
    let orch = orchestrator(&provider, Arc::new(StaticSearchProvider::default()));

    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let items = tokio::time::timeout(
        Duration::from_secs(5),
        collect(&orch, &[Message::user("hi")], token),
    )
    .await
    .expect("run should end after cancel");

    assert_eq!(items.len(), 1);
    assert!(matches!(items[0], Err(OrchestratorError::Cancelled)));
}

#[tokio::test]
async fn test_cancel_interrupts_in_flight_search() {
    let provider = ScriptedChatProvider::new(vec![
        ScriptedTurn::tool_call("call_1", "searchWeb", PARIS_ARGS),
        ScriptedTurn::text("never reached"),
    ]);
    let search = HangingSearchProvider::new();
    let orch = orchestrator(&provider, Arc::new(search.clone()));

    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let mut items = tokio::time::timeout(
        Duration::from_secs(5),
        collect(&orch, &[Message::user("Weather in Paris?")], token),
    )
    .await
    .expect("run should end after cancel");

    assert!(matches!(items.pop(), Some(Err(OrchestratorError::Cancelled))));
    let events = ok_events(items);
    assert_eq!(
        types(&events),
        vec![
            "tool-call-streaming-start",
            "tool-call-delta",
            "tool-call-delta",
            "tool-call-start",
        ]
    );
    assert_eq!(search.calls(), 1);
    assert_eq!(search.aborted(), 1);
    assert_eq!(provider.requests().len(), 1);
}

#[tokio::test]
async fn test_invalid_arguments_skip_search() {
    let provider = ScriptedChatProvider::new(vec![
        ScriptedTurn::tool_call("call_1", "searchWeb", r#"{"query": "unterminated"#),
        ScriptedTurn::text("Sorry."),
    ]);
    let search = StaticSearchProvider::new(sample_results(1));
    let orch = orchestrator(&provider, Arc::new(search.clone()));

    let events = ok_events(collect(&orch, &[Message::user("hi")], CancellationToken::new()).await);

    let start = events
        .iter()
        .find(|e| matches!(e, OutputEvent::ToolCallStart { .. }))
        .expect("tool start");
    assert!(matches!(
        start,
        OutputEvent::ToolCallStart { args: serde_json::Value::String(_), .. }
    ));
    assert!(events.iter().any(|e| matches!(
        e,
        OutputEvent::ToolCallResult { is_error: true, result, .. }
            if result == &json!({ "error": "Invalid tool arguments" })
    )));
    assert_eq!(search.calls(), 0);
    assert!(matches!(events.last(), Some(OutputEvent::Done { .. })));

    // the replayed call carries well-formed arguments
    let followup = &provider.requests()[1];
    let replayed = followup
        .messages
        .iter()
        .find_map(|m| m.tool_calls.as_ref())
        .expect("assistant tool call in history");
    assert_eq!(replayed[0].function.arguments, "{}");
}

#[tokio::test]
async fn test_sources_follow_search_results_when_enabled() {
    let provider = ScriptedChatProvider::new(vec![
        ScriptedTurn::tool_call("call_1", "searchWeb", PARIS_ARGS),
        ScriptedTurn::text("Sunny."),
    ]);
    let orch = orchestrator(&provider, Arc::new(StaticSearchProvider::new(sample_results(2))))
        .with_sources_from_results(true);

    let events = ok_events(collect(&orch, &[Message::user("hi")], CancellationToken::new()).await);

    let sources: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            OutputEvent::Source { source } => Some(source.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(sources.len(), 2);
    assert_eq!(sources[0].id, "call_1-0");
    assert_eq!(sources[0].url, "https://example.com/1");
    assert_eq!(sources[1].title.as_deref(), Some("Result 2"));

    let result_at = types(&events).iter().position(|t| *t == "tool-call-result").unwrap();
    assert_eq!(types(&events)[result_at + 1], "source");
}

#[tokio::test]
async fn test_runs_are_independent() {
    let provider = ScriptedChatProvider::new(vec![
        ScriptedTurn::text("First."),
        ScriptedTurn::text("Second."),
    ]);
    let orch = orchestrator(&provider, Arc::new(StaticSearchProvider::default()));

    let first = ok_events(collect(&orch, &[Message::user("one")], CancellationToken::new()).await);
    let second = ok_events(collect(&orch, &[Message::user("two")], CancellationToken::new()).await);

    assert_eq!(first[0], OutputEvent::TextDelta { text: "First.".into() });
    assert_eq!(second[0], OutputEvent::TextDelta { text: "Second.".into() });
    let requests = provider.requests();
    assert_eq!(requests[1].messages.len(), 2);
}

#[tokio::test]
async fn test_empty_history_is_rejected() {
    let provider = ScriptedChatProvider::new(vec![ScriptedTurn::text("unused")]);
    let orch = orchestrator(&provider, Arc::new(StaticSearchProvider::default()));

    let items = collect(&orch, &[], CancellationToken::new()).await;

    assert_eq!(items.len(), 1);
    assert!(matches!(items[0], Err(OrchestratorError::Internal(_))));
    assert!(provider.requests().is_empty());
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    fn turn() -> impl Strategy<Value = ScriptedTurn> {
        prop_oneof![
            "[a-z ]{0,20}".prop_map(ScriptedTurn::Text),
            Just(ScriptedTurn::tool_call("c", "searchWeb", r#"{"query":"q"}"#)),
            Just(ScriptedTurn::tool_call("c", "searchWeb", "not json")),
            Just(ScriptedTurn::Error(LlmError::HttpError("reset".into()))),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn exactly_one_terminal_item_and_it_is_last(
            turns in prop::collection::vec(turn(), 0..6),
            max_steps in 1u32..4,
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            let items = runtime.block_on(async {
                let provider = ScriptedChatProvider::new(turns);
                let orch = orchestrator(&provider, Arc::new(StaticSearchProvider::new(sample_results(1))))
                    .with_max_steps(max_steps);
                collect(&orch, &[Message::user("hi")], CancellationToken::new()).await
            });

            let terminal = |item: &OrchestratorResult<OutputEvent>| match item {
                Ok(event) => event.is_terminal(),
                Err(_) => true,
            };
            prop_assert_eq!(items.iter().filter(|i| terminal(i)).count(), 1);
            prop_assert!(terminal(items.last().unwrap()));
        }
    }
}
