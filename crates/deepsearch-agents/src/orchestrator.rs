//! The chat orchestrator
//!
//! One run is a loop of steps. A step streams one model generation; if the
//! model asked for tools, each call is executed in order and its result fed
//! back before the next step. Events are yielded as soon as they exist so
//! text that precedes a tool call reaches the client before the call does.

use std::sync::Arc;

use async_stream::stream;
use deepsearch_core::traits::{
    ChatCompletionRequest, ChatProvider, ExecutionContext, LlmMessage, LlmToolDefinition,
    SearchResult, ToolCall, ToolCallDelta, ToolError, ToolExecutor,
};
use deepsearch_core::{FinishReason, Message, OutputEvent, SourceRef, SEARCH_WEB_TOOL};
use futures::stream::BoxStream;
use futures::StreamExt;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::convert::conversation_to_messages;
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::prompt::DEFAULT_SYSTEM_PROMPT;

/// Model generations allowed per run
pub const DEFAULT_MAX_STEPS: u32 = 10;

/// Streams a chat turn with tool calls resolved in-line
///
/// Cheap to clone; the server builds one at startup and shares it.
#[derive(Clone)]
pub struct ChatOrchestrator {
    provider: Arc<dyn ChatProvider>,
    tools: Arc<dyn ToolExecutor>,
    system_prompt: String,
    model: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    max_steps: u32,
    sources_from_results: bool,
}

impl ChatOrchestrator {
    pub fn new(provider: Arc<dyn ChatProvider>, tools: Arc<dyn ToolExecutor>) -> Self {
        Self {
            provider,
            tools,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            model: None,
            temperature: None,
            max_tokens: None,
            max_steps: DEFAULT_MAX_STEPS,
            sources_from_results: false,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the step budget; zero is treated as one
    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    /// Emit a `source` event per search hit
    pub fn with_sources_from_results(mut self, enabled: bool) -> Self {
        self.sources_from_results = enabled;
        self
    }

    pub fn max_steps(&self) -> u32 {
        self.max_steps
    }

    pub fn provider_name(&self) -> &str {
        self.provider.provider_name()
    }

    /// Whether the model backend answers its health probe
    pub async fn provider_ready(&self) -> bool {
        match self.provider.health_check().await {
            Ok(ready) => ready,
            Err(e) => {
                warn!(provider = self.provider.provider_name(), error = %e, "Provider health check failed");
                false
            }
        }
    }

    fn tool_definitions(&self) -> Vec<LlmToolDefinition> {
        self.tools
            .list_tools()
            .into_iter()
            .map(|def| LlmToolDefinition::function(def.name, def.description, def.parameters))
            .collect()
    }

    /// Run one chat turn over `history`
    ///
    /// The stream ends after exactly one `Ok(OutputEvent::Done)` or one
    /// `Err`. Cancelling `context.cancel` aborts the in-flight model stream
    /// or tool call and ends the stream with `Err(Cancelled)`; events already
    /// yielded stay valid.
    pub fn run(
        &self,
        history: &[Message],
        context: ExecutionContext,
    ) -> BoxStream<'static, OrchestratorResult<OutputEvent>> {
        let this = self.clone();
        let mut messages = vec![LlmMessage::system(this.system_prompt.clone())];
        messages.extend(conversation_to_messages(history));
        let tool_definitions = this.tool_definitions();

        Box::pin(stream! {
            if messages.len() == 1 {
                yield Err(OrchestratorError::Internal("conversation has no content".into()));
                return;
            }

            let cancel = context.cancel.clone();
            let mut step: u32 = 0;

            loop {
                step += 1;
                let mut request = ChatCompletionRequest::new(messages.clone())
                    .with_temperature(this.temperature)
                    .with_max_tokens(this.max_tokens);
                if !tool_definitions.is_empty() {
                    request = request.with_tools(tool_definitions.clone());
                }
                if let Some(model) = &this.model {
                    request = request.with_model(model.clone());
                }

                debug!(step, messages = messages.len(), "Sending request to model");

                let mut content = String::new();
                let mut pending: Vec<PendingCall> = Vec::new();
                let mut finish_reason: Option<String> = None;
                let mut chunks = this.provider.stream_chat(request);

                loop {
                    let next = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => None,
                        next = chunks.next() => Some(next),
                    };
                    let Some(next) = next else {
                        info!(step, "Chat turn cancelled during model stream");
                        yield Err(OrchestratorError::Cancelled);
                        return;
                    };

                    let chunk = match next {
                        Some(Ok(chunk)) => chunk,
                        Some(Err(e)) => {
                            warn!(step, error = %e, "Model stream failed");
                            yield Err(OrchestratorError::Model(e));
                            return;
                        }
                        None => break,
                    };

                    if let Some(text) = chunk.delta.content {
                        if !text.is_empty() {
                            content.push_str(&text);
                            yield Ok(OutputEvent::TextDelta { text });
                        }
                    }

                    for delta in chunk.delta.tool_calls.unwrap_or_default() {
                        for event in apply_delta(&mut pending, delta) {
                            yield Ok(event);
                        }
                    }

                    if chunk.finish_reason.is_some() {
                        finish_reason = chunk.finish_reason;
                    }
                }
                drop(chunks);

                // Some backends report "stop" alongside tool calls; the calls win
                pending.retain(|call| !call.name.is_empty());
                if pending.is_empty() {
                    let finish_reason = FinishReason::from_provider(finish_reason.as_deref());
                    info!(step, ?finish_reason, "Chat turn complete");
                    yield Ok(OutputEvent::Done { finish_reason, steps: step });
                    return;
                }

                debug!(step, tool_calls = pending.len(), "Model requested tools");
                let calls: Vec<ToolCall> = pending
                    .iter()
                    .map(|call| ToolCall::new(call.id.clone(), call.name.clone(), call.replay_arguments()))
                    .collect();
                messages.push(LlmMessage::assistant_with_tools(content, calls));

                for call in pending {
                    for event in call.start_events() {
                        yield Ok(event);
                    }

                    let args = match call.parsed_arguments() {
                        Ok(args) => args,
                        Err(raw) => {
                            warn!(tool_call_id = %call.id, "Tool arguments are not valid JSON");
                            yield Ok(OutputEvent::ToolCallStart {
                                tool_call_id: call.id.clone(),
                                tool_name: call.name.clone(),
                                args: Value::String(raw),
                            });
                            let error = ToolError::InvalidParameters("arguments are not JSON".into());
                            let result = json!({ "error": error.public_message() });
                            messages.push(LlmMessage::tool(call.id.clone(), result.to_string()));
                            yield Ok(OutputEvent::ToolCallResult {
                                tool_call_id: call.id,
                                tool_name: call.name,
                                result,
                                is_error: true,
                            });
                            continue;
                        }
                    };

                    yield Ok(OutputEvent::ToolCallStart {
                        tool_call_id: call.id.clone(),
                        tool_name: call.name.clone(),
                        args: args.clone(),
                    });

                    let tool_context = context.clone().with_tool_call(call.id.clone());
                    let outcome = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => Err(ToolError::Cancelled),
                        outcome = this.tools.execute_tool(&call.name, args, &tool_context) => outcome,
                    };

                    match outcome {
                        Ok(result) => {
                            messages.push(LlmMessage::tool(call.id.clone(), result.to_string()));
                            let sources = if this.sources_from_results && call.name == SEARCH_WEB_TOOL {
                                sources_from(&call.id, &result)
                            } else {
                                Vec::new()
                            };
                            yield Ok(OutputEvent::ToolCallResult {
                                tool_call_id: call.id,
                                tool_name: call.name,
                                result,
                                is_error: false,
                            });
                            for source in sources {
                                yield Ok(OutputEvent::Source { source });
                            }
                        }
                        Err(ToolError::Cancelled) => {
                            info!(step, tool_call_id = %call.id, "Chat turn cancelled during tool call");
                            yield Err(OrchestratorError::Cancelled);
                            return;
                        }
                        Err(e) => {
                            warn!(tool_call_id = %call.id, tool = %call.name, error = %e, "Tool call failed");
                            let result = json!({ "error": e.public_message() });
                            messages.push(LlmMessage::tool(call.id.clone(), result.to_string()));
                            yield Ok(OutputEvent::ToolCallResult {
                                tool_call_id: call.id,
                                tool_name: call.name,
                                result,
                                is_error: true,
                            });
                        }
                    }
                }

                if step >= this.max_steps {
                    info!(step, "Step budget exhausted");
                    yield Ok(OutputEvent::Done {
                        finish_reason: FinishReason::StepLimit,
                        steps: step,
                    });
                    return;
                }
            }
        })
    }
}

/// A tool call being assembled from stream deltas
#[derive(Debug, Default)]
struct PendingCall {
    index: u32,
    id: String,
    name: String,
    arguments: String,
    /// `tool-call-streaming-start` already sent
    announced: bool,
}

impl PendingCall {
    /// Events for a call whose announcement never happened mid-stream
    fn start_events(&self) -> Vec<OutputEvent> {
        if self.announced {
            return Vec::new();
        }
        let mut events = vec![OutputEvent::ToolCallStreamingStart {
            tool_call_id: self.id.clone(),
            tool_name: self.name.clone(),
        }];
        if !self.arguments.is_empty() {
            events.push(OutputEvent::ToolCallDelta {
                tool_call_id: self.id.clone(),
                args_text_delta: self.arguments.clone(),
            });
        }
        events
    }

    /// Argument text for the history sent back to the model
    ///
    /// Unparseable text is replaced by `{}` since strict backends reject it.
    fn replay_arguments(&self) -> String {
        match self.parsed_arguments() {
            Ok(_) if !self.arguments.trim().is_empty() => self.arguments.clone(),
            _ => "{}".to_string(),
        }
    }

    /// Parsed arguments; empty text means no arguments
    fn parsed_arguments(&self) -> Result<Value, String> {
        if self.arguments.trim().is_empty() {
            return Ok(json!({}));
        }
        serde_json::from_str(&self.arguments).map_err(|_| self.arguments.clone())
    }
}

/// Fold one delta into the pending calls, returning events to emit
fn apply_delta(pending: &mut Vec<PendingCall>, delta: ToolCallDelta) -> Vec<OutputEvent> {
    let position = match pending.iter().position(|call| call.index == delta.index) {
        Some(position) => position,
        None => {
            pending.push(PendingCall {
                index: delta.index,
                ..Default::default()
            });
            pending.len() - 1
        }
    };
    let call = &mut pending[position];

    if let Some(id) = delta.id.filter(|id| !id.is_empty()) {
        if call.id.is_empty() {
            call.id = id;
        }
    }

    let mut fresh_arguments = None;
    if let Some(function) = delta.function {
        if let Some(name) = function.name {
            call.name.push_str(&name);
        }
        if let Some(arguments) = function.arguments.filter(|a| !a.is_empty()) {
            call.arguments.push_str(&arguments);
            fresh_arguments = Some(arguments);
        }
    }

    let mut events = Vec::new();
    if !call.announced {
        if call.name.is_empty() {
            return events;
        }
        if call.id.is_empty() {
            call.id = format!("call_{}", Uuid::new_v4().simple());
        }
        events = call.start_events();
        call.announced = true;
    } else if let Some(arguments) = fresh_arguments {
        events.push(OutputEvent::ToolCallDelta {
            tool_call_id: call.id.clone(),
            args_text_delta: arguments,
        });
    }
    events
}

/// Source parts for each hit in a `searchWeb` result
fn sources_from(tool_call_id: &str, result: &Value) -> Vec<SourceRef> {
    serde_json::from_value::<Vec<SearchResult>>(result.clone())
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(i, hit)| SourceRef {
            id: format!("{}-{}", tool_call_id, i),
            url: hit.link,
            title: Some(hit.title).filter(|t| !t.is_empty()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use deepsearch_core::traits::FunctionCallDelta;

    #[test]
    fn start_announced_once_with_buffered_arguments() {
        let mut pending = Vec::new();

        // arguments before the name
        let events = apply_delta(
            &mut pending,
            ToolCallDelta {
                index: 0,
                id: Some("call_1".into()),
                function: Some(FunctionCallDelta {
                    name: None,
                    arguments: Some("{\"q".into()),
                }),
            },
        );
        assert!(events.is_empty());

        let events = apply_delta(
            &mut pending,
            ToolCallDelta {
                index: 0,
                id: None,
                function: Some(FunctionCallDelta {
                    name: Some("searchWeb".into()),
                    arguments: None,
                }),
            },
        );
        assert_eq!(
            events,
            vec![
                OutputEvent::ToolCallStreamingStart {
                    tool_call_id: "call_1".into(),
                    tool_name: "searchWeb".into(),
                },
                OutputEvent::ToolCallDelta {
                    tool_call_id: "call_1".into(),
                    args_text_delta: "{\"q".into(),
                },
            ]
        );

        let events = apply_delta(&mut pending, ToolCallDelta::arguments(0, "uery\":\"x\"}"));
        assert_eq!(
            events,
            vec![OutputEvent::ToolCallDelta {
                tool_call_id: "call_1".into(),
                args_text_delta: "uery\":\"x\"}".into(),
            }]
        );
        assert_eq!(pending[0].parsed_arguments().unwrap(), json!({ "query": "x" }));
    }

    #[test]
    fn missing_id_is_generated() {
        let mut pending = Vec::new();
        let mut delta = ToolCallDelta::start(0, "", "searchWeb");
        delta.id = None;

        let events = apply_delta(&mut pending, delta);
        match &events[0] {
            OutputEvent::ToolCallStreamingStart { tool_call_id, .. } => {
                assert!(tool_call_id.starts_with("call_"));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn parallel_indices_tracked_separately() {
        let mut pending = Vec::new();
        apply_delta(&mut pending, ToolCallDelta::start(0, "a", "searchWeb"));
        apply_delta(&mut pending, ToolCallDelta::start(1, "b", "searchWeb"));
        apply_delta(&mut pending, ToolCallDelta::arguments(1, "{}"));

        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].arguments, "");
        assert_eq!(pending[1].arguments, "{}");
    }

    #[test]
    fn sources_from_search_results() {
        let result = json!([
            { "title": "Weather", "link": "https://weather.example", "snippet": "s" },
            { "title": "", "link": "https://bare.example", "snippet": "" }
        ]);
        let sources = sources_from("call_1", &result);

        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].id, "call_1-0");
        assert_eq!(sources[0].title.as_deref(), Some("Weather"));
        assert_eq!(sources[1].title, None);
        assert!(sources_from("c", &json!({ "error": "x" })).is_empty());
    }
}
