//! Ollama chat provider implementation
//!
//! Streams `/api/chat`. The body is NDJSON, one object per line. Ollama sends
//! tool calls whole, with parsed-object arguments and usually without ids.

use std::time::Duration;

use async_stream::stream;
use async_trait::async_trait;
use deepsearch_core::stream::LineBuffer;
use deepsearch_core::traits::{
    ChatCompletionChunk, ChatCompletionRequest, ChatMessageDelta, ChatProvider, FunctionCallDelta,
    LlmError, LlmMessage, LlmResult, MessageRole, ToolCallDelta,
};
use futures::stream::BoxStream;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};
use uuid::Uuid;

/// Ollama chat provider
pub struct OllamaChatProvider {
    client: reqwest::Client,
    base_url: String,
    default_model: String,
    timeout: Duration,
}

impl OllamaChatProvider {
    /// Create a new Ollama provider
    pub fn new(base_url: String, model: String, timeout_secs: u64) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            default_model: model,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    fn build_request_body(&self, request: &ChatCompletionRequest) -> Value {
        let model = request.model.as_deref().unwrap_or(&self.default_model);
        let mut api_request = json!({
            "model": model,
            "messages": request.messages.iter().map(message_to_json).collect::<Vec<_>>(),
            "stream": true,
        });

        let mut options = serde_json::Map::new();
        if let Some(temp) = request.temperature {
            options.insert("temperature".to_string(), json!(temp));
        }
        if let Some(max_tokens) = request.max_tokens {
            options.insert("num_predict".to_string(), json!(max_tokens));
        }
        if !options.is_empty() {
            api_request["options"] = Value::Object(options);
        }

        if let Some(tools) = &request.tools {
            let ollama_tools: Vec<Value> = tools
                .iter()
                .map(|tool| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": tool.function.name,
                            "description": tool.function.description,
                            "parameters": tool.function.parameters.clone().unwrap_or(json!({})),
                        }
                    })
                })
                .collect();
            api_request["tools"] = json!(ollama_tools);
        }

        api_request
    }
}

fn message_to_json(m: &LlmMessage) -> Value {
    let mut msg = json!({
        "role": m.role.as_str(),
        "content": m.content,
    });

    // Ollama wants arguments as an object, not a JSON string
    if let Some(tool_calls) = &m.tool_calls {
        let calls: Vec<Value> = tool_calls
            .iter()
            .map(|tc| {
                let arguments: Value =
                    serde_json::from_str(&tc.function.arguments).unwrap_or_else(|_| json!({}));
                json!({
                    "function": {
                        "name": tc.function.name,
                        "arguments": arguments,
                    }
                })
            })
            .collect();
        msg["tool_calls"] = json!(calls);
    }

    msg
}

#[async_trait]
impl ChatProvider for OllamaChatProvider {
    fn stream_chat<'a>(
        &'a self,
        request: ChatCompletionRequest,
    ) -> BoxStream<'a, LlmResult<ChatCompletionChunk>> {
        let api_request = self.build_request_body(&request);
        let url = format!("{}/api/chat", self.base_url);

        Box::pin(stream! {
            debug!(url = %url, messages = request.messages.len(), "Starting Ollama stream");
            let response = self
                .client
                .post(&url)
                .json(&api_request)
                .timeout(self.timeout)
                .send()
                .await;

            let res = match response {
                Ok(res) if res.status().is_success() => res,
                Ok(res) => {
                    let status = res.status().as_u16();
                    let message = res.text().await.unwrap_or_default();
                    yield Err(LlmError::Api { status, message });
                    return;
                }
                Err(e) => {
                    yield Err(LlmError::HttpError(e.to_string()));
                    return;
                }
            };

            let mut body = res.bytes_stream().fuse();
            let mut buffer = LineBuffer::new();
            let mut tool_index = 0u32;
            let mut finished = false;

            loop {
                let line = match buffer.next_line() {
                    Some(line) => line,
                    None => match body.next().await {
                        Some(Ok(bytes)) => {
                            buffer.push(&bytes);
                            continue;
                        }
                        Some(Err(e)) => {
                            yield Err(LlmError::HttpError(e.to_string()));
                            return;
                        }
                        None => match buffer.finish() {
                            Some(tail) => tail,
                            None => break,
                        },
                    },
                };

                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let stream_resp = match serde_json::from_str::<OllamaStreamResponse>(line) {
                    Ok(resp) => resp,
                    Err(e) => {
                        warn!(error = %e, "Unparseable Ollama stream line");
                        yield Err(LlmError::InvalidResponse(format!(
                            "Failed to parse stream: {}",
                            e
                        )));
                        return;
                    }
                };

                if let Some(error) = &stream_resp.error {
                    yield Err(LlmError::InvalidResponse(error.clone()));
                    return;
                }

                let (chunk, calls) = stream_resp.into_chunk(&mut tool_index);
                if calls > 0 {
                    debug!(calls, "Ollama emitted tool calls");
                }
                finished = chunk.finish_reason.is_some();
                yield Ok(chunk);
                if finished {
                    break;
                }
            }

            if !finished {
                debug!("Ollama stream closed without done=true");
            }
        })
    }

    fn provider_name(&self) -> &str {
        "Ollama"
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    async fn health_check(&self) -> LlmResult<bool> {
        let url = format!("{}/api/tags", self.base_url);
        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }
}

// Ollama streaming response types
#[derive(Debug, Deserialize)]
struct OllamaStreamResponse {
    #[serde(default)]
    message: Option<OllamaStreamMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    done_reason: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl OllamaStreamResponse {
    /// Convert to a chunk, assigning each tool call the next free index
    ///
    /// Returns the number of tool calls in this line. Ollama reports
    /// `done_reason: "stop"` even after tool calls, so the finish reason is
    /// rewritten to `tool_calls` when any were seen.
    fn into_chunk(self, tool_index: &mut u32) -> (ChatCompletionChunk, usize) {
        let message = self.message.unwrap_or_default();
        let start = *tool_index;

        let tool_calls: Option<Vec<ToolCallDelta>> = message.tool_calls.map(|calls| {
            calls
                .into_iter()
                .enumerate()
                .map(|(idx, tc)| ToolCallDelta {
                    index: start + idx as u32,
                    id: Some(tc.id.unwrap_or_else(|| format!("call_{}", Uuid::new_v4().simple()))),
                    function: Some(FunctionCallDelta {
                        name: Some(tc.function.name),
                        arguments: Some(tc.function.arguments.to_string()),
                    }),
                })
                .collect()
        });
        let calls = tool_calls.as_ref().map_or(0, Vec::len);
        *tool_index += calls as u32;

        let finish_reason = if self.done {
            if *tool_index > 0 {
                Some("tool_calls".to_string())
            } else {
                self.done_reason.or(Some("stop".to_string()))
            }
        } else {
            None
        };

        let chunk = ChatCompletionChunk {
            index: 0,
            delta: ChatMessageDelta {
                role: message.role.as_deref().map(|r| match r {
                    "system" => MessageRole::System,
                    "user" => MessageRole::User,
                    "tool" => MessageRole::Tool,
                    _ => MessageRole::Assistant,
                }),
                content: Some(message.content).filter(|c| !c.is_empty()),
                tool_calls,
            },
            finish_reason,
        };
        (chunk, calls)
    }
}

#[derive(Debug, Default, Deserialize)]
struct OllamaStreamMessage {
    role: Option<String>,
    #[serde(default)]
    content: String,
    #[serde(default)]
    tool_calls: Option<Vec<OllamaToolCall>>,
}

#[derive(Debug, Deserialize)]
struct OllamaToolCall {
    id: Option<String>,
    function: OllamaFunction,
}

#[derive(Debug, Deserialize)]
struct OllamaFunction {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use deepsearch_core::traits::ToolCall;

    #[test]
    fn test_ollama_provider_creation() {
        let provider = OllamaChatProvider::new(
            "http://localhost:11434/".to_string(),
            "llama3.2".to_string(),
            120,
        );

        assert_eq!(provider.provider_name(), "Ollama");
        assert_eq!(provider.default_model(), "llama3.2");
        assert_eq!(provider.base_url, "http://localhost:11434");
    }

    #[test]
    fn test_tool_call_arguments_sent_as_object() {
        let msg = LlmMessage::assistant_with_tools(
            "",
            vec![ToolCall::new("call_1", "searchWeb", r#"{"query":"paris"}"#)],
        );
        let value = message_to_json(&msg);
        assert_eq!(
            value["tool_calls"][0]["function"]["arguments"],
            json!({"query": "paris"})
        );
    }

    #[test]
    fn test_options_only_when_set() {
        let provider =
            OllamaChatProvider::new("http://localhost:11434".into(), "llama3.2".into(), 60);

        let bare = provider.build_request_body(&ChatCompletionRequest::new(vec![]));
        assert!(bare.get("options").is_none());

        let tuned = provider.build_request_body(
            &ChatCompletionRequest::new(vec![]).with_max_tokens(Some(256)),
        );
        assert_eq!(tuned["options"]["num_predict"], 256);
    }

    #[test]
    fn test_missing_ids_are_generated_and_indices_advance() {
        let line = r#"{"message":{"role":"assistant","content":"","tool_calls":[{"function":{"name":"searchWeb","arguments":{"query":"a"}}},{"function":{"name":"searchWeb","arguments":{"query":"b"}}}]},"done":false}"#;
        let resp: OllamaStreamResponse = serde_json::from_str(line).unwrap();

        let mut tool_index = 0;
        let (chunk, calls) = resp.into_chunk(&mut tool_index);

        assert_eq!(calls, 2);
        assert_eq!(tool_index, 2);
        let deltas = chunk.delta.tool_calls.unwrap();
        assert_eq!(deltas[1].index, 1);
        assert!(deltas[0].id.as_deref().unwrap().starts_with("call_"));
        assert_ne!(deltas[0].id, deltas[1].id);
    }

    #[test]
    fn test_done_after_tool_calls_reports_tool_calls() {
        let resp: OllamaStreamResponse =
            serde_json::from_str(r#"{"message":{"role":"assistant","content":""},"done":true,"done_reason":"stop"}"#)
                .unwrap();
        let mut tool_index = 1;
        let (chunk, _) = resp.into_chunk(&mut tool_index);
        assert_eq!(chunk.finish_reason.as_deref(), Some("tool_calls"));
    }
}
