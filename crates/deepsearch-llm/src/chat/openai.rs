//! OpenAI chat provider implementation
//!
//! Streams `/chat/completions` with `stream: true`. The body is SSE: one
//! `data: {json}` line per chunk, terminated by `data: [DONE]`.

use std::time::Duration;

use async_stream::stream;
use async_trait::async_trait;
use deepsearch_core::stream::{sse_data, LineBuffer};
use deepsearch_core::traits::{
    ChatCompletionChunk, ChatCompletionRequest, ChatMessageDelta, ChatProvider, FunctionCallDelta,
    LlmError, LlmMessage, LlmResult, MessageRole, ToolCallDelta,
};
use futures::stream::BoxStream;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

/// OpenAI chat provider
pub struct OpenAIChatProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    default_model: String,
    timeout: Duration,
}

impl OpenAIChatProvider {
    /// Create a new OpenAI provider
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        model: String,
        timeout_secs: u64,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: base_url
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string())
                .trim_end_matches('/')
                .to_string(),
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

        if let Some(temp) = request.temperature {
            api_request["temperature"] = json!(temp);
        }

        if let Some(max_tokens) = request.max_tokens {
            api_request["max_tokens"] = json!(max_tokens);
        }

        if let Some(tools) = &request.tools {
            let openai_tools: Vec<Value> = tools
                .iter()
                .map(|tool| {
                    json!({
                        "type": tool.r#type,
                        "function": {
                            "name": tool.function.name,
                            "description": tool.function.description,
                            "parameters": tool.function.parameters.clone().unwrap_or(json!({})),
                        }
                    })
                })
                .collect();
            api_request["tools"] = json!(openai_tools);
        }

        api_request
    }
}

fn message_to_json(m: &LlmMessage) -> Value {
    let mut msg = json!({
        "role": m.role.as_str(),
        "content": m.content,
    });

    if m.role == MessageRole::Tool {
        if let Some(tool_call_id) = &m.tool_call_id {
            msg["tool_call_id"] = json!(tool_call_id);
        }
    }

    if let Some(tool_calls) = &m.tool_calls {
        let calls: Vec<Value> = tool_calls
            .iter()
            .map(|tc| {
                json!({
                    "id": tc.id,
                    "type": tc.r#type,
                    "function": {
                        "name": tc.function.name,
                        "arguments": tc.function.arguments,
                    }
                })
            })
            .collect();
        msg["tool_calls"] = json!(calls);
    }

    msg
}

#[async_trait]
impl ChatProvider for OpenAIChatProvider {
    fn stream_chat<'a>(
        &'a self,
        request: ChatCompletionRequest,
    ) -> BoxStream<'a, LlmResult<ChatCompletionChunk>> {
        let api_request = self.build_request_body(&request);
        let url = format!("{}/chat/completions", self.base_url);

        Box::pin(stream! {
            debug!(url = %url, messages = request.messages.len(), "Starting OpenAI stream");
            let response = self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
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

            let mut body = res.bytes_stream();
            let mut buffer = LineBuffer::new();

            while let Some(chunk_result) = body.next().await {
                let bytes = match chunk_result {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        yield Err(LlmError::HttpError(e.to_string()));
                        return;
                    }
                };
                buffer.push(&bytes);

                while let Some(line) = buffer.next_line() {
                    let Some(data) = sse_data(&line) else {
                        continue;
                    };
                    if data == "[DONE]" {
                        return;
                    }
                    match serde_json::from_str::<OpenAIStreamChunk>(data) {
                        Ok(parsed) => {
                            for chunk in parsed.into_chunks() {
                                yield Ok(chunk);
                            }
                        }
                        Err(e) => {
                            warn!(error = %e, "Unparseable OpenAI stream chunk");
                            yield Err(LlmError::InvalidResponse(format!(
                                "Failed to parse stream chunk: {}",
                                e
                            )));
                            return;
                        }
                    }
                }
            }

            // Stream ended without [DONE]; compatible servers sometimes do this
            debug!("OpenAI stream closed without [DONE]");
        })
    }

    fn provider_name(&self) -> &str {
        "OpenAI"
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    async fn health_check(&self) -> LlmResult<bool> {
        let url = format!("{}/models", self.base_url);
        match self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .send()
            .await
        {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }
}

// OpenAI streaming response types
#[derive(Debug, Deserialize)]
struct OpenAIStreamChunk {
    #[serde(default)]
    choices: Vec<OpenAIStreamChoice>,
}

impl OpenAIStreamChunk {
    fn into_chunks(self) -> impl Iterator<Item = ChatCompletionChunk> {
        self.choices.into_iter().map(|choice| ChatCompletionChunk {
            index: choice.index,
            delta: ChatMessageDelta {
                role: choice.delta.role.as_deref().map(|r| match r {
                    "system" => MessageRole::System,
                    "user" => MessageRole::User,
                    "tool" => MessageRole::Tool,
                    _ => MessageRole::Assistant,
                }),
                content: choice.delta.content.filter(|c| !c.is_empty()),
                tool_calls: choice.delta.tool_calls.map(|calls| {
                    calls
                        .into_iter()
                        .map(|tc| ToolCallDelta {
                            index: tc.index,
                            id: tc.id,
                            function: tc.function.map(|f| FunctionCallDelta {
                                name: f.name,
                                arguments: f.arguments,
                            }),
                        })
                        .collect()
                }),
            },
            finish_reason: choice.finish_reason,
        })
    }
}

#[derive(Debug, Deserialize)]
struct OpenAIStreamChoice {
    #[serde(default)]
    index: u32,
    #[serde(default)]
    delta: OpenAIStreamDelta,
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OpenAIStreamDelta {
    role: Option<String>,
    content: Option<String>,
    tool_calls: Option<Vec<OpenAIToolCallDelta>>,
}

#[derive(Debug, Deserialize)]
struct OpenAIToolCallDelta {
    #[serde(default)]
    index: u32,
    id: Option<String>,
    function: Option<OpenAIFunctionDelta>,
}

#[derive(Debug, Deserialize)]
struct OpenAIFunctionDelta {
    name: Option<String>,
    arguments: Option<String>,
}
