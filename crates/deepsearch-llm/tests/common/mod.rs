//! Shared helpers for provider streaming tests

#![allow(dead_code)]

use std::collections::BTreeMap;

use deepsearch_core::traits::{ChatCompletionChunk, LlmError, LlmResult};
use futures::stream::BoxStream;
use futures::StreamExt;

/// Concatenated text content, or the first error
pub async fn collect_stream_content(
    mut stream: BoxStream<'_, LlmResult<ChatCompletionChunk>>,
) -> LlmResult<String> {
    let mut content = String::new();
    while let Some(chunk) = stream.next().await {
        if let Some(text) = chunk?.delta.content {
            content.push_str(&text);
        }
    }
    Ok(content)
}

/// Text collected before the stream failed, plus the error if any
pub async fn collect_stream_with_error(
    mut stream: BoxStream<'_, LlmResult<ChatCompletionChunk>>,
) -> (String, Option<LlmError>) {
    let mut content = String::new();
    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(chunk) => {
                if let Some(text) = chunk.delta.content {
                    content.push_str(&text);
                }
            }
            Err(e) => return (content, Some(e)),
        }
    }
    (content, None)
}

/// Tool call accumulated from deltas
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CollectedCall {
    pub id: Option<String>,
    pub name: String,
    pub arguments: String,
}

/// Tool calls reassembled by index, plus the last finish reason
pub async fn collect_tool_calls(
    mut stream: BoxStream<'_, LlmResult<ChatCompletionChunk>>,
) -> (Vec<CollectedCall>, Option<String>) {
    let mut calls: BTreeMap<u32, CollectedCall> = BTreeMap::new();
    let mut finish = None;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.expect("stream chunk");
        if chunk.finish_reason.is_some() {
            finish = chunk.finish_reason.clone();
        }
        for delta in chunk.delta.tool_calls.unwrap_or_default() {
            let entry = calls.entry(delta.index).or_default();
            if delta.id.is_some() {
                entry.id = delta.id;
            }
            if let Some(function) = delta.function {
                if let Some(name) = function.name {
                    entry.name.push_str(&name);
                }
                if let Some(arguments) = function.arguments {
                    entry.arguments.push_str(&arguments);
                }
            }
        }
    }
    (calls.into_values().collect(), finish)
}

/// SSE body from JSON payloads, terminated with `[DONE]`
pub fn sse_body(payloads: &[&str]) -> String {
    let mut body: String = payloads
        .iter()
        .map(|p| format!("data: {}\n\n", p))
        .collect();
    body.push_str("data: [DONE]\n\n");
    body
}
