use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::traits::{
    ChatCompletionChunk, ChatCompletionRequest, ChatProvider, LlmError, LlmResult, SearchError,
    SearchResult, ToolCallDelta, WebSearchProvider,
};

/// One model generation in a script
#[derive(Debug, Clone)]
pub enum ScriptedTurn {
    /// Plain text, streamed word by word, finishing with `stop`
    Text(String),
    /// A single tool call whose arguments arrive in two fragments
    ToolCall {
        id: Option<String>,
        name: String,
        arguments: String,
    },
    /// Raw chunks, emitted as given
    Chunks(Vec<ChatCompletionChunk>),
    /// The stream fails immediately
    Error(LlmError),
    /// The stream never yields
    Hang,
}

impl ScriptedTurn {
    pub fn text(text: impl Into<String>) -> Self {
        ScriptedTurn::Text(text.into())
    }

    pub fn tool_call(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        ScriptedTurn::ToolCall {
            id: Some(id.into()),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    fn into_chunks(self) -> Vec<LlmResult<ChatCompletionChunk>> {
        match self {
            ScriptedTurn::Text(text) => text
                .split_inclusive(' ')
                .map(|word| Ok(ChatCompletionChunk::text(word)))
                .chain(std::iter::once(Ok(ChatCompletionChunk::finish("stop"))))
                .collect(),
            ScriptedTurn::ToolCall { id, name, arguments } => {
                let split = arguments
                    .char_indices()
                    .map(|(i, _)| i)
                    .nth(arguments.chars().count() / 2)
                    .unwrap_or(arguments.len());
                let (head, tail) = arguments.split_at(split);

                let mut start = ToolCallDelta::start(0, id.unwrap_or_default(), name);
                if start.id.as_deref() == Some("") {
                    start.id = None;
                }
                vec![
                    Ok(ChatCompletionChunk::tool_calls(vec![start])),
                    Ok(ChatCompletionChunk::tool_calls(vec![ToolCallDelta::arguments(0, head)])),
                    Ok(ChatCompletionChunk::tool_calls(vec![ToolCallDelta::arguments(0, tail)])),
                    Ok(ChatCompletionChunk::finish("tool_calls")),
                ]
            }
            ScriptedTurn::Chunks(chunks) => chunks.into_iter().map(Ok).collect(),
            ScriptedTurn::Error(err) => vec![Err(err)],
            ScriptedTurn::Hang => Vec::new(),
        }
    }
}

/// Chat provider that replays a fixed script, one turn per request
#[derive(Clone, Default)]
pub struct ScriptedChatProvider {
    turns: Arc<Mutex<VecDeque<ScriptedTurn>>>,
    requests: Arc<Mutex<Vec<ChatCompletionRequest>>>,
    unhealthy: bool,
}

impl ScriptedChatProvider {
    pub fn new(turns: Vec<ScriptedTurn>) -> Self {
        Self {
            turns: Arc::new(Mutex::new(turns.into())),
            requests: Arc::default(),
            unhealthy: false,
        }
    }

    /// Report the backend as unreachable from `health_check`
    pub fn unhealthy(mut self) -> Self {
        self.unhealthy = true;
        self
    }

    /// Requests received so far, in order
    pub fn requests(&self) -> Vec<ChatCompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn remaining(&self) -> usize {
        self.turns.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatProvider for ScriptedChatProvider {
    fn stream_chat<'a>(
        &'a self,
        request: ChatCompletionRequest,
    ) -> BoxStream<'a, LlmResult<ChatCompletionChunk>> {
        self.requests.lock().unwrap().push(request);
        let turn = self.turns.lock().unwrap().pop_front();

        match turn {
            Some(ScriptedTurn::Hang) => stream::pending::<LlmResult<ChatCompletionChunk>>().boxed(),
            Some(turn) => stream::iter(turn.into_chunks()).boxed(),
            None => stream::iter(vec![Err(LlmError::InvalidResponse(
                "script exhausted".to_string(),
            ))])
            .boxed(),
        }
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn default_model(&self) -> &str {
        "scripted-model"
    }

    async fn health_check(&self) -> LlmResult<bool> {
        Ok(!self.unhealthy)
    }
}

/// Search provider returning fixed results
#[derive(Clone, Default)]
pub struct StaticSearchProvider {
    results: Vec<SearchResult>,
    calls: Arc<AtomicUsize>,
    queries: Arc<Mutex<Vec<String>>>,
}

impl StaticSearchProvider {
    pub fn new(results: Vec<SearchResult>) -> Self {
        Self {
            results,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl WebSearchProvider for StaticSearchProvider {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<SearchResult>, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.to_string());
        if cancel.is_cancelled() {
            return Err(SearchError::Cancelled);
        }
        Ok(self.results.iter().take(max_results).cloned().collect())
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// Search provider that always fails with an upstream status
#[derive(Clone)]
pub struct FailingSearchProvider {
    status: u16,
    calls: Arc<AtomicUsize>,
}

impl FailingSearchProvider {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            calls: Arc::default(),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WebSearchProvider for FailingSearchProvider {
    async fn search(
        &self,
        _query: &str,
        _max_results: usize,
        _cancel: &CancellationToken,
    ) -> Result<Vec<SearchResult>, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(SearchError::Upstream {
            status: self.status,
            body: "Service Unavailable".to_string(),
        })
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Search provider whose calls never complete on their own
#[derive(Clone, Default)]
pub struct HangingSearchProvider {
    calls: Arc<AtomicUsize>,
    aborted: Arc<AtomicUsize>,
}

impl HangingSearchProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Calls whose future was dropped by the caller
    pub fn aborted(&self) -> usize {
        self.aborted.load(Ordering::SeqCst)
    }
}

/// Counts a search future dropped before completion
struct AbortCounter(Arc<AtomicUsize>);

impl Drop for AbortCounter {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl WebSearchProvider for HangingSearchProvider {
    async fn search(
        &self,
        _query: &str,
        _max_results: usize,
        _cancel: &CancellationToken,
    ) -> Result<Vec<SearchResult>, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let _counter = AbortCounter(self.aborted.clone());
        std::future::pending().await
    }

    fn name(&self) -> &str {
        "hanging"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_tool_call_arguments_reassemble() {
        let provider = ScriptedChatProvider::new(vec![ScriptedTurn::tool_call(
            "call_1",
            "searchWeb",
            r#"{"query":"weather in Paris today"}"#,
        )]);

        let chunks: Vec<_> = provider
            .stream_chat(ChatCompletionRequest::new(vec![]))
            .collect()
            .await;

        let args: String = chunks
            .iter()
            .filter_map(|c| c.as_ref().ok())
            .filter_map(|c| c.delta.tool_calls.as_ref())
            .flatten()
            .filter_map(|d| d.function.as_ref()?.arguments.clone())
            .collect();
        assert_eq!(args, r#"{"query":"weather in Paris today"}"#);
        assert_eq!(provider.remaining(), 0);
    }

    #[tokio::test]
    async fn test_exhausted_script_errors() {
        let provider = ScriptedChatProvider::new(vec![]);
        let chunks: Vec<_> = provider
            .stream_chat(ChatCompletionRequest::new(vec![]))
            .collect()
            .await;
        assert!(matches!(chunks.as_slice(), [Err(LlmError::InvalidResponse(_))]));
    }
}
