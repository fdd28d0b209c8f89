//! HTTP side of the chat client

use deepsearch_core::traits::User;
use deepsearch_core::OutputEvent;
use futures::StreamExt;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::error::{ClientError, ClientResult};
use crate::reducer::apply_event;
use crate::sse::EventStreamDecoder;
use crate::state::{ChatState, ChatStatus};

/// Shown when the stream ends without `done` or `error`
const CONNECTION_LOST: &str = "Connection to the server was lost";

#[derive(Debug, Deserialize)]
struct SessionResponse {
    user: Option<User>,
}

/// Chat client bound to one server and one credential
pub struct ChatClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
    session: Option<User>,
    state: ChatState,
}

impl ChatClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            session: None,
            state: ChatState::new(),
        }
    }

    pub fn state(&self) -> &ChatState {
        &self.state
    }

    pub fn status(&self) -> ChatStatus {
        self.state.status
    }

    pub fn user(&self) -> Option<&User> {
        self.session.as_ref()
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Ask the server who we are; `None` means signed out
    pub async fn check_session(&mut self) -> ClientResult<Option<User>> {
        let response = self
            .authorized(self.http.get(format!("{}/api/auth/session", self.base_url)))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ClientError::Status {
                status: response.status().as_u16(),
            });
        }
        let body: SessionResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Protocol(e.to_string()))?;
        self.session = body.user;
        debug!(signed_in = self.session.is_some(), "Session checked");
        Ok(self.session.clone())
    }

    /// Submit a user turn and stream the reply into the local state
    ///
    /// `on_event` sees each event after it has been applied. Without a session
    /// nothing is sent and [`ClientError::SignInRequired`] is returned.
    pub async fn submit<F>(&mut self, text: &str, mut on_event: F) -> ClientResult<()>
    where
        F: FnMut(&ChatState, &OutputEvent),
    {
        if self.session.is_none() {
            return Err(ClientError::SignInRequired);
        }
        if !self.state.status.accepts_input() {
            return Err(ClientError::Busy);
        }

        self.state.submit(text);
        let body = json!({ "messages": &self.state.messages });

        let response = match self
            .authorized(self.http.post(format!("{}/chat", self.base_url)))
            .json(&body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                self.state.status = ChatStatus::Error;
                return Err(e.into());
            }
        };

        match response.status() {
            StatusCode::UNAUTHORIZED => {
                self.session = None;
                self.state.status = ChatStatus::Error;
                return Err(ClientError::SignInRequired);
            }
            status if !status.is_success() => {
                self.state.status = ChatStatus::Error;
                return Err(ClientError::Status {
                    status: status.as_u16(),
                });
            }
            _ => {}
        }

        let mut decoder = EventStreamDecoder::new();
        let mut body = response.bytes_stream();
        let mut finished = false;

        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    warn!(error = %e, "Stream interrupted");
                    break;
                }
            };
            for decoded in decoder.push(&chunk) {
                match decoded {
                    Ok(event) => finished |= self.apply(&event, &mut on_event),
                    Err(e) => {
                        self.state.status = ChatStatus::Error;
                        return Err(e);
                    }
                }
            }
        }
        match decoder.finish() {
            Ok(Some(event)) => finished |= self.apply(&event, &mut on_event),
            Ok(None) => {}
            Err(e) => {
                self.state.status = ChatStatus::Error;
                return Err(e);
            }
        }

        if !finished {
            self.apply(&OutputEvent::error(CONNECTION_LOST), &mut on_event);
        }
        Ok(())
    }

    /// Apply one event; returns whether it ended the turn
    fn apply<F>(&mut self, event: &OutputEvent, on_event: &mut F) -> bool
    where
        F: FnMut(&ChatState, &OutputEvent),
    {
        apply_event(&mut self.state, event);
        on_event(&self.state, event);
        event.is_terminal()
    }
}
