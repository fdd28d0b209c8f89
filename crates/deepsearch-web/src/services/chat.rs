//! Relay from the orchestrator to an SSE response
//!
//! Each request gets its own task feeding a bounded channel. The response body
//! owns a drop guard for the request's cancellation token, so a client that
//! disconnects cancels the in-flight model stream and search call.

use std::convert::Infallible;
use std::time::Duration;

use async_stream::stream;
use axum::response::sse::Event;
use deepsearch_agents::{ChatOrchestrator, OrchestratorError};
use deepsearch_core::traits::ExecutionContext;
use deepsearch_core::{Message, OutputEvent};
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, error, info, warn};

/// The only failure text a client ever sees
pub const GENERIC_ERROR_MESSAGE: &str = "Oops, an error occured!";

/// Per-request relay limits
#[derive(Debug, Clone, Copy)]
pub struct RelaySettings {
    /// Deadline for the whole turn
    pub request_timeout: Duration,
    /// Capacity of the event channel
    pub channel_buffer: usize,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(60),
            channel_buffer: 64,
        }
    }
}

/// Receiving end of one chat turn
pub struct ChatRelay {
    events: mpsc::Receiver<OutputEvent>,
    guard: DropGuard,
    token: CancellationToken,
}

impl ChatRelay {
    /// Token cancelled when this relay is dropped
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Next event, or `None` once the turn has ended
    pub async fn recv(&mut self) -> Option<OutputEvent> {
        self.events.recv().await
    }

    /// SSE frames for the turn; dropping the stream cancels the turn
    pub fn into_sse_stream(self) -> impl Stream<Item = Result<Event, Infallible>> + Send {
        let ChatRelay {
            mut events, guard, ..
        } = self;
        stream! {
            let _guard = guard;
            while let Some(event) = events.recv().await {
                yield Ok(sse_event(&event));
            }
        }
    }
}

fn sse_event(event: &OutputEvent) -> Event {
    Event::default()
        .event(event.event_type())
        .data(serde_json::to_string(event).unwrap_or_default())
}

/// Start a chat turn in the background
///
/// The returned relay yields the turn's events in generation order, ending
/// with exactly one `done` or `error`. Orchestrator failures and the deadline
/// both become an `error` event carrying [`GENERIC_ERROR_MESSAGE`]; the
/// detail goes to the log only.
pub fn spawn_relay(
    orchestrator: &ChatOrchestrator,
    history: Vec<Message>,
    user_id: String,
    settings: RelaySettings,
) -> ChatRelay {
    let (tx, rx) = mpsc::channel(settings.channel_buffer.max(1));
    let token = CancellationToken::new();
    let context = ExecutionContext::new(token.clone()).with_user(user_id.clone());
    let mut turn = orchestrator.run(&history, context);
    let cancel = token.clone();
    let deadline = Instant::now() + settings.request_timeout;

    tokio::spawn(async move {
        debug!(%user_id, messages = history.len(), "Chat turn started");
        let timeout = settings.request_timeout;

        let failure = loop {
            let next = tokio::select! {
                biased;
                _ = tokio::time::sleep_until(deadline) => break Some(OrchestratorError::Timeout(timeout)),
                next = turn.next() => next,
            };

            let event = match next {
                Some(Ok(event)) => event,
                Some(Err(OrchestratorError::Cancelled)) if tx.is_closed() => {
                    info!(%user_id, "Chat turn cancelled by client disconnect");
                    break None;
                }
                Some(Err(e)) => break Some(e),
                None => {
                    break Some(OrchestratorError::Internal(
                        "stream ended without a terminal event".into(),
                    ))
                }
            };

            // a stalled reader is bounded by the same deadline
            let terminal = event.is_terminal();
            let sent = tokio::select! {
                biased;
                _ = tokio::time::sleep_until(deadline) => break Some(OrchestratorError::Timeout(timeout)),
                sent = tx.send(event) => sent,
            };
            if sent.is_err() {
                debug!(%user_id, "Client went away");
                cancel.cancel();
                break None;
            }
            if terminal {
                break None;
            }
        };

        match failure {
            None => {}
            Some(e @ OrchestratorError::Timeout(_)) => {
                warn!(%user_id, error = %e, "Chat turn timed out");
                cancel.cancel();
                if tx.try_send(OutputEvent::error(GENERIC_ERROR_MESSAGE)).is_err() {
                    debug!(%user_id, "Event channel full; timeout error not delivered");
                }
            }
            Some(e) => {
                error!(%user_id, error = %e, "Chat turn failed");
                let _ = tx.send(OutputEvent::error(GENERIC_ERROR_MESSAGE)).await;
            }
        }
    });

    ChatRelay {
        events: rx,
        guard: token.clone().drop_guard(),
        token,
    }
}
