//! # deepsearch chat client
//!
//! Client side of the chat endpoint. [`ChatState`] holds the conversation and
//! a [`ChatStatus`]; [`reduce`] folds one streamed [`OutputEvent`] into it
//! without I/O. [`ChatClient`] owns the HTTP side and [`Renderer`] turns
//! events into terminal text.
//!
//! [`OutputEvent`]: deepsearch_core::OutputEvent

mod client;
mod error;
mod reducer;
mod render;
mod sse;
mod state;

pub use client::ChatClient;
pub use error::{ClientError, ClientResult};
pub use reducer::{apply_event, reduce};
pub use render::{sign_in_prompt, Renderer};
pub use sse::EventStreamDecoder;
pub use state::{ChatState, ChatStatus};
