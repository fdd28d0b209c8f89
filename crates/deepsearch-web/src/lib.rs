//! # deepsearch web transport
//!
//! Axum routes for the chat assistant. `POST /chat` authenticates the caller,
//! parses the conversation and relays the orchestrator's events as
//! server-sent events until a terminal `done` or `error`.

pub mod auth;
pub mod routes;
pub mod server;
pub mod services;
pub mod state;

mod error;

pub use auth::{
    create_session_resolver, credentials_from_headers, AuthenticatedUser, HttpSessionResolver,
    StaticTokenResolver,
};
pub use error::{Result, WebError};
pub use server::{build_router, start_server};
pub use services::{spawn_relay, ChatRelay, RelaySettings, GENERIC_ERROR_MESSAGE};
pub use state::AppState;
