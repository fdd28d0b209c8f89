//! Session lookup for clients deciding whether to show a sign-in prompt

use axum::extract::State;
use axum::http::HeaderMap;
use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

use crate::auth::resolve_user;
use crate::state::AppState;

pub fn session_routes() -> Router<AppState> {
    Router::new().route("/api/auth/session", get(get_session))
}

/// `{ "user": {...} }` for a valid session, `{}` otherwise
async fn get_session(State(state): State<AppState>, headers: HeaderMap) -> Json<Value> {
    match resolve_user(state.sessions.as_ref(), &headers).await {
        Some(user) => Json(json!({ "user": user })),
        None => Json(json!({})),
    }
}
