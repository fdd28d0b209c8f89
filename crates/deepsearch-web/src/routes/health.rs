//! Health check endpoints

use axum::extract::State;
use axum::http::StatusCode;
use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

use crate::state::AppState;

pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "deepsearch-web"
    }))
}

/// Ready once the model backend answers; 503 otherwise
async fn ready_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let (code, status) = if state.orchestrator.provider_ready().await {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
    };
    (
        code,
        Json(json!({
            "status": status,
            "provider": state.orchestrator.provider_name(),
            "maxSteps": state.orchestrator.max_steps(),
        })),
    )
}
