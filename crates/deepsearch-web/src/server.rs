use crate::routes::{chat_routes, health_routes, session_routes};
use crate::state::AppState;
use crate::{Result, WebError};
use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::Router;
use deepsearch_config::{AppConfig, ServerConfig};
use std::net::SocketAddr;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

const MAX_BODY_SIZE_10MB: usize = 10 * 1024 * 1024;

/// Assemble the application router
pub fn build_router(state: AppState, config: &ServerConfig) -> Result<Router> {
    let origins = if config.allowed_origins.is_empty() {
        AllowOrigin::any()
    } else {
        let list = config
            .allowed_origins
            .iter()
            .map(|origin| {
                HeaderValue::from_str(origin)
                    .map_err(|e| WebError::Config(format!("Invalid origin {origin}: {e}")))
            })
            .collect::<Result<Vec<_>>>()?;
        AllowOrigin::list(list)
    };

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Ok(Router::new()
        .merge(chat_routes())
        .merge(session_routes())
        .merge(health_routes())
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE_10MB))
        .layer(TraceLayer::new_for_http())
        .layer(cors))
}

pub async fn start_server(config: &AppConfig) -> Result<()> {
    let state = AppState::from_config(config)?;
    let app = build_router(state, &config.server)?;

    let addr: SocketAddr = config
        .server
        .bind_address()
        .parse()
        .map_err(|e| WebError::Config(format!("Invalid address: {e}")))?;

    tracing::info!("Starting web server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(WebError::Io)?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(WebError::Io)?;

    tracing::info!("Web server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
