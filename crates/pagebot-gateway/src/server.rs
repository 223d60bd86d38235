// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use pagebot_config::model::{MessengerConfig, ServerConfig};
use pagebot_core::PagebotError;
use pagebot_engine::Engine;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub engine: Arc<Engine>,
    /// Verify token and app secret for the Messenger webhook.
    pub messenger: Arc<MessengerConfig>,
}

impl GatewayState {
    pub fn new(engine: Arc<Engine>, messenger: MessengerConfig) -> Self {
        Self {
            engine,
            messenger: Arc::new(messenger),
        }
    }
}

/// All gateway routes.
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route(
            "/webhook",
            get(handlers::verify_webhook).post(handlers::receive_webhook),
        )
        .route("/api/webchat/message", post(handlers::post_webchat_message))
        .route("/api/webchat/messages", get(handlers::get_webchat_messages))
        .route("/api/pages/{page_id}/analytics", get(handlers::get_analytics))
        .route("/health", get(handlers::get_health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until `shutdown` resolves.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), PagebotError> {
    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| PagebotError::Channel {
            message: format!("failed to bind gateway to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| PagebotError::Channel {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })
}
