// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway API.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use pagebot_core::{Channel, StorageAdapter};
use pagebot_core::types::{InboundEvent, PageRef};
use pagebot_messenger::{SIGNATURE_HEADER, WebhookPayload, verify_signature, verify_subscription};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::server::GatewayState;

/// Days covered by the analytics time series.
const ANALYTICS_DAYS: u32 = 7;

#[derive(Debug, Deserialize)]
pub struct SubscriptionQuery {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

/// Body of `POST /api/webchat/message`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebchatMessageRequest {
    pub page_id: String,
    pub user_id: String,
    pub text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebchatHistoryQuery {
    pub page_id: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// GET /webhook
///
/// Messenger subscription handshake. Without `hub.mode` and
/// `hub.verify_token` this is a liveness ping.
pub async fn verify_webhook(
    State(state): State<GatewayState>,
    Query(query): Query<SubscriptionQuery>,
) -> Response {
    if query.mode.is_none() || query.verify_token.is_none() {
        return (StatusCode::OK, "Webhook is running").into_response();
    }
    match verify_subscription(
        query.mode.as_deref(),
        query.verify_token.as_deref(),
        query.challenge.as_deref(),
        &state.messenger.verify_token,
    ) {
        Some(challenge) => {
            info!("webhook subscription verified");
            (StatusCode::OK, challenge).into_response()
        }
        None => {
            warn!("webhook subscription verification failed");
            StatusCode::FORBIDDEN.into_response()
        }
    }
}

/// POST /webhook
///
/// Messenger event delivery. Events are processed before responding.
pub async fn receive_webhook(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Some(secret) = state.messenger.app_secret.as_deref() {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok());
        if !verify_signature(secret, signature, &body) {
            warn!("rejecting webhook with missing or invalid signature");
            return StatusCode::UNAUTHORIZED.into_response();
        }
    }

    let payload: WebhookPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "malformed webhook body");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };
    if !payload.is_page_object() {
        debug!(object = payload.object.as_str(), "ignoring non-page webhook");
        return StatusCode::NOT_FOUND.into_response();
    }

    let events = payload.events();
    debug!(count = events.len(), "webhook events received");
    state.engine.handle_batch(events).await;
    (StatusCode::OK, "EVENT_RECEIVED").into_response()
}

/// POST /api/webchat/message
pub async fn post_webchat_message(
    State(state): State<GatewayState>,
    Json(body): Json<WebchatMessageRequest>,
) -> Response {
    let storage = state.engine.storage();
    let page = match storage.get_page(&body.page_id).await {
        Ok(Some(page)) => page,
        Ok(None) => return error_response(StatusCode::NOT_FOUND, "Page not found"),
        Err(e) => {
            error!(error = %e, "failed to load page");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load page");
        }
    };
    if !page.is_active {
        return error_response(StatusCode::BAD_REQUEST, "Page is inactive");
    }
    match storage.get_tenant(&page.owner_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return error_response(StatusCode::NOT_FOUND, "User not found"),
        Err(e) => {
            error!(error = %e, "failed to load page owner");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load page");
        }
    }

    let outcome = state
        .engine
        .handle_event(InboundEvent {
            channel: Channel::Webchat,
            page: PageRef::Id(page.id),
            sender_id: body.user_id,
            text: body.text,
        })
        .await;
    debug!(?outcome, "webchat message handled");
    Json(json!({ "success": true })).into_response()
}

/// GET /api/webchat/messages?pageId=&userId=
pub async fn get_webchat_messages(
    State(state): State<GatewayState>,
    Query(query): Query<WebchatHistoryQuery>,
) -> Response {
    let (Some(page_id), Some(user_id)) = (query.page_id, query.user_id) else {
        return error_response(StatusCode::BAD_REQUEST, "Missing pageId or userId");
    };
    match state
        .engine
        .storage()
        .list_messages(&page_id, &user_id, Channel::Webchat)
        .await
    {
        Ok(messages) => Json(messages).into_response(),
        Err(e) => {
            error!(error = %e, "failed to list webchat messages");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch messages")
        }
    }
}

/// GET /api/pages/{page_id}/analytics
pub async fn get_analytics(
    State(state): State<GatewayState>,
    Path(page_id): Path<String>,
) -> Response {
    match state.engine.storage().analytics(&page_id, ANALYTICS_DAYS).await {
        Ok(summary) => Json(summary).into_response(),
        Err(e) => {
            error!(page_id = page_id.as_str(), error = %e, "failed to compute analytics");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch analytics")
        }
    }
}

/// GET /health
pub async fn get_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
