// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Processor notifications.
//!
//! The processor retries deliveries that are not answered with a 2xx, so
//! every verified event is acknowledged with 200, including the ones whose
//! settlement step could not complete (those are dead-lettered instead).

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use tracing::{error, info, warn};

use crate::{
    providers::{
        signature::{verify_signature, DEFAULT_TOLERANCE_SECS, SIGNATURE_HEADER},
        WebhookEvent,
    },
    settlement::settle_event,
    state::AppState,
};

/// Receive a signed processor event.
#[utoipa::path(
    post,
    path = "/webhook",
    tag = "Webhook",
    request_body(content = String, content_type = "application/json", description = "Raw signed event"),
    params(
        ("stripe-signature" = String, Header, description = "Processor signature header")
    ),
    responses(
        (status = 200, description = "Event processed or ignored"),
        (status = 400, description = "Signature verification failed"),
        (status = 500, description = "Webhook secret not configured")
    )
)]
pub async fn receive_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(secret) = state.config.webhook_secret.as_deref() else {
        error!("WEBHOOK_SECRET is not configured");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Webhook Error: WEBHOOK_SECRET is not configured",
        )
            .into_response();
    };

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());
    if let Err(err) = verify_signature(
        &body,
        signature,
        secret,
        Utc::now().timestamp(),
        DEFAULT_TOLERANCE_SECS,
    ) {
        warn!(error = %err, "webhook verification failed");
        return (StatusCode::BAD_REQUEST, format!("Webhook Error: {err}")).into_response();
    }

    let event: WebhookEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(err) => {
            warn!(error = %err, "webhook payload is not an event");
            return (StatusCode::BAD_REQUEST, format!("Webhook Error: {err}")).into_response();
        }
    };

    let event_id = event.id.clone();
    let outcome = settle_event(&state, event).await;
    info!(event_id = %event_id, outcome = ?outcome, "webhook handled");

    (StatusCode::OK, "OK").into_response()
}
