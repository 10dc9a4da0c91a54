// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

/// Health check response with individual component status.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    /// Overall health status ("ok" or "degraded").
    pub status: String,
    /// Individual health checks and their results.
    pub checks: HealthChecks,
}

/// Configuration checks. Each is "ok" or "missing".
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthChecks {
    /// Whether the service process is running.
    pub service: String,
    /// Payment processor secret key.
    pub processor: String,
    /// Webhook shared secret.
    pub webhook_secret: String,
    /// SMTP relay settings for receipts.
    pub smtp: String,
}

/// Simple health check response for liveness checks.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

fn check(configured: bool) -> String {
    if configured { "ok" } else { "missing" }.to_string()
}

/// Liveness string on the root path.
#[utoipa::path(
    get,
    path = "/",
    tag = "Health",
    responses(
        (status = 200, description = "Service banner", body = String)
    )
)]
pub async fn index(State(state): State<AppState>) -> String {
    format!("{} Destination Charge Server", state.config.platform_name)
}

/// Health check endpoint handler.
///
/// Returns 200 when every collaborator is configured, 503 otherwise.
/// Missing configuration does not stop the process; affected calls fail
/// when they are first made.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = ReadyResponse),
        (status = 503, description = "Service is degraded", body = ReadyResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let config = &state.config;
    let processor_ok = config.processor.secret_key.is_some();
    let webhook_ok = config.webhook_secret.is_some();
    let smtp_ok = config.smtp.is_configured();
    let all_ok = processor_ok && webhook_ok && smtp_ok;

    let response = ReadyResponse {
        status: if all_ok { "ok" } else { "degraded" }.to_string(),
        checks: HealthChecks {
            service: "ok".to_string(),
            processor: check(processor_ok),
            webhook_secret: check(webhook_ok),
            smtp: check(smtp_ok),
        },
    };

    let status = if all_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}

/// Liveness check handler.
///
/// Always returns 200 if the process is running.
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    )
)]
pub async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
