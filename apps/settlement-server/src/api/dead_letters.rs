// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;
use utoipa::IntoParams;

use crate::{
    error::ApiError, models::DeadLetterListResponse, state::AppState, store::DeadLetterKind,
};

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct DeadLetterQuery {
    /// Only list entries of this kind.
    pub kind: Option<DeadLetterKind>,
}

/// Settlement steps that were acknowledged but could not complete.
#[utoipa::path(
    get,
    path = "/api/dead-letters",
    params(DeadLetterQuery),
    tag = "Settlement",
    responses(
        (status = 200, description = "Dead letters, newest first", body = DeadLetterListResponse)
    )
)]
pub async fn list_dead_letters(
    State(state): State<AppState>,
    Query(query): Query<DeadLetterQuery>,
) -> Json<DeadLetterListResponse> {
    let store = state.store.read().await;
    let dead_letters = match query.kind {
        Some(kind) => store.dead_letters_of(kind),
        None => store.dead_letters(),
    };
    Json(DeadLetterListResponse {
        total: dead_letters.len(),
        dead_letters,
    })
}

/// Mark a dead letter as handled.
#[utoipa::path(
    delete,
    path = "/api/dead-letters/{dead_letter_id}",
    params(
        ("dead_letter_id" = String, Path, description = "Identifier of the dead letter")
    ),
    tag = "Settlement",
    responses(
        (status = 204, description = "Acknowledged"),
        (status = 404, description = "No such dead letter")
    )
)]
pub async fn acknowledge_dead_letter(
    State(state): State<AppState>,
    Path(dead_letter_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let removed = state.store.write().await.acknowledge(&dead_letter_id);
    let letter = removed.ok_or_else(|| ApiError::not_found("Dead letter not found"))?;
    info!(id = %letter.id, kind = ?letter.kind, reference = %letter.reference, "dead letter acknowledged");
    Ok(StatusCode::NO_CONTENT)
}
