// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Customer card storage through setup intents.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use tracing::info;

use crate::{
    error::ApiError,
    models::{
        present, ListCardsRequest, SaveCardRequest, SaveCardResponse, SetupIntentRequest,
        SetupIntentResponse,
    },
    providers::PaymentMethod,
    state::AppState,
};

fn customer_description(state: &AppState) -> String {
    format!("{} user", state.config.platform_name)
}

/// Start saving a card for an existing or new customer.
#[utoipa::path(
    post,
    path = "/api/setup-intent",
    tag = "Cards",
    request_body = SetupIntentRequest,
    responses(
        (status = 200, description = "Setup intent created", body = SetupIntentResponse),
        (status = 500, description = "Processor error")
    )
)]
pub async fn create_setup_intent(
    State(state): State<AppState>,
    body: Result<Option<Json<SetupIntentRequest>>, JsonRejection>,
) -> Result<Json<SetupIntentResponse>, ApiError> {
    let requested = body?.and_then(|Json(request)| present(request.customer_id));

    let customer_id = match requested {
        Some(customer_id) => customer_id,
        None => {
            state
                .processor
                .create_customer(&customer_description(&state), None)
                .await?
                .id
        }
    };

    let intent = state.processor.create_setup_intent(&customer_id).await?;
    info!(customer_id = %customer_id, setup_intent_id = %intent.id, "setup intent created");

    Ok(Json(SetupIntentResponse {
        client_secret: intent.client_secret,
        customer_id,
    }))
}

/// Cards stored on a customer.
#[utoipa::path(
    post,
    path = "/api/list-cards",
    tag = "Cards",
    request_body = ListCardsRequest,
    responses(
        (status = 200, description = "Stored cards", body = Vec<PaymentMethod>),
        (status = 400, description = "Missing customerId"),
        (status = 500, description = "Processor error")
    )
)]
pub async fn list_cards(
    State(state): State<AppState>,
    body: Result<Json<ListCardsRequest>, JsonRejection>,
) -> Result<Json<Vec<PaymentMethod>>, ApiError> {
    let Json(request) = body?;
    let customer_id =
        present(request.customer_id).ok_or_else(|| ApiError::bad_request("Missing customerId"))?;

    let methods = state
        .processor
        .list_card_payment_methods(&customer_id)
        .await?;
    Ok(Json(methods))
}

/// Create a customer for `email` and start saving a card for it.
#[utoipa::path(
    post,
    path = "/api/save-card",
    tag = "Cards",
    request_body = SaveCardRequest,
    responses(
        (status = 200, description = "Customer and setup intent created", body = SaveCardResponse),
        (status = 400, description = "Missing email"),
        (status = 500, description = "Processor error")
    )
)]
pub async fn save_card(
    State(state): State<AppState>,
    body: Result<Json<SaveCardRequest>, JsonRejection>,
) -> Result<Json<SaveCardResponse>, ApiError> {
    let Json(request) = body?;
    let email = present(request.email).ok_or_else(|| ApiError::bad_request("Missing email"))?;

    let customer = state
        .processor
        .create_customer(&customer_description(&state), Some(&email))
        .await?;
    let intent = state.processor.create_setup_intent(&customer.id).await?;

    Ok(Json(SaveCardResponse {
        client_secret: intent.client_secret,
        customer_id: customer.id,
    }))
}
