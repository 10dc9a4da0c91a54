// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Checkout: destination charge for the driver with the platform fee kept.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use crate::{
    error::ApiError,
    models::{present, CheckoutRequest, CheckoutResponse},
    settlement::{run_checkout, CheckoutOrder},
    state::AppState,
};

const MISSING_FIELDS: &str = "Missing required checkout fields";

/// Presence check only; ranges and formats are left to the processor.
impl TryFrom<CheckoutRequest> for CheckoutOrder {
    type Error = ApiError;

    fn try_from(request: CheckoutRequest) -> Result<Self, Self::Error> {
        let missing = || ApiError::bad_request(MISSING_FIELDS);
        Ok(Self {
            amount: request.amount.ok_or_else(missing)?,
            currency: present(request.currency).ok_or_else(missing)?,
            payment_method_id: present(request.payment_method_id).ok_or_else(missing)?,
            customer_id: present(request.customer_id).ok_or_else(missing)?,
            driver_account_id: present(request.driver_account_id).ok_or_else(missing)?,
            truck_account_id: present(request.truck_account_id).ok_or_else(missing)?,
            mode: request.mode,
            receipt_email: present(request.receipt_email),
        })
    }
}

/// Charge a customer for a delivery.
///
/// With `"mode": "invoice"` the charge is also recorded on a finalized
/// invoice that is marked paid out of band, and a receipt is mailed in the
/// background. Steps already accepted by the processor are not undone when
/// a later one fails.
#[utoipa::path(
    post,
    path = "/api/checkout",
    tag = "Checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Payment created", body = CheckoutResponse),
        (status = 400, description = "Missing required fields or unreadable body"),
        (status = 500, description = "Processor error")
    )
)]
pub async fn checkout(
    State(state): State<AppState>,
    body: Result<Json<CheckoutRequest>, JsonRejection>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let Json(request) = body?;
    let order = CheckoutOrder::try_from(request)?;
    let outcome = run_checkout(&state, order).await?;
    // The receipt task is detached; its failures end up in the dead-letter ledger.
    drop(outcome.receipt);
    Ok(Json(outcome.response))
}
