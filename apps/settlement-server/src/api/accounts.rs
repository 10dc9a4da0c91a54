// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Connected account provisioning for drivers and trucking companies.

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::info;

use crate::{
    error::ApiError,
    models::SetupAccountsResponse,
    providers::{AccountLink, Balance, PayeeRole, ProcessorError},
    state::AppState,
};

/// A freshly created payee and its onboarding link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payee {
    pub account_id: String,
    pub onboarding_link: AccountLink,
}

/// Create a connected account for `role` and request its onboarding link.
///
/// No local validation and no retry: processor errors are returned as is.
pub async fn create_payee(state: &AppState, role: PayeeRole) -> Result<Payee, ProcessorError> {
    let account = state.processor.create_account(role).await?;
    let onboarding = &state.config.onboarding;
    let onboarding_link = state
        .processor
        .create_account_link(&account.id, &onboarding.refresh_url, &onboarding.return_url)
        .await?;

    info!(account_id = %account.id, role = role.as_str(), "payee provisioned");
    Ok(Payee {
        account_id: account.id,
        onboarding_link,
    })
}

/// Create a driver and a trucking company account with onboarding links.
#[utoipa::path(
    post,
    path = "/api/setup-accounts",
    tag = "Accounts",
    responses(
        (status = 200, description = "Accounts created", body = SetupAccountsResponse),
        (status = 500, description = "Processor error")
    )
)]
pub async fn setup_accounts(
    State(state): State<AppState>,
) -> Result<Json<SetupAccountsResponse>, ApiError> {
    let driver = create_payee(&state, PayeeRole::Driver).await?;
    let truck = create_payee(&state, PayeeRole::TruckingCompany).await?;

    Ok(Json(SetupAccountsResponse {
        driver_account_id: driver.account_id,
        driver_link: driver.onboarding_link,
        truck_account_id: truck.account_id,
        truck_link: truck.onboarding_link,
    }))
}

/// Balance held by a connected account.
#[utoipa::path(
    get,
    path = "/api/accounts/{account_id}/balance",
    tag = "Accounts",
    params(
        ("account_id" = String, Path, description = "Connected account ID")
    ),
    responses(
        (status = 200, description = "Account balance", body = Balance),
        (status = 500, description = "Processor error")
    )
)]
pub async fn account_balance(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> Result<Json<Balance>, ApiError> {
    let balance = state.processor.retrieve_balance(&account_id).await?;
    Ok(Json(balance))
}
