// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    fees::FeePolicy,
    models::{
        CheckoutMode, CheckoutRequest, CheckoutResponse, DeadLetterListResponse,
        ListCardsRequest, SaveCardRequest, SaveCardResponse, SetupAccountsResponse,
        SetupIntentRequest, SetupIntentResponse,
    },
    providers::{
        AccountLink, Balance, BalanceAmount, CardDetails, Invoice, PayeeRole, PaymentMethod,
    },
    state::AppState,
    store::{DeadLetter, DeadLetterKind},
};

pub mod accounts;
pub mod cards;
pub mod checkout;
pub mod dead_letters;
pub mod health;
pub mod webhook;

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/setup-accounts", post(accounts::setup_accounts))
        .route(
            "/accounts/{account_id}/balance",
            get(accounts::account_balance),
        )
        .route("/setup-intent", post(cards::create_setup_intent))
        .route("/list-cards", post(cards::list_cards))
        .route("/save-card", post(cards::save_card))
        .route("/checkout", post(checkout::checkout))
        .route("/dead-letters", get(dead_letters::list_dead_letters))
        .route(
            "/dead-letters/{dead_letter_id}",
            delete(dead_letters::acknowledge_dead_letter),
        );

    Router::new()
        .route("/", get(health::index))
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/webhook", post(webhook::receive_webhook))
        .nest("/api", api_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::index,
        health::health,
        health::liveness,
        webhook::receive_webhook,
        accounts::setup_accounts,
        accounts::account_balance,
        cards::create_setup_intent,
        cards::list_cards,
        cards::save_card,
        checkout::checkout,
        dead_letters::list_dead_letters,
        dead_letters::acknowledge_dead_letter
    ),
    components(
        schemas(
            AccountLink,
            Balance,
            BalanceAmount,
            CardDetails,
            CheckoutMode,
            CheckoutRequest,
            CheckoutResponse,
            DeadLetter,
            DeadLetterKind,
            DeadLetterListResponse,
            FeePolicy,
            health::HealthChecks,
            health::HealthResponse,
            health::ReadyResponse,
            Invoice,
            ListCardsRequest,
            PayeeRole,
            PaymentMethod,
            SaveCardRequest,
            SaveCardResponse,
            SetupAccountsResponse,
            SetupIntentRequest,
            SetupIntentResponse
        )
    ),
    tags(
        (name = "Health", description = "Liveness and configuration checks"),
        (name = "Accounts", description = "Driver and trucking company onboarding"),
        (name = "Cards", description = "Customer card storage"),
        (name = "Checkout", description = "Delivery payments"),
        (name = "Webhook", description = "Processor notifications"),
        (name = "Settlement", description = "Settlement follow-up")
    )
)]
pub struct ApiDoc;
