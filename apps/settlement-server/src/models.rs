// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies of the REST API. Field names follow the
//! existing client contract, which mixes `snake_case` with a few camelCase
//! keys (`clientSecret`, `customerId`).
//!
//! Request fields are optional at the type level so that a missing field is
//! reported as a 400 with a static message rather than a deserialization
//! rejection.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    providers::{AccountLink, Invoice},
    store::DeadLetter,
};

/// Treats absent, blank and whitespace-only strings alike.
pub fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// =============================================================================
// Accounts
// =============================================================================

/// Connected accounts and onboarding links for a new driver/truck pair.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SetupAccountsResponse {
    pub driver_account_id: String,
    pub driver_link: AccountLink,
    pub truck_account_id: String,
    pub truck_link: AccountLink,
}

// =============================================================================
// Cards
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct SetupIntentRequest {
    /// Existing customer; a new one is created when omitted.
    #[serde(default)]
    pub customer_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SetupIntentResponse {
    #[serde(rename = "clientSecret")]
    pub client_secret: String,
    pub customer_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ListCardsRequest {
    #[serde(rename = "customerId", default)]
    pub customer_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct SaveCardRequest {
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SaveCardResponse {
    pub client_secret: String,
    pub customer_id: String,
}

// =============================================================================
// Checkout
// =============================================================================

/// How a checkout is recorded at the processor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutMode {
    /// Destination charge only.
    #[default]
    Direct,
    /// Destination charge plus a finalized invoice marked paid out of band
    /// and a receipt mail.
    Invoice,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    /// Amount in minor currency units.
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub payment_method_id: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub driver_account_id: Option<String>,
    #[serde(default)]
    pub truck_account_id: Option<String>,
    #[serde(default)]
    pub mode: CheckoutMode,
    /// Receipt recipient for invoice checkouts; defaults to the customer's email.
    #[serde(default)]
    pub receipt_email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CheckoutResponse {
    pub payment_intent_id: String,
    pub client_secret: Option<String>,
    pub platform_fee: i64,
    /// Paid to the trucking company once the payment settles.
    pub truck_company_share: i64,
    pub transfer_group: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice: Option<Invoice>,
    pub message: String,
}

// =============================================================================
// Dead letters
// =============================================================================

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DeadLetterListResponse {
    pub dead_letters: Vec<DeadLetter>,
    pub total: usize,
}
