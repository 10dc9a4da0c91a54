// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Payment Processor Port
//!
//! The processor is the system of record for accounts, payments, invoices
//! and transfers. This module defines the operations the service sequences
//! ([`PaymentProcessor`]), the payloads exchanged with it, and the Stripe
//! implementation. Nothing returned here is persisted locally.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod signature;
pub mod stripe;

#[cfg(test)]
pub mod mock;

pub use stripe::StripeClient;

#[derive(Debug, thiserror::Error)]
pub enum ProcessorError {
    #[error("payment processor configuration missing: {0}")]
    MissingConfig(String),

    #[error("payment processor request failed: {0}")]
    Request(String),

    /// The processor rejected the call; `message` is its own text.
    #[error("payment processor returned {status}: {message}")]
    Api { status: u16, message: String },

    /// An id that cannot be used as a single URL path segment.
    #[error("{0}")]
    InvalidIdentifier(String),

    #[error("payment processor response was invalid: {0}")]
    InvalidResponse(String),
}

/// Role a connected payee plays in an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PayeeRole {
    Driver,
    TruckingCompany,
}

impl PayeeRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayeeRole::Driver => "driver",
            PayeeRole::TruckingCompany => "trucking_company",
        }
    }

    /// Legal form used when creating the connected account.
    pub fn business_type(&self) -> &'static str {
        match self {
            PayeeRole::Driver => "individual",
            PayeeRole::TruckingCompany => "company",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ConnectedAccount {
    pub id: String,
}

/// Hosted onboarding link for a connected account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AccountLink {
    #[serde(default)]
    pub object: String,
    pub url: String,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub expires_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Customer {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SetupIntent {
    pub id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CardDetails {
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub last4: String,
    #[serde(default)]
    pub exp_month: u32,
    #[serde(default)]
    pub exp_year: u32,
}

/// A payment method stored on a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PaymentMethod {
    pub id: String,
    #[serde(rename = "type", default)]
    pub method_type: String,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub card: Option<CardDetails>,
}

/// Destination charge: settled under the driver's account, with the
/// platform fee retained by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntentParams {
    pub amount: i64,
    pub currency: String,
    pub customer: String,
    pub payment_method: String,
    pub destination_account: String,
    pub application_fee_amount: i64,
    pub transfer_group: String,
    pub metadata: BTreeMap<String, String>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PaymentIntent {
    pub id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub transfer_group: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Invoice {
    pub id: String,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub hosted_invoice_url: Option<String>,
    #[serde(default)]
    pub paid_out_of_band: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceItemParams {
    pub customer: String,
    pub invoice: String,
    pub amount: i64,
    pub currency: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferParams {
    pub amount: i64,
    pub currency: String,
    pub destination: String,
    pub transfer_group: Option<String>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Transfer {
    pub id: String,
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub transfer_group: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BalanceAmount {
    pub amount: i64,
    pub currency: String,
}

/// Funds held by a connected account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Balance {
    #[serde(default)]
    pub available: Vec<BalanceAmount>,
    #[serde(default)]
    pub pending: Vec<BalanceAmount>,
}

/// Envelope of an asynchronous notification from the processor.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: EventData,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EventData {
    /// The object the event is about; its shape depends on the event type.
    pub object: serde_json::Value,
}

/// Remote operations sequenced by the checkout, onboarding and settlement
/// flows. Every call is a single request; retries and idempotency belong to
/// the processor.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    async fn create_account(&self, role: PayeeRole) -> Result<ConnectedAccount, ProcessorError>;

    async fn create_account_link(
        &self,
        account_id: &str,
        refresh_url: &str,
        return_url: &str,
    ) -> Result<AccountLink, ProcessorError>;

    async fn create_customer(
        &self,
        description: &str,
        email: Option<&str>,
    ) -> Result<Customer, ProcessorError>;

    async fn retrieve_customer(&self, customer_id: &str) -> Result<Customer, ProcessorError>;

    async fn create_setup_intent(&self, customer_id: &str) -> Result<SetupIntent, ProcessorError>;

    async fn list_card_payment_methods(
        &self,
        customer_id: &str,
    ) -> Result<Vec<PaymentMethod>, ProcessorError>;

    async fn attach_payment_method(
        &self,
        payment_method_id: &str,
        customer_id: &str,
    ) -> Result<PaymentMethod, ProcessorError>;

    async fn create_payment_intent(
        &self,
        params: PaymentIntentParams,
    ) -> Result<PaymentIntent, ProcessorError>;

    async fn create_invoice(
        &self,
        customer_id: &str,
        currency: &str,
        description: &str,
    ) -> Result<Invoice, ProcessorError>;

    async fn create_invoice_item(&self, params: InvoiceItemParams) -> Result<(), ProcessorError>;

    async fn finalize_invoice(&self, invoice_id: &str) -> Result<Invoice, ProcessorError>;

    async fn pay_invoice_out_of_band(&self, invoice_id: &str) -> Result<Invoice, ProcessorError>;

    async fn create_transfer(&self, params: TransferParams) -> Result<Transfer, ProcessorError>;

    async fn retrieve_balance(&self, account_id: &str) -> Result<Balance, ProcessorError>;
}
