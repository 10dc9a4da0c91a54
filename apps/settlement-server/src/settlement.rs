// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Checkout and Settlement Sequencing
//!
//! Checkout charges the customer on behalf of the driver (destination
//! charge) and keeps the platform fee. The trucking company's share is paid
//! later, when the processor reports the payment as settled: the webhook
//! reads the account ids back out of the payment's metadata and transfers
//! the share within the same transfer group.
//!
//! Steps are awaited one after another and nothing is rolled back. If a
//! later step fails, whatever the processor already accepted stays
//! committed (an invoice finalized before a failed charge stays finalized).

use std::collections::BTreeMap;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::{
    fees::SettlementRecord,
    mail::{render_receipt, ReceiptDetails},
    models::{CheckoutMode, CheckoutResponse},
    providers::{
        Invoice, InvoiceItemParams, PaymentIntent, PaymentIntentParams, ProcessorError,
        TransferParams, WebhookEvent,
    },
    state::AppState,
    store::DeadLetterKind,
};

pub const METADATA_DRIVER_ACCOUNT: &str = "driver_account_id";
pub const METADATA_TRUCK_ACCOUNT: &str = "truck_account_id";
pub const METADATA_INVOICE: &str = "invoice_id";

/// A checkout whose required fields are all present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutOrder {
    pub amount: i64,
    pub currency: String,
    pub payment_method_id: String,
    pub customer_id: String,
    pub driver_account_id: String,
    pub truck_account_id: String,
    pub mode: CheckoutMode,
    pub receipt_email: Option<String>,
}

pub struct CheckoutOutcome {
    pub response: CheckoutResponse,
    /// Receipt delivery running in the background, for invoice checkouts.
    pub receipt: Option<JoinHandle<()>>,
}

/// Result of handling one verified webhook event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementOutcome {
    /// Not the settlement trigger; acknowledged without action.
    Ignored,
    /// The payment carried no account ids; recorded as a dead letter.
    MissingMetadata,
    /// The event object was not a readable payment; recorded as a dead letter.
    Unreadable,
    Transferred { transfer_id: String, amount: i64 },
    /// The processor rejected the transfer; recorded as a dead letter.
    TransferFailed { message: String },
}

fn settlement_metadata(record: &SettlementRecord) -> BTreeMap<String, String> {
    let mut metadata = BTreeMap::new();
    metadata.insert(
        METADATA_DRIVER_ACCOUNT.to_string(),
        record.driver_account_id.clone(),
    );
    metadata.insert(
        METADATA_TRUCK_ACCOUNT.to_string(),
        record.truck_account_id.clone(),
    );
    if let Some(invoice_id) = &record.invoice_id {
        metadata.insert(METADATA_INVOICE.to_string(), invoice_id.clone());
    }
    metadata
}

fn percent_label(bps: u32) -> String {
    format!("{}%", f64::from(bps) / 100.0)
}

/// Draft invoice with the delivery fee and tax lines, finalized.
async fn prepare_invoice(state: &AppState, order: &CheckoutOrder) -> Result<Invoice, ProcessorError> {
    let processor = &state.processor;
    let fees = &state.config.fees;

    let draft = processor
        .create_invoice(
            &order.customer_id,
            &order.currency,
            &format!("{} delivery", state.config.platform_name),
        )
        .await?;

    processor
        .create_invoice_item(InvoiceItemParams {
            customer: order.customer_id.clone(),
            invoice: draft.id.clone(),
            amount: order.amount,
            currency: order.currency.clone(),
            description: "Delivery fee".to_string(),
        })
        .await?;

    processor
        .create_invoice_item(InvoiceItemParams {
            customer: order.customer_id.clone(),
            invoice: draft.id.clone(),
            amount: fees.tax(order.amount),
            currency: order.currency.clone(),
            description: format!("Tax ({})", percent_label(fees.tax_bps)),
        })
        .await?;

    let finalized = processor.finalize_invoice(&draft.id).await?;
    info!(
        invoice_id = %finalized.id,
        number = ?finalized.number,
        total = finalized.total,
        "invoice finalized"
    );
    Ok(finalized)
}

/// Run the checkout sequence for a validated order.
pub async fn run_checkout(
    state: &AppState,
    order: CheckoutOrder,
) -> Result<CheckoutOutcome, ProcessorError> {
    let processor = &state.processor;

    processor
        .attach_payment_method(&order.payment_method_id, &order.customer_id)
        .await?;

    let mut record = SettlementRecord::new(
        &state.config.fees,
        order.amount,
        order.currency.clone(),
        order.driver_account_id.clone(),
        order.truck_account_id.clone(),
        Utc::now(),
    );
    info!(
        amount = record.amount,
        currency = %record.currency,
        platform_fee = record.platform_fee,
        truck_company_share = record.truck_company_share,
        transfer_group = %record.transfer_group,
        mode = ?order.mode,
        "checkout started"
    );

    let invoice = match order.mode {
        CheckoutMode::Invoice => Some(prepare_invoice(state, &order).await?),
        CheckoutMode::Direct => None,
    };
    record.invoice_id = invoice.as_ref().map(|invoice| invoice.id.clone());

    let intent = processor
        .create_payment_intent(PaymentIntentParams {
            amount: record.amount,
            currency: record.currency.clone(),
            customer: order.customer_id.clone(),
            payment_method: order.payment_method_id.clone(),
            destination_account: record.driver_account_id.clone(),
            application_fee_amount: record.platform_fee,
            transfer_group: record.transfer_group.clone(),
            metadata: settlement_metadata(&record),
            description: format!("{} Delivery Service", state.config.platform_name),
        })
        .await?;

    let receipt = match &invoice {
        Some(finalized) => {
            processor.pay_invoice_out_of_band(&finalized.id).await?;
            info!(invoice_id = %finalized.id, "invoice marked paid out of band");
            Some(spawn_receipt(
                state.clone(),
                ReceiptJob {
                    customer_id: order.customer_id.clone(),
                    recipient: order.receipt_email.clone(),
                    details: ReceiptDetails {
                        platform_name: state.config.platform_name.clone(),
                        invoice_number: finalized.number.clone(),
                        invoice_url: finalized.hosted_invoice_url.clone(),
                        payment_intent_id: intent.id.clone(),
                        currency: record.currency.clone(),
                        delivery_fee: record.amount,
                        tax: state.config.fees.tax(record.amount),
                    },
                },
            ))
        }
        None => None,
    };

    Ok(CheckoutOutcome {
        response: CheckoutResponse {
            payment_intent_id: intent.id,
            client_secret: intent.client_secret,
            platform_fee: record.platform_fee,
            truck_company_share: record.truck_company_share,
            transfer_group: record.transfer_group,
            invoice,
            message: "Payment successful!".to_string(),
        },
        receipt,
    })
}

struct ReceiptJob {
    customer_id: String,
    recipient: Option<String>,
    details: ReceiptDetails,
}

/// Receipts are sent off the request path; a mail outage never fails a
/// payment that the processor has already accepted.
fn spawn_receipt(state: AppState, job: ReceiptJob) -> JoinHandle<()> {
    tokio::spawn(async move { deliver_receipt(&state, job).await })
}

async fn deliver_receipt(state: &AppState, job: ReceiptJob) {
    let reference = job.details.payment_intent_id.clone();

    let recipient = match job.recipient {
        Some(recipient) => Some(recipient),
        None => match state.processor.retrieve_customer(&job.customer_id).await {
            Ok(customer) => customer.email,
            Err(err) => {
                warn!(customer_id = %job.customer_id, error = %err, "could not look up receipt recipient");
                None
            }
        },
    };

    let Some(to) = recipient else {
        warn!(payment_intent_id = %reference, "no receipt recipient available");
        state.store.write().await.record_dead_letter(
            DeadLetterKind::ReceiptRecipientMissing,
            reference,
            format!("customer {} has no email address", job.customer_id),
        );
        return;
    };

    let mail = render_receipt(&to, &job.details);
    match state.mailer.send(mail).await {
        Ok(()) => info!(payment_intent_id = %reference, to = %to, "receipt sent"),
        Err(err) => {
            error!(payment_intent_id = %reference, error = %err, "receipt delivery failed");
            state.store.write().await.record_dead_letter(
                DeadLetterKind::ReceiptEmailFailed,
                reference,
                err.to_string(),
            );
        }
    }
}

/// Pay the trucking company's share for a settled payment.
///
/// Every branch is acknowledged to the processor; failures are recorded as
/// dead letters so they can be replayed by an operator.
pub async fn settle_event(state: &AppState, event: WebhookEvent) -> SettlementOutcome {
    if event.event_type != state.config.settlement_event_type {
        info!(event_id = %event.id, event_type = %event.event_type, "ignoring webhook event");
        return SettlementOutcome::Ignored;
    }

    let payment: PaymentIntent = match serde_json::from_value(event.data.object) {
        Ok(payment) => payment,
        Err(err) => {
            warn!(event_id = %event.id, error = %err, "settlement event is not a payment");
            state.store.write().await.record_dead_letter(
                DeadLetterKind::UnreadableSettlementEvent,
                event.id,
                err.to_string(),
            );
            return SettlementOutcome::Unreadable;
        }
    };

    let driver_account = payment.metadata.get(METADATA_DRIVER_ACCOUNT).filter(|v| !v.is_empty());
    let truck_account = payment.metadata.get(METADATA_TRUCK_ACCOUNT).filter(|v| !v.is_empty());
    let (Some(_), Some(truck_account)) = (driver_account, truck_account) else {
        warn!(event_id = %event.id, payment_id = %payment.id, "missing account ids in metadata");
        state.store.write().await.record_dead_letter(
            DeadLetterKind::MissingSettlementMetadata,
            payment.id,
            format!("event {} has no driver/truck account ids", event.id),
        );
        return SettlementOutcome::MissingMetadata;
    };

    let share = state.config.fees.truck_company_share(payment.amount);
    info!(
        payment_id = %payment.id,
        total = payment.amount,
        truck_company_share = share,
        "settling trucking company share"
    );

    let transfer = state
        .processor
        .create_transfer(TransferParams {
            amount: share,
            currency: payment.currency.clone(),
            destination: truck_account.clone(),
            transfer_group: payment.transfer_group.clone(),
            description: format!("Trucking company share for PI {}", payment.id),
        })
        .await;

    match transfer {
        Ok(transfer) => {
            info!(transfer_id = %transfer.id, payment_id = %payment.id, "truck company transfer complete");
            SettlementOutcome::Transferred {
                transfer_id: transfer.id,
                amount: share,
            }
        }
        Err(err) => {
            error!(payment_id = %payment.id, error = %err, "truck company transfer failed");
            let message = err.to_string();
            state.store.write().await.record_dead_letter(
                DeadLetterKind::TruckTransferFailed,
                payment.id,
                message.clone(),
            );
            SettlementOutcome::TransferFailed { message }
        }
    }
}
