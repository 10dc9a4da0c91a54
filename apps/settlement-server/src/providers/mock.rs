// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Recording processor for tests.
//!
//! Every call is appended to a log by operation name so tests can assert
//! which remote calls happened. A single operation can be made to fail.

use std::{collections::HashMap, sync::Mutex};

use async_trait::async_trait;

use super::{
    AccountLink, Balance, BalanceAmount, ConnectedAccount, Customer, Invoice, InvoiceItemParams,
    PayeeRole, PaymentIntent, PaymentIntentParams, PaymentMethod, PaymentProcessor,
    ProcessorError, SetupIntent, Transfer, TransferParams,
};

#[derive(Debug, Default)]
pub struct RecordingProcessor {
    calls: Mutex<Vec<String>>,
    fail_on: Mutex<Option<String>>,
    customer_email: Mutex<Option<String>>,
    invoices: Mutex<HashMap<String, Invoice>>,
    payment_intents: Mutex<Vec<PaymentIntentParams>>,
    transfers: Mutex<Vec<TransferParams>>,
    counter: Mutex<u32>,
}

impl RecordingProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `operation` return a processor rejection.
    pub fn failing_on(operation: &str) -> Self {
        let processor = Self::default();
        *processor.fail_on.lock().unwrap() = Some(operation.to_string());
        processor
    }

    pub fn with_customer_email(self, email: &str) -> Self {
        *self.customer_email.lock().unwrap() = Some(email.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn payment_intents(&self) -> Vec<PaymentIntentParams> {
        self.payment_intents.lock().unwrap().clone()
    }

    pub fn transfers(&self) -> Vec<TransferParams> {
        self.transfers.lock().unwrap().clone()
    }

    pub fn invoices(&self) -> Vec<Invoice> {
        self.invoices.lock().unwrap().values().cloned().collect()
    }

    pub fn invoice(&self, invoice_id: &str) -> Option<Invoice> {
        self.invoices.lock().unwrap().get(invoice_id).cloned()
    }

    fn record(&self, operation: &str) -> Result<u32, ProcessorError> {
        self.calls.lock().unwrap().push(operation.to_string());
        if self.fail_on.lock().unwrap().as_deref() == Some(operation) {
            return Err(ProcessorError::Api {
                status: 402,
                message: format!("{operation} was declined"),
            });
        }
        let mut counter = self.counter.lock().unwrap();
        *counter += 1;
        Ok(*counter)
    }

    fn update_invoice(
        &self,
        invoice_id: &str,
        update: impl FnOnce(&mut Invoice),
    ) -> Result<Invoice, ProcessorError> {
        let mut invoices = self.invoices.lock().unwrap();
        let invoice = invoices.get_mut(invoice_id).ok_or_else(|| ProcessorError::Api {
            status: 404,
            message: format!("No such invoice: '{invoice_id}'"),
        })?;
        update(invoice);
        Ok(invoice.clone())
    }
}

#[async_trait]
impl PaymentProcessor for RecordingProcessor {
    async fn create_account(&self, role: PayeeRole) -> Result<ConnectedAccount, ProcessorError> {
        let n = self.record("create_account")?;
        Ok(ConnectedAccount {
            id: format!("acct_{}_{n}", role.as_str()),
        })
    }

    async fn create_account_link(
        &self,
        account_id: &str,
        _refresh_url: &str,
        _return_url: &str,
    ) -> Result<AccountLink, ProcessorError> {
        self.record("create_account_link")?;
        Ok(AccountLink {
            object: "account_link".to_string(),
            url: format!("https://connect.example.com/setup/{account_id}"),
            created: 1_761_692_690,
            expires_at: 1_761_692_990,
        })
    }

    async fn create_customer(
        &self,
        _description: &str,
        email: Option<&str>,
    ) -> Result<Customer, ProcessorError> {
        let n = self.record("create_customer")?;
        Ok(Customer {
            id: format!("cus_{n}"),
            email: email.map(str::to_string),
        })
    }

    async fn retrieve_customer(&self, customer_id: &str) -> Result<Customer, ProcessorError> {
        self.record("retrieve_customer")?;
        Ok(Customer {
            id: customer_id.to_string(),
            email: self.customer_email.lock().unwrap().clone(),
        })
    }

    async fn create_setup_intent(&self, customer_id: &str) -> Result<SetupIntent, ProcessorError> {
        let n = self.record("create_setup_intent")?;
        Ok(SetupIntent {
            id: format!("seti_{n}"),
            client_secret: format!("seti_{n}_secret_{customer_id}"),
        })
    }

    async fn list_card_payment_methods(
        &self,
        customer_id: &str,
    ) -> Result<Vec<PaymentMethod>, ProcessorError> {
        self.record("list_card_payment_methods")?;
        Ok(vec![PaymentMethod {
            id: "pm_card_visa".to_string(),
            method_type: "card".to_string(),
            customer: Some(customer_id.to_string()),
            card: None,
        }])
    }

    async fn attach_payment_method(
        &self,
        payment_method_id: &str,
        customer_id: &str,
    ) -> Result<PaymentMethod, ProcessorError> {
        self.record("attach_payment_method")?;
        Ok(PaymentMethod {
            id: payment_method_id.to_string(),
            method_type: "card".to_string(),
            customer: Some(customer_id.to_string()),
            card: None,
        })
    }

    async fn create_payment_intent(
        &self,
        params: PaymentIntentParams,
    ) -> Result<PaymentIntent, ProcessorError> {
        let n = self.record("create_payment_intent")?;
        let intent = PaymentIntent {
            id: format!("pi_{n}"),
            client_secret: Some(format!("pi_{n}_secret")),
            status: "succeeded".to_string(),
            amount: params.amount,
            currency: params.currency.clone(),
            transfer_group: Some(params.transfer_group.clone()),
            metadata: params.metadata.clone(),
        };
        self.payment_intents.lock().unwrap().push(params);
        Ok(intent)
    }

    async fn create_invoice(
        &self,
        customer_id: &str,
        currency: &str,
        _description: &str,
    ) -> Result<Invoice, ProcessorError> {
        let n = self.record("create_invoice")?;
        let invoice = Invoice {
            id: format!("in_{n}"),
            number: None,
            status: Some("draft".to_string()),
            customer: Some(customer_id.to_string()),
            currency: currency.to_string(),
            total: 0,
            hosted_invoice_url: None,
            paid_out_of_band: false,
        };
        self.invoices
            .lock()
            .unwrap()
            .insert(invoice.id.clone(), invoice.clone());
        Ok(invoice)
    }

    async fn create_invoice_item(&self, params: InvoiceItemParams) -> Result<(), ProcessorError> {
        self.record("create_invoice_item")?;
        self.update_invoice(&params.invoice, |invoice| invoice.total += params.amount)?;
        Ok(())
    }

    async fn finalize_invoice(&self, invoice_id: &str) -> Result<Invoice, ProcessorError> {
        self.record("finalize_invoice")?;
        self.update_invoice(invoice_id, |invoice| {
            invoice.status = Some("open".to_string());
            invoice.number = Some("INV-0001".to_string());
            invoice.hosted_invoice_url = Some(format!("https://invoice.example.com/{}", invoice.id));
        })
    }

    async fn pay_invoice_out_of_band(&self, invoice_id: &str) -> Result<Invoice, ProcessorError> {
        self.record("pay_invoice_out_of_band")?;
        self.update_invoice(invoice_id, |invoice| {
            invoice.status = Some("paid".to_string());
            invoice.paid_out_of_band = true;
        })
    }

    async fn create_transfer(&self, params: TransferParams) -> Result<Transfer, ProcessorError> {
        let n = self.record("create_transfer")?;
        let transfer = Transfer {
            id: format!("tr_{n}"),
            amount: params.amount,
            currency: params.currency.clone(),
            destination: Some(params.destination.clone()),
            transfer_group: params.transfer_group.clone(),
        };
        self.transfers.lock().unwrap().push(params);
        Ok(transfer)
    }

    async fn retrieve_balance(&self, _account_id: &str) -> Result<Balance, ProcessorError> {
        self.record("retrieve_balance")?;
        Ok(Balance {
            available: vec![BalanceAmount {
                amount: 8_500,
                currency: "cad".to_string(),
            }],
            pending: Vec::new(),
        })
    }
}
