// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Stripe Connect integration for destination charges, invoices and transfers.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize};
use tracing::{debug, info};
use url::Url;
use uuid::Uuid;

use super::{
    AccountLink, Balance, ConnectedAccount, Customer, Invoice, InvoiceItemParams, PayeeRole,
    PaymentIntent, PaymentIntentParams, PaymentMethod, PaymentProcessor, ProcessorError,
    SetupIntent, Transfer, TransferParams,
};
use crate::config::ProcessorConfig;

const STRIPE_API_VERSION: &str = "2023-10-16";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    data: Vec<T>,
}

/// Bracket-notation form body as the Stripe API expects it.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct FormParams(Vec<(String, String)>);

impl FormParams {
    fn new() -> Self {
        Self::default()
    }

    fn push(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.0.push((key.into(), value.to_string()));
        self
    }

    fn push_opt(self, key: &str, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.push(key, value),
            None => self,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StripeClient {
    api_base_url: Url,
    secret_key: Option<String>,
    http: Client,
}

impl StripeClient {
    pub fn new(config: &ProcessorConfig) -> Result<Self, ProcessorError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ProcessorError::Request(format!("failed to build HTTP client: {e}")))?;

        let base = Url::parse(&config.api_base_url).map_err(|e| {
            ProcessorError::MissingConfig(format!(
                "STRIPE_API_BASE_URL is not a valid URL ({}): {e}",
                config.api_base_url
            ))
        })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ProcessorError::MissingConfig(format!(
                "STRIPE_API_BASE_URL must use http or https, got {}",
                base.scheme()
            )));
        }

        Ok(Self {
            api_base_url: base,
            secret_key: config.secret_key.clone(),
            http,
        })
    }

    fn secret_key(&self) -> Result<&str, ProcessorError> {
        self.secret_key
            .as_deref()
            .ok_or_else(|| ProcessorError::MissingConfig("STRIPE_SECRET_KEY".to_string()))
    }

    /// Base URL extended with `segments`, each percent-encoded as a single
    /// path segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ProcessorError> {
        let mut url = self.api_base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ProcessorError::MissingConfig("STRIPE_API_BASE_URL cannot carry a path".to_string())
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
        stripe_account: Option<&str>,
    ) -> Result<T, ProcessorError> {
        let url = self.endpoint(segments)?;
        let path = url.path().to_string();
        let mut request = self
            .http
            .get(url)
            .bearer_auth(self.secret_key()?)
            .header("Stripe-Version", STRIPE_API_VERSION)
            .query(query);
        if let Some(account) = stripe_account {
            request = request.header("Stripe-Account", account);
        }
        self.send(request, "GET", &path).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        params: FormParams,
    ) -> Result<T, ProcessorError> {
        let url = self.endpoint(segments)?;
        let path = url.path().to_string();
        let request = self
            .http
            .post(url)
            .bearer_auth(self.secret_key()?)
            .header("Stripe-Version", STRIPE_API_VERSION)
            .header("Idempotency-Key", Uuid::new_v4().to_string())
            .form(&params.0);
        self.send(request, "POST", &path).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        method: &str,
        path: &str,
    ) -> Result<T, ProcessorError> {
        let response = request
            .send()
            .await
            .map_err(|e| ProcessorError::Request(format!("{method} {path} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), &body));
        }

        debug!(method, path, status = status.as_u16(), "stripe call succeeded");

        response.json().await.map_err(|e| {
            ProcessorError::InvalidResponse(format!("{method} {path} invalid JSON: {e}"))
        })
    }
}

/// Ids travel as path segments. Blank and dot-only values would be dropped
/// or resolved against the parent path, so they are refused up front.
fn object_id<'a>(kind: &str, id: &'a str) -> Result<&'a str, ProcessorError> {
    if id.trim().is_empty() || id.chars().all(|c| c == '.') {
        return Err(ProcessorError::InvalidIdentifier(format!(
            "invalid {kind} id: {id:?}"
        )));
    }
    Ok(id)
}

/// Extracts Stripe's own error message so it can be relayed verbatim.
fn api_error(status: u16, body: &str) -> ProcessorError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| {
            let kind = envelope.error.kind;
            envelope.error.message.or(kind)
        })
        .unwrap_or_else(|| format!("request returned {status}: {body}"));
    ProcessorError::Api { status, message }
}

fn payment_intent_form(params: &PaymentIntentParams) -> FormParams {
    let mut form = FormParams::new()
        .push("amount", params.amount)
        .push("currency", &params.currency)
        .push("customer", &params.customer)
        .push("payment_method", &params.payment_method)
        .push("confirm", true)
        .push("automatic_payment_methods[enabled]", true)
        .push("automatic_payment_methods[allow_redirects]", "never")
        .push("on_behalf_of", &params.destination_account)
        .push("transfer_data[destination]", &params.destination_account)
        .push("application_fee_amount", params.application_fee_amount)
        .push("transfer_group", &params.transfer_group)
        .push("description", &params.description);
    for (key, value) in &params.metadata {
        form = form.push(format!("metadata[{key}]"), value);
    }
    form
}

fn transfer_form(params: &TransferParams) -> FormParams {
    FormParams::new()
        .push("amount", params.amount)
        .push("currency", &params.currency)
        .push("destination", &params.destination)
        .push_opt("transfer_group", params.transfer_group.as_deref())
        .push("description", &params.description)
}

#[async_trait]
impl PaymentProcessor for StripeClient {
    async fn create_account(&self, role: PayeeRole) -> Result<ConnectedAccount, ProcessorError> {
        let form = FormParams::new()
            .push("type", "express")
            .push("capabilities[card_payments][requested]", true)
            .push("capabilities[transfers][requested]", true)
            .push("business_type", role.business_type())
            .push("metadata[role]", role.as_str());
        let account: ConnectedAccount = self.post(&["v1", "accounts"], form).await?;
        info!(account_id = %account.id, role = role.as_str(), "connected account created");
        Ok(account)
    }

    async fn create_account_link(
        &self,
        account_id: &str,
        refresh_url: &str,
        return_url: &str,
    ) -> Result<AccountLink, ProcessorError> {
        let form = FormParams::new()
            .push("account", account_id)
            .push("refresh_url", refresh_url)
            .push("return_url", return_url)
            .push("type", "account_onboarding");
        self.post(&["v1", "account_links"], form).await
    }

    async fn create_customer(
        &self,
        description: &str,
        email: Option<&str>,
    ) -> Result<Customer, ProcessorError> {
        let form = FormParams::new()
            .push("description", description)
            .push_opt("email", email);
        self.post(&["v1", "customers"], form).await
    }

    async fn retrieve_customer(&self, customer_id: &str) -> Result<Customer, ProcessorError> {
        let customer_id = object_id("customer", customer_id)?;
        self.get(&["v1", "customers", customer_id], &[], None)
            .await
    }

    async fn create_setup_intent(&self, customer_id: &str) -> Result<SetupIntent, ProcessorError> {
        let form = FormParams::new()
            .push("customer", customer_id)
            .push("payment_method_types[]", "card");
        self.post(&["v1", "setup_intents"], form).await
    }

    async fn list_card_payment_methods(
        &self,
        customer_id: &str,
    ) -> Result<Vec<PaymentMethod>, ProcessorError> {
        let list: ListResponse<PaymentMethod> = self
            .get(
                &["v1", "payment_methods"],
                &[("customer", customer_id), ("type", "card")],
                None,
            )
            .await?;
        Ok(list.data)
    }

    async fn attach_payment_method(
        &self,
        payment_method_id: &str,
        customer_id: &str,
    ) -> Result<PaymentMethod, ProcessorError> {
        let payment_method_id = object_id("payment method", payment_method_id)?;
        let form = FormParams::new().push("customer", customer_id);
        self.post(
            &["v1", "payment_methods", payment_method_id, "attach"],
            form,
        )
        .await
    }

    async fn create_payment_intent(
        &self,
        params: PaymentIntentParams,
    ) -> Result<PaymentIntent, ProcessorError> {
        let intent: PaymentIntent = self
            .post(&["v1", "payment_intents"], payment_intent_form(&params))
            .await?;
        info!(
            payment_intent_id = %intent.id,
            status = %intent.status,
            transfer_group = %params.transfer_group,
            "payment intent created"
        );
        Ok(intent)
    }

    async fn create_invoice(
        &self,
        customer_id: &str,
        currency: &str,
        description: &str,
    ) -> Result<Invoice, ProcessorError> {
        let form = FormParams::new()
            .push("customer", customer_id)
            .push("currency", currency)
            .push("description", description)
            .push("collection_method", "send_invoice")
            .push("days_until_due", 0)
            .push("auto_advance", false)
            .push("pending_invoice_items_behavior", "exclude");
        self.post(&["v1", "invoices"], form).await
    }

    async fn create_invoice_item(&self, params: InvoiceItemParams) -> Result<(), ProcessorError> {
        let form = FormParams::new()
            .push("customer", &params.customer)
            .push("invoice", &params.invoice)
            .push("amount", params.amount)
            .push("currency", &params.currency)
            .push("description", &params.description);
        let _: serde_json::Value = self.post(&["v1", "invoiceitems"], form).await?;
        Ok(())
    }

    async fn finalize_invoice(&self, invoice_id: &str) -> Result<Invoice, ProcessorError> {
        let invoice_id = object_id("invoice", invoice_id)?;
        self.post(
            &["v1", "invoices", invoice_id, "finalize"],
            FormParams::new().push("auto_advance", false),
        )
        .await
    }

    async fn pay_invoice_out_of_band(&self, invoice_id: &str) -> Result<Invoice, ProcessorError> {
        let invoice_id = object_id("invoice", invoice_id)?;
        self.post(
            &["v1", "invoices", invoice_id, "pay"],
            FormParams::new().push("paid_out_of_band", true),
        )
        .await
    }

    async fn create_transfer(&self, params: TransferParams) -> Result<Transfer, ProcessorError> {
        self.post(&["v1", "transfers"], transfer_form(&params)).await
    }

    async fn retrieve_balance(&self, account_id: &str) -> Result<Balance, ProcessorError> {
        self.get(&["v1", "balance"], &[], Some(account_id)).await
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::BTreeMap,
        sync::{Arc, Mutex},
    };

    use axum::http::{Method, Uri};

    use super::*;

    fn client_for(base: &str) -> StripeClient {
        StripeClient::new(&ProcessorConfig {
            secret_key: Some("sk_test".to_string()),
            api_base_url: base.to_string(),
        })
        .expect("client builds")
    }

    fn value_of<'a>(form: &'a FormParams, key: &str) -> Option<&'a str> {
        form.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn api_error_prefers_processor_message() {
        let body = r#"{"error":{"message":"No such customer: 'cus_x'","type":"invalid_request_error"}}"#;
        match api_error(400, body) {
            ProcessorError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "No such customer: 'cus_x'");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn api_error_falls_back_to_raw_body() {
        match api_error(502, "bad gateway") {
            ProcessorError::Api { message, .. } => {
                assert_eq!(message, "request returned 502: bad gateway");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn payment_intent_form_routes_funds_to_driver() {
        let mut metadata = BTreeMap::new();
        metadata.insert("driver_account_id".to_string(), "acct_driver".to_string());
        metadata.insert("truck_account_id".to_string(), "acct_truck".to_string());
        let form = payment_intent_form(&PaymentIntentParams {
            amount: 10_000,
            currency: "cad".to_string(),
            customer: "cus_1".to_string(),
            payment_method: "pm_1".to_string(),
            destination_account: "acct_driver".to_string(),
            application_fee_amount: 3_000,
            transfer_group: "order_1".to_string(),
            metadata,
            description: "Jelpala Delivery Service".to_string(),
        });

        assert_eq!(value_of(&form, "amount"), Some("10000"));
        assert_eq!(value_of(&form, "on_behalf_of"), Some("acct_driver"));
        assert_eq!(
            value_of(&form, "transfer_data[destination]"),
            Some("acct_driver")
        );
        assert_eq!(value_of(&form, "application_fee_amount"), Some("3000"));
        assert_eq!(value_of(&form, "confirm"), Some("true"));
        assert_eq!(
            value_of(&form, "automatic_payment_methods[allow_redirects]"),
            Some("never")
        );
        assert_eq!(
            value_of(&form, "metadata[truck_account_id]"),
            Some("acct_truck")
        );
    }

    #[test]
    fn transfer_form_omits_missing_group() {
        let form = transfer_form(&TransferParams {
            amount: 1_500,
            currency: "cad".to_string(),
            destination: "acct_truck".to_string(),
            transfer_group: None,
            description: "share".to_string(),
        });
        assert_eq!(value_of(&form, "destination"), Some("acct_truck"));
        assert!(value_of(&form, "transfer_group").is_none());
    }

    #[tokio::test]
    async fn calls_fail_fast_without_secret_key() {
        let client = StripeClient::new(&ProcessorConfig {
            secret_key: None,
            api_base_url: "http://127.0.0.1:9".to_string(),
        })
        .expect("client builds");

        let err = client
            .retrieve_customer("cus_1")
            .await
            .expect_err("missing key should fail");
        assert!(matches!(err, ProcessorError::MissingConfig(_)));
    }

    #[test]
    fn rejects_unusable_base_url() {
        for base in ["not a url", "ftp://api.stripe.com"] {
            let err = StripeClient::new(&ProcessorConfig {
                secret_key: Some("sk_test".to_string()),
                api_base_url: base.to_string(),
            })
            .expect_err("base url should be rejected");
            assert!(matches!(err, ProcessorError::MissingConfig(_)));
        }
    }

    #[test]
    fn normalizes_trailing_slash() {
        let client = StripeClient::new(&ProcessorConfig {
            secret_key: Some("sk_test".to_string()),
            api_base_url: "https://api.stripe.com/".to_string(),
        })
        .unwrap();
        assert_eq!(
            client.endpoint(&["v1", "customers"]).unwrap().as_str(),
            "https://api.stripe.com/v1/customers"
        );
    }

    #[test]
    fn ids_are_encoded_as_single_segments() {
        let client = client_for("https://api.stripe.com");
        let url = client
            .endpoint(&["v1", "payment_methods", "pm_x/../../transfers?", "attach"])
            .unwrap();
        assert_eq!(
            url.path(),
            "/v1/payment_methods/pm_x%2F..%2F..%2Ftransfers%3F/attach"
        );
        assert!(url.query().is_none());
    }

    #[test]
    fn base_path_prefix_is_kept() {
        let client = client_for("http://127.0.0.1:9/stripe/");
        assert_eq!(
            client.endpoint(&["v1", "customers", "cus_1"]).unwrap().path(),
            "/stripe/v1/customers/cus_1"
        );
    }

    #[tokio::test]
    async fn dot_and_blank_ids_are_refused_before_sending() {
        let client = client_for("http://127.0.0.1:9");
        for id in ["..", ".", "", "  "] {
            let err = client
                .retrieve_customer(id)
                .await
                .expect_err("unusable id");
            assert!(matches!(err, ProcessorError::InvalidIdentifier(_)));
        }
        let err = client
            .pay_invoice_out_of_band("..")
            .await
            .expect_err("unusable id");
        assert!(matches!(err, ProcessorError::InvalidIdentifier(_)));
    }

    #[tokio::test]
    async fn crafted_ids_stay_inside_their_resource() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = seen.clone();
        let app = axum::Router::new().fallback(move |method: Method, uri: Uri| {
            let recorder = recorder.clone();
            async move {
                recorder
                    .lock()
                    .unwrap()
                    .push(format!("{method} {}", uri.path()));
                axum::Json(serde_json::json!({ "id": "obj_1" }))
            }
        });
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        let client = client_for(&format!("http://{addr}"));
        client
            .attach_payment_method("pm_x/../../transfers?", "cus_1")
            .await
            .expect("attach reaches the server");
        client
            .retrieve_customer("cus_1/../../balance")
            .await
            .expect("retrieve reaches the server");

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                "POST /v1/payment_methods/pm_x%2F..%2F..%2Ftransfers%3F/attach".to_string(),
                "GET /v1/customers/cus_1%2F..%2F..%2Fbalance".to_string(),
            ]
        );
    }
}
