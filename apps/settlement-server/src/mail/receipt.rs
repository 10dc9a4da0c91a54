// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Delivery receipt rendering.

use super::OutgoingMail;

/// Currencies whose minor unit is the major unit.
const ZERO_DECIMAL_CURRENCIES: [&str; 8] = ["bif", "clp", "jpy", "krw", "mga", "pyg", "vnd", "xaf"];

/// Figures shown on a receipt. All amounts are minor units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptDetails {
    pub platform_name: String,
    pub invoice_number: Option<String>,
    pub invoice_url: Option<String>,
    pub payment_intent_id: String,
    pub currency: String,
    pub delivery_fee: i64,
    pub tax: i64,
}

impl ReceiptDetails {
    pub fn total(&self) -> i64 {
        self.delivery_fee.saturating_add(self.tax)
    }
}

/// Formats a minor-unit amount as `"113.00 CAD"`.
pub fn format_amount(amount: i64, currency: &str) -> String {
    let code = currency.to_ascii_uppercase();
    if ZERO_DECIMAL_CURRENCIES.contains(&currency.to_ascii_lowercase().as_str()) {
        return format!("{amount} {code}");
    }
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.unsigned_abs();
    format!("{sign}{}.{:02} {code}", abs / 100, abs % 100)
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// The card is charged the delivery fee; the invoice total adds tax and is
/// settled out of band.
pub fn render_receipt(to: &str, details: &ReceiptDetails) -> OutgoingMail {
    let reference = details
        .invoice_number
        .clone()
        .unwrap_or_else(|| details.payment_intent_id.clone());
    let subject = format!("{} receipt {reference}", details.platform_name);
    let platform = escape_html(&details.platform_name);

    let mut html = format!(
        "<h2>Thank you for your order</h2>\
         <p>Receipt <strong>{reference}</strong></p>\
         <table>\
         <tr><td>Delivery fee</td><td>{delivery}</td></tr>\
         <tr><td>Tax</td><td>{tax}</td></tr>\
         <tr><td><strong>Invoice total</strong></td><td><strong>{total}</strong></td></tr>\
         </table>\
         <p>Card payment: {delivery} (reference {payment})</p>",
        reference = escape_html(&reference),
        delivery = format_amount(details.delivery_fee, &details.currency),
        tax = format_amount(details.tax, &details.currency),
        total = format_amount(details.total(), &details.currency),
        payment = escape_html(&details.payment_intent_id),
    );
    if let Some(url) = &details.invoice_url {
        html.push_str(&format!(
            "<p><a href=\"{}\">View invoice</a></p>",
            escape_html(url)
        ));
    }
    html.push_str(&format!("<p>{platform}</p>"));

    OutgoingMail {
        to: to.to_string(),
        subject,
        html,
        text: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details() -> ReceiptDetails {
        ReceiptDetails {
            platform_name: "Jelpala".to_string(),
            invoice_number: Some("INV-0001".to_string()),
            invoice_url: Some("https://invoice.example.com/i/1".to_string()),
            payment_intent_id: "pi_123".to_string(),
            currency: "cad".to_string(),
            delivery_fee: 10_000,
            tax: 1_300,
        }
    }

    #[test]
    fn format_amount_uses_major_units() {
        assert_eq!(format_amount(10_000, "cad"), "100.00 CAD");
        assert_eq!(format_amount(5, "usd"), "0.05 USD");
        assert_eq!(format_amount(-250, "eur"), "-2.50 EUR");
        assert_eq!(format_amount(1_500, "jpy"), "1500 JPY");
    }

    #[test]
    fn receipt_lists_fee_tax_and_total() {
        let mail = render_receipt("customer@example.com", &details());
        assert_eq!(mail.to, "customer@example.com");
        assert_eq!(mail.subject, "Jelpala receipt INV-0001");
        assert!(mail.html.contains("100.00 CAD"));
        assert!(mail.html.contains("13.00 CAD"));
        assert!(mail.html.contains("Invoice total"));
        assert!(mail.html.contains("113.00 CAD"));
        assert!(mail.html.contains("Card payment: 100.00 CAD"));
        assert!(!mail.html.contains("Total paid"));
        assert!(mail.html.contains("pi_123"));
        assert!(mail.html.contains("View invoice"));
        assert!(!mail.text_body().contains('<'));
    }

    #[test]
    fn receipt_falls_back_to_payment_reference() {
        let mut details = details();
        details.invoice_number = None;
        details.invoice_url = None;
        let mail = render_receipt("customer@example.com", &details);
        assert_eq!(mail.subject, "Jelpala receipt pi_123");
        assert!(!mail.html.contains("View invoice"));
    }

    #[test]
    fn interpolated_values_are_escaped() {
        let mut details = details();
        details.platform_name = "Jelpala <Freight>".to_string();
        details.invoice_number = Some("INV-<b>1</b>".to_string());
        details.invoice_url = Some("https://invoice.example.com/i/1?a=1&b=\"x\"".to_string());
        let mail = render_receipt("customer@example.com", &details);

        assert!(mail.html.contains("Jelpala &lt;Freight&gt;"));
        assert!(mail.html.contains("INV-&lt;b&gt;1&lt;/b&gt;"));
        assert!(mail
            .html
            .contains("href=\"https://invoice.example.com/i/1?a=1&amp;b=&quot;x&quot;\""));
        assert!(!mail.html.contains("<b>1</b>"));
    }
}
