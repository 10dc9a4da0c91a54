// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Outbound mail.
//!
//! Mail is a stateless collaborator: the service hands over a rendered
//! message and does not track delivery beyond the transport's answer.

use async_trait::async_trait;

pub mod receipt;
pub mod smtp;

#[cfg(test)]
pub mod mock;

pub use receipt::{render_receipt, ReceiptDetails};
pub use smtp::SmtpMailer;

#[derive(Debug, Clone, thiserror::Error)]
pub enum MailError {
    #[error("mail configuration missing: {0}")]
    MissingConfig(String),

    #[error("invalid mail address: {0}")]
    Address(String),

    #[error("failed to build mail: {0}")]
    Build(String),

    #[error("mail transport failed: {0}")]
    Transport(String),
}

/// A rendered message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub html: String,
    /// Plain-text part; derived from `html` when absent.
    pub text: Option<String>,
}

impl OutgoingMail {
    pub fn text_body(&self) -> String {
        self.text
            .clone()
            .unwrap_or_else(|| html_to_text(&self.html))
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError>;
}

/// Drops markup, keeping only text content with entities decoded.
pub fn html_to_text(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(ch),
            _ => {}
        }
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
