// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! SMTP delivery over an implicit-TLS relay.

use async_trait::async_trait;
use lettre::{
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::info;

use super::{MailError, Mailer, OutgoingMail};
use crate::config::SmtpConfig;

/// Holds one pooled transport for the lifetime of the process. Missing
/// settings are kept as the error every send reports.
#[derive(Debug, Clone)]
pub struct SmtpMailer {
    sender_name: String,
    user: Option<String>,
    transport: Result<AsyncSmtpTransport<Tokio1Executor>, MailError>,
}

impl SmtpMailer {
    /// Must be called within a Tokio runtime; the pool spawns its idle reaper.
    pub fn new(config: SmtpConfig, sender_name: impl Into<String>) -> Self {
        Self {
            sender_name: sender_name.into(),
            transport: build_transport(&config),
            user: config.user,
        }
    }

    fn sender(&self) -> Result<Mailbox, MailError> {
        let user = required(&self.user, "SMTP_USER")?;
        format!("\"{}\" <{}>", self.sender_name, user)
            .parse()
            .map_err(|e| MailError::Address(format!("sender: {e}")))
    }

    fn build_message(&self, mail: &OutgoingMail) -> Result<Message, MailError> {
        let to: Mailbox = mail
            .to
            .parse()
            .map_err(|e| MailError::Address(format!("{}: {e}", mail.to)))?;

        Message::builder()
            .from(self.sender()?)
            .to(to)
            .subject(mail.subject.clone())
            .multipart(MultiPart::alternative_plain_html(
                mail.text_body(),
                mail.html.clone(),
            ))
            .map_err(|e| MailError::Build(e.to_string()))
    }
}

fn build_transport(config: &SmtpConfig) -> Result<AsyncSmtpTransport<Tokio1Executor>, MailError> {
    let host = required(&config.host, "SMTP_HOST")?;
    let user = required(&config.user, "SMTP_USER")?;
    let password = required(&config.password, "SMTP_PASS")?;

    let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
        .map_err(|e| MailError::Transport(e.to_string()))?
        .port(config.port)
        .credentials(Credentials::new(user.to_string(), password.to_string()))
        .build();
    Ok(transport)
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, MailError> {
    value
        .as_deref()
        .ok_or_else(|| MailError::MissingConfig(name.to_string()))
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        let transport = self.transport.as_ref().map_err(Clone::clone)?;
        let message = self.build_message(&mail)?;

        let response = transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        info!(to = %mail.to, subject = %mail.subject, code = %response.code(), "mail sent");
        Ok(())
    }
}
