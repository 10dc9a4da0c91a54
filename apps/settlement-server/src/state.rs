// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{
    config::AppConfig,
    mail::{Mailer, SmtpMailer},
    providers::{PaymentProcessor, ProcessorError, StripeClient},
    store::InMemoryStore,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub processor: Arc<dyn PaymentProcessor>,
    pub mailer: Arc<dyn Mailer>,
    pub store: Arc<RwLock<InMemoryStore>>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        processor: Arc<dyn PaymentProcessor>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            processor,
            mailer,
            store: Arc::new(RwLock::new(InMemoryStore::new())),
        }
    }

    /// Wire the Stripe client and SMTP mailer from configuration.
    pub fn from_config(config: AppConfig) -> Result<Self, ProcessorError> {
        let processor = StripeClient::new(&config.processor)?;
        let mailer = SmtpMailer::new(config.smtp.clone(), config.platform_name.clone());
        Ok(Self::new(config, Arc::new(processor), Arc::new(mailer)))
    }
}
