// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory dead-letter ledger.
//!
//! Settlement steps that the processor's retry contract forces us to
//! acknowledge (a webhook without settlement metadata, a failed truck
//! transfer, an undeliverable receipt) are recorded here instead of being
//! dropped. The ledger lives for the lifetime of the process only; the
//! processor remains the system of record.
//!
//! Operators acknowledge entries once handled. Unacknowledged entries are
//! capped at [`MAX_DEAD_LETTERS`]; the oldest is evicted first.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;
use uuid::Uuid;

pub const MAX_DEAD_LETTERS: usize = 1_000;

/// Why a settlement step could not complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DeadLetterKind {
    /// The settlement event carried no driver/truck account ids.
    MissingSettlementMetadata,
    /// The settlement event object could not be read as a payment.
    UnreadableSettlementEvent,
    /// The processor rejected the trucking company transfer.
    TruckTransferFailed,
    /// No address was available for the receipt.
    ReceiptRecipientMissing,
    /// The receipt could not be delivered.
    ReceiptEmailFailed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DeadLetter {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub kind: DeadLetterKind,
    /// Processor object the failure relates to (event, payment intent, invoice).
    pub reference: String,
    pub detail: String,
}

#[derive(Debug)]
pub struct InMemoryStore {
    dead_letters: VecDeque<DeadLetter>,
    capacity: usize,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::with_capacity(MAX_DEAD_LETTERS)
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            dead_letters: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn record_dead_letter(
        &mut self,
        kind: DeadLetterKind,
        reference: impl Into<String>,
        detail: impl Into<String>,
    ) -> DeadLetter {
        let letter = DeadLetter {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            kind,
            reference: reference.into(),
            detail: detail.into(),
        };
        if self.dead_letters.len() >= self.capacity {
            if let Some(evicted) = self.dead_letters.pop_front() {
                warn!(
                    id = %evicted.id,
                    kind = ?evicted.kind,
                    reference = %evicted.reference,
                    "dead-letter ledger full, evicting oldest entry"
                );
            }
        }
        self.dead_letters.push_back(letter.clone());
        letter
    }

    /// Dead letters, newest first.
    pub fn dead_letters(&self) -> Vec<DeadLetter> {
        self.dead_letters.iter().rev().cloned().collect()
    }

    pub fn dead_letters_of(&self, kind: DeadLetterKind) -> Vec<DeadLetter> {
        self.dead_letters
            .iter()
            .rev()
            .filter(|letter| letter.kind == kind)
            .cloned()
            .collect()
    }

    /// Remove a handled entry.
    pub fn acknowledge(&mut self, id: &str) -> Option<DeadLetter> {
        let index = self.dead_letters.iter().position(|letter| letter.id == id)?;
        self.dead_letters.remove(index)
    }
}
