// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Fee policy and settlement arithmetic.
//!
//! All amounts are integer minor currency units. Percentages are expressed in
//! basis points so every deduction is an exact integer computation. The
//! platform fee and the trucking company share are independent deductions of
//! the order amount; nothing ties their sum to the amount.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const BPS_DENOMINATOR: i128 = 10_000;

/// Percentages applied to an order, in basis points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FeePolicy {
    /// Share of the amount retained by the platform.
    pub platform_fee_bps: u32,
    /// Share of the amount forwarded to the trucking company after settlement.
    pub truck_share_bps: u32,
    /// Tax line added to invoices.
    pub tax_bps: u32,
}

impl Default for FeePolicy {
    fn default() -> Self {
        Self {
            platform_fee_bps: 3_000,
            truck_share_bps: 1_500,
            tax_bps: 1_300,
        }
    }
}

impl FeePolicy {
    pub fn platform_fee(&self, amount: i64) -> i64 {
        apply_bps(amount, self.platform_fee_bps)
    }

    pub fn truck_company_share(&self, amount: i64) -> i64 {
        apply_bps(amount, self.truck_share_bps)
    }

    pub fn tax(&self, amount: i64) -> i64 {
        apply_bps(amount, self.tax_bps)
    }
}

/// `round(amount * bps / 10000)` with halves rounded toward positive infinity.
pub fn apply_bps(amount: i64, bps: u32) -> i64 {
    let scaled = i128::from(amount) * i128::from(bps);
    let rounded = (2 * scaled + BPS_DENOMINATOR).div_euclid(2 * BPS_DENOMINATOR);
    // |rounded| <= |amount| * u32::MAX / 10000, which only exceeds i64 for absurd inputs.
    i64::try_from(rounded).unwrap_or(if rounded.is_negative() { i64::MIN } else { i64::MAX })
}

/// Correlation token linking a payment to its secondary transfers.
pub fn transfer_group_for(now: DateTime<Utc>) -> String {
    format!("order_{}", now.timestamp_millis())
}

/// The figures of one order as they travel through the processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SettlementRecord {
    pub amount: i64,
    pub currency: String,
    pub driver_account_id: String,
    pub truck_account_id: String,
    pub platform_fee: i64,
    pub truck_company_share: i64,
    pub transfer_group: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_id: Option<String>,
}

impl SettlementRecord {
    pub fn new(
        policy: &FeePolicy,
        amount: i64,
        currency: impl Into<String>,
        driver_account_id: impl Into<String>,
        truck_account_id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            amount,
            currency: currency.into(),
            driver_account_id: driver_account_id.into(),
            truck_account_id: truck_account_id.into(),
            platform_fee: policy.platform_fee(amount),
            truck_company_share: policy.truck_company_share(amount),
            transfer_group: transfer_group_for(now),
            invoice_id: None,
        }
    }
}
