// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Settlement Server - Destination Charge Backend
//!
//! Onboards drivers and trucking companies as Stripe Connect accounts,
//! charges customers with the driver as the destination, and splits the
//! proceeds with the trucking company once the payment settles.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `providers` - Payment processor port and Stripe client
//! - `settlement` - Checkout and settlement sequencing
//! - `mail` - Receipt delivery (SMTP)

pub mod api;
pub mod config;
pub mod error;
pub mod fees;
pub mod mail;
pub mod models;
pub mod providers;
pub mod settlement;
pub mod state;
pub mod store;
