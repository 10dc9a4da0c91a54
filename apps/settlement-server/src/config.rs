// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment exactly once at startup and
//! handed to the rest of the service as an [`AppConfig`] value inside
//! [`crate::state::AppState`]. Handlers never read the environment directly.
//!
//! Credentials are optional at startup: a missing key is reported when the
//! collaborator that needs it is first used, not when the process boots.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `STRIPE_SECRET_KEY` | Processor API secret key | none |
//! | `STRIPE_API_BASE_URL` | Processor API base URL | `https://api.stripe.com` |
//! | `WEBHOOK_SECRET` | Shared secret for webhook signatures | none |
//! | `SETTLEMENT_EVENT_TYPE` | Event type that triggers the truck transfer | `payment_intent.succeeded` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `4242` |
//! | `SMTP_HOST` | Mail relay host | none |
//! | `SMTP_PORT` | Mail relay port (implicit TLS) | `465` |
//! | `SMTP_USER` | Mail relay user, also the sender address | none |
//! | `SMTP_PASS` | Mail relay password | none |
//! | `PLATFORM_NAME` | Brand used in descriptions and mail sender | `Jelpala` |
//! | `ONBOARDING_REFRESH_URL` | Onboarding link refresh URL | `https://jelpala.com/onboarding/retry` |
//! | `ONBOARDING_RETURN_URL` | Onboarding link return URL | `https://jelpala.com/onboarding/complete` |
//! | `PLATFORM_FEE_BPS` | Platform fee in basis points | `3000` |
//! | `TRUCK_SHARE_BPS` | Trucking company share in basis points | `1500` |
//! | `TAX_BPS` | Invoice tax line in basis points | `1300` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::str::FromStr;

use tracing::warn;

use crate::fees::FeePolicy;

/// Environment variable selecting the log output format.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

const DEFAULT_STRIPE_API_BASE_URL: &str = "https://api.stripe.com";
const DEFAULT_SETTLEMENT_EVENT_TYPE: &str = "payment_intent.succeeded";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 4242;
const DEFAULT_SMTP_PORT: u16 = 465;
const DEFAULT_PLATFORM_NAME: &str = "Jelpala";
const DEFAULT_ONBOARDING_REFRESH_URL: &str = "https://jelpala.com/onboarding/retry";
const DEFAULT_ONBOARDING_RETURN_URL: &str = "https://jelpala.com/onboarding/complete";

/// Payment processor credentials and endpoints.
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    pub secret_key: Option<String>,
    pub api_base_url: String,
}

/// SMTP relay settings for receipt mail.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: Option<String>,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl SmtpConfig {
    pub fn is_configured(&self) -> bool {
        self.host.is_some() && self.user.is_some() && self.password.is_some()
    }
}

/// Static URLs handed to the processor when requesting onboarding links.
#[derive(Debug, Clone)]
pub struct OnboardingUrls {
    pub refresh_url: String,
    pub return_url: String,
}

/// Process-wide configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub platform_name: String,
    pub processor: ProcessorConfig,
    pub webhook_secret: Option<String>,
    pub settlement_event_type: String,
    pub smtp: SmtpConfig,
    pub onboarding: OnboardingUrls,
    pub fees: FeePolicy,
}

impl AppConfig {
    /// Build the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| -> Option<String> {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let or_default = |name: &str, default: &str| get(name).unwrap_or_else(|| default.to_string());

        let defaults = FeePolicy::default();

        Self {
            host: or_default("HOST", DEFAULT_HOST),
            port: parse_or_default("PORT", get("PORT"), DEFAULT_PORT),
            platform_name: or_default("PLATFORM_NAME", DEFAULT_PLATFORM_NAME),
            processor: ProcessorConfig {
                secret_key: get("STRIPE_SECRET_KEY"),
                api_base_url: or_default("STRIPE_API_BASE_URL", DEFAULT_STRIPE_API_BASE_URL),
            },
            webhook_secret: get("WEBHOOK_SECRET"),
            settlement_event_type: or_default(
                "SETTLEMENT_EVENT_TYPE",
                DEFAULT_SETTLEMENT_EVENT_TYPE,
            ),
            smtp: SmtpConfig {
                host: get("SMTP_HOST"),
                port: parse_or_default("SMTP_PORT", get("SMTP_PORT"), DEFAULT_SMTP_PORT),
                user: get("SMTP_USER"),
                password: get("SMTP_PASS"),
            },
            onboarding: OnboardingUrls {
                refresh_url: or_default("ONBOARDING_REFRESH_URL", DEFAULT_ONBOARDING_REFRESH_URL),
                return_url: or_default("ONBOARDING_RETURN_URL", DEFAULT_ONBOARDING_RETURN_URL),
            },
            fees: FeePolicy {
                platform_fee_bps: parse_or_default(
                    "PLATFORM_FEE_BPS",
                    get("PLATFORM_FEE_BPS"),
                    defaults.platform_fee_bps,
                ),
                truck_share_bps: parse_or_default(
                    "TRUCK_SHARE_BPS",
                    get("TRUCK_SHARE_BPS"),
                    defaults.truck_share_bps,
                ),
                tax_bps: parse_or_default("TAX_BPS", get("TAX_BPS"), defaults.tax_bps),
            },
        }
    }

    /// Socket address string the server binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn parse_or_default<T>(name: &str, raw: Option<String>, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match raw {
        Some(value) => value.parse().unwrap_or_else(|_| {
            warn!(variable = name, value = %value, default = %default, "invalid value, using default");
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> AppConfig {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_environment_is_empty() {
        let config = AppConfig::default();
        assert_eq!(config.bind_address(), "0.0.0.0:4242");
        assert_eq!(config.processor.api_base_url, "https://api.stripe.com");
        assert!(config.processor.secret_key.is_none());
        assert!(config.webhook_secret.is_none());
        assert_eq!(config.settlement_event_type, "payment_intent.succeeded");
        assert_eq!(config.smtp.port, 465);
        assert!(!config.smtp.is_configured());
        assert_eq!(config.fees, FeePolicy::default());
    }

    #[test]
    fn blank_values_count_as_missing() {
        let config = config_from(&[("STRIPE_SECRET_KEY", "   "), ("WEBHOOK_SECRET", "")]);
        assert!(config.processor.secret_key.is_none());
        assert!(config.webhook_secret.is_none());
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = config_from(&[
            ("PORT", "8080"),
            ("STRIPE_SECRET_KEY", "sk_test_123"),
            ("SMTP_HOST", "smtp.example.com"),
            ("SMTP_USER", "billing@example.com"),
            ("SMTP_PASS", "hunter2"),
            ("PLATFORM_FEE_BPS", "2500"),
        ]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.processor.secret_key.as_deref(), Some("sk_test_123"));
        assert!(config.smtp.is_configured());
        assert_eq!(config.fees.platform_fee_bps, 2500);
        assert_eq!(config.fees.truck_share_bps, 1500);
    }

    #[test]
    fn malformed_numbers_fall_back_to_defaults() {
        let config = config_from(&[("PORT", "not-a-port"), ("TAX_BPS", "-3")]);
        assert_eq!(config.port, 4242);
        assert_eq!(config.fees.tax_bps, 1300);
    }
}
