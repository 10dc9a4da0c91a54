// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Webhook signature verification.
//!
//! The processor signs `"{timestamp}.{raw body}"` with HMAC-SHA256 keyed by
//! the endpoint's shared secret and sends `t=<unix>,v1=<hex>[,v1=<hex>]` in
//! the `stripe-signature` header. More than one `v1` entry appears while a
//! secret is being rolled.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the webhook signature.
pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Maximum accepted age of a signed timestamp, in seconds.
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

const SIGNATURE_SCHEME: &str = "v1";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("No signatures found matching the expected signature for payload")]
    NoMatchingSignature,

    #[error("Unable to extract timestamp and signatures from header")]
    Malformed,

    #[error("Timestamp outside the tolerance zone")]
    TimestampOutOfTolerance,

    #[error("Missing stripe-signature header")]
    MissingHeader,
}

struct ParsedHeader<'a> {
    timestamp: i64,
    /// `t=` value exactly as sent; it is what the processor signed.
    raw_timestamp: &'a str,
    signatures: Vec<Vec<u8>>,
}

fn parse_header(header: &str) -> Result<ParsedHeader<'_>, SignatureError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = value.parse::<i64>().ok().map(|parsed| (parsed, value)),
            SIGNATURE_SCHEME => {
                // Entries that are not hex can never match; skip them.
                if let Ok(bytes) = hex::decode(value) {
                    signatures.push(bytes);
                }
            }
            _ => {}
        }
    }

    let (timestamp, raw_timestamp) = timestamp.ok_or(SignatureError::Malformed)?;
    if signatures.is_empty() {
        return Err(SignatureError::NoMatchingSignature);
    }
    Ok(ParsedHeader {
        timestamp,
        raw_timestamp,
        signatures,
    })
}

fn mac_for(secret: &str, timestamp: &str, payload: &[u8]) -> HmacSha256 {
    // HMAC accepts keys of any length.
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    mac
}

/// Hex signature the processor would send for `payload` at `timestamp`.
pub fn compute_signature(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    hex::encode(
        mac_for(secret, &timestamp.to_string(), payload)
            .finalize()
            .into_bytes(),
    )
}

/// Verify `header` against the raw `payload` at wall-clock time `now`.
pub fn verify_signature(
    payload: &[u8],
    header: Option<&str>,
    secret: &str,
    now: i64,
    tolerance_secs: i64,
) -> Result<(), SignatureError> {
    let header = header.ok_or(SignatureError::MissingHeader)?;
    let parsed = parse_header(header)?;

    let expected = mac_for(secret, parsed.raw_timestamp, payload);
    let matched = parsed
        .signatures
        .iter()
        .any(|candidate| expected.clone().verify_slice(candidate).is_ok());
    if !matched {
        return Err(SignatureError::NoMatchingSignature);
    }

    if tolerance_secs > 0 && now.saturating_sub(parsed.timestamp) > tolerance_secs {
        return Err(SignatureError::TimestampOutOfTolerance);
    }

    Ok(())
}
