//! Stripe webhook signature verification.
//!
//! The `Stripe-Signature` header has the form `t=<unix time>,v1=<hex signature>[,v1=...]`. Each `v1` value is the
//! hex-encoded HMAC-SHA256 of `"<t>.<raw body>"` keyed with the endpoint's signing secret. A payload is accepted if
//! any `v1` value matches and the timestamp is within the tolerance window.
use hmac::{Hmac, Mac};
use log::*;
use sha2::Sha256;

use crate::{StripeApiError, StripeEvent};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq, Eq)]
struct SignatureHeader {
    timestamp: i64,
    signatures: Vec<String>,
}

fn parse_header(header: &str) -> Result<SignatureHeader, StripeApiError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", t)) => {
                let t = t.parse::<i64>().map_err(|_| StripeApiError::InvalidSignature(format!("Bad timestamp: {t}")))?;
                timestamp = Some(t);
            },
            Some(("v1", sig)) => signatures.push(sig.to_string()),
            _ => {},
        }
    }
    let timestamp = timestamp.ok_or_else(|| StripeApiError::InvalidSignature("No timestamp in header".into()))?;
    if signatures.is_empty() {
        return Err(StripeApiError::InvalidSignature("No v1 signature in header".into()));
    }
    Ok(SignatureHeader { timestamp, signatures })
}

fn mac_for(secret: &str, timestamp: i64, payload: &[u8]) -> Result<HmacSha256, StripeApiError> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|e| StripeApiError::InvalidSignature(e.to_string()))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac)
}

/// Computes the `v1` signature for `payload`. Useful for signing test fixtures.
pub fn compute_signature(secret: &str, timestamp: i64, payload: &[u8]) -> Result<String, StripeApiError> {
    Ok(hex::encode(mac_for(secret, timestamp, payload)?.finalize().into_bytes()))
}

/// Builds a complete `Stripe-Signature` header value for `payload`.
pub fn signature_header(secret: &str, timestamp: i64, payload: &[u8]) -> Result<String, StripeApiError> {
    Ok(format!("t={timestamp},v1={}", compute_signature(secret, timestamp, payload)?))
}

/// Checks the signature header against the raw body. Comparison is constant-time.
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance_secs: i64,
    now: i64,
) -> Result<(), StripeApiError> {
    if secret.is_empty() {
        return Err(StripeApiError::InvalidSignature("No webhook secret is configured".into()));
    }
    let header = parse_header(header)?;
    if now.abs_diff(header.timestamp) > tolerance_secs.max(0) as u64 {
        return Err(StripeApiError::InvalidSignature(format!(
            "Timestamp {} is outside the {tolerance_secs}s tolerance window",
            header.timestamp
        )));
    }
    let matched = header.signatures.iter().any(|sig| {
        let Ok(expected) = hex::decode(sig) else {
            return false;
        };
        mac_for(secret, header.timestamp, payload).map(|mac| mac.verify_slice(&expected).is_ok()).unwrap_or(false)
    });
    if matched {
        Ok(())
    } else {
        Err(StripeApiError::InvalidSignature("No signatures found matching the expected signature".into()))
    }
}

/// Verifies the signature and decodes the event. Nothing is parsed until the signature has been checked.
pub fn construct_event(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance_secs: i64,
    now: i64,
) -> Result<StripeEvent, StripeApiError> {
    verify_signature(payload, header, secret, tolerance_secs, now)?;
    let event = serde_json::from_slice::<StripeEvent>(payload).map_err(|e| StripeApiError::JsonError(e.to_string()))?;
    trace!("Verified Stripe event {} ({})", event.id, event.event_type);
    Ok(event)
}
