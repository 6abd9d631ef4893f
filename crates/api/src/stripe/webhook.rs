//! Webhook signature verification.
//!
//! Stripe signs each delivery with a `Stripe-Signature` header of the form
//! `t=<unix time>,v1=<hex hmac>[,v1=...]`, where the HMAC-SHA256 covers
//! `"{t}.{raw body}"` under the endpoint's signing secret.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

use super::error::StripeError;
use super::types::Event;

/// Maximum age (and future skew) of a signed timestamp, in seconds.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Verify a delivery and parse its event.
///
/// # Errors
///
/// Returns `StripeError::InvalidSignature` if the header is missing parts,
/// stale, or does not match, and `StripeError::InvalidPayload` if the body is
/// not an event.
pub fn construct_event(
    payload: &str,
    signature_header: &str,
    secret: &SecretString,
) -> Result<Event, StripeError> {
    verify_signature(payload, signature_header, secret, chrono::Utc::now().timestamp())?;
    serde_json::from_str(payload).map_err(|e| StripeError::InvalidPayload(e.to_string()))
}

/// Verify a signature header against `payload` at time `now`.
///
/// # Errors
///
/// Returns `StripeError::InvalidSignature` on any failure.
pub fn verify_signature(
    payload: &str,
    signature_header: &str,
    secret: &SecretString,
    now: i64,
) -> Result<(), StripeError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in signature_header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp =
        timestamp.ok_or_else(|| StripeError::InvalidSignature("missing timestamp".to_owned()))?;
    if signatures.is_empty() {
        return Err(StripeError::InvalidSignature("missing v1 signature".to_owned()));
    }

    let ts: i64 = timestamp
        .parse()
        .map_err(|_| StripeError::InvalidSignature("invalid timestamp".to_owned()))?;
    if now.abs_diff(ts) > SIGNATURE_TOLERANCE_SECS.unsigned_abs() {
        return Err(StripeError::InvalidSignature(
            "timestamp outside tolerance".to_owned(),
        ));
    }

    let expected = sign(payload, timestamp, secret)?;
    if signatures.iter().any(|sig| constant_time_compare(&expected, sig)) {
        Ok(())
    } else {
        Err(StripeError::InvalidSignature("signature mismatch".to_owned()))
    }
}

/// Hex HMAC-SHA256 of `"{timestamp}.{payload}"`.
fn sign(payload: &str, timestamp: &str, secret: &SecretString) -> Result<String, StripeError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.expose_secret().as_bytes())
        .map_err(|e| StripeError::InvalidSignature(e.to_string()))?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Build a `Stripe-Signature` header for `payload` (used by tests and local tooling).
///
/// # Errors
///
/// Returns `StripeError::InvalidSignature` if the secret cannot key the MAC.
pub fn signature_header(
    payload: &str,
    secret: &SecretString,
    timestamp: i64,
) -> Result<String, StripeError> {
    let ts = timestamp.to_string();
    Ok(format!("t={ts},v1={}", sign(payload, &ts, secret)?))
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}
