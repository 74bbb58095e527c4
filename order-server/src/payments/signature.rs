//! Payment provider signature (HMAC-SHA256)
//!
//! Header format: `Payment-Signature: t=<unix secs>,v1=<hex hmac>` where the
//! MAC covers `"{t}.{raw body}"`.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

pub const SIGNATURE_HEADER: &str = "payment-signature";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("malformed signature header")]
    MalformedHeader,
    #[error("invalid signature encoding")]
    InvalidEncoding,
    #[error("signature mismatch")]
    Mismatch,
    #[error("timestamp outside tolerance")]
    Stale,
}

fn mac_for(secret: &str, timestamp: &str, payload: &[u8]) -> Result<Hmac<Sha256>, SignatureError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|_| SignatureError::InvalidEncoding)?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac)
}

/// Verify the header against the raw body. `now` and `tolerance_secs` are in
/// seconds; events further than the tolerance from `now` are rejected.
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance_secs: i64,
    now: i64,
) -> Result<(), SignatureError> {
    let mut timestamp = "";
    let mut signature = "";
    for part in header.split(',').map(str::trim) {
        if let Some(t) = part.strip_prefix("t=") {
            timestamp = t;
        } else if let Some(v) = part.strip_prefix("v1=") {
            signature = v;
        }
    }
    if timestamp.is_empty() || signature.is_empty() {
        return Err(SignatureError::MalformedHeader);
    }

    let sig_bytes = hex::decode(signature).map_err(|_| SignatureError::InvalidEncoding)?;
    // 常量时间比较
    mac_for(secret, timestamp, payload)?
        .verify_slice(&sig_bytes)
        .map_err(|_| SignatureError::Mismatch)?;

    let ts: i64 = timestamp.parse().map_err(|_| SignatureError::MalformedHeader)?;
    if (now - ts).abs() > tolerance_secs {
        return Err(SignatureError::Stale);
    }
    Ok(())
}

/// Build a header value for `payload` signed at `timestamp` (tests, tooling)
pub fn sign(payload: &[u8], secret: &str, timestamp: i64) -> String {
    let ts = timestamp.to_string();
    let digest = match mac_for(secret, &ts, payload) {
        Ok(mac) => hex::encode(mac.finalize().into_bytes()),
        Err(_) => String::new(),
    };
    format!("t={ts},v1={digest}")
}
