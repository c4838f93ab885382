//! Webhook signature verification.
//!
//! The `Stripe-Signature` header looks like `t=1700000000,v1=<hex>,v1=<hex>`.
//! The signed payload is `"{t}.{body}"`, HMAC-SHA256'd with the endpoint's
//! signing secret. Any `v1` entry may match (secrets roll over).

use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::StripeError;

/// Maximum age of a delivery, in seconds.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Verify `payload` against `header` as of the unix time `now`.
///
/// # Errors
///
/// Returns `StripeError::InvalidSignature` if the header is malformed, the
/// timestamp is outside the tolerance, or no signature matches.
pub fn verify_signature(
    secret: &[u8],
    payload: &str,
    header: &str,
    now: i64,
) -> Result<(), StripeError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(StripeError::InvalidSignature("missing timestamp"))?;
    let ts: i64 = timestamp
        .parse()
        .map_err(|_| StripeError::InvalidSignature("invalid timestamp"))?;
    if (now - ts).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(StripeError::InvalidSignature("timestamp outside tolerance"));
    }
    if signatures.is_empty() {
        return Err(StripeError::InvalidSignature("no v1 signature"));
    }

    let matches = signatures.iter().any(|sig| {
        let Ok(expected) = hex::decode(sig) else {
            return false;
        };
        let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(secret) else {
            return false;
        };
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(payload.as_bytes());
        mac.verify_slice(&expected).is_ok()
    });

    if matches {
        Ok(())
    } else {
        Err(StripeError::InvalidSignature("signature mismatch"))
    }
}

/// Build a header for `payload`, as Stripe would.
#[cfg(test)]
pub(crate) fn sign(secret: &[u8], payload: &str, timestamp: i64) -> String {
    #[allow(clippy::unwrap_used)]
    let mut mac = Hmac::<Sha256>::new_from_slice(secret).unwrap();
    mac.update(format!("{timestamp}.{payload}").as_bytes());
    format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"whsec_test_secret";
    const BODY: &str = r#"{"id":"evt_1","type":"payment_intent.succeeded"}"#;

    #[test]
    fn test_valid_signature() {
        let header = sign(SECRET, BODY, 1_700_000_000);
        assert!(verify_signature(SECRET, BODY, &header, 1_700_000_100).is_ok());
    }

    #[test]
    fn test_rolled_secret_second_signature_matches() {
        let good = sign(SECRET, BODY, 1_700_000_000);
        let header = format!("t=1700000000,v1={},{}", "00".repeat(32), &good[13..]);
        assert!(verify_signature(SECRET, BODY, &header, 1_700_000_000).is_ok());
    }

    #[test]
    fn test_tampered_body_rejected() {
        let header = sign(SECRET, BODY, 1_700_000_000);
        let err = verify_signature(SECRET, "{}", &header, 1_700_000_000).unwrap_err();
        assert!(matches!(err, StripeError::InvalidSignature("signature mismatch")));
    }

    #[test]
    fn test_stale_timestamp_rejected() {
        let header = sign(SECRET, BODY, 1_700_000_000);
        let err = verify_signature(SECRET, BODY, &header, 1_700_000_301).unwrap_err();
        assert!(matches!(err, StripeError::InvalidSignature("timestamp outside tolerance")));
    }

    #[test]
    fn test_malformed_header_rejected() {
        assert!(verify_signature(SECRET, BODY, "garbage", 0).is_err());
        assert!(verify_signature(SECRET, BODY, "t=abc,v1=00", 0).is_err());
        assert!(verify_signature(SECRET, BODY, "t=0", 0).is_err());
    }
}
