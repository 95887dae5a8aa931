//! Webhook signature verification
//!
//! Notifications are signed with HMAC-SHA256 over `"{timestamp}.{payload}"`
//! using the organization's webhook secret, delivered in a header of the
//! form `t=<unix-timestamp>,v1=<hex-digest>`. Verification happens before
//! the payload is interpreted at all; a stale timestamp is rejected to
//! limit replay.

use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::GatewayError;

type HmacSha256 = Hmac<Sha256>;

/// Default tolerance for the signature timestamp (5 minutes)
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

/// Verifies signed notification payloads
#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    tolerance: Duration,
}

impl Default for SignatureVerifier {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE_SECS)
    }
}

impl SignatureVerifier {
    /// Creates a verifier with the given replay tolerance in seconds
    pub fn new(tolerance_secs: i64) -> Self {
        Self {
            tolerance: Duration::seconds(tolerance_secs),
        }
    }

    /// Verifies a signature header against the raw payload
    ///
    /// # Errors
    ///
    /// [`GatewayError::InvalidSignature`] when the header is malformed, the
    /// timestamp is outside the tolerance window, or the digest does not
    /// match.
    pub fn verify(
        &self,
        payload: &[u8],
        header: &str,
        secret: &SecretString,
        now: DateTime<Utc>,
    ) -> Result<(), GatewayError> {
        let (timestamp, provided) = parse_header(header)?;

        let age = now.timestamp() - timestamp;
        if age.abs() > self.tolerance.num_seconds() {
            return Err(GatewayError::InvalidSignature(format!(
                "timestamp outside tolerance ({age}s old)"
            )));
        }

        let expected = compute_signature(payload, secret, timestamp);
        let provided_bytes = hex::decode(provided)
            .map_err(|_| GatewayError::InvalidSignature("v1 is not valid hex".to_string()))?;
        let expected_bytes =
            hex::decode(&expected).expect("computed signature is always valid hex");

        if provided_bytes.len() != expected_bytes.len()
            || provided_bytes.ct_eq(&expected_bytes).unwrap_u8() != 1
        {
            return Err(GatewayError::InvalidSignature(
                "digest mismatch".to_string(),
            ));
        }
        Ok(())
    }
}

/// Computes the hex HMAC-SHA256 digest of `"{timestamp}.{payload}"`
///
/// Exposed so test fixtures can produce valid signature headers.
pub fn compute_signature(payload: &[u8], secret: &SecretString, timestamp: i64) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Builds a signature header for a payload (test fixtures)
pub fn signature_header(payload: &[u8], secret: &SecretString, timestamp: i64) -> String {
    format!("t={},v1={}", timestamp, compute_signature(payload, secret, timestamp))
}

fn parse_header(header: &str) -> Result<(i64, &str), GatewayError> {
    let mut timestamp = None;
    let mut signature = None;

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => {
                timestamp = Some(value.parse::<i64>().map_err(|_| {
                    GatewayError::InvalidSignature("t is not a unix timestamp".to_string())
                })?);
            }
            Some(("v1", value)) => signature = Some(value),
            _ => {} // unknown scheme elements are ignored
        }
    }

    match (timestamp, signature) {
        (Some(t), Some(v1)) => Ok((t, v1)),
        _ => Err(GatewayError::InvalidSignature(
            "header must carry t and v1".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret() -> SecretString {
        SecretString::new("whsec_test123secret456".to_string())
    }

    #[test]
    fn test_valid_signature_accepted() {
        let payload = br#"{"type":"checkout.session.completed"}"#;
        let now = Utc::now();
        let header = signature_header(payload, &secret(), now.timestamp());

        SignatureVerifier::default()
            .verify(payload, &header, &secret(), now)
            .unwrap();
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let payload = br#"{"type":"checkout.session.completed"}"#;
        let now = Utc::now();
        let header = signature_header(
            payload,
            &SecretString::new("wrong_secret".to_string()),
            now.timestamp(),
        );

        let err = SignatureVerifier::default()
            .verify(payload, &header, &secret(), now)
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidSignature(_)));
    }

    #[test]
    fn test_modified_payload_rejected() {
        let payload = br#"{"type":"checkout.session.completed"}"#;
        let tampered = br#"{"type":"checkout.session.completed","extra":true}"#;
        let now = Utc::now();
        let header = signature_header(payload, &secret(), now.timestamp());

        let err = SignatureVerifier::default()
            .verify(tampered, &header, &secret(), now)
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidSignature(_)));
    }

    #[test]
    fn test_stale_timestamp_rejected() {
        let payload = b"{}";
        let now = Utc::now();
        // 10 minutes old, beyond the 5-minute tolerance
        let stale = now.timestamp() - 600;
        let header = signature_header(payload, &secret(), stale);

        let err = SignatureVerifier::default()
            .verify(payload, &header, &secret(), now)
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidSignature(_)));
    }

    #[test]
    fn test_missing_timestamp_rejected() {
        let err = SignatureVerifier::default()
            .verify(b"{}", "v1=deadbeef", &secret(), Utc::now())
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidSignature(_)));
    }

    #[test]
    fn test_garbage_header_rejected() {
        let err = SignatureVerifier::default()
            .verify(b"{}", "totally-not-a-header", &secret(), Utc::now())
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidSignature(_)));
    }
}
