//! Webhook fixtures
//!
//! Signed notification bodies in the shapes the processor consumes, plus
//! the shared test credentials that sign them.

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde_json::json;

use domain_gateway::adapters::StaticCredentialStore;
use domain_gateway::signature::signature_header;
use domain_gateway::SessionMetadata;

/// The webhook signing secret used across the test suite
pub fn webhook_secret() -> SecretString {
    SecretString::new("whsec_test_secret".to_string())
}

/// A credential store serving the shared test credentials for every
/// organization
pub fn test_credentials() -> StaticCredentialStore {
    StaticCredentialStore::new(
        SecretString::new("sk_test_key".to_string()),
        webhook_secret(),
    )
}

/// Builds a valid signature header for a payload at the given time
pub fn signed_header(payload: &[u8], now: DateTime<Utc>) -> String {
    signature_header(payload, &webhook_secret(), now.timestamp())
}

/// `checkout.session.completed` notification body
pub fn checkout_completed_body(
    session_id: &str,
    intent_id: Option<&str>,
    amount_minor: i64,
    metadata: &SessionMetadata,
) -> Vec<u8> {
    json!({
        "type": "checkout.session.completed",
        "data": {"object": {
            "id": session_id,
            "payment_intent": intent_id,
            "amount_total": amount_minor,
            "metadata": metadata.to_map(),
        }}
    })
    .to_string()
    .into_bytes()
}

/// `checkout.session.expired` notification body
pub fn checkout_expired_body(session_id: &str) -> Vec<u8> {
    json!({
        "type": "checkout.session.expired",
        "data": {"object": {"id": session_id}}
    })
    .to_string()
    .into_bytes()
}

/// `payment_intent.succeeded` notification body
pub fn intent_succeeded_body(
    intent_id: &str,
    amount_minor: i64,
    metadata: &SessionMetadata,
) -> Vec<u8> {
    json!({
        "type": "payment_intent.succeeded",
        "data": {"object": {
            "id": intent_id,
            "amount": amount_minor,
            "metadata": metadata.to_map(),
            "payment_method_details": {"card": {"brand": "visa", "last4": "4242"}},
        }}
    })
    .to_string()
    .into_bytes()
}

/// `payment_intent.payment_failed` notification body
pub fn intent_failed_body(intent_id: &str, message: &str) -> Vec<u8> {
    json!({
        "type": "payment_intent.payment_failed",
        "data": {"object": {
            "id": intent_id,
            "last_payment_error": {"message": message},
        }}
    })
    .to_string()
    .into_bytes()
}
