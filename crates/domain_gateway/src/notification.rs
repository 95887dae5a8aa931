//! Gateway notification payloads
//!
//! Notification bodies arrive as loosely-typed JSON. They are parsed into a
//! small tagged-variant type here at the boundary, rejecting unrecognized
//! shapes immediately, so nothing loosely typed travels deeper into the
//! engine.
//!
//! Four event shapes are consumed: checkout session completed, checkout
//! session expired, payment-intent succeeded, payment-intent failed.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use crate::client::SessionMetadata;
use crate::error::GatewayError;

/// A parsed gateway notification
#[derive(Debug, Clone)]
pub enum GatewayNotification {
    /// Hosted checkout completed; funds captured
    CheckoutCompleted {
        session_id: String,
        intent_id: Option<String>,
        metadata: SessionMetadata,
        amount_minor: Option<i64>,
        raw: Value,
    },
    /// Hosted checkout expired without completing
    CheckoutExpired { session_id: String },
    /// Embedded-form payment intent succeeded; funds captured. Card
    /// metadata rides along in `raw`, which is persisted as the payment's
    /// gateway response snapshot.
    IntentSucceeded {
        intent_id: String,
        metadata: SessionMetadata,
        amount_minor: Option<i64>,
        raw: Value,
    },
    /// Payment intent failed (card declined, etc.)
    IntentFailed {
        intent_id: String,
        failure_message: Option<String>,
        raw: Value,
    },
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    event_type: String,
    data: EnvelopeData,
}

#[derive(Debug, Deserialize)]
struct EnvelopeData {
    object: Value,
}

#[derive(Debug, Deserialize)]
struct CheckoutSessionObject {
    id: String,
    payment_intent: Option<String>,
    amount_total: Option<i64>,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct ExpiredSessionObject {
    id: String,
}

#[derive(Debug, Deserialize)]
struct PaymentIntentObject {
    id: String,
    amount: Option<i64>,
    #[serde(default)]
    metadata: HashMap<String, String>,
    last_payment_error: Option<PaymentError>,
}

#[derive(Debug, Deserialize)]
struct PaymentError {
    message: Option<String>,
}

impl GatewayNotification {
    /// Parses a raw notification body
    ///
    /// # Errors
    ///
    /// - [`GatewayError::MalformedPayload`] for bodies that are not valid
    ///   JSON or lack the fields the event type requires
    /// - [`GatewayError::UnrecognizedEvent`] for event types this system
    ///   does not consume
    pub fn parse(payload: &[u8]) -> Result<Self, GatewayError> {
        let envelope: Envelope = serde_json::from_slice(payload)
            .map_err(|e| GatewayError::MalformedPayload(e.to_string()))?;

        let object = envelope.data.object;
        match envelope.event_type.as_str() {
            "checkout.session.completed" => {
                let session: CheckoutSessionObject = decode(&object)?;
                let metadata = SessionMetadata::from_map(&session.metadata)?;
                Ok(GatewayNotification::CheckoutCompleted {
                    session_id: session.id,
                    intent_id: session.payment_intent,
                    metadata,
                    amount_minor: session.amount_total,
                    raw: object,
                })
            }
            "checkout.session.expired" => {
                let session: ExpiredSessionObject = decode(&object)?;
                Ok(GatewayNotification::CheckoutExpired {
                    session_id: session.id,
                })
            }
            "payment_intent.succeeded" => {
                let intent: PaymentIntentObject = decode(&object)?;
                let metadata = SessionMetadata::from_map(&intent.metadata)?;
                Ok(GatewayNotification::IntentSucceeded {
                    intent_id: intent.id,
                    metadata,
                    amount_minor: intent.amount,
                    raw: object,
                })
            }
            "payment_intent.payment_failed" => {
                let intent: PaymentIntentObject = decode(&object)?;
                Ok(GatewayNotification::IntentFailed {
                    intent_id: intent.id,
                    failure_message: intent.last_payment_error.and_then(|e| e.message),
                    raw: object,
                })
            }
            other => Err(GatewayError::UnrecognizedEvent(other.to_string())),
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(object: &Value) -> Result<T, GatewayError> {
    serde_json::from_value(object.clone())
        .map_err(|e| GatewayError::MalformedPayload(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::{CustomerId, DocumentId, OrganizationId, PaymentId};
    use serde_json::json;

    fn metadata_json() -> Value {
        json!({
            "organizationId": OrganizationId::new().as_uuid().to_string(),
            "customerId": CustomerId::new().as_uuid().to_string(),
            "paymentId": PaymentId::new().as_uuid().to_string(),
            "documentIds": DocumentId::new().as_uuid().to_string(),
            "paymentNumber": "PMT-000001",
        })
    }

    #[test]
    fn test_parse_checkout_completed() {
        let body = json!({
            "type": "checkout.session.completed",
            "data": {"object": {
                "id": "cs_test_123",
                "payment_intent": "pi_test_456",
                "amount_total": 50000,
                "metadata": metadata_json(),
            }}
        });

        let parsed = GatewayNotification::parse(body.to_string().as_bytes()).unwrap();
        match parsed {
            GatewayNotification::CheckoutCompleted {
                session_id,
                intent_id,
                amount_minor,
                ..
            } => {
                assert_eq!(session_id, "cs_test_123");
                assert_eq!(intent_id.as_deref(), Some("pi_test_456"));
                assert_eq!(amount_minor, Some(50000));
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn test_parse_checkout_expired() {
        let body = json!({
            "type": "checkout.session.expired",
            "data": {"object": {"id": "cs_test_123"}}
        });

        let parsed = GatewayNotification::parse(body.to_string().as_bytes()).unwrap();
        assert!(matches!(
            parsed,
            GatewayNotification::CheckoutExpired { session_id } if session_id == "cs_test_123"
        ));
    }

    #[test]
    fn test_parse_intent_succeeded_keeps_card_details_in_snapshot() {
        let body = json!({
            "type": "payment_intent.succeeded",
            "data": {"object": {
                "id": "pi_test_456",
                "amount": 30000,
                "metadata": metadata_json(),
                "payment_method_details": {"card": {"brand": "visa", "last4": "4242"}},
            }}
        });

        let parsed = GatewayNotification::parse(body.to_string().as_bytes()).unwrap();
        match parsed {
            GatewayNotification::IntentSucceeded {
                intent_id,
                amount_minor,
                raw,
                ..
            } => {
                assert_eq!(intent_id, "pi_test_456");
                assert_eq!(amount_minor, Some(30000));
                // Card metadata survives in the raw snapshot persisted on
                // the payment.
                assert_eq!(
                    raw["payment_method_details"]["card"]["last4"],
                    json!("4242")
                );
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn test_parse_intent_failed() {
        let body = json!({
            "type": "payment_intent.payment_failed",
            "data": {"object": {
                "id": "pi_test_456",
                "last_payment_error": {"message": "Your card was declined."},
            }}
        });

        let parsed = GatewayNotification::parse(body.to_string().as_bytes()).unwrap();
        match parsed {
            GatewayNotification::IntentFailed {
                intent_id,
                failure_message,
                ..
            } => {
                assert_eq!(intent_id, "pi_test_456");
                assert_eq!(
                    failure_message.as_deref(),
                    Some("Your card was declined.")
                );
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn test_unrecognized_event_rejected() {
        let body = json!({
            "type": "customer.subscription.deleted",
            "data": {"object": {"id": "sub_1"}}
        });

        let err = GatewayNotification::parse(body.to_string().as_bytes()).unwrap_err();
        assert!(matches!(err, GatewayError::UnrecognizedEvent(_)));
    }

    #[test]
    fn test_non_json_rejected() {
        let err = GatewayNotification::parse(b"not json at all").unwrap_err();
        assert!(matches!(err, GatewayError::MalformedPayload(_)));
    }

    #[test]
    fn test_completed_without_metadata_rejected() {
        let body = json!({
            "type": "checkout.session.completed",
            "data": {"object": {"id": "cs_test_123"}}
        });

        let err = GatewayNotification::parse(body.to_string().as_bytes()).unwrap_err();
        assert!(matches!(err, GatewayError::MalformedPayload(_)));
    }
}
