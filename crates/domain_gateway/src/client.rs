//! Gateway client port
//!
//! The outbound interface to the external payment gateway. Requests carry
//! the amount in integer minor-currency units and an opaque metadata map
//! embedding the local payment id and target document ids, so the eventual
//! notification can be correlated without a separate lookup table.

use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use core_kernel::{Currency, CustomerId, DocumentId, DomainPort, OrganizationId, PaymentId};

use crate::error::GatewayError;

/// How the collection flow is presented to the customer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutMode {
    /// Redirect to a gateway-hosted checkout page
    HostedRedirect,
    /// Embedded payment form driven by a client secret
    EmbeddedForm,
}

/// Correlation metadata embedded in every gateway session
///
/// Serialized to the gateway's string-keyed metadata map and recovered from
/// the notification payload when the outcome arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionMetadata {
    pub organization_id: OrganizationId,
    pub customer_id: CustomerId,
    pub payment_id: PaymentId,
    /// Target documents in allocation order
    pub document_ids: Vec<DocumentId>,
    pub payment_number: String,
}

impl SessionMetadata {
    /// Serializes to the gateway's opaque string map
    pub fn to_map(&self) -> HashMap<String, String> {
        let document_ids = self
            .document_ids
            .iter()
            .map(|id| id.as_uuid().to_string())
            .collect::<Vec<_>>()
            .join(",");

        HashMap::from([
            (
                "organizationId".to_string(),
                self.organization_id.as_uuid().to_string(),
            ),
            (
                "customerId".to_string(),
                self.customer_id.as_uuid().to_string(),
            ),
            ("paymentId".to_string(), self.payment_id.as_uuid().to_string()),
            ("documentIds".to_string(), document_ids),
            ("paymentNumber".to_string(), self.payment_number.clone()),
        ])
    }

    /// Recovers metadata from a notification's string map
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::MalformedPayload`] when a key is missing or
    /// an id fails to parse.
    pub fn from_map(map: &HashMap<String, String>) -> Result<Self, GatewayError> {
        fn require<'a>(
            map: &'a HashMap<String, String>,
            key: &str,
        ) -> Result<&'a str, GatewayError> {
            map.get(key)
                .map(String::as_str)
                .ok_or_else(|| GatewayError::MalformedPayload(format!("missing metadata key {key}")))
        }

        fn parse_id<T: FromStr>(value: &str, key: &str) -> Result<T, GatewayError> {
            value
                .parse()
                .map_err(|_| GatewayError::MalformedPayload(format!("invalid {key}: {value}")))
        }

        let document_ids = require(map, "documentIds")?
            .split(',')
            .filter(|s| !s.is_empty())
            .map(|s| parse_id::<DocumentId>(s, "documentIds"))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            organization_id: parse_id(require(map, "organizationId")?, "organizationId")?,
            customer_id: parse_id(require(map, "customerId")?, "customerId")?,
            payment_id: parse_id(require(map, "paymentId")?, "paymentId")?,
            document_ids,
            payment_number: require(map, "paymentNumber")?.to_string(),
        })
    }
}

/// Request to create a gateway session or payment intent
#[derive(Debug, Clone)]
pub struct CreateSessionRequest {
    /// Amount in integer minor-currency units (e.g. cents)
    pub amount_minor: i64,
    /// Currency code
    pub currency: Currency,
    /// Absolute timestamp after which the session is inert
    pub expires_at: DateTime<Utc>,
    /// Correlation metadata
    pub metadata: SessionMetadata,
}

/// A gateway-hosted checkout session
#[derive(Debug, Clone)]
pub struct GatewaySession {
    /// Gateway-assigned session id
    pub session_id: String,
    /// URL the customer is redirected to
    pub redirect_url: String,
}

/// A gateway payment intent backing an embedded form
#[derive(Debug, Clone)]
pub struct GatewayIntent {
    /// Gateway-assigned intent id
    pub intent_id: String,
    /// Client secret handed to the embedded form
    pub client_secret: String,
}

/// Outbound port to the external payment gateway
#[async_trait]
pub trait GatewayClient: DomainPort {
    /// Creates a hosted checkout session
    async fn create_checkout_session(
        &self,
        api_key: &SecretString,
        request: &CreateSessionRequest,
    ) -> Result<GatewaySession, GatewayError>;

    /// Creates a payment intent for an embedded form
    async fn create_payment_intent(
        &self,
        api_key: &SecretString,
        request: &CreateSessionRequest,
    ) -> Result<GatewayIntent, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> SessionMetadata {
        SessionMetadata {
            organization_id: OrganizationId::new(),
            customer_id: CustomerId::new(),
            payment_id: PaymentId::new(),
            document_ids: vec![DocumentId::new(), DocumentId::new()],
            payment_number: "PMT-000017".to_string(),
        }
    }

    #[test]
    fn test_metadata_round_trip() {
        let original = metadata();
        let recovered = SessionMetadata::from_map(&original.to_map()).unwrap();
        assert_eq!(recovered, original);
    }

    #[test]
    fn test_document_ids_comma_joined() {
        let md = metadata();
        let map = md.to_map();
        let joined = &map["documentIds"];
        assert_eq!(joined.split(',').count(), 2);
    }

    #[test]
    fn test_missing_key_rejected() {
        let md = metadata();
        let mut map = md.to_map();
        map.remove("paymentId");
        let err = SessionMetadata::from_map(&map).unwrap_err();
        assert!(matches!(err, GatewayError::MalformedPayload(_)));
    }

    #[test]
    fn test_garbage_id_rejected() {
        let md = metadata();
        let mut map = md.to_map();
        map.insert("documentIds".to_string(), "not-a-uuid".to_string());
        let err = SessionMetadata::from_map(&map).unwrap_err();
        assert!(matches!(err, GatewayError::MalformedPayload(_)));
    }
}
