//! Gateway domain errors

use thiserror::Error;

use core_kernel::PortError;
use domain_ledger::LedgerError;

/// Errors that can occur in the gateway domain
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No signature header was supplied with the notification
    #[error("Missing notification signature")]
    MissingSignature,

    /// The signature header did not verify against the payload
    #[error("Invalid notification signature: {0}")]
    InvalidSignature(String),

    /// The payload could not be parsed into a known notification shape
    #[error("Malformed notification payload: {0}")]
    MalformedPayload(String),

    /// The notification type is not one this system consumes
    #[error("Unrecognized notification type: {0}")]
    UnrecognizedEvent(String),

    /// A notification referenced a payment with no local record
    #[error("No payment found for gateway reference {0}")]
    PaymentNotFound(String),

    /// The organization has no gateway credentials configured
    #[error("Missing gateway credentials for organization {0}")]
    MissingCredentials(String),

    /// The external gateway call failed
    #[error("Gateway call failed: {0}")]
    Provider(String),

    /// A ledger operation failed
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// The backing store reported an error
    #[error("Store error: {0}")]
    Store(#[from] PortError),
}

impl GatewayError {
    /// Returns true when the sender is at fault and a retry can never
    /// succeed; such errors map to 4xx responses so the gateway's retry
    /// policy stops redelivering the payload.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            GatewayError::MissingSignature
                | GatewayError::InvalidSignature(_)
                | GatewayError::MalformedPayload(_)
                | GatewayError::UnrecognizedEvent(_)
                | GatewayError::PaymentNotFound(_)
                | GatewayError::MissingCredentials(_)
        )
    }
}
