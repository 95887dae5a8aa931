//! Ledger domain errors

use rust_decimal::Decimal;
use thiserror::Error;

use core_kernel::{MoneyError, PortError};

/// Errors that can occur in the ledger domain
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Document not found or belongs to another tenant
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    /// Payment not found
    #[error("Payment not found: {0}")]
    PaymentNotFound(String),

    /// Document belongs to a different customer than the payment
    #[error("Document {0} belongs to a different customer")]
    CustomerMismatch(String),

    /// Document type or status does not accept payment application
    #[error("Document {0} does not accept payments")]
    NotPayable(String),

    /// No target documents were supplied
    #[error("At least one target document is required")]
    NoTargetDocuments,

    /// The same document appears more than once in the target list
    #[error("Document {0} is targeted more than once")]
    DuplicateTarget(String),

    /// Amount is zero, negative, or otherwise unusable
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Requested amount exceeds the combined balance due of the targets
    #[error("Amount {requested} exceeds combined balance due {available}")]
    AmountExceedsBalance {
        requested: Decimal,
        available: Decimal,
    },

    /// The payment is not in a state that permits the operation
    #[error("Payment {payment} is {status}, expected {expected}")]
    InvalidPaymentStatus {
        payment: String,
        status: String,
        expected: &'static str,
    },

    /// Money arithmetic failed
    #[error("Money error: {0}")]
    Money(#[from] MoneyError),

    /// The backing store reported an error
    #[error("Store error: {0}")]
    Store(#[from] PortError),
}
