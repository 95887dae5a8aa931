//! Payment applications
//!
//! The join row recording how much of a payment was allocated to a document.
//! Created only by the allocation engine; deleted only when the owning
//! payment is voided.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{ApplicationId, DocumentId, Money, OrganizationId, PaymentId};

/// How much of a payment was applied to a document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentApplication {
    /// Unique identifier
    pub id: ApplicationId,
    /// Owning organization
    pub organization_id: OrganizationId,
    /// The payment the funds came from
    pub payment_id: PaymentId,
    /// The document the funds were applied to
    pub document_id: DocumentId,
    /// Amount applied (always positive)
    pub amount_applied: Money,
    /// When the allocation happened
    pub applied_at: DateTime<Utc>,
}

impl PaymentApplication {
    /// Creates a new application row
    pub fn new(
        organization_id: OrganizationId,
        payment_id: PaymentId,
        document_id: DocumentId,
        amount_applied: Money,
        applied_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ApplicationId::new_v7(),
            organization_id,
            payment_id,
            document_id,
            amount_applied,
            applied_at,
        }
    }
}
