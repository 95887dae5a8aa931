//! Ledger application service
//!
//! Orchestrates load -> plan -> atomic commit for the two operations that
//! mutate the ledger: applying a confirmed payment and voiding an applied
//! one. All validation happens in the pure planners; this layer only moves
//! data between the store and the planners.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use core_kernel::{DocumentId, OrganizationId, PaymentId};

use crate::allocation::{allocate_payment, AllocationOutcome};
use crate::error::LedgerError;
use crate::payment::Payment;
use crate::ports::LedgerStore;
use crate::reversal::{reverse_payment, ReversalOutcome};

/// Funds-received confirmation details captured from the gateway
#[derive(Debug, Clone, Default)]
pub struct PaymentConfirmation {
    /// Gateway transaction id
    pub gateway_transaction_id: Option<String>,
    /// Raw gateway response snapshot (card metadata etc.) for audit
    pub gateway_response: Option<serde_json::Value>,
}

/// Service coordinating ledger mutations through the store port
#[derive(Clone)]
pub struct LedgerService {
    store: Arc<dyn LedgerStore>,
}

impl LedgerService {
    /// Creates a new service over the given store
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Returns the underlying store
    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.store
    }

    /// Applies a pending payment across the given documents
    ///
    /// Loads the targets in the supplied order, plans the allocation, marks
    /// the payment `Applied`, and commits everything in one transaction.
    /// On any failure nothing is persisted and the stored payment remains
    /// `Pending`.
    #[instrument(skip(self, payment, confirmation), fields(payment_id = %payment.id))]
    pub async fn apply_payment(
        &self,
        mut payment: Payment,
        document_ids: &[DocumentId],
        confirmation: PaymentConfirmation,
        now: DateTime<Utc>,
    ) -> Result<(Payment, AllocationOutcome), LedgerError> {
        let documents = self
            .store
            .get_documents(payment.organization_id, document_ids)
            .await?;

        if documents.len() != document_ids.len() {
            let missing = document_ids
                .iter()
                .find(|id| !documents.iter().any(|d| d.id == **id));
            return Err(LedgerError::DocumentNotFound(
                missing.map(|id| id.to_string()).unwrap_or_default(),
            ));
        }

        let outcome = allocate_payment(&payment, documents, now)?;
        payment.mark_applied(
            confirmation.gateway_transaction_id,
            confirmation.gateway_response,
            now,
        )?;

        self.store.commit_allocation(&payment, &outcome).await?;

        info!(
            payment_number = %payment.payment_number,
            documents = outcome.applications.len(),
            amount = %payment.amount,
            "payment applied"
        );
        Ok((payment, outcome))
    }

    /// Voids an applied payment, restoring every document it touched
    #[instrument(skip(self), fields(%organization_id, %payment_id))]
    pub async fn void_payment(
        &self,
        organization_id: OrganizationId,
        payment_id: PaymentId,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<ReversalOutcome, LedgerError> {
        let payment = self
            .store
            .get_payment(organization_id, payment_id)
            .await?
            .ok_or_else(|| LedgerError::PaymentNotFound(payment_id.to_string()))?;

        let applications = self
            .store
            .get_applications_for_payment(organization_id, payment_id)
            .await?;

        let document_ids: Vec<DocumentId> =
            applications.iter().map(|a| a.document_id).collect();
        let documents = self
            .store
            .get_documents(organization_id, &document_ids)
            .await?;

        let outcome = reverse_payment(payment, applications, documents, reason, now)?;
        self.store.commit_reversal(&outcome).await?;

        info!(
            payment_number = %outcome.payment.payment_number,
            documents = outcome.documents.len(),
            "payment voided"
        );
        Ok(outcome)
    }
}
