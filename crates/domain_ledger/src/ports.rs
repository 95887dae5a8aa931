//! Ledger store port
//!
//! The narrow repository interface the ledger domain requires from its
//! persistence adapter. Every multi-row mutation goes through one of the
//! `commit_*` methods, which take a fully-planned outcome and execute it as
//! a single atomic transaction; the atomicity guarantees of the ledger are
//! structural, not conventions.

use async_trait::async_trait;

use core_kernel::{CustomerId, DocumentId, DomainPort, OrganizationId, PaymentId, PortError};

use crate::allocation::AllocationOutcome;
use crate::application::PaymentApplication;
use crate::document::Document;
use crate::payment::Payment;
use crate::reversal::ReversalOutcome;

/// Persistence port for documents, payments, and applications
///
/// Implementations must serialize concurrent mutations of the same payment
/// row (e.g. via row locks and transaction isolation) so the status
/// re-checks in the notification processor are race-free: two concurrent
/// success notifications for one payment must result in exactly one
/// allocation.
#[async_trait]
pub trait LedgerStore: DomainPort {
    /// Fetches a single document scoped to an organization
    async fn get_document(
        &self,
        organization_id: OrganizationId,
        document_id: DocumentId,
    ) -> Result<Option<Document>, PortError>;

    /// Fetches documents by id, preserving the requested order
    ///
    /// Ids that do not resolve in this organization are omitted from the
    /// result; callers detect missing documents by comparing lengths.
    async fn get_documents(
        &self,
        organization_id: OrganizationId,
        document_ids: &[DocumentId],
    ) -> Result<Vec<Document>, PortError>;

    /// Lists a customer's documents with an outstanding balance
    async fn get_open_documents(
        &self,
        organization_id: OrganizationId,
        customer_id: CustomerId,
    ) -> Result<Vec<Document>, PortError>;

    /// Inserts a document created by the authoring collaborator
    async fn insert_document(&self, document: &Document) -> Result<(), PortError>;

    /// Fetches a payment scoped to an organization
    async fn get_payment(
        &self,
        organization_id: OrganizationId,
        payment_id: PaymentId,
    ) -> Result<Option<Payment>, PortError>;

    /// Finds a payment by gateway session or intent id
    async fn find_payment_by_gateway_reference(
        &self,
        organization_id: OrganizationId,
        reference: &str,
    ) -> Result<Option<Payment>, PortError>;

    /// Fetches all application rows belonging to a payment
    async fn get_applications_for_payment(
        &self,
        organization_id: OrganizationId,
        payment_id: PaymentId,
    ) -> Result<Vec<PaymentApplication>, PortError>;

    /// Returns the next value of the organization's payment-number sequence
    async fn next_payment_number(
        &self,
        organization_id: OrganizationId,
    ) -> Result<u64, PortError>;

    /// Inserts a new payment row
    async fn insert_payment(&self, payment: &Payment) -> Result<(), PortError>;

    /// Persists updated payment fields (status, gateway references, audit)
    async fn update_payment(&self, payment: &Payment) -> Result<(), PortError>;

    /// Commits an allocation atomically
    ///
    /// Writes the payment's new state, inserts the application rows, and
    /// updates every touched document in one transaction. Either all of it
    /// becomes visible or none does. Implementations re-check the stored
    /// payment status and each document's balance against the plan, and
    /// refuse with a conflict when either has moved since the plan was made.
    async fn commit_allocation(
        &self,
        payment: &Payment,
        outcome: &AllocationOutcome,
    ) -> Result<(), PortError>;

    /// Commits a reversal atomically
    ///
    /// Restores the documents, deletes the application rows, and voids the
    /// payment in one transaction, with the same stale-plan checks as
    /// [`Self::commit_allocation`].
    async fn commit_reversal(&self, outcome: &ReversalOutcome) -> Result<(), PortError>;

    /// Voids all still-pending payments for an expired checkout session
    ///
    /// Scoped by current status so a racing success notification that
    /// already applied the payment is never clobbered. Returns the number
    /// of payments transitioned.
    async fn expire_pending_sessions(
        &self,
        organization_id: OrganizationId,
        session_id: &str,
    ) -> Result<u64, PortError>;
}
