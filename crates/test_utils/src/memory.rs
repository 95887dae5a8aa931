//! In-memory ledger store
//!
//! Implements `LedgerStore` over hash maps with the same semantics the
//! PostgreSQL adapter provides: commits are all-or-nothing, the payment's
//! stored status is re-checked before a commit mutates anything, and
//! session expiry only touches pending rows. Failure injection lets tests
//! exercise the paths where the store errors mid-operation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;

use core_kernel::{
    AdapterHealth, CustomerId, DocumentId, DomainPort, HealthCheckResult, HealthCheckable,
    OrganizationId, PaymentId, PortError,
};
use domain_ledger::payment::CheckoutSessionStatus;
use domain_ledger::{
    AllocationOutcome, Document, LedgerStore, Payment, PaymentApplication, PaymentStatus,
    ReversalOutcome,
};

#[derive(Default)]
struct LedgerState {
    documents: HashMap<DocumentId, Document>,
    payments: HashMap<PaymentId, Payment>,
    applications: Vec<PaymentApplication>,
    sequences: HashMap<OrganizationId, u64>,
}

/// In-memory implementation of the `LedgerStore` port
#[derive(Default)]
pub struct InMemoryLedgerStore {
    state: Mutex<LedgerState>,
    fail_commits: AtomicBool,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `commit_*` call fail with a connection error
    pub fn set_fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    /// Seeds a document directly
    pub fn seed_document(&self, document: Document) {
        let mut state = self.lock();
        state.documents.insert(document.id, document);
    }

    /// Seeds a payment directly
    pub fn seed_payment(&self, payment: Payment) {
        let mut state = self.lock();
        state.payments.insert(payment.id, payment);
    }

    /// Snapshot of a stored document
    pub fn document(&self, document_id: DocumentId) -> Option<Document> {
        self.lock().documents.get(&document_id).cloned()
    }

    /// Snapshot of a stored payment
    pub fn payment(&self, payment_id: PaymentId) -> Option<Payment> {
        self.lock().payments.get(&payment_id).cloned()
    }

    /// Snapshot of all stored payments
    pub fn payments(&self) -> Vec<Payment> {
        self.lock().payments.values().cloned().collect()
    }

    /// Snapshot of all application rows
    pub fn applications(&self) -> Vec<PaymentApplication> {
        self.lock().applications.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LedgerState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn check_commit_failure(&self) -> Result<(), PortError> {
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(PortError::connection("injected commit failure"));
        }
        Ok(())
    }
}

fn verify_planned_balance(
    state: &LedgerState,
    document: &Document,
    planned_from: Decimal,
) -> Result<(), PortError> {
    let stored = state
        .documents
        .get(&document.id)
        .ok_or_else(|| PortError::not_found("document", document.id))?;
    if stored.balance_due.amount() != planned_from {
        return Err(PortError::conflict(format!(
            "document {} balance is {}, plan expected {}",
            document.id,
            stored.balance_due.amount(),
            planned_from
        )));
    }
    Ok(())
}

impl DomainPort for InMemoryLedgerStore {}

#[async_trait]
impl HealthCheckable for InMemoryLedgerStore {
    async fn health_check(&self) -> HealthCheckResult {
        HealthCheckResult {
            adapter_id: "in-memory-ledger".to_string(),
            status: AdapterHealth::Healthy,
            latency_ms: 0,
            message: None,
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn get_document(
        &self,
        organization_id: OrganizationId,
        document_id: DocumentId,
    ) -> Result<Option<Document>, PortError> {
        let state = self.lock();
        Ok(state
            .documents
            .get(&document_id)
            .filter(|d| d.organization_id == organization_id)
            .cloned())
    }

    async fn get_documents(
        &self,
        organization_id: OrganizationId,
        document_ids: &[DocumentId],
    ) -> Result<Vec<Document>, PortError> {
        let state = self.lock();
        Ok(document_ids
            .iter()
            .filter_map(|id| {
                state
                    .documents
                    .get(id)
                    .filter(|d| d.organization_id == organization_id)
                    .cloned()
            })
            .collect())
    }

    async fn get_open_documents(
        &self,
        organization_id: OrganizationId,
        customer_id: CustomerId,
    ) -> Result<Vec<Document>, PortError> {
        let state = self.lock();
        let mut documents: Vec<_> = state
            .documents
            .values()
            .filter(|d| {
                d.organization_id == organization_id
                    && d.customer_id == customer_id
                    && d.balance_due.is_positive()
            })
            .cloned()
            .collect();
        documents.sort_by_key(|d| d.created_at);
        Ok(documents)
    }

    async fn insert_document(&self, document: &Document) -> Result<(), PortError> {
        let mut state = self.lock();
        state.documents.insert(document.id, document.clone());
        Ok(())
    }

    async fn get_payment(
        &self,
        organization_id: OrganizationId,
        payment_id: PaymentId,
    ) -> Result<Option<Payment>, PortError> {
        let state = self.lock();
        Ok(state
            .payments
            .get(&payment_id)
            .filter(|p| p.organization_id == organization_id)
            .cloned())
    }

    async fn find_payment_by_gateway_reference(
        &self,
        organization_id: OrganizationId,
        reference: &str,
    ) -> Result<Option<Payment>, PortError> {
        let state = self.lock();
        Ok(state
            .payments
            .values()
            .find(|p| {
                p.organization_id == organization_id
                    && (p.gateway_session_id.as_deref() == Some(reference)
                        || p.gateway_intent_id.as_deref() == Some(reference))
            })
            .cloned())
    }

    async fn get_applications_for_payment(
        &self,
        organization_id: OrganizationId,
        payment_id: PaymentId,
    ) -> Result<Vec<PaymentApplication>, PortError> {
        let state = self.lock();
        Ok(state
            .applications
            .iter()
            .filter(|a| a.organization_id == organization_id && a.payment_id == payment_id)
            .cloned()
            .collect())
    }

    async fn next_payment_number(
        &self,
        organization_id: OrganizationId,
    ) -> Result<u64, PortError> {
        let mut state = self.lock();
        let counter = state.sequences.entry(organization_id).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }

    async fn insert_payment(&self, payment: &Payment) -> Result<(), PortError> {
        let mut state = self.lock();
        state.payments.insert(payment.id, payment.clone());
        Ok(())
    }

    async fn update_payment(&self, payment: &Payment) -> Result<(), PortError> {
        let mut state = self.lock();
        if !state.payments.contains_key(&payment.id) {
            return Err(PortError::not_found("payment", payment.id));
        }
        state.payments.insert(payment.id, payment.clone());
        Ok(())
    }

    async fn commit_allocation(
        &self,
        payment: &Payment,
        outcome: &AllocationOutcome,
    ) -> Result<(), PortError> {
        self.check_commit_failure()?;
        let mut state = self.lock();

        // Same re-check the SQL adapter performs under its row lock.
        let stored = state
            .payments
            .get(&payment.id)
            .ok_or_else(|| PortError::not_found("payment", payment.id))?;
        if stored.status != PaymentStatus::Pending {
            return Err(PortError::conflict(format!(
                "payment {} is {}, expected PENDING",
                payment.id,
                stored.status.as_str()
            )));
        }

        // A plan computed against a snapshot another payment has since
        // changed must not clobber that payment's contribution.
        for document in &outcome.documents {
            let applied: Decimal = outcome
                .applications
                .iter()
                .filter(|a| a.document_id == document.id)
                .map(|a| a.amount_applied.amount())
                .sum();
            verify_planned_balance(
                &state,
                document,
                document.balance_due.amount() + applied,
            )?;
        }

        state.payments.insert(payment.id, payment.clone());
        state.applications.extend(outcome.applications.iter().cloned());
        for document in &outcome.documents {
            state.documents.insert(document.id, document.clone());
        }
        Ok(())
    }

    async fn commit_reversal(&self, outcome: &ReversalOutcome) -> Result<(), PortError> {
        self.check_commit_failure()?;
        let mut state = self.lock();

        let payment = &outcome.payment;
        let stored = state
            .payments
            .get(&payment.id)
            .ok_or_else(|| PortError::not_found("payment", payment.id))?;
        if stored.status != PaymentStatus::Applied {
            return Err(PortError::conflict(format!(
                "payment {} is {}, expected APPLIED",
                payment.id,
                stored.status.as_str()
            )));
        }

        for document in &outcome.documents {
            let restored: Decimal = outcome
                .removed_applications
                .iter()
                .filter(|a| a.document_id == document.id)
                .map(|a| a.amount_applied.amount())
                .sum();
            verify_planned_balance(
                &state,
                document,
                document.balance_due.amount() - restored,
            )?;
        }

        state.payments.insert(payment.id, payment.clone());
        state
            .applications
            .retain(|a| a.payment_id != payment.id);
        for document in &outcome.documents {
            state.documents.insert(document.id, document.clone());
        }
        Ok(())
    }

    async fn expire_pending_sessions(
        &self,
        organization_id: OrganizationId,
        session_id: &str,
    ) -> Result<u64, PortError> {
        let mut state = self.lock();
        let now = Utc::now();
        let mut count = 0;

        for payment in state.payments.values_mut() {
            if payment.organization_id == organization_id
                && payment.gateway_session_id.as_deref() == Some(session_id)
                && payment.status == PaymentStatus::Pending
            {
                payment.status = PaymentStatus::Void;
                payment.checkout_session_status = Some(CheckoutSessionStatus::Expired);
                payment.updated_at = now;
                count += 1;
            }
        }
        Ok(count)
    }
}
