//! PostgreSQL ledger store adapter
//!
//! Implements the `LedgerStore` port on top of [`LedgerRepository`],
//! translating between domain models and row types and between
//! `DatabaseError` and `PortError`. Enum-valued columns are stored as their
//! stable string forms; a value that fails to parse on the way out is
//! surfaced as an internal error rather than a panic.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use core_kernel::{
    AdapterHealth, ApplicationId, Currency, CustomerId, DocumentId, DomainPort,
    HealthCheckResult, HealthCheckable, Money, OrganizationId, PaymentId, PortError,
};
use domain_ledger::{
    AllocationOutcome, Document, DocumentStatus, DocumentType, LedgerStore, Payment,
    PaymentApplication, PaymentMethod, PaymentStatus, ReversalOutcome,
};
use domain_ledger::payment::CheckoutSessionStatus;

use crate::error::DatabaseError;
use crate::repositories::ledger::{
    ApplicationRow, DocumentRow, LedgerRepository, PaymentRow, PlannedDocumentWrite,
};

/// PostgreSQL-backed implementation of the `LedgerStore` port
#[derive(Debug, Clone)]
pub struct PgLedgerStore {
    repository: LedgerRepository,
}

impl PgLedgerStore {
    /// Creates a new adapter over the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: LedgerRepository::new(pool),
        }
    }

    /// Returns a reference to the underlying repository
    pub fn repository(&self) -> &LedgerRepository {
        &self.repository
    }
}

impl DomainPort for PgLedgerStore {}

#[async_trait]
impl HealthCheckable for PgLedgerStore {
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();
        let outcome = self.repository.ping().await;

        HealthCheckResult {
            adapter_id: "postgres-ledger".to_string(),
            status: match &outcome {
                Ok(()) => AdapterHealth::Healthy,
                Err(_) => AdapterHealth::Unhealthy,
            },
            latency_ms: start.elapsed().as_millis() as u64,
            message: outcome.err().map(|e| e.to_string()),
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn get_document(
        &self,
        organization_id: OrganizationId,
        document_id: DocumentId,
    ) -> Result<Option<Document>, PortError> {
        let row = self
            .repository
            .get_document(*organization_id.as_uuid(), *document_id.as_uuid())
            .await?;
        row.map(document_from_row).transpose().map_err(Into::into)
    }

    async fn get_documents(
        &self,
        organization_id: OrganizationId,
        document_ids: &[DocumentId],
    ) -> Result<Vec<Document>, PortError> {
        let ids: Vec<_> = document_ids.iter().map(|id| *id.as_uuid()).collect();
        let rows = self
            .repository
            .get_documents(*organization_id.as_uuid(), &ids)
            .await?;

        let mut documents = rows
            .into_iter()
            .map(document_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        // Restore the caller's order; unresolved ids are simply absent.
        documents.sort_by_key(|d| {
            document_ids
                .iter()
                .position(|id| *id == d.id)
                .unwrap_or(usize::MAX)
        });
        Ok(documents)
    }

    async fn get_open_documents(
        &self,
        organization_id: OrganizationId,
        customer_id: CustomerId,
    ) -> Result<Vec<Document>, PortError> {
        let rows = self
            .repository
            .get_open_documents(*organization_id.as_uuid(), *customer_id.as_uuid())
            .await?;
        rows.into_iter()
            .map(document_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(Into::into)
    }

    async fn insert_document(&self, document: &Document) -> Result<(), PortError> {
        self.repository
            .insert_document(&document_to_row(document))
            .await
            .map_err(Into::into)
    }

    async fn get_payment(
        &self,
        organization_id: OrganizationId,
        payment_id: PaymentId,
    ) -> Result<Option<Payment>, PortError> {
        let row = self
            .repository
            .get_payment(*organization_id.as_uuid(), *payment_id.as_uuid())
            .await?;
        row.map(payment_from_row).transpose().map_err(Into::into)
    }

    async fn find_payment_by_gateway_reference(
        &self,
        organization_id: OrganizationId,
        reference: &str,
    ) -> Result<Option<Payment>, PortError> {
        let row = self
            .repository
            .find_payment_by_gateway_reference(*organization_id.as_uuid(), reference)
            .await?;
        row.map(payment_from_row).transpose().map_err(Into::into)
    }

    async fn get_applications_for_payment(
        &self,
        organization_id: OrganizationId,
        payment_id: PaymentId,
    ) -> Result<Vec<PaymentApplication>, PortError> {
        let rows = self
            .repository
            .get_applications_for_payment(*organization_id.as_uuid(), *payment_id.as_uuid())
            .await?;
        rows.into_iter()
            .map(application_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(Into::into)
    }

    async fn next_payment_number(
        &self,
        organization_id: OrganizationId,
    ) -> Result<u64, PortError> {
        let value = self
            .repository
            .next_payment_number(*organization_id.as_uuid())
            .await?;
        Ok(value as u64)
    }

    async fn insert_payment(&self, payment: &Payment) -> Result<(), PortError> {
        self.repository
            .insert_payment(&payment_to_row(payment))
            .await
            .map_err(Into::into)
    }

    async fn update_payment(&self, payment: &Payment) -> Result<(), PortError> {
        self.repository
            .update_payment(&payment_to_row(payment))
            .await
            .map_err(Into::into)
    }

    async fn commit_allocation(
        &self,
        payment: &Payment,
        outcome: &AllocationOutcome,
    ) -> Result<(), PortError> {
        let applications: Vec<_> = outcome.applications.iter().map(application_to_row).collect();
        // Each document's pre-plan balance is its planned balance plus what
        // this allocation applied to it; the repository re-checks the stored
        // row still holds that balance under its lock.
        let documents: Vec<_> = outcome
            .documents
            .iter()
            .map(|document| {
                let applied = applied_to(document.id, &outcome.applications);
                PlannedDocumentWrite {
                    row: document_to_row(document),
                    planned_from_balance: document.balance_due.amount() + applied,
                }
            })
            .collect();
        self.repository
            .commit_allocation(&payment_to_row(payment), &applications, &documents)
            .await
            .map_err(Into::into)
    }

    async fn commit_reversal(&self, outcome: &ReversalOutcome) -> Result<(), PortError> {
        let documents: Vec<_> = outcome
            .documents
            .iter()
            .map(|document| {
                let restored = applied_to(document.id, &outcome.removed_applications);
                PlannedDocumentWrite {
                    row: document_to_row(document),
                    planned_from_balance: document.balance_due.amount() - restored,
                }
            })
            .collect();
        self.repository
            .commit_reversal(&payment_to_row(&outcome.payment), &documents)
            .await
            .map_err(Into::into)
    }

    async fn expire_pending_sessions(
        &self,
        organization_id: OrganizationId,
        session_id: &str,
    ) -> Result<u64, PortError> {
        self.repository
            .expire_pending_sessions(*organization_id.as_uuid(), session_id)
            .await
            .map_err(Into::into)
    }
}

fn applied_to(
    document_id: DocumentId,
    applications: &[PaymentApplication],
) -> rust_decimal::Decimal {
    applications
        .iter()
        .filter(|a| a.document_id == document_id)
        .map(|a| a.amount_applied.amount())
        .sum()
}

fn document_to_row(document: &Document) -> DocumentRow {
    DocumentRow {
        id: *document.id.as_uuid(),
        organization_id: *document.organization_id.as_uuid(),
        customer_id: *document.customer_id.as_uuid(),
        document_number: document.document_number.clone(),
        document_type: document.document_type.as_str().to_string(),
        currency: document.currency().code().to_string(),
        subtotal: document.subtotal.amount(),
        tax_amount: document.tax_amount.amount(),
        total_amount: document.total_amount.amount(),
        amount_paid: document.amount_paid.amount(),
        balance_due: document.balance_due.amount(),
        status: document.status.as_str().to_string(),
        paid_date: document.paid_date,
        created_at: document.created_at,
        updated_at: document.updated_at,
    }
}

fn document_from_row(row: DocumentRow) -> Result<Document, DatabaseError> {
    let currency = parse_currency(&row.currency)?;
    Ok(Document {
        id: DocumentId::from_uuid(row.id),
        organization_id: OrganizationId::from_uuid(row.organization_id),
        customer_id: CustomerId::from_uuid(row.customer_id),
        document_number: row.document_number,
        document_type: parse_enum::<DocumentType>(&row.document_type)?,
        subtotal: Money::new(row.subtotal, currency),
        tax_amount: Money::new(row.tax_amount, currency),
        total_amount: Money::new(row.total_amount, currency),
        amount_paid: Money::new(row.amount_paid, currency),
        balance_due: Money::new(row.balance_due, currency),
        status: parse_enum::<DocumentStatus>(&row.status)?,
        paid_date: row.paid_date,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn payment_to_row(payment: &Payment) -> PaymentRow {
    PaymentRow {
        id: *payment.id.as_uuid(),
        organization_id: *payment.organization_id.as_uuid(),
        customer_id: *payment.customer_id.as_uuid(),
        payment_number: payment.payment_number.clone(),
        currency: payment.amount.currency().code().to_string(),
        amount: payment.amount.amount(),
        method: payment.method.as_str().to_string(),
        status: payment.status.as_str().to_string(),
        gateway_provider: payment.gateway_provider.clone(),
        gateway_transaction_id: payment.gateway_transaction_id.clone(),
        gateway_session_id: payment.gateway_session_id.clone(),
        gateway_intent_id: payment.gateway_intent_id.clone(),
        gateway_response: payment.gateway_response.clone(),
        session_expires_at: payment.session_expires_at,
        checkout_session_status: payment
            .checkout_session_status
            .map(|s| s.as_str().to_string()),
        void_reason: payment.void_reason.clone(),
        created_at: payment.created_at,
        updated_at: payment.updated_at,
    }
}

fn payment_from_row(row: PaymentRow) -> Result<Payment, DatabaseError> {
    let currency = parse_currency(&row.currency)?;
    Ok(Payment {
        id: PaymentId::from_uuid(row.id),
        organization_id: OrganizationId::from_uuid(row.organization_id),
        customer_id: CustomerId::from_uuid(row.customer_id),
        payment_number: row.payment_number,
        amount: Money::new(row.amount, currency),
        method: parse_enum::<PaymentMethod>(&row.method)?,
        status: parse_enum::<PaymentStatus>(&row.status)?,
        gateway_provider: row.gateway_provider,
        gateway_transaction_id: row.gateway_transaction_id,
        gateway_session_id: row.gateway_session_id,
        gateway_intent_id: row.gateway_intent_id,
        gateway_response: row.gateway_response,
        session_expires_at: row.session_expires_at,
        checkout_session_status: row
            .checkout_session_status
            .as_deref()
            .map(parse_enum::<CheckoutSessionStatus>)
            .transpose()?,
        void_reason: row.void_reason,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn application_to_row(application: &PaymentApplication) -> ApplicationRow {
    ApplicationRow {
        id: *application.id.as_uuid(),
        organization_id: *application.organization_id.as_uuid(),
        payment_id: *application.payment_id.as_uuid(),
        document_id: *application.document_id.as_uuid(),
        currency: application.amount_applied.currency().code().to_string(),
        amount_applied: application.amount_applied.amount(),
        applied_at: application.applied_at,
    }
}

fn application_from_row(row: ApplicationRow) -> Result<PaymentApplication, DatabaseError> {
    let currency = parse_currency(&row.currency)?;
    Ok(PaymentApplication {
        id: ApplicationId::from_uuid(row.id),
        organization_id: OrganizationId::from_uuid(row.organization_id),
        payment_id: PaymentId::from_uuid(row.payment_id),
        document_id: DocumentId::from_uuid(row.document_id),
        amount_applied: Money::new(row.amount_applied, currency),
        applied_at: row.applied_at,
    })
}

fn parse_currency(code: &str) -> Result<Currency, DatabaseError> {
    Currency::from_code(code.trim())
        .ok_or_else(|| DatabaseError::SerializationError(format!("unknown currency: {code}")))
}

fn parse_enum<T: FromStr<Err = String>>(value: &str) -> Result<T, DatabaseError> {
    value.parse().map_err(DatabaseError::SerializationError)
}
