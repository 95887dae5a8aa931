//! Ledger repository implementation
//!
//! Database access for documents, payments, and payment applications. The
//! `commit_*` methods execute a fully-planned multi-row mutation inside a
//! single transaction, taking `FOR UPDATE` locks on the payment row and on
//! every touched document row, re-checking the payment's status and each
//! document's balance before writing anything. Those locks are what make
//! the notification processor's idempotency race-free: of two concurrent
//! success notifications for the same payment, exactly one commits, and a
//! plan made stale by a different payment's allocation is refused.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::DatabaseError;

const DOCUMENT_COLUMNS: &str = "id, organization_id, customer_id, document_number, \
     document_type, currency, subtotal, tax_amount, total_amount, amount_paid, \
     balance_due, status, paid_date, created_at, updated_at";

const PAYMENT_COLUMNS: &str = "id, organization_id, customer_id, payment_number, \
     currency, amount, method, status, gateway_provider, gateway_transaction_id, \
     gateway_session_id, gateway_intent_id, gateway_response, session_expires_at, \
     checkout_session_status, void_reason, created_at, updated_at";

const APPLICATION_COLUMNS: &str =
    "id, organization_id, payment_id, document_id, currency, amount_applied, applied_at";

/// A row in the `documents` table
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DocumentRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub customer_id: Uuid,
    pub document_number: String,
    pub document_type: String,
    pub currency: String,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
    pub amount_paid: Decimal,
    pub balance_due: Decimal,
    pub status: String,
    pub paid_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A row in the `payments` table
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PaymentRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub customer_id: Uuid,
    pub payment_number: String,
    pub currency: String,
    pub amount: Decimal,
    pub method: String,
    pub status: String,
    pub gateway_provider: Option<String>,
    pub gateway_transaction_id: Option<String>,
    pub gateway_session_id: Option<String>,
    pub gateway_intent_id: Option<String>,
    pub gateway_response: Option<serde_json::Value>,
    pub session_expires_at: Option<DateTime<Utc>>,
    pub checkout_session_status: Option<String>,
    pub void_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A row in the `payment_applications` table
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ApplicationRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub payment_id: Uuid,
    pub document_id: Uuid,
    pub currency: String,
    pub amount_applied: Decimal,
    pub applied_at: DateTime<Utc>,
}

/// A planned document write plus the balance the plan was computed against
///
/// The `commit_*` methods lock each document row and refuse to write when
/// its stored balance no longer matches `planned_from_balance`, so a plan
/// computed from a snapshot another payment has since changed cannot
/// clobber that payment's contribution.
#[derive(Debug, Clone)]
pub struct PlannedDocumentWrite {
    pub row: DocumentRow,
    pub planned_from_balance: Decimal,
}

/// Repository for the receivables ledger tables
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: PgPool,
}

impl LedgerRepository {
    /// Creates a new LedgerRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_document(
        &self,
        organization_id: Uuid,
        document_id: Uuid,
    ) -> Result<Option<DocumentRow>, DatabaseError> {
        let query = format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE organization_id = $1 AND id = $2"
        );
        let row = sqlx::query_as::<_, DocumentRow>(&query)
            .bind(organization_id)
            .bind(document_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Fetches documents by id; result order is unspecified
    pub async fn get_documents(
        &self,
        organization_id: Uuid,
        document_ids: &[Uuid],
    ) -> Result<Vec<DocumentRow>, DatabaseError> {
        let query = format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents \
             WHERE organization_id = $1 AND id = ANY($2)"
        );
        let rows = sqlx::query_as::<_, DocumentRow>(&query)
            .bind(organization_id)
            .bind(document_ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Lists a customer's documents with an outstanding positive balance,
    /// oldest first
    pub async fn get_open_documents(
        &self,
        organization_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Vec<DocumentRow>, DatabaseError> {
        let query = format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents \
             WHERE organization_id = $1 AND customer_id = $2 \
               AND status IN ('OPEN', 'PARTIAL') AND balance_due > 0 \
             ORDER BY created_at"
        );
        let rows = sqlx::query_as::<_, DocumentRow>(&query)
            .bind(organization_id)
            .bind(customer_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn insert_document(&self, document: &DocumentRow) -> Result<(), DatabaseError> {
        let query = format!(
            "INSERT INTO documents ({DOCUMENT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)"
        );
        sqlx::query(&query)
            .bind(document.id)
            .bind(document.organization_id)
            .bind(document.customer_id)
            .bind(&document.document_number)
            .bind(&document.document_type)
            .bind(&document.currency)
            .bind(document.subtotal)
            .bind(document.tax_amount)
            .bind(document.total_amount)
            .bind(document.amount_paid)
            .bind(document.balance_due)
            .bind(&document.status)
            .bind(document.paid_date)
            .bind(document.created_at)
            .bind(document.updated_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn get_payment(
        &self,
        organization_id: Uuid,
        payment_id: Uuid,
    ) -> Result<Option<PaymentRow>, DatabaseError> {
        let query = format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE organization_id = $1 AND id = $2"
        );
        let row = sqlx::query_as::<_, PaymentRow>(&query)
            .bind(organization_id)
            .bind(payment_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Finds a payment by gateway checkout-session or payment-intent id
    pub async fn find_payment_by_gateway_reference(
        &self,
        organization_id: Uuid,
        reference: &str,
    ) -> Result<Option<PaymentRow>, DatabaseError> {
        let query = format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments \
             WHERE organization_id = $1 \
               AND (gateway_session_id = $2 OR gateway_intent_id = $2)"
        );
        let row = sqlx::query_as::<_, PaymentRow>(&query)
            .bind(organization_id)
            .bind(reference)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn get_applications_for_payment(
        &self,
        organization_id: Uuid,
        payment_id: Uuid,
    ) -> Result<Vec<ApplicationRow>, DatabaseError> {
        let query = format!(
            "SELECT {APPLICATION_COLUMNS} FROM payment_applications \
             WHERE organization_id = $1 AND payment_id = $2 \
             ORDER BY applied_at, id"
        );
        let rows = sqlx::query_as::<_, ApplicationRow>(&query)
            .bind(organization_id)
            .bind(payment_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Atomically increments and returns the organization's payment-number
    /// sequence
    pub async fn next_payment_number(
        &self,
        organization_id: Uuid,
    ) -> Result<i64, DatabaseError> {
        let value: i64 = sqlx::query_scalar(
            "INSERT INTO payment_number_sequences (organization_id, last_value) \
             VALUES ($1, 1) \
             ON CONFLICT (organization_id) \
             DO UPDATE SET last_value = payment_number_sequences.last_value + 1 \
             RETURNING last_value",
        )
        .bind(organization_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(value)
    }

    pub async fn insert_payment(&self, payment: &PaymentRow) -> Result<(), DatabaseError> {
        let query = format!(
            "INSERT INTO payments ({PAYMENT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, \
                     $15, $16, $17, $18)"
        );
        sqlx::query(&query)
            .bind(payment.id)
            .bind(payment.organization_id)
            .bind(payment.customer_id)
            .bind(&payment.payment_number)
            .bind(&payment.currency)
            .bind(payment.amount)
            .bind(&payment.method)
            .bind(&payment.status)
            .bind(&payment.gateway_provider)
            .bind(&payment.gateway_transaction_id)
            .bind(&payment.gateway_session_id)
            .bind(&payment.gateway_intent_id)
            .bind(&payment.gateway_response)
            .bind(payment.session_expires_at)
            .bind(&payment.checkout_session_status)
            .bind(&payment.void_reason)
            .bind(payment.created_at)
            .bind(payment.updated_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn update_payment(&self, payment: &PaymentRow) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;
        update_payment_in(&mut tx, payment).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Commits a planned allocation: locks the payment and the target
    /// documents, re-checks the payment is still `PENDING` and each document
    /// still holds the balance the plan was computed from, then writes the
    /// payment, applications, and documents in one transaction
    pub async fn commit_allocation(
        &self,
        payment: &PaymentRow,
        applications: &[ApplicationRow],
        documents: &[PlannedDocumentWrite],
    ) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;
        lock_payment_expecting(&mut tx, payment, "PENDING").await?;
        for document in documents {
            lock_document_expecting_balance(&mut tx, document).await?;
        }

        update_payment_in(&mut tx, payment).await?;
        for application in applications {
            insert_application_in(&mut tx, application).await?;
        }
        for document in documents {
            update_document_balance_in(&mut tx, &document.row).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Commits a planned reversal: locks the payment and the restored
    /// documents with the same stale-plan checks as `commit_allocation`,
    /// then voids the payment, deletes its applications, and restores the
    /// documents in one transaction
    pub async fn commit_reversal(
        &self,
        payment: &PaymentRow,
        documents: &[PlannedDocumentWrite],
    ) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;
        lock_payment_expecting(&mut tx, payment, "APPLIED").await?;
        for document in documents {
            lock_document_expecting_balance(&mut tx, document).await?;
        }

        update_payment_in(&mut tx, payment).await?;
        sqlx::query(
            "DELETE FROM payment_applications WHERE organization_id = $1 AND payment_id = $2",
        )
        .bind(payment.organization_id)
        .bind(payment.id)
        .execute(&mut *tx)
        .await?;
        for document in documents {
            update_document_balance_in(&mut tx, &document.row).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Voids every still-pending payment tied to the given checkout session
    ///
    /// Scoped by `status = 'PENDING'` so a payment already applied by a
    /// racing success notification is untouched.
    pub async fn expire_pending_sessions(
        &self,
        organization_id: Uuid,
        session_id: &str,
    ) -> Result<u64, DatabaseError> {
        let result = sqlx::query(
            "UPDATE payments \
             SET status = 'VOID', checkout_session_status = 'expired', updated_at = NOW() \
             WHERE organization_id = $1 AND gateway_session_id = $2 AND status = 'PENDING'",
        )
        .bind(organization_id)
        .bind(session_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Health probe used by the adapter layer
    pub async fn ping(&self) -> Result<(), DatabaseError> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }
}

async fn lock_document_expecting_balance(
    tx: &mut Transaction<'_, Postgres>,
    document: &PlannedDocumentWrite,
) -> Result<(), DatabaseError> {
    let balance: Option<Decimal> = sqlx::query_scalar(
        "SELECT balance_due FROM documents WHERE organization_id = $1 AND id = $2 FOR UPDATE",
    )
    .bind(document.row.organization_id)
    .bind(document.row.id)
    .fetch_optional(&mut **tx)
    .await?;

    match balance {
        None => Err(DatabaseError::not_found("document", document.row.id)),
        Some(b) if b == document.planned_from_balance => Ok(()),
        Some(b) => Err(DatabaseError::StaleState(format!(
            "document {} balance is {}, plan expected {}",
            document.row.id, b, document.planned_from_balance
        ))),
    }
}

async fn lock_payment_expecting(
    tx: &mut Transaction<'_, Postgres>,
    payment: &PaymentRow,
    expected_status: &str,
) -> Result<(), DatabaseError> {
    let status: Option<String> = sqlx::query_scalar(
        "SELECT status FROM payments WHERE organization_id = $1 AND id = $2 FOR UPDATE",
    )
    .bind(payment.organization_id)
    .bind(payment.id)
    .fetch_optional(&mut **tx)
    .await?;

    match status.as_deref() {
        None => Err(DatabaseError::not_found("payment", payment.id)),
        Some(s) if s == expected_status => Ok(()),
        Some(other) => Err(DatabaseError::StaleState(format!(
            "payment {} is {}, expected {}",
            payment.id, other, expected_status
        ))),
    }
}

async fn update_payment_in(
    tx: &mut Transaction<'_, Postgres>,
    payment: &PaymentRow,
) -> Result<(), DatabaseError> {
    sqlx::query(
        "UPDATE payments SET \
             status = $3, gateway_provider = $4, gateway_transaction_id = $5, \
             gateway_session_id = $6, gateway_intent_id = $7, gateway_response = $8, \
             session_expires_at = $9, checkout_session_status = $10, void_reason = $11, \
             updated_at = $12 \
         WHERE organization_id = $1 AND id = $2",
    )
    .bind(payment.organization_id)
    .bind(payment.id)
    .bind(&payment.status)
    .bind(&payment.gateway_provider)
    .bind(&payment.gateway_transaction_id)
    .bind(&payment.gateway_session_id)
    .bind(&payment.gateway_intent_id)
    .bind(&payment.gateway_response)
    .bind(payment.session_expires_at)
    .bind(&payment.checkout_session_status)
    .bind(&payment.void_reason)
    .bind(payment.updated_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn insert_application_in(
    tx: &mut Transaction<'_, Postgres>,
    application: &ApplicationRow,
) -> Result<(), DatabaseError> {
    let query = format!(
        "INSERT INTO payment_applications ({APPLICATION_COLUMNS}) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)"
    );
    sqlx::query(&query)
        .bind(application.id)
        .bind(application.organization_id)
        .bind(application.payment_id)
        .bind(application.document_id)
        .bind(&application.currency)
        .bind(application.amount_applied)
        .bind(application.applied_at)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

async fn update_document_balance_in(
    tx: &mut Transaction<'_, Postgres>,
    document: &DocumentRow,
) -> Result<(), DatabaseError> {
    sqlx::query(
        "UPDATE documents SET \
             amount_paid = $3, balance_due = $4, status = $5, paid_date = $6, \
             updated_at = $7 \
         WHERE organization_id = $1 AND id = $2",
    )
    .bind(document.organization_id)
    .bind(document.id)
    .bind(document.amount_paid)
    .bind(document.balance_due)
    .bind(&document.status)
    .bind(document.paid_date)
    .bind(document.updated_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
