//! Allocation engine
//!
//! Distributes a payment amount across an ordered list of target documents.
//! Funds are applied in the caller-supplied order (the order captured at
//! checkout time), not oldest-document-first; this mirrors the documented
//! behavior of the system and changing it would change which documents
//! appear paid first.
//!
//! The planner is pure: it validates everything up front, then computes the
//! full set of application rows and updated documents. Nothing is persisted
//! here; the caller commits the returned [`AllocationOutcome`] through
//! [`crate::LedgerStore::commit_allocation`] in a single transaction, so a
//! partially-allocated payment is never observable.

use chrono::{DateTime, Utc};

use core_kernel::{CustomerId, DocumentId, Money, OrganizationId};

use crate::application::PaymentApplication;
use crate::document::Document;
use crate::error::LedgerError;
use crate::payment::Payment;

/// The complete, atomic result of one allocation call
///
/// This is the unit of work handed to the store: the application rows to
/// insert and the updated document states to write, committed together with
/// the payment's own status change or not at all.
#[derive(Debug, Clone)]
pub struct AllocationOutcome {
    /// Application rows to insert
    pub applications: Vec<PaymentApplication>,
    /// Updated copies of every document that received funds
    pub documents: Vec<Document>,
    /// Total amount distributed (equals the payment amount)
    pub total_applied: Money,
}

/// Validates a set of target documents against a prospective amount
///
/// Shared by the allocation engine and the checkout session manager, which
/// runs the same checks before any gateway call is made.
///
/// # Errors
///
/// - [`LedgerError::NoTargetDocuments`] if `requested` is empty
/// - [`LedgerError::DuplicateTarget`] if the same document is listed twice;
///   a repeated id would double-count its balance toward the ceiling and
///   produce two application rows against one document
/// - [`LedgerError::DocumentNotFound`] if an id did not resolve in this
///   organization
/// - [`LedgerError::CustomerMismatch`] if a document belongs to another
///   customer
/// - [`LedgerError::NotPayable`] for quotes, orders, and voided documents
/// - [`LedgerError::AmountExceedsBalance`] if `amount` exceeds the combined
///   balance due of the targets
pub fn validate_targets(
    organization_id: OrganizationId,
    customer_id: CustomerId,
    amount: Money,
    requested: &[DocumentId],
    documents: &[Document],
) -> Result<(), LedgerError> {
    if requested.is_empty() {
        return Err(LedgerError::NoTargetDocuments);
    }
    if !amount.is_positive() {
        return Err(LedgerError::InvalidAmount(format!(
            "allocation amount must be positive, got {amount}"
        )));
    }

    for (index, id) in requested.iter().enumerate() {
        if requested[index + 1..].contains(id) {
            return Err(LedgerError::DuplicateTarget(id.to_string()));
        }
    }

    for id in requested {
        let document = documents
            .iter()
            .find(|d| d.id == *id && d.organization_id == organization_id)
            .ok_or_else(|| LedgerError::DocumentNotFound(id.to_string()))?;

        if document.customer_id != customer_id {
            return Err(LedgerError::CustomerMismatch(document.id.to_string()));
        }
        if !document.is_payable() {
            return Err(LedgerError::NotPayable(document.id.to_string()));
        }
    }

    // Over-payment across the targeted set is rejected, not silently
    // absorbed. Only positive balances count toward the ceiling.
    let mut available = Money::zero(amount.currency());
    for document in documents {
        if document.balance_due.is_positive() {
            available = available.checked_add(&document.balance_due)?;
        }
    }
    if amount > available {
        return Err(LedgerError::AmountExceedsBalance {
            requested: amount.amount(),
            available: available.amount(),
        });
    }

    Ok(())
}

/// Distributes the full payment amount across the given documents
///
/// Documents must be supplied in the order captured at checkout time; each
/// receives `min(remaining, balance_due)` until the amount is exhausted.
/// Documents with no positive balance are skipped.
///
/// # Errors
///
/// All of [`validate_targets`]'s failures, checked before any mutation.
pub fn allocate_payment(
    payment: &Payment,
    mut documents: Vec<Document>,
    now: DateTime<Utc>,
) -> Result<AllocationOutcome, LedgerError> {
    let requested: Vec<DocumentId> = documents.iter().map(|d| d.id).collect();
    validate_targets(
        payment.organization_id,
        payment.customer_id,
        payment.amount,
        &requested,
        &documents,
    )?;

    let mut remaining = payment.amount;
    let mut applications = Vec::new();
    let mut touched = Vec::new();

    for document in documents.iter_mut() {
        if remaining.is_zero() {
            break;
        }
        if !document.balance_due.is_positive() {
            continue;
        }

        let apply = remaining.min(&document.balance_due)?;
        document.apply(apply, now)?;
        remaining = remaining.checked_sub(&apply)?;

        applications.push(PaymentApplication::new(
            payment.organization_id,
            payment.id,
            document.id,
            apply,
            now,
        ));
        touched.push(document.clone());
    }

    // validate_targets guarantees the ceiling, so the amount is always
    // fully distributed here.
    debug_assert!(remaining.is_zero());

    Ok(AllocationOutcome {
        applications,
        documents: touched,
        total_applied: payment.amount,
    })
}
