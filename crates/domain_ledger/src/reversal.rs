//! Void/reversal handling
//!
//! Reverses a previously applied payment: every document it touched is
//! restored to its pre-payment balance, the application rows are deleted,
//! and the payment is voided. The payment row itself is retained for audit.
//!
//! Like allocation, reversal is planned as a pure computation and committed
//! atomically through [`crate::LedgerStore::commit_reversal`]; a missing
//! document aborts the whole plan rather than leaving documents partially
//! restored.

use chrono::{DateTime, Utc};

use crate::application::PaymentApplication;
use crate::document::Document;
use crate::error::LedgerError;
use crate::payment::Payment;

/// The complete, atomic result of voiding one payment
#[derive(Debug, Clone)]
pub struct ReversalOutcome {
    /// The payment, now `Void` with the reason recorded
    pub payment: Payment,
    /// Restored copies of every document the payment had touched
    pub documents: Vec<Document>,
    /// Application rows to delete; stores use their amounts to verify the
    /// restored documents were planned from current state
    pub removed_applications: Vec<PaymentApplication>,
}

/// Plans the reversal of an applied payment
///
/// # Arguments
///
/// * `payment` - The payment to void; must be `Applied`
/// * `applications` - All of the payment's application rows
/// * `documents` - Current state of every document those rows reference
/// * `reason` - Optional free-text reason recorded on the payment
///
/// # Errors
///
/// - [`LedgerError::InvalidPaymentStatus`] if the payment is not `Applied`
/// - [`LedgerError::DocumentNotFound`] if an application references a
///   document that was not supplied; the whole reversal is abandoned
pub fn reverse_payment(
    mut payment: Payment,
    applications: Vec<PaymentApplication>,
    mut documents: Vec<Document>,
    reason: Option<String>,
    now: DateTime<Utc>,
) -> Result<ReversalOutcome, LedgerError> {
    payment.mark_voided(reason, now)?;

    for application in &applications {
        let document = documents
            .iter_mut()
            .find(|d| d.id == application.document_id)
            .ok_or_else(|| LedgerError::DocumentNotFound(application.document_id.to_string()))?;

        document.reverse(application.amount_applied, now)?;
    }

    Ok(ReversalOutcome {
        payment,
        documents,
        removed_applications: applications,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::allocate_payment;
    use crate::document::{DocumentStatus, DocumentType};
    use crate::payment::{format_payment_number, PaymentMethod, PaymentStatus};
    use core_kernel::{CustomerId, Currency, Money, OrganizationId};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn usd(d: Decimal) -> Money {
        Money::new(d, Currency::USD)
    }

    fn applied_setup(total: Decimal, amount: Decimal) -> (Payment, crate::AllocationOutcome) {
        let org = OrganizationId::new();
        let customer = CustomerId::new();
        let doc = Document::new(
            org,
            customer,
            "INV-2001",
            DocumentType::Invoice,
            usd(total),
            usd(dec!(0)),
        )
        .unwrap();

        let payment = Payment::new_manual(
            org,
            customer,
            format_payment_number(3),
            usd(amount),
            PaymentMethod::Ach,
        )
        .unwrap();

        let outcome = allocate_payment(&payment, vec![doc], Utc::now()).unwrap();
        (payment, outcome)
    }

    #[test]
    fn test_void_restores_documents_exactly() {
        // 500.00 onto a 796.00 balance, then void: back to 796.00.
        let (payment, outcome) = applied_setup(dec!(796.00), dec!(500.00));
        assert_eq!(outcome.documents[0].balance_due, usd(dec!(296.00)));

        let reversal = reverse_payment(
            payment,
            outcome.applications.clone(),
            outcome.documents.clone(),
            Some("duplicate charge".into()),
            Utc::now(),
        )
        .unwrap();

        let restored = &reversal.documents[0];
        assert_eq!(restored.balance_due, usd(dec!(796.00)));
        assert!(restored.amount_paid.is_zero());
        assert_eq!(restored.status, DocumentStatus::Open);
        assert!(restored.is_balanced());

        assert_eq!(reversal.payment.status, PaymentStatus::Void);
        assert_eq!(
            reversal.payment.void_reason.as_deref(),
            Some("duplicate charge")
        );
        assert_eq!(
            reversal
                .removed_applications
                .iter()
                .map(|a| a.id)
                .collect::<Vec<_>>(),
            outcome
                .applications
                .iter()
                .map(|a| a.id)
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_void_of_fully_paid_document_reopens_it() {
        let (payment, outcome) = applied_setup(dec!(8000.00), dec!(8000.00));
        assert_eq!(outcome.documents[0].status, DocumentStatus::Paid);

        let reversal = reverse_payment(
            payment,
            outcome.applications,
            outcome.documents,
            None,
            Utc::now(),
        )
        .unwrap();

        let restored = &reversal.documents[0];
        assert_eq!(restored.status, DocumentStatus::Open);
        assert!(restored.paid_date.is_none());
        assert_eq!(restored.balance_due, usd(dec!(8000.00)));
    }

    #[test]
    fn test_void_requires_applied_payment() {
        let (payment, outcome) = applied_setup(dec!(100.00), dec!(100.00));
        let mut voided = payment;
        voided.mark_voided(None, Utc::now()).unwrap();

        let err = reverse_payment(
            voided,
            outcome.applications,
            outcome.documents,
            None,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidPaymentStatus { .. }));
    }

    #[test]
    fn test_missing_document_aborts_reversal() {
        let (payment, outcome) = applied_setup(dec!(100.00), dec!(100.00));

        let err = reverse_payment(
            payment,
            outcome.applications,
            vec![], // document row has gone missing
            None,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::DocumentNotFound(_)));
    }
}
