//! Receivable documents
//!
//! A document is an invoice, credit memo, or debit memo owed by a customer.
//! Quotes and orders share the table but never participate in payment
//! application. Status is always derived from the balance, never set
//! independently of a balance change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use core_kernel::{CustomerId, DocumentId, Money, OrganizationId};

use crate::error::LedgerError;

/// Document type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    Invoice,
    Quote,
    Order,
    CreditMemo,
    DebitMemo,
}

impl DocumentType {
    /// Returns true if payments may be applied against this document type
    pub fn is_payable(&self) -> bool {
        matches!(
            self,
            DocumentType::Invoice | DocumentType::CreditMemo | DocumentType::DebitMemo
        )
    }

    /// Stable string form used for persistence
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Invoice => "INVOICE",
            DocumentType::Quote => "QUOTE",
            DocumentType::Order => "ORDER",
            DocumentType::CreditMemo => "CREDIT_MEMO",
            DocumentType::DebitMemo => "DEBIT_MEMO",
        }
    }
}

impl FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INVOICE" => Ok(DocumentType::Invoice),
            "QUOTE" => Ok(DocumentType::Quote),
            "ORDER" => Ok(DocumentType::Order),
            "CREDIT_MEMO" => Ok(DocumentType::CreditMemo),
            "DEBIT_MEMO" => Ok(DocumentType::DebitMemo),
            other => Err(format!("unknown document type: {other}")),
        }
    }
}

/// Document status, derived from `balance_due` relative to `total_amount`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentStatus {
    Open,
    Partial,
    Paid,
    Void,
}

impl DocumentStatus {
    /// Stable string form used for persistence
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Open => "OPEN",
            DocumentStatus::Partial => "PARTIAL",
            DocumentStatus::Paid => "PAID",
            DocumentStatus::Void => "VOID",
        }
    }
}

impl FromStr for DocumentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPEN" => Ok(DocumentStatus::Open),
            "PARTIAL" => Ok(DocumentStatus::Partial),
            "PAID" => Ok(DocumentStatus::Paid),
            "VOID" => Ok(DocumentStatus::Void),
            other => Err(format!("unknown document status: {other}")),
        }
    }
}

/// An invoice, credit memo, or debit memo
///
/// # Invariant
///
/// `amount_paid + balance_due == total_amount` at all times. The only
/// mutations are [`Document::apply`] (allocation) and [`Document::reverse`]
/// (payment void), both of which preserve it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier
    pub id: DocumentId,
    /// Owning organization
    pub organization_id: OrganizationId,
    /// Customer the document is owed by
    pub customer_id: CustomerId,
    /// Document number (human-readable, unique per organization)
    pub document_number: String,
    /// Document type
    pub document_type: DocumentType,
    /// Subtotal before tax
    pub subtotal: Money,
    /// Tax amount
    pub tax_amount: Money,
    /// Total amount (subtotal + tax, signed; credit memos are negative)
    pub total_amount: Money,
    /// Amount applied so far
    pub amount_paid: Money,
    /// Remaining unpaid amount
    pub balance_due: Money,
    /// Status
    pub status: DocumentStatus,
    /// When the balance reached zero
    pub paid_date: Option<DateTime<Utc>>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Creates a new open document
    ///
    /// # Arguments
    ///
    /// * `organization_id` - Owning organization
    /// * `customer_id` - Customer being billed
    /// * `document_number` - Human-readable number, unique per organization
    /// * `document_type` - Invoice, memo, quote, or order
    /// * `subtotal` - Amount before tax
    /// * `tax_amount` - Tax portion
    pub fn new(
        organization_id: OrganizationId,
        customer_id: CustomerId,
        document_number: impl Into<String>,
        document_type: DocumentType,
        subtotal: Money,
        tax_amount: Money,
    ) -> Result<Self, LedgerError> {
        let total = subtotal.checked_add(&tax_amount)?;
        let now = Utc::now();

        Ok(Self {
            id: DocumentId::new_v7(),
            organization_id,
            customer_id,
            document_number: document_number.into(),
            document_type,
            subtotal,
            tax_amount,
            total_amount: total,
            amount_paid: Money::zero(total.currency()),
            balance_due: total,
            status: DocumentStatus::Open,
            paid_date: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Returns the document currency
    pub fn currency(&self) -> core_kernel::Currency {
        self.total_amount.currency()
    }

    /// Returns true if this document currently accepts payment application
    pub fn is_payable(&self) -> bool {
        self.document_type.is_payable() && self.status != DocumentStatus::Void
    }

    /// Applies part of a payment against this document
    ///
    /// Decrements the balance, increments the amount paid, and recomputes
    /// status: a zero balance means `Paid` with `paid_date` set, any other
    /// reduction means `Partial`.
    ///
    /// # Errors
    ///
    /// Rejects non-positive amounts and amounts exceeding the balance due.
    pub fn apply(&mut self, amount: Money, now: DateTime<Utc>) -> Result<(), LedgerError> {
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount(format!(
                "applied amount must be positive, got {amount}"
            )));
        }
        if amount > self.balance_due {
            return Err(LedgerError::AmountExceedsBalance {
                requested: amount.amount(),
                available: self.balance_due.amount(),
            });
        }

        self.amount_paid = self.amount_paid.checked_add(&amount)?;
        self.balance_due = self.balance_due.checked_sub(&amount)?;
        self.updated_at = now;

        if self.balance_due.is_zero() {
            self.status = DocumentStatus::Paid;
            self.paid_date = Some(now);
        } else {
            self.status = DocumentStatus::Partial;
        }

        debug_assert!(self.is_balanced());
        Ok(())
    }

    /// Reverses a previously applied amount
    ///
    /// Restores the balance and recomputes status: `Open` when the amount
    /// paid returns to zero, otherwise `Partial`. A document cannot return
    /// to `Paid` through a reversal, so `paid_date` is cleared.
    ///
    /// # Errors
    ///
    /// Rejects amounts exceeding what was applied.
    pub fn reverse(&mut self, amount: Money, now: DateTime<Utc>) -> Result<(), LedgerError> {
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount(format!(
                "reversed amount must be positive, got {amount}"
            )));
        }
        if amount > self.amount_paid {
            return Err(LedgerError::InvalidAmount(format!(
                "cannot reverse {amount}, only {} was applied",
                self.amount_paid
            )));
        }

        self.balance_due = self.balance_due.checked_add(&amount)?;
        self.amount_paid = self.amount_paid.checked_sub(&amount)?;
        self.updated_at = now;

        self.status = if self.amount_paid.is_zero() {
            DocumentStatus::Open
        } else {
            DocumentStatus::Partial
        };
        self.paid_date = None;

        debug_assert!(self.is_balanced());
        Ok(())
    }

    /// Checks the balance conservation invariant
    pub fn is_balanced(&self) -> bool {
        match self.amount_paid.checked_add(&self.balance_due) {
            Ok(sum) => sum == self.total_amount,
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Currency;
    use rust_decimal_macros::dec;

    fn invoice(total: Money) -> Document {
        Document::new(
            OrganizationId::new(),
            CustomerId::new(),
            "INV-1001",
            DocumentType::Invoice,
            total,
            Money::zero(total.currency()),
        )
        .unwrap()
    }

    #[test]
    fn test_new_document_is_open_and_balanced() {
        let doc = invoice(Money::new(dec!(1296.00), Currency::USD));
        assert_eq!(doc.status, DocumentStatus::Open);
        assert_eq!(doc.balance_due.amount(), dec!(1296.00));
        assert!(doc.amount_paid.is_zero());
        assert!(doc.is_balanced());
    }

    #[test]
    fn test_partial_application() {
        let mut doc = invoice(Money::new(dec!(1296.00), Currency::USD));
        doc.apply(Money::new(dec!(500.00), Currency::USD), Utc::now())
            .unwrap();

        assert_eq!(doc.status, DocumentStatus::Partial);
        assert_eq!(doc.balance_due.amount(), dec!(796.00));
        assert_eq!(doc.amount_paid.amount(), dec!(500.00));
        assert!(doc.paid_date.is_none());
        assert!(doc.is_balanced());
    }

    #[test]
    fn test_full_application_sets_paid() {
        let mut doc = invoice(Money::new(dec!(8000.00), Currency::USD));
        doc.apply(Money::new(dec!(8000.00), Currency::USD), Utc::now())
            .unwrap();

        assert_eq!(doc.status, DocumentStatus::Paid);
        assert!(doc.balance_due.is_zero());
        assert!(doc.paid_date.is_some());
    }

    #[test]
    fn test_over_application_rejected() {
        let mut doc = invoice(Money::new(dec!(8000.00), Currency::USD));
        let err = doc
            .apply(Money::new(dec!(9000.00), Currency::USD), Utc::now())
            .unwrap_err();

        assert!(matches!(err, LedgerError::AmountExceedsBalance { .. }));
        assert_eq!(doc.balance_due.amount(), dec!(8000.00));
        assert_eq!(doc.status, DocumentStatus::Open);
    }

    #[test]
    fn test_reverse_restores_balance() {
        let mut doc = invoice(Money::new(dec!(796.00), Currency::USD));
        let amount = Money::new(dec!(500.00), Currency::USD);
        doc.apply(amount, Utc::now()).unwrap();
        doc.reverse(amount, Utc::now()).unwrap();

        assert_eq!(doc.status, DocumentStatus::Open);
        assert_eq!(doc.balance_due.amount(), dec!(796.00));
        assert!(doc.amount_paid.is_zero());
        assert!(doc.paid_date.is_none());
        assert!(doc.is_balanced());
    }

    #[test]
    fn test_reverse_of_paid_document_clears_paid_date() {
        let mut doc = invoice(Money::new(dec!(100.00), Currency::USD));
        doc.apply(Money::new(dec!(100.00), Currency::USD), Utc::now())
            .unwrap();
        assert!(doc.paid_date.is_some());

        doc.reverse(Money::new(dec!(40.00), Currency::USD), Utc::now())
            .unwrap();
        assert_eq!(doc.status, DocumentStatus::Partial);
        assert!(doc.paid_date.is_none());
    }

    #[test]
    fn test_quote_is_not_payable() {
        let doc = Document::new(
            OrganizationId::new(),
            CustomerId::new(),
            "QTE-1",
            DocumentType::Quote,
            Money::new(dec!(50.00), Currency::USD),
            Money::zero(Currency::USD),
        )
        .unwrap();
        assert!(!doc.is_payable());
    }

    #[test]
    fn test_type_and_status_round_trip() {
        for ty in [
            DocumentType::Invoice,
            DocumentType::Quote,
            DocumentType::Order,
            DocumentType::CreditMemo,
            DocumentType::DebitMemo,
        ] {
            assert_eq!(ty.as_str().parse::<DocumentType>().unwrap(), ty);
        }
        for st in [
            DocumentStatus::Open,
            DocumentStatus::Partial,
            DocumentStatus::Paid,
            DocumentStatus::Void,
        ] {
            assert_eq!(st.as_str().parse::<DocumentStatus>().unwrap(), st);
        }
    }
}
