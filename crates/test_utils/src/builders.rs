//! Test Data Builders
//!
//! Builder patterns for constructing test data with sensible defaults.
//! Tests specify only the fields they care about.

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{Currency, CustomerId, Money, OrganizationId};
use domain_ledger::payment::format_payment_number;
use domain_ledger::{Document, DocumentType, Payment};

/// Builder for test documents
pub struct DocumentBuilder {
    organization_id: OrganizationId,
    customer_id: CustomerId,
    document_number: String,
    document_type: DocumentType,
    subtotal: Decimal,
    tax_amount: Decimal,
    currency: Currency,
}

impl Default for DocumentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentBuilder {
    /// Creates a builder for a $1000.00 open invoice
    pub fn new() -> Self {
        Self {
            organization_id: OrganizationId::new(),
            customer_id: CustomerId::new(),
            document_number: "INV-001".to_string(),
            document_type: DocumentType::Invoice,
            subtotal: dec!(900.00),
            tax_amount: dec!(100.00),
            currency: Currency::USD,
        }
    }

    pub fn organization(mut self, id: OrganizationId) -> Self {
        self.organization_id = id;
        self
    }

    pub fn customer(mut self, id: CustomerId) -> Self {
        self.customer_id = id;
        self
    }

    pub fn number(mut self, number: impl Into<String>) -> Self {
        self.document_number = number.into();
        self
    }

    pub fn document_type(mut self, document_type: DocumentType) -> Self {
        self.document_type = document_type;
        self
    }

    /// Sets subtotal and tax so the total is exactly `total` (no tax)
    pub fn total(mut self, total: Decimal) -> Self {
        self.subtotal = total;
        self.tax_amount = dec!(0);
        self
    }

    pub fn subtotal(mut self, subtotal: Decimal) -> Self {
        self.subtotal = subtotal;
        self
    }

    pub fn tax(mut self, tax_amount: Decimal) -> Self {
        self.tax_amount = tax_amount;
        self
    }

    pub fn currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    pub fn build(self) -> Document {
        Document::new(
            self.organization_id,
            self.customer_id,
            self.document_number,
            self.document_type,
            Money::new(self.subtotal, self.currency),
            Money::new(self.tax_amount, self.currency),
        )
        .expect("builder produced an invalid document")
    }
}

/// Builder for pending gateway test payments
pub struct PaymentBuilder {
    organization_id: OrganizationId,
    customer_id: CustomerId,
    sequence: u64,
    amount: Decimal,
    currency: Currency,
    session_id: Option<String>,
    intent_id: Option<String>,
}

impl Default for PaymentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PaymentBuilder {
    /// Creates a builder for a $500.00 pending gateway payment
    pub fn new() -> Self {
        Self {
            organization_id: OrganizationId::new(),
            customer_id: CustomerId::new(),
            sequence: 1,
            amount: dec!(500.00),
            currency: Currency::USD,
            session_id: Some("cs_test_1".to_string()),
            intent_id: None,
        }
    }

    pub fn organization(mut self, id: OrganizationId) -> Self {
        self.organization_id = id;
        self
    }

    pub fn customer(mut self, id: CustomerId) -> Self {
        self.customer_id = id;
        self
    }

    pub fn sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn amount(mut self, amount: Decimal) -> Self {
        self.amount = amount;
        self
    }

    pub fn currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    pub fn session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn intent_id(mut self, intent_id: impl Into<String>) -> Self {
        self.intent_id = Some(intent_id.into());
        self
    }

    /// Builds a `Pending` gateway payment with the configured references
    pub fn build(self) -> Payment {
        let mut payment = Payment::new_pending_gateway(
            self.organization_id,
            self.customer_id,
            format_payment_number(self.sequence),
            Money::new(self.amount, self.currency),
            "stripe",
            Utc::now() + Duration::hours(24),
        )
        .expect("builder produced an invalid payment");
        payment.set_gateway_references(self.session_id, self.intent_id);
        payment
    }
}
