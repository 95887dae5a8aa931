//! Document DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use domain_ledger::Document;

#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub document_number: String,
    pub document_type: String,
    pub status: String,
    pub currency: String,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
    pub amount_paid: Decimal,
    pub balance_due: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Document> for DocumentResponse {
    fn from(document: Document) -> Self {
        Self {
            id: *document.id.as_uuid(),
            customer_id: *document.customer_id.as_uuid(),
            document_number: document.document_number.clone(),
            document_type: document.document_type.as_str().to_string(),
            status: document.status.as_str().to_string(),
            currency: document.currency().code().to_string(),
            subtotal: document.subtotal.amount(),
            tax_amount: document.tax_amount.amount(),
            total_amount: document.total_amount.amount(),
            amount_paid: document.amount_paid.amount(),
            balance_due: document.balance_due.amount(),
            paid_date: document.paid_date,
            created_at: document.created_at,
            updated_at: document.updated_at,
        }
    }
}
