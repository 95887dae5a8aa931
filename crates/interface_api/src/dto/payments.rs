//! Payment DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use domain_ledger::{Payment, PaymentApplication};

#[derive(Debug, Deserialize, Default)]
pub struct VoidPaymentRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub id: Uuid,
    pub payment_number: String,
    pub customer_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub method: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_transaction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout_session_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub void_reason: Option<String>,
    pub applications: Vec<ApplicationResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApplicationResponse {
    pub id: Uuid,
    pub document_id: Uuid,
    pub amount_applied: Decimal,
    pub applied_at: DateTime<Utc>,
}

impl PaymentResponse {
    /// Builds the response from a payment and its application rows
    pub fn from_domain(payment: Payment, applications: Vec<PaymentApplication>) -> Self {
        Self {
            id: *payment.id.as_uuid(),
            payment_number: payment.payment_number,
            customer_id: *payment.customer_id.as_uuid(),
            amount: payment.amount.amount(),
            currency: payment.amount.currency().code().to_string(),
            method: payment.method.as_str().to_string(),
            status: payment.status.as_str().to_string(),
            gateway_provider: payment.gateway_provider,
            gateway_transaction_id: payment.gateway_transaction_id,
            checkout_session_status: payment
                .checkout_session_status
                .map(|s| s.as_str().to_string()),
            void_reason: payment.void_reason,
            applications: applications
                .into_iter()
                .map(|a| ApplicationResponse {
                    id: *a.id.as_uuid(),
                    document_id: *a.document_id.as_uuid(),
                    amount_applied: a.amount_applied.amount(),
                    applied_at: a.applied_at,
                })
                .collect(),
            created_at: payment.created_at,
            updated_at: payment.updated_at,
        }
    }
}
