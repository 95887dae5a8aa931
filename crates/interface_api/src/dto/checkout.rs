//! Checkout session DTOs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use domain_gateway::CheckoutMode;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCheckoutSessionRequest {
    pub customer_id: Uuid,
    /// Target documents in desired allocation order
    #[validate(length(min = 1, message = "at least one target document is required"))]
    pub document_ids: Vec<Uuid>,
    pub amount: Decimal,
    /// ISO currency code (e.g. "USD")
    #[validate(length(equal = 3, message = "currency must be a 3-letter code"))]
    pub currency: String,
    pub mode: CheckoutMode,
}

#[derive(Debug, Serialize)]
pub struct CheckoutSessionResponse {
    pub payment_id: Uuid,
    pub payment_number: String,
    pub mode: CheckoutMode,
    /// Present in hosted-redirect mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
    /// Present in embedded-form mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
}
