//! Checkout session handlers

use axum::{extract::State, http::HeaderMap, Json};
use chrono::Utc;
use validator::Validate;

use core_kernel::{Currency, CustomerId, DocumentId, Money};
use domain_gateway::{CheckoutCreated, CreateCheckoutRequest};

use crate::dto::checkout::{CheckoutSessionResponse, CreateCheckoutSessionRequest};
use crate::error::ApiError;
use crate::{organization_id, AppState};

/// Creates a gateway checkout session for a set of documents
pub async fn create_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateCheckoutSessionRequest>,
) -> Result<Json<CheckoutSessionResponse>, ApiError> {
    request.validate()?;
    let organization_id = organization_id(&headers)?;

    let currency = Currency::from_code(&request.currency)
        .ok_or_else(|| ApiError::BadRequest(format!("unknown currency: {}", request.currency)))?;
    let amount = Money::new(request.amount, currency);
    if !amount.is_positive() {
        return Err(ApiError::BadRequest(
            "amount must be positive".to_string(),
        ));
    }

    let created = state
        .checkout
        .create_session(
            CreateCheckoutRequest {
                organization_id,
                customer_id: CustomerId::from_uuid(request.customer_id),
                document_ids: request
                    .document_ids
                    .iter()
                    .map(|id| DocumentId::from_uuid(*id))
                    .collect(),
                amount,
                mode: request.mode,
            },
            Utc::now(),
        )
        .await?;

    let response = match created {
        CheckoutCreated::Hosted {
            payment_id,
            payment_number,
            redirect_url,
        } => CheckoutSessionResponse {
            payment_id: *payment_id.as_uuid(),
            payment_number,
            mode: request.mode,
            redirect_url: Some(redirect_url),
            client_secret: None,
        },
        CheckoutCreated::Embedded {
            payment_id,
            payment_number,
            client_secret,
        } => CheckoutSessionResponse {
            payment_id: *payment_id.as_uuid(),
            payment_number,
            mode: request.mode,
            redirect_url: None,
            client_secret: Some(client_secret),
        },
    };
    Ok(Json(response))
}
