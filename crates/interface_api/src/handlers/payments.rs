//! Payment handlers

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use core_kernel::PaymentId;

use crate::dto::payments::{PaymentResponse, VoidPaymentRequest};
use crate::error::ApiError;
use crate::{organization_id, AppState};

/// Gets a payment with its application rows
pub async fn get_payment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let organization_id = organization_id(&headers)?;
    let payment_id = PaymentId::from_uuid(id);

    let payment = state
        .store
        .get_payment(organization_id, payment_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("payment {payment_id} not found")))?;
    let applications = state
        .store
        .get_applications_for_payment(organization_id, payment_id)
        .await?;

    Ok(Json(PaymentResponse::from_domain(payment, applications)))
}

/// Voids an applied payment, restoring the documents it touched
pub async fn void_payment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(request): Json<VoidPaymentRequest>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let organization_id = organization_id(&headers)?;

    let outcome = state
        .ledger
        .void_payment(
            organization_id,
            PaymentId::from_uuid(id),
            request.reason,
            Utc::now(),
        )
        .await?;

    // Application rows are deleted by the reversal.
    Ok(Json(PaymentResponse::from_domain(outcome.payment, vec![])))
}
