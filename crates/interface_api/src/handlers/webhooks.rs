//! Gateway webhook handler
//!
//! The notification endpoint reads the raw body bytes (signature
//! verification covers the exact payload, so no extractor may touch it
//! first) and answers with the status codes the gateway's retry policy
//! keys on: 200 for processed or idempotent no-op, 400 for payloads that
//! will never verify or resolve, 500 for failures worth retrying.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use chrono::Utc;
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use core_kernel::OrganizationId;
use domain_gateway::ProcessOutcome;

use crate::error::ApiError;
use crate::AppState;

/// Header carrying the `t=...,v1=...` payload signature
pub const SIGNATURE_HEADER: &str = "gateway-signature";

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
    pub outcome: String,
}

/// Receives a signed gateway notification
pub async fn receive_notification(
    State(state): State<AppState>,
    Path(organization_id): Path<Uuid>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, ApiError> {
    let organization_id = OrganizationId::from_uuid(organization_id);
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    match state
        .processor
        .process(organization_id, &body, signature, Utc::now())
        .await
    {
        Ok(outcome) => Ok(Json(WebhookAck {
            received: true,
            outcome: outcome_label(&outcome).to_string(),
        })),
        Err(err) if err.is_rejection() => {
            warn!(%organization_id, %err, "gateway notification rejected");
            Err(ApiError::BadRequest(err.to_string()))
        }
        // Anything else is retryable from the gateway's perspective.
        Err(err) => Err(ApiError::Internal(err.to_string())),
    }
}

fn outcome_label(outcome: &ProcessOutcome) -> &'static str {
    match outcome {
        ProcessOutcome::Applied => "applied",
        ProcessOutcome::AlreadyApplied => "already_applied",
        ProcessOutcome::Ignored => "ignored",
        ProcessOutcome::Voided => "voided",
        ProcessOutcome::SessionsExpired { .. } => "sessions_expired",
    }
}
