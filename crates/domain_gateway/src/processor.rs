//! Notification processor
//!
//! Applies gateway notifications to the ledger. Gateways deliver at least
//! once and out of order, so every handler is idempotent: the payment's
//! current status decides whether a notification still has work to do, and
//! a repeat arrives as a logged no-op rather than an error. The store
//! serializes concurrent mutations of a payment row, so two racing success
//! notifications produce exactly one allocation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{info, instrument, warn};

use core_kernel::OrganizationId;
use domain_ledger::{LedgerService, Payment, PaymentConfirmation, PaymentStatus};

use crate::client::SessionMetadata;
use crate::credentials::CredentialStore;
use crate::error::GatewayError;
use crate::notification::GatewayNotification;
use crate::signature::SignatureVerifier;

/// What a notification ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Funds confirmed and allocated
    Applied,
    /// Success notification for a payment that was already applied
    AlreadyApplied,
    /// Notification carried no work for the payment's current state
    Ignored,
    /// Failure notification voided the pending payment
    Voided,
    /// Session expiry voided this many pending payments
    SessionsExpired { count: u64 },
}

/// Processes signed gateway notifications
#[derive(Clone)]
pub struct NotificationProcessor {
    ledger: LedgerService,
    credentials: Arc<dyn CredentialStore>,
    verifier: SignatureVerifier,
}

impl NotificationProcessor {
    /// Creates a new processor
    pub fn new(
        ledger: LedgerService,
        credentials: Arc<dyn CredentialStore>,
        verifier: SignatureVerifier,
    ) -> Self {
        Self {
            ledger,
            credentials,
            verifier,
        }
    }

    /// Verifies and applies a single notification
    ///
    /// The raw payload bytes are verified against the organization's webhook
    /// secret before any interpretation. Errors for which `is_rejection()`
    /// holds should not be retried by the gateway; everything else should.
    #[instrument(skip(self, payload, signature_header), fields(%organization_id))]
    pub async fn process(
        &self,
        organization_id: OrganizationId,
        payload: &[u8],
        signature_header: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<ProcessOutcome, GatewayError> {
        let header = signature_header.ok_or(GatewayError::MissingSignature)?;

        let secret = self
            .credentials
            .webhook_secret(organization_id)
            .await
            .map_err(|e| match e {
                e if e.is_not_found() => {
                    GatewayError::MissingCredentials(organization_id.to_string())
                }
                e => GatewayError::Store(e),
            })?;
        self.verifier.verify(payload, header, &secret, now)?;

        match GatewayNotification::parse(payload)? {
            GatewayNotification::CheckoutCompleted {
                session_id,
                intent_id,
                metadata,
                amount_minor,
                raw,
            } => {
                self.handle_success(
                    organization_id,
                    &session_id,
                    intent_id,
                    metadata,
                    amount_minor,
                    raw,
                    now,
                )
                .await
            }
            GatewayNotification::IntentSucceeded {
                intent_id,
                metadata,
                amount_minor,
                raw,
            } => {
                let reference = intent_id.clone();
                self.handle_success(
                    organization_id,
                    &reference,
                    Some(intent_id),
                    metadata,
                    amount_minor,
                    raw,
                    now,
                )
                .await
            }
            GatewayNotification::IntentFailed {
                intent_id,
                failure_message,
                raw,
            } => {
                self.handle_failure(organization_id, &intent_id, failure_message, raw, now)
                    .await
            }
            GatewayNotification::CheckoutExpired { session_id } => {
                let count = self
                    .ledger
                    .store()
                    .expire_pending_sessions(organization_id, &session_id)
                    .await?;
                info!(%session_id, count, "checkout session expired");
                Ok(ProcessOutcome::SessionsExpired { count })
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn handle_success(
        &self,
        organization_id: OrganizationId,
        reference: &str,
        transaction_id: Option<String>,
        metadata: SessionMetadata,
        amount_minor: Option<i64>,
        raw: Value,
        now: DateTime<Utc>,
    ) -> Result<ProcessOutcome, GatewayError> {
        if metadata.organization_id != organization_id {
            return Err(GatewayError::MalformedPayload(format!(
                "metadata names organization {}, delivered to {organization_id}",
                metadata.organization_id
            )));
        }

        let payment = self.lookup(organization_id, reference).await?;
        match payment.status {
            PaymentStatus::Applied => {
                warn!(
                    payment_id = %payment.id,
                    %reference,
                    "duplicate success notification for applied payment"
                );
                Ok(ProcessOutcome::AlreadyApplied)
            }
            PaymentStatus::Void => {
                warn!(
                    payment_id = %payment.id,
                    %reference,
                    "success notification for voided payment ignored"
                );
                Ok(ProcessOutcome::Ignored)
            }
            PaymentStatus::Pending => {
                // The locally recorded amount is authoritative; a mismatch is
                // logged for investigation but does not block the allocation.
                if let Some(reported) = amount_minor {
                    let local = payment.amount.to_minor();
                    if reported != local {
                        warn!(
                            payment_id = %payment.id,
                            reported,
                            local,
                            "gateway-reported amount differs from local payment"
                        );
                    }
                }

                let confirmation = PaymentConfirmation {
                    gateway_transaction_id: transaction_id,
                    gateway_response: Some(raw),
                };
                self.ledger
                    .apply_payment(payment, &metadata.document_ids, confirmation, now)
                    .await?;
                Ok(ProcessOutcome::Applied)
            }
        }
    }

    async fn handle_failure(
        &self,
        organization_id: OrganizationId,
        reference: &str,
        failure_message: Option<String>,
        raw: Value,
        now: DateTime<Utc>,
    ) -> Result<ProcessOutcome, GatewayError> {
        let mut payment = self.lookup(organization_id, reference).await?;
        match payment.status {
            PaymentStatus::Pending => {
                payment.mark_failed(Some(raw), now)?;
                self.ledger.store().update_payment(&payment).await?;
                info!(
                    payment_id = %payment.id,
                    failure = failure_message.as_deref().unwrap_or("unspecified"),
                    "pending payment voided on gateway failure"
                );
                Ok(ProcessOutcome::Voided)
            }
            status => {
                // A failed retry can trail the success that superseded it.
                warn!(
                    payment_id = %payment.id,
                    status = status.as_str(),
                    "failure notification for settled payment ignored"
                );
                Ok(ProcessOutcome::Ignored)
            }
        }
    }

    async fn lookup(
        &self,
        organization_id: OrganizationId,
        reference: &str,
    ) -> Result<Payment, GatewayError> {
        self.ledger
            .store()
            .find_payment_by_gateway_reference(organization_id, reference)
            .await?
            .ok_or_else(|| GatewayError::PaymentNotFound(reference.to_string()))
    }
}
