//! Checkout session manager
//!
//! Stands up an external, gateway-hosted collection flow for a prospective
//! payment without assuming it will succeed. The local `Pending` payment is
//! persisted before the gateway is contacted: an orphaned pending row is
//! safe (session-expiry handling reaps it), collected money with no local
//! record is not.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, instrument, warn};

use core_kernel::{CustomerId, DocumentId, Money, OrganizationId, PaymentId};
use domain_ledger::payment::format_payment_number;
use domain_ledger::{validate_targets, LedgerStore, Payment};

use crate::client::{
    CheckoutMode, CreateSessionRequest, GatewayClient, SessionMetadata,
};
use crate::credentials::CredentialStore;
use crate::error::GatewayError;

/// Gateway configuration for session creation
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// Provider tag recorded on the payment (e.g. "stripe")
    pub provider: String,
    /// How long a session stays collectable
    pub session_expiry: Duration,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            provider: "stripe".to_string(),
            session_expiry: Duration::hours(24),
        }
    }
}

/// Request to open a collection flow
#[derive(Debug, Clone)]
pub struct CreateCheckoutRequest {
    pub organization_id: OrganizationId,
    pub customer_id: CustomerId,
    /// Target documents in allocation order
    pub document_ids: Vec<DocumentId>,
    pub amount: Money,
    pub mode: CheckoutMode,
}

/// Result of opening a collection flow
#[derive(Debug, Clone)]
pub enum CheckoutCreated {
    /// Hosted-redirect mode: send the customer to the gateway page
    Hosted {
        payment_id: PaymentId,
        payment_number: String,
        redirect_url: String,
    },
    /// Embedded-form mode: drive the form with the client secret
    Embedded {
        payment_id: PaymentId,
        payment_number: String,
        client_secret: String,
    },
}

impl CheckoutCreated {
    /// The local payment backing the session
    pub fn payment_id(&self) -> PaymentId {
        match self {
            CheckoutCreated::Hosted { payment_id, .. } => *payment_id,
            CheckoutCreated::Embedded { payment_id, .. } => *payment_id,
        }
    }
}

/// Creates gateway checkout sessions backed by local pending payments
#[derive(Clone)]
pub struct CheckoutSessionService {
    store: Arc<dyn LedgerStore>,
    gateway: Arc<dyn GatewayClient>,
    credentials: Arc<dyn CredentialStore>,
    config: CheckoutConfig,
}

impl CheckoutSessionService {
    /// Creates a new session service
    pub fn new(
        store: Arc<dyn LedgerStore>,
        gateway: Arc<dyn GatewayClient>,
        credentials: Arc<dyn CredentialStore>,
        config: CheckoutConfig,
    ) -> Self {
        Self {
            store,
            gateway,
            credentials,
            config,
        }
    }

    /// Opens a collection flow for the given documents
    ///
    /// Validation (amount ceiling, tenancy, payability) runs before any
    /// gateway call, so no external session is ever created for an invalid
    /// request. If the gateway call fails after the local insert, the
    /// `Pending` row remains and is reaped by session-expiry handling.
    #[instrument(skip(self, request), fields(organization_id = %request.organization_id))]
    pub async fn create_session(
        &self,
        request: CreateCheckoutRequest,
        now: DateTime<Utc>,
    ) -> Result<CheckoutCreated, GatewayError> {
        let documents = self
            .store
            .get_documents(request.organization_id, &request.document_ids)
            .await?;
        validate_targets(
            request.organization_id,
            request.customer_id,
            request.amount,
            &request.document_ids,
            &documents,
        )?;

        let sequence = self
            .store
            .next_payment_number(request.organization_id)
            .await?;
        let payment_number = format_payment_number(sequence);
        let expires_at = now + self.config.session_expiry;

        let mut payment = Payment::new_pending_gateway(
            request.organization_id,
            request.customer_id,
            payment_number.clone(),
            request.amount,
            self.config.provider.clone(),
            expires_at,
        )?;

        // Durable local counterpart first; only then talk to the gateway.
        self.store.insert_payment(&payment).await?;

        let api_key = self
            .credentials
            .gateway_api_key(request.organization_id)
            .await
            .map_err(|e| match e {
                e if e.is_not_found() => GatewayError::MissingCredentials(
                    request.organization_id.to_string(),
                ),
                e => GatewayError::Store(e),
            })?;

        let gateway_request = CreateSessionRequest {
            amount_minor: request.amount.to_minor(),
            currency: request.amount.currency(),
            expires_at,
            metadata: SessionMetadata {
                organization_id: request.organization_id,
                customer_id: request.customer_id,
                payment_id: payment.id,
                document_ids: request.document_ids.clone(),
                payment_number: payment_number.clone(),
            },
        };

        let created = match request.mode {
            CheckoutMode::HostedRedirect => {
                let session = self
                    .gateway
                    .create_checkout_session(&api_key, &gateway_request)
                    .await
                    .map_err(|e| self.orphaned(&payment, e))?;

                payment.set_gateway_references(Some(session.session_id), None);
                CheckoutCreated::Hosted {
                    payment_id: payment.id,
                    payment_number: payment_number.clone(),
                    redirect_url: session.redirect_url,
                }
            }
            CheckoutMode::EmbeddedForm => {
                let intent = self
                    .gateway
                    .create_payment_intent(&api_key, &gateway_request)
                    .await
                    .map_err(|e| self.orphaned(&payment, e))?;

                payment.set_gateway_references(None, Some(intent.intent_id));
                CheckoutCreated::Embedded {
                    payment_id: payment.id,
                    payment_number: payment_number.clone(),
                    client_secret: intent.client_secret,
                }
            }
        };

        self.store.update_payment(&payment).await?;

        info!(
            payment_id = %payment.id,
            %payment_number,
            amount = %request.amount,
            documents = request.document_ids.len(),
            "checkout session created"
        );
        Ok(created)
    }

    fn orphaned(&self, payment: &Payment, error: GatewayError) -> GatewayError {
        // The pending row stays behind; session-expiry handling reaps it.
        warn!(
            payment_id = %payment.id,
            payment_number = %payment.payment_number,
            %error,
            "gateway call failed after local payment insert"
        );
        error
    }
}
