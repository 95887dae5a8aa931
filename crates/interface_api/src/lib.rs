//! HTTP API Layer
//!
//! REST API for the receivables engine using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: checkout sessions, payment reads and voids, document
//!   reads, the gateway webhook endpoint, and health checks
//! - **DTOs**: request/response data transfer objects
//! - **Error Handling**: consistent JSON error responses; the webhook
//!   handler additionally maps errors onto the gateway's retry semantics
//!
//! All ledger routes are tenant-scoped through the `X-Organization-Id`
//! header; the webhook route carries the organization in its path because
//! the gateway is configured with a per-organization endpoint URL.
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let app = create_router(state);
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod dto;

use std::sync::Arc;

use axum::{
    http::HeaderMap,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use core_kernel::{HealthCheckable, OrganizationId};
use domain_gateway::{
    CheckoutConfig, CheckoutSessionService, CredentialStore, GatewayClient,
    NotificationProcessor, SignatureVerifier,
};
use domain_ledger::{LedgerService, LedgerStore};

use crate::error::ApiError;
use crate::handlers::{checkout, documents, health, payments, webhooks};

/// Header carrying the tenant for ledger routes
pub const ORGANIZATION_HEADER: &str = "x-organization-id";

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LedgerStore>,
    pub ledger: LedgerService,
    pub checkout: CheckoutSessionService,
    pub processor: NotificationProcessor,
    pub health: Arc<dyn HealthCheckable>,
}

impl AppState {
    /// Wires the services over the given port implementations
    pub fn new(
        store: Arc<dyn LedgerStore>,
        gateway: Arc<dyn GatewayClient>,
        credentials: Arc<dyn CredentialStore>,
        health: Arc<dyn HealthCheckable>,
        checkout_config: CheckoutConfig,
        verifier: SignatureVerifier,
    ) -> Self {
        let ledger = LedgerService::new(Arc::clone(&store));
        Self {
            checkout: CheckoutSessionService::new(
                Arc::clone(&store),
                gateway,
                Arc::clone(&credentials),
                checkout_config,
            ),
            processor: NotificationProcessor::new(ledger.clone(), credentials, verifier),
            ledger,
            store,
            health,
        }
    }
}

/// Extracts the tenant from the `X-Organization-Id` header
pub(crate) fn organization_id(headers: &HeaderMap) -> Result<OrganizationId, ApiError> {
    headers
        .get(ORGANIZATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            ApiError::BadRequest(format!("missing {ORGANIZATION_HEADER} header"))
        })?
        .parse()
        .map_err(|_| {
            ApiError::BadRequest(format!("{ORGANIZATION_HEADER} is not a valid id"))
        })
}

/// Creates the main API router
pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let api_routes = Router::new()
        .route("/checkout/sessions", post(checkout::create_session))
        .route("/payments/:id", get(payments::get_payment))
        .route("/payments/:id/void", post(payments::void_payment))
        .route("/documents/:id", get(documents::get_document));

    let webhook_routes = Router::new().route(
        "/gateway/:organization_id",
        post(webhooks::receive_notification),
    );

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .nest("/webhooks", webhook_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
