//! Gateway Domain - Checkout Sessions and Notification Processing
//!
//! This crate owns everything that touches the external card-payment
//! gateway:
//!
//! - **Session manager**: stands up a gateway-hosted collection flow for a
//!   prospective payment, persisting a `Pending` payment before any money
//!   can move.
//! - **Notification processor**: consumes the gateway's asynchronous,
//!   possibly-duplicated, possibly-out-of-order webhook notifications and
//!   drives the payment state machine idempotently.
//! - **Signature verification**: HMAC-SHA256 over signed payloads with a
//!   per-organization secret; unverifiable payloads are rejected with no
//!   state change.
//!
//! The gateway itself sits behind the [`GatewayClient`] port; credentials
//! (API key, webhook signing secret) come from the [`CredentialStore`]
//! port, whose encrypted-at-rest backing store is an external collaborator.

pub mod client;
pub mod credentials;
pub mod signature;
pub mod notification;
pub mod session;
pub mod processor;
pub mod error;
pub mod adapters;

pub use client::{
    CheckoutMode, CreateSessionRequest, GatewayClient, GatewayIntent, GatewaySession,
    SessionMetadata,
};
pub use credentials::CredentialStore;
pub use signature::SignatureVerifier;
pub use notification::GatewayNotification;
pub use session::{CheckoutConfig, CheckoutCreated, CheckoutSessionService, CreateCheckoutRequest};
pub use processor::{NotificationProcessor, ProcessOutcome};
pub use error::GatewayError;
