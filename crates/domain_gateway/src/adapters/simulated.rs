//! Simulated gateway client
//!
//! Fabricates session and intent identifiers in-process instead of calling
//! a live provider. Lets the full checkout/notification flow run end to end
//! in development: the redirect URL points at the configured base, and
//! notifications are posted by hand (or by a test harness) using the same
//! identifiers.

use async_trait::async_trait;
use secrecy::SecretString;
use tracing::debug;
use uuid::Uuid;

use core_kernel::DomainPort;

use crate::client::{
    CreateSessionRequest, GatewayClient, GatewayIntent, GatewaySession,
};
use crate::error::GatewayError;

/// Configuration for the simulated gateway
#[derive(Debug, Clone)]
pub struct SimulatedGatewayConfig {
    /// Base URL embedded in fabricated redirect URLs
    pub checkout_base_url: String,
}

impl Default for SimulatedGatewayConfig {
    fn default() -> Self {
        Self {
            checkout_base_url: "https://checkout.invalid".to_string(),
        }
    }
}

/// Gateway client that fabricates identifiers instead of calling a provider
#[derive(Debug, Clone, Default)]
pub struct SimulatedGatewayClient {
    config: SimulatedGatewayConfig,
}

impl SimulatedGatewayClient {
    /// Creates a simulated client with the given configuration
    pub fn new(config: SimulatedGatewayConfig) -> Self {
        Self { config }
    }
}

impl DomainPort for SimulatedGatewayClient {}

#[async_trait]
impl GatewayClient for SimulatedGatewayClient {
    async fn create_checkout_session(
        &self,
        _api_key: &SecretString,
        request: &CreateSessionRequest,
    ) -> Result<GatewaySession, GatewayError> {
        let session_id = format!("cs_sim_{}", Uuid::new_v4().simple());
        debug!(
            %session_id,
            amount_minor = request.amount_minor,
            "simulated checkout session created"
        );
        Ok(GatewaySession {
            redirect_url: format!("{}/pay/{session_id}", self.config.checkout_base_url),
            session_id,
        })
    }

    async fn create_payment_intent(
        &self,
        _api_key: &SecretString,
        request: &CreateSessionRequest,
    ) -> Result<GatewayIntent, GatewayError> {
        let intent_id = format!("pi_sim_{}", Uuid::new_v4().simple());
        debug!(
            %intent_id,
            amount_minor = request.amount_minor,
            "simulated payment intent created"
        );
        Ok(GatewayIntent {
            client_secret: format!("{intent_id}_secret_{}", Uuid::new_v4().simple()),
            intent_id,
        })
    }
}
