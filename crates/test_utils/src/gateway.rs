//! Recording gateway client mock

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use secrecy::SecretString;

use core_kernel::DomainPort;
use domain_gateway::{
    CreateSessionRequest, GatewayClient, GatewayError, GatewayIntent, GatewaySession,
};

/// Mock `GatewayClient` that fabricates deterministic identifiers and
/// records every request it receives
#[derive(Default)]
pub struct MockGatewayClient {
    requests: Mutex<Vec<CreateSessionRequest>>,
    counter: AtomicU64,
    fail_next: AtomicBool,
}

impl MockGatewayClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next gateway call fail with a provider error
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Returns every request received so far
    pub fn requests(&self) -> Vec<CreateSessionRequest> {
        match self.requests.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Returns the most recent request, if any
    pub fn last_request(&self) -> Option<CreateSessionRequest> {
        self.requests().pop()
    }

    fn record(&self, request: &CreateSessionRequest) -> Result<u64, GatewayError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(GatewayError::Provider("injected gateway failure".to_string()));
        }
        match self.requests.lock() {
            Ok(mut guard) => guard.push(request.clone()),
            Err(poisoned) => poisoned.into_inner().push(request.clone()),
        }
        Ok(self.counter.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

impl DomainPort for MockGatewayClient {}

#[async_trait]
impl GatewayClient for MockGatewayClient {
    async fn create_checkout_session(
        &self,
        _api_key: &SecretString,
        request: &CreateSessionRequest,
    ) -> Result<GatewaySession, GatewayError> {
        let n = self.record(request)?;
        Ok(GatewaySession {
            session_id: format!("cs_test_{n}"),
            redirect_url: format!("https://checkout.test/pay/cs_test_{n}"),
        })
    }

    async fn create_payment_intent(
        &self,
        _api_key: &SecretString,
        request: &CreateSessionRequest,
    ) -> Result<GatewayIntent, GatewayError> {
        let n = self.record(request)?;
        Ok(GatewayIntent {
            intent_id: format!("pi_test_{n}"),
            client_secret: format!("pi_test_{n}_secret"),
        })
    }
}
