//! API configuration

use serde::Deserialize;

/// API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Database URL
    pub database_url: String,
    /// Log level
    pub log_level: String,
    /// Gateway provider tag recorded on payments (e.g. "stripe")
    pub gateway_provider: String,
    /// Checkout session lifetime in hours
    pub session_expiry_hours: i64,
    /// Webhook signature timestamp tolerance in seconds
    pub signature_tolerance_secs: i64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_url: "postgres://localhost/receivables".to_string(),
            log_level: "info".to_string(),
            gateway_provider: "stripe".to_string(),
            session_expiry_hours: 24,
            signature_tolerance_secs: domain_gateway::signature::DEFAULT_TOLERANCE_SECS,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("API"))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
