//! Open Receivables Core - API Server Binary
//!
//! Starts the HTTP API server for the receivables engine.
//!
//! # Usage
//!
//! ```bash
//! # Run with default configuration
//! cargo run --bin receivables-api
//!
//! # Run with environment variables
//! API_HOST=0.0.0.0 API_PORT=8080 DATABASE_URL=postgres://... cargo run --bin receivables-api
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST` - Server host (default: 0.0.0.0)
//! * `API_PORT` - Server port (default: 8080)
//! * `API_DATABASE_URL` / `DATABASE_URL` - PostgreSQL connection string
//! * `API_LOG_LEVEL` - Log level: trace, debug, info, warn, error (default: info)
//! * `API_GATEWAY_PROVIDER` - Provider tag recorded on payments (default: stripe)
//! * `API_SESSION_EXPIRY_HOURS` - Checkout session lifetime (default: 24)
//! * `API_SIGNATURE_TOLERANCE_SECS` - Webhook timestamp tolerance (default: 300)
//! * `GATEWAY_API_KEY` - Gateway API key
//! * `GATEWAY_WEBHOOK_SECRET` - Webhook signing secret

use std::net::SocketAddr;
use std::sync::Arc;

use secrecy::SecretString;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use chrono::Duration;
use domain_gateway::adapters::{SimulatedGatewayClient, StaticCredentialStore};
use domain_gateway::{CheckoutConfig, SignatureVerifier};
use infra_db::{create_pool, DatabaseConfig, PgLedgerStore};
use interface_api::{config::ApiConfig, create_router, AppState};

/// Main entry point for the API server.
///
/// Initializes logging, loads configuration, establishes the database
/// connection, runs migrations, and starts the HTTP server.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = load_config();
    init_tracing(&config.log_level);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        "Starting Open Receivables Core API Server"
    );

    let pool = create_pool(DatabaseConfig::new(&config.database_url)).await?;
    infra_db::run_migrations(&pool).await?;

    let store = Arc::new(PgLedgerStore::new(pool));
    let credentials = Arc::new(load_credentials());
    let gateway = Arc::new(SimulatedGatewayClient::default());

    let state = AppState::new(
        store.clone(),
        gateway,
        credentials,
        store,
        CheckoutConfig {
            provider: config.gateway_provider.clone(),
            session_expiry: Duration::hours(config.session_expiry_hours),
        },
        SignatureVerifier::new(config.signature_tolerance_secs),
    );
    let app = create_router(state);

    let addr: SocketAddr = config.server_addr().parse()?;
    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Loads API configuration from environment variables, falling back to
/// individual variables and then defaults.
fn load_config() -> ApiConfig {
    ApiConfig::from_env().unwrap_or_else(|_| {
        let defaults = ApiConfig::default();
        ApiConfig {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            database_url: std::env::var("DATABASE_URL")
                .or_else(|_| std::env::var("API_DATABASE_URL"))
                .unwrap_or(defaults.database_url),
            log_level: std::env::var("API_LOG_LEVEL")
                .or_else(|_| std::env::var("RUST_LOG"))
                .unwrap_or(defaults.log_level),
            gateway_provider: std::env::var("API_GATEWAY_PROVIDER")
                .unwrap_or(defaults.gateway_provider),
            session_expiry_hours: std::env::var("API_SESSION_EXPIRY_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.session_expiry_hours),
            signature_tolerance_secs: std::env::var("API_SIGNATURE_TOLERANCE_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.signature_tolerance_secs),
        }
    })
}

/// Builds the credential store from environment variables.
fn load_credentials() -> StaticCredentialStore {
    let api_key = std::env::var("GATEWAY_API_KEY")
        .unwrap_or_else(|_| "sk_test_placeholder".to_string());
    let webhook_secret = std::env::var("GATEWAY_WEBHOOK_SECRET")
        .unwrap_or_else(|_| "whsec_placeholder".to_string());
    StaticCredentialStore::new(
        SecretString::new(api_key),
        SecretString::new(webhook_secret),
    )
}

/// Initializes the tracing subscriber for structured logging.
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM), enabling graceful
/// shutdown so in-flight requests complete before the process exits.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
