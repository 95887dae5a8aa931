//! Gateway port adapters
//!
//! Standing implementations of the outbound ports: a simulated gateway
//! client for environments without a live provider account, and a static
//! credential store configured at startup.

pub mod credentials;
pub mod simulated;

pub use credentials::StaticCredentialStore;
pub use simulated::{SimulatedGatewayClient, SimulatedGatewayConfig};
