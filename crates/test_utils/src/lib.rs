//! Test Utilities Crate
//!
//! Shared test infrastructure for the Open Receivables Core test suite.
//!
//! # Modules
//!
//! - `memory`: in-memory `LedgerStore` with the same transactional commit
//!   semantics as the PostgreSQL adapter, plus failure injection
//! - `gateway`: recording mock of the `GatewayClient` port
//! - `builders`: builder patterns for test data construction
//! - `fixtures`: signed webhook payloads and shared credentials
//! - `assertions`: custom assertion helpers for domain types

pub mod assertions;
pub mod builders;
pub mod fixtures;
pub mod gateway;
pub mod memory;

pub use assertions::*;
pub use builders::*;
pub use fixtures::*;
pub use gateway::*;
pub use memory::*;
