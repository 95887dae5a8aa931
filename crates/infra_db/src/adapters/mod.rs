//! Port adapters
//!
//! Implementations of the domain port traits on top of the repositories.

pub mod ledger;

pub use ledger::PgLedgerStore;
