//! Ledger Domain - Documents, Payments, and Payment Applications
//!
//! This crate implements the receivables ledger: the entities money is
//! applied against, the allocation engine that distributes a payment across
//! outstanding documents, and the reversal logic that restores balances when
//! a payment is voided.
//!
//! # Invariants
//!
//! - For every document, `amount_paid + balance_due == total_amount`
//! - For every document, the sum of its application rows equals `amount_paid`
//! - For every payment, the sum of its application rows never exceeds `amount`
//! - A payment transitions out of `Pending` exactly once
//!
//! Documents and payments are mutated only by the allocation engine and the
//! reversal handler; every multi-row mutation is committed through a single
//! atomic `LedgerStore` call so no partially-applied state is observable.
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_ledger::{allocate_payment, Document, Payment};
//!
//! let outcome = allocate_payment(&payment, documents, Utc::now())?;
//! store.commit_allocation(&payment, &outcome).await?;
//! ```

pub mod document;
pub mod payment;
pub mod application;
pub mod allocation;
pub mod reversal;
pub mod ports;
pub mod service;
pub mod error;

pub use document::{Document, DocumentType, DocumentStatus};
pub use payment::{Payment, PaymentMethod, PaymentStatus, CheckoutSessionStatus};
pub use application::PaymentApplication;
pub use allocation::{allocate_payment, validate_targets, AllocationOutcome};
pub use reversal::{reverse_payment, ReversalOutcome};
pub use ports::LedgerStore;
pub use service::{LedgerService, PaymentConfirmation};
pub use error::LedgerError;
