//! Row-level repositories
//!
//! Repositories own the SQL. They deal in row structs and return
//! [`crate::DatabaseError`]; translation to domain models happens in the
//! adapters layer.

pub mod ledger;

pub use ledger::{
    ApplicationRow, DocumentRow, LedgerRepository, PaymentRow, PlannedDocumentWrite,
};
