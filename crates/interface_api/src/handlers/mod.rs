//! Request handlers

pub mod checkout;
pub mod documents;
pub mod health;
pub mod payments;
pub mod webhooks;
