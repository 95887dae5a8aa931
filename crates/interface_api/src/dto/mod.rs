//! Request/response data transfer objects

pub mod checkout;
pub mod documents;
pub mod payments;
