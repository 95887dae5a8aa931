//! Payments
//!
//! A payment is a collection event of a fixed amount from a customer, either
//! entered manually or originated through the external card-payment gateway.
//! Gateway payments start `Pending` and transition to `Applied` or `Void`
//! exactly once, driven by the notification processor; an `Applied` payment
//! is reversible only through the void handler.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use core_kernel::{CustomerId, Money, OrganizationId, PaymentId};

use crate::error::LedgerError;

/// Payment method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Check,
    Ach,
    Wire,
    CreditCard,
    Other,
}

impl PaymentMethod {
    /// Stable string form used for persistence
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "CASH",
            PaymentMethod::Check => "CHECK",
            PaymentMethod::Ach => "ACH",
            PaymentMethod::Wire => "WIRE",
            PaymentMethod::CreditCard => "CREDIT_CARD",
            PaymentMethod::Other => "OTHER",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CASH" => Ok(PaymentMethod::Cash),
            "CHECK" => Ok(PaymentMethod::Check),
            "ACH" => Ok(PaymentMethod::Ach),
            "WIRE" => Ok(PaymentMethod::Wire),
            "CREDIT_CARD" => Ok(PaymentMethod::CreditCard),
            "OTHER" => Ok(PaymentMethod::Other),
            other => Err(format!("unknown payment method: {other}")),
        }
    }
}

/// Payment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// Created for a gateway session; funds not yet confirmed
    Pending,
    /// Funds confirmed and allocated to documents
    Applied,
    /// Failed, expired, or reversed
    Void,
}

impl PaymentStatus {
    /// Stable string form used for persistence
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Applied => "APPLIED",
            PaymentStatus::Void => "VOID",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(PaymentStatus::Pending),
            "APPLIED" => Ok(PaymentStatus::Applied),
            "VOID" => Ok(PaymentStatus::Void),
            other => Err(format!("unknown payment status: {other}")),
        }
    }
}

/// Checkout session bookkeeping for gateway-originated payments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutSessionStatus {
    Open,
    Complete,
    Expired,
}

impl CheckoutSessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutSessionStatus::Open => "open",
            CheckoutSessionStatus::Complete => "complete",
            CheckoutSessionStatus::Expired => "expired",
        }
    }
}

impl FromStr for CheckoutSessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(CheckoutSessionStatus::Open),
            "complete" => Ok(CheckoutSessionStatus::Complete),
            "expired" => Ok(CheckoutSessionStatus::Expired),
            other => Err(format!("unknown checkout session status: {other}")),
        }
    }
}

/// A payment record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    /// Unique identifier
    pub id: PaymentId,
    /// Owning organization
    pub organization_id: OrganizationId,
    /// Paying customer
    pub customer_id: CustomerId,
    /// Human-readable payment number, sequential per organization
    pub payment_number: String,
    /// Total collected amount (always positive)
    pub amount: Money,
    /// Payment method
    pub method: PaymentMethod,
    /// Status
    pub status: PaymentStatus,
    /// Gateway provider tag (e.g. "stripe") for gateway-originated payments
    pub gateway_provider: Option<String>,
    /// Gateway transaction id recorded on success
    pub gateway_transaction_id: Option<String>,
    /// Gateway checkout session id
    pub gateway_session_id: Option<String>,
    /// Gateway payment-intent id
    pub gateway_intent_id: Option<String>,
    /// Raw gateway response snapshot for audit
    pub gateway_response: Option<serde_json::Value>,
    /// When the gateway session becomes inert
    pub session_expires_at: Option<DateTime<Utc>>,
    /// Checkout session bookkeeping
    pub checkout_session_status: Option<CheckoutSessionStatus>,
    /// Free-text reason recorded when voided
    pub void_reason: Option<String>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    /// Creates a pending payment backing a gateway checkout session
    ///
    /// The row is persisted before the gateway is contacted, so every
    /// external session has a durable local counterpart.
    pub fn new_pending_gateway(
        organization_id: OrganizationId,
        customer_id: CustomerId,
        payment_number: impl Into<String>,
        amount: Money,
        gateway_provider: impl Into<String>,
        session_expires_at: DateTime<Utc>,
    ) -> Result<Self, LedgerError> {
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount(format!(
                "payment amount must be positive, got {amount}"
            )));
        }
        let now = Utc::now();

        Ok(Self {
            id: PaymentId::new_v7(),
            organization_id,
            customer_id,
            payment_number: payment_number.into(),
            amount,
            method: PaymentMethod::CreditCard,
            status: PaymentStatus::Pending,
            gateway_provider: Some(gateway_provider.into()),
            gateway_transaction_id: None,
            gateway_session_id: None,
            gateway_intent_id: None,
            gateway_response: None,
            session_expires_at: Some(session_expires_at),
            checkout_session_status: Some(CheckoutSessionStatus::Open),
            void_reason: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Creates an already-applied manual payment (cash, check, etc.)
    pub fn new_manual(
        organization_id: OrganizationId,
        customer_id: CustomerId,
        payment_number: impl Into<String>,
        amount: Money,
        method: PaymentMethod,
    ) -> Result<Self, LedgerError> {
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount(format!(
                "payment amount must be positive, got {amount}"
            )));
        }
        let now = Utc::now();

        Ok(Self {
            id: PaymentId::new_v7(),
            organization_id,
            customer_id,
            payment_number: payment_number.into(),
            amount,
            method,
            status: PaymentStatus::Applied,
            gateway_provider: None,
            gateway_transaction_id: None,
            gateway_session_id: None,
            gateway_intent_id: None,
            gateway_response: None,
            session_expires_at: None,
            checkout_session_status: None,
            void_reason: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Records the gateway-assigned session/intent identifiers
    pub fn set_gateway_references(
        &mut self,
        session_id: Option<String>,
        intent_id: Option<String>,
    ) {
        self.gateway_session_id = session_id;
        self.gateway_intent_id = intent_id;
        self.updated_at = Utc::now();
    }

    /// Transitions `Pending -> Applied` when the gateway confirms funds
    ///
    /// # Errors
    ///
    /// Rejects the transition unless the payment is currently `Pending`.
    pub fn mark_applied(
        &mut self,
        gateway_transaction_id: Option<String>,
        gateway_response: Option<serde_json::Value>,
        now: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        self.ensure_status(PaymentStatus::Pending, "PENDING")?;

        self.status = PaymentStatus::Applied;
        self.gateway_transaction_id = gateway_transaction_id;
        if gateway_response.is_some() {
            self.gateway_response = gateway_response;
        }
        if self.checkout_session_status.is_some() {
            self.checkout_session_status = Some(CheckoutSessionStatus::Complete);
        }
        self.updated_at = now;
        Ok(())
    }

    /// Transitions `Pending -> Void` on a gateway failure notification
    pub fn mark_failed(
        &mut self,
        gateway_response: Option<serde_json::Value>,
        now: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        self.ensure_status(PaymentStatus::Pending, "PENDING")?;

        self.status = PaymentStatus::Void;
        if gateway_response.is_some() {
            self.gateway_response = gateway_response;
        }
        self.updated_at = now;
        Ok(())
    }

    /// Transitions `Pending -> Void` when the checkout session expires
    pub fn mark_expired(&mut self, now: DateTime<Utc>) -> Result<(), LedgerError> {
        self.ensure_status(PaymentStatus::Pending, "PENDING")?;

        self.status = PaymentStatus::Void;
        self.checkout_session_status = Some(CheckoutSessionStatus::Expired);
        self.updated_at = now;
        Ok(())
    }

    /// Transitions `Applied -> Void` as part of a reversal
    ///
    /// Callers must restore the affected documents in the same transaction;
    /// use [`crate::reverse_payment`] rather than calling this directly.
    pub fn mark_voided(
        &mut self,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        self.ensure_status(PaymentStatus::Applied, "APPLIED")?;

        self.status = PaymentStatus::Void;
        self.void_reason = reason;
        self.updated_at = now;
        Ok(())
    }

    /// Returns true if the payment can still be voided
    pub fn can_void(&self) -> bool {
        self.status == PaymentStatus::Applied
    }

    fn ensure_status(
        &self,
        expected: PaymentStatus,
        expected_name: &'static str,
    ) -> Result<(), LedgerError> {
        if self.status != expected {
            return Err(LedgerError::InvalidPaymentStatus {
                payment: self.id.to_string(),
                status: self.status.as_str().to_string(),
                expected: expected_name,
            });
        }
        Ok(())
    }
}

/// Formats a sequential payment number (e.g. `PMT-000042`)
pub fn format_payment_number(sequence: u64) -> String {
    format!("PMT-{sequence:06}")
}
