//! Custom Test Assertions
//!
//! Assertion helpers for domain types that give more meaningful error
//! messages than standard assertions.

use core_kernel::Money;
use domain_ledger::{Document, PaymentApplication};
use rust_decimal::Decimal;

/// Asserts that two Money values are equal within a tolerance
pub fn assert_money_approx_eq(actual: &Money, expected: &Money, tolerance: Decimal) {
    assert_eq!(
        actual.currency(),
        expected.currency(),
        "Currency mismatch: actual={}, expected={}",
        actual.currency(),
        expected.currency()
    );

    let diff = (actual.amount() - expected.amount()).abs();
    assert!(
        diff <= tolerance,
        "Money amounts differ by more than tolerance: actual={}, expected={}, diff={}, tolerance={}",
        actual.amount(),
        expected.amount(),
        diff,
        tolerance
    );
}

/// Asserts that a Money value is positive
pub fn assert_money_positive(money: &Money) {
    assert!(
        money.is_positive(),
        "Expected positive money, got {} {}",
        money.currency().symbol(),
        money.amount()
    );
}

/// Asserts that a Money value is zero
pub fn assert_money_zero(money: &Money) {
    assert!(
        money.is_zero(),
        "Expected zero money, got {} {}",
        money.currency().symbol(),
        money.amount()
    );
}

/// Asserts the document balance conservation invariant:
/// `amount_paid + balance_due == total_amount`
pub fn assert_document_balanced(document: &Document) {
    assert!(
        document.is_balanced(),
        "Document {} violates balance conservation: paid={} + due={} != total={}",
        document.document_number,
        document.amount_paid.amount(),
        document.balance_due.amount(),
        document.total_amount.amount()
    );
}

/// Asserts that a set of application rows sums exactly to a total
pub fn assert_applications_sum(applications: &[PaymentApplication], total: &Money) {
    let sum: Decimal = applications.iter().map(|a| a.amount_applied.amount()).sum();
    assert_eq!(
        sum,
        total.amount(),
        "Application rows sum to {} but expected {}",
        sum,
        total.amount()
    );
}
