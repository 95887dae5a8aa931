//! Checkout session service integration tests
//!
//! Exercise session creation over the in-memory store and recording
//! gateway mock: validation before any gateway call, the pending payment
//! persisted before the gateway is contacted, and the orphaned-row behavior
//! when the gateway fails afterwards.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal_macros::dec;

use core_kernel::{CustomerId, Money, OrganizationId};
use domain_ledger::{Document, LedgerError, PaymentStatus};

use domain_gateway::{
    CheckoutConfig, CheckoutCreated, CheckoutMode, CheckoutSessionService, CreateCheckoutRequest,
    GatewayError,
};
use test_utils::{test_credentials, DocumentBuilder, InMemoryLedgerStore, MockGatewayClient};

struct Harness {
    store: Arc<InMemoryLedgerStore>,
    gateway: Arc<MockGatewayClient>,
    service: CheckoutSessionService,
    organization_id: OrganizationId,
    customer_id: CustomerId,
}

fn harness() -> Harness {
    let store = Arc::new(InMemoryLedgerStore::new());
    let gateway = Arc::new(MockGatewayClient::new());
    let service = CheckoutSessionService::new(
        Arc::clone(&store) as Arc<_>,
        Arc::clone(&gateway) as Arc<_>,
        Arc::new(test_credentials()),
        CheckoutConfig::default(),
    );
    Harness {
        store,
        gateway,
        service,
        organization_id: OrganizationId::new(),
        customer_id: CustomerId::new(),
    }
}

impl Harness {
    fn seed_invoice(&self, total: rust_decimal::Decimal) -> Document {
        let invoice = DocumentBuilder::new()
            .organization(self.organization_id)
            .customer(self.customer_id)
            .total(total)
            .build();
        self.store.seed_document(invoice.clone());
        invoice
    }

    fn request(&self, documents: &[Document], amount: rust_decimal::Decimal, mode: CheckoutMode) -> CreateCheckoutRequest {
        CreateCheckoutRequest {
            organization_id: self.organization_id,
            customer_id: self.customer_id,
            document_ids: documents.iter().map(|d| d.id).collect(),
            amount: Money::new(amount, core_kernel::Currency::USD),
            mode,
        }
    }
}

#[tokio::test]
async fn test_hosted_session_creates_pending_payment() {
    let h = harness();
    let invoice = h.seed_invoice(dec!(750.00));

    let created = h
        .service
        .create_session(
            h.request(&[invoice.clone()], dec!(750.00), CheckoutMode::HostedRedirect),
            Utc::now(),
        )
        .await
        .unwrap();

    let CheckoutCreated::Hosted {
        payment_id,
        payment_number,
        redirect_url,
    } = created
    else {
        panic!("expected hosted session");
    };
    assert_eq!(payment_number, "PMT-000001");
    assert!(redirect_url.contains("cs_test_1"));

    let payment = h.store.payment(payment_id).unwrap();
    assert_eq!(payment.status, PaymentStatus::Pending);
    assert_eq!(payment.gateway_session_id.as_deref(), Some("cs_test_1"));
    assert!(payment.gateway_intent_id.is_none());
    assert!(payment.session_expires_at.is_some());

    // The invoice is untouched until funds are confirmed.
    let stored = h.store.document(invoice.id).unwrap();
    assert!(stored.amount_paid.is_zero());
}

#[tokio::test]
async fn test_embedded_session_returns_client_secret() {
    let h = harness();
    let invoice = h.seed_invoice(dec!(200.00));

    let created = h
        .service
        .create_session(
            h.request(&[invoice], dec!(200.00), CheckoutMode::EmbeddedForm),
            Utc::now(),
        )
        .await
        .unwrap();

    let CheckoutCreated::Embedded {
        payment_id,
        client_secret,
        ..
    } = created
    else {
        panic!("expected embedded session");
    };
    assert_eq!(client_secret, "pi_test_1_secret");

    let payment = h.store.payment(payment_id).unwrap();
    assert_eq!(payment.gateway_intent_id.as_deref(), Some("pi_test_1"));
    assert!(payment.gateway_session_id.is_none());
}

#[tokio::test]
async fn test_session_metadata_carries_allocation_order() {
    let h = harness();
    let first = h.seed_invoice(dec!(100.00));
    let second = h.seed_invoice(dec!(300.00));

    let created = h
        .service
        .create_session(
            h.request(
                &[second.clone(), first.clone()],
                dec!(350.00),
                CheckoutMode::HostedRedirect,
            ),
            Utc::now(),
        )
        .await
        .unwrap();

    let request = h.gateway.last_request().unwrap();
    assert_eq!(request.amount_minor, 35_000);
    assert_eq!(request.metadata.organization_id, h.organization_id);
    assert_eq!(request.metadata.customer_id, h.customer_id);
    assert_eq!(request.metadata.payment_id, created.payment_id());
    // Order captured here decides which document is paid down first.
    assert_eq!(request.metadata.document_ids, vec![second.id, first.id]);
}

#[tokio::test]
async fn test_over_amount_rejected_before_gateway_call() {
    let h = harness();
    let invoice = h.seed_invoice(dec!(100.00));

    let err = h
        .service
        .create_session(
            h.request(&[invoice], dec!(150.00), CheckoutMode::HostedRedirect),
            Utc::now(),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        GatewayError::Ledger(LedgerError::AmountExceedsBalance { .. })
    ));

    // No gateway call, no payment row.
    assert!(h.gateway.requests().is_empty());
    assert!(h.store.payments().is_empty());
}

#[tokio::test]
async fn test_duplicate_document_ids_rejected_before_gateway_call() {
    let h = harness();
    let invoice = h.seed_invoice(dec!(500.00));

    // Listing the invoice twice must not double its balance toward the
    // ceiling; no session may be opened for more than is owed.
    let err = h
        .service
        .create_session(
            h.request(
                &[invoice.clone(), invoice],
                dec!(800.00),
                CheckoutMode::HostedRedirect,
            ),
            Utc::now(),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        GatewayError::Ledger(LedgerError::DuplicateTarget(_))
    ));

    assert!(h.gateway.requests().is_empty());
    assert!(h.store.payments().is_empty());
}

#[tokio::test]
async fn test_empty_document_list_rejected() {
    let h = harness();
    let err = h
        .service
        .create_session(
            h.request(&[], dec!(50.00), CheckoutMode::HostedRedirect),
            Utc::now(),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        GatewayError::Ledger(LedgerError::NoTargetDocuments)
    ));
}

#[tokio::test]
async fn test_gateway_failure_leaves_orphaned_pending_row() {
    let h = harness();
    let invoice = h.seed_invoice(dec!(400.00));
    h.gateway.fail_next();

    let err = h
        .service
        .create_session(
            h.request(&[invoice], dec!(400.00), CheckoutMode::HostedRedirect),
            Utc::now(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Provider(_)));

    // The local row was inserted before the gateway call and stays behind,
    // with no gateway references; expiry handling reaps it later.
    let payments = h.store.payments();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].status, PaymentStatus::Pending);
    assert!(payments[0].gateway_session_id.is_none());
}

#[tokio::test]
async fn test_payment_numbers_are_sequential_per_organization() {
    let h = harness();
    let first = h.seed_invoice(dec!(100.00));
    let second = h.seed_invoice(dec!(100.00));

    let a = h
        .service
        .create_session(
            h.request(&[first], dec!(100.00), CheckoutMode::HostedRedirect),
            Utc::now(),
        )
        .await
        .unwrap();
    let b = h
        .service
        .create_session(
            h.request(&[second], dec!(100.00), CheckoutMode::HostedRedirect),
            Utc::now(),
        )
        .await
        .unwrap();

    let number = |c: &CheckoutCreated| match c {
        CheckoutCreated::Hosted { payment_number, .. } => payment_number.clone(),
        CheckoutCreated::Embedded { payment_number, .. } => payment_number.clone(),
    };
    assert_eq!(number(&a), "PMT-000001");
    assert_eq!(number(&b), "PMT-000002");
}
