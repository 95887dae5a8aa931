//! End-to-end API tests
//!
//! Drive the full router over the in-memory store and mock gateway. The
//! webhook cases pin down the status codes the gateway's retry policy
//! depends on: 200 for processed or no-op, 400 for permanent rejections,
//! 500 when redelivery should happen.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::Utc;
use http_body_util::BodyExt;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tower::ServiceExt;

use core_kernel::{CustomerId, OrganizationId};
use domain_gateway::{CheckoutConfig, SessionMetadata, SignatureVerifier};
use domain_ledger::Document;
use interface_api::handlers::webhooks::SIGNATURE_HEADER;
use interface_api::{create_router, AppState, ORGANIZATION_HEADER};
use test_utils::{
    checkout_completed_body, signed_header, test_credentials, DocumentBuilder,
    InMemoryLedgerStore, MockGatewayClient, PaymentBuilder,
};

struct TestApp {
    store: Arc<InMemoryLedgerStore>,
    router: Router,
    organization_id: OrganizationId,
    customer_id: CustomerId,
}

fn test_app() -> TestApp {
    let store = Arc::new(InMemoryLedgerStore::new());
    let gateway = Arc::new(MockGatewayClient::new());
    let state = AppState::new(
        Arc::clone(&store) as Arc<_>,
        gateway,
        Arc::new(test_credentials()),
        Arc::clone(&store) as Arc<_>,
        CheckoutConfig::default(),
        SignatureVerifier::default(),
    );
    TestApp {
        store,
        router: create_router(state),
        organization_id: OrganizationId::new(),
        customer_id: CustomerId::new(),
    }
}

impl TestApp {
    fn seed_invoice(&self, total: rust_decimal::Decimal) -> Document {
        let invoice = DocumentBuilder::new()
            .organization(self.organization_id)
            .customer(self.customer_id)
            .total(total)
            .build();
        self.store.seed_document(invoice.clone());
        invoice
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn get(&self, uri: &str) -> Request<Body> {
        Request::builder()
            .method("GET")
            .uri(uri)
            .header(ORGANIZATION_HEADER, self.organization_id.to_string())
            .body(Body::empty())
            .unwrap()
    }

    fn post_json(&self, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(ORGANIZATION_HEADER, self.organization_id.to_string())
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn webhook(&self, organization_id: OrganizationId, payload: Vec<u8>, sign: bool) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(format!("/webhooks/gateway/{}", organization_id.as_uuid()))
            .header("content-type", "application/json");
        if sign {
            builder = builder.header(SIGNATURE_HEADER, signed_header(&payload, Utc::now()));
        }
        builder.body(Body::from(payload)).unwrap()
    }

    /// Seeds a pending gateway payment for the invoice and returns the
    /// signed success payload for it
    fn pending_payment_with_success_body(
        &self,
        invoice: &Document,
        amount: rust_decimal::Decimal,
    ) -> (domain_ledger::Payment, Vec<u8>) {
        let payment = PaymentBuilder::new()
            .organization(self.organization_id)
            .customer(self.customer_id)
            .amount(amount)
            .session_id("cs_test_1")
            .build();
        self.store.seed_payment(payment.clone());

        let metadata = SessionMetadata {
            organization_id: self.organization_id,
            customer_id: self.customer_id,
            payment_id: payment.id,
            document_ids: vec![invoice.id],
            payment_number: payment.payment_number.clone(),
        };
        let body = checkout_completed_body(
            "cs_test_1",
            Some("pi_1"),
            payment.amount.to_minor(),
            &metadata,
        );
        (payment, body)
    }
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = test_app();

    let (status, body) = app
        .send(Request::get("/health").body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = app
        .send(Request::get("/health/ready").body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_create_checkout_session() {
    let app = test_app();
    let invoice = app.seed_invoice(dec!(750.00));

    let (status, body) = app
        .send(app.post_json(
            "/api/v1/checkout/sessions",
            json!({
                "customer_id": app.customer_id.as_uuid().to_string(),
                "document_ids": [invoice.id.as_uuid().to_string()],
                "amount": "750.00",
                "currency": "USD",
                "mode": "hosted_redirect",
            }),
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["payment_number"], "PMT-000001");
    assert!(body["redirect_url"].as_str().unwrap().contains("cs_test_1"));
    assert!(body.get("client_secret").is_none());
}

#[tokio::test]
async fn test_checkout_requires_organization_header() {
    let app = test_app();
    let invoice = app.seed_invoice(dec!(100.00));

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/checkout/sessions")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "customer_id": app.customer_id.as_uuid().to_string(),
                "document_ids": [invoice.id.as_uuid().to_string()],
                "amount": "100.00",
                "currency": "USD",
                "mode": "hosted_redirect",
            })
            .to_string(),
        ))
        .unwrap();

    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_checkout_rejects_empty_document_list() {
    let app = test_app();

    let (status, body) = app
        .send(app.post_json(
            "/api/v1/checkout/sessions",
            json!({
                "customer_id": app.customer_id.as_uuid().to_string(),
                "document_ids": [],
                "amount": "100.00",
                "currency": "USD",
                "mode": "hosted_redirect",
            }),
        ))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_checkout_rejects_unknown_currency() {
    let app = test_app();
    let invoice = app.seed_invoice(dec!(100.00));

    let (status, _) = app
        .send(app.post_json(
            "/api/v1/checkout/sessions",
            json!({
                "customer_id": app.customer_id.as_uuid().to_string(),
                "document_ids": [invoice.id.as_uuid().to_string()],
                "amount": "100.00",
                "currency": "XXX",
                "mode": "hosted_redirect",
            }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_checkout_rejects_over_amount() {
    let app = test_app();
    let invoice = app.seed_invoice(dec!(100.00));

    let (status, _) = app
        .send(app.post_json(
            "/api/v1/checkout/sessions",
            json!({
                "customer_id": app.customer_id.as_uuid().to_string(),
                "document_ids": [invoice.id.as_uuid().to_string()],
                "amount": "150.00",
                "currency": "USD",
                "mode": "hosted_redirect",
            }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_webhook_applies_payment_then_noops() {
    let app = test_app();
    let invoice = app.seed_invoice(dec!(500.00));
    let (payment, body) = app.pending_payment_with_success_body(&invoice, dec!(500.00));

    let (status, ack) = app
        .send(app.webhook(app.organization_id, body.clone(), true))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["received"], true);
    assert_eq!(ack["outcome"], "applied");

    // Redelivery of the same notification acks without reallocating.
    let (status, ack) = app
        .send(app.webhook(app.organization_id, body, true))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["outcome"], "already_applied");

    assert_eq!(app.store.applications().len(), 1);
    assert_eq!(
        app.store.payment(payment.id).unwrap().status,
        domain_ledger::PaymentStatus::Applied
    );
}

#[tokio::test]
async fn test_webhook_missing_signature_gets_400() {
    let app = test_app();
    let invoice = app.seed_invoice(dec!(500.00));
    let (_, body) = app.pending_payment_with_success_body(&invoice, dec!(500.00));

    let (status, error) = app
        .send(app.webhook(app.organization_id, body, false))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["error"], "bad_request");
}

#[tokio::test]
async fn test_webhook_unknown_payment_gets_400() {
    let app = test_app();
    let invoice = app.seed_invoice(dec!(500.00));

    let metadata = SessionMetadata {
        organization_id: app.organization_id,
        customer_id: app.customer_id,
        payment_id: core_kernel::PaymentId::new(),
        document_ids: vec![invoice.id],
        payment_number: "PMT-000099".to_string(),
    };
    let body = checkout_completed_body("cs_unknown", None, 50_000, &metadata);

    let (status, _) = app
        .send(app.webhook(app.organization_id, body, true))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_webhook_store_failure_gets_500() {
    let app = test_app();
    let invoice = app.seed_invoice(dec!(500.00));
    let (payment, body) = app.pending_payment_with_success_body(&invoice, dec!(500.00));

    app.store.set_fail_commits(true);
    let (status, _) = app
        .send(app.webhook(app.organization_id, body, true))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        app.store.payment(payment.id).unwrap().status,
        domain_ledger::PaymentStatus::Pending
    );
}

#[tokio::test]
async fn test_get_payment_with_applications() {
    let app = test_app();
    let invoice = app.seed_invoice(dec!(500.00));
    let (payment, body) = app.pending_payment_with_success_body(&invoice, dec!(500.00));
    app.send(app.webhook(app.organization_id, body, true)).await;

    let (status, response) = app
        .send(app.get(&format!("/api/v1/payments/{}", payment.id.as_uuid())))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["status"], "APPLIED");
    assert_eq!(response["gateway_transaction_id"], "pi_1");
    assert_eq!(response["applications"].as_array().unwrap().len(), 1);
    assert_eq!(
        response["applications"][0]["document_id"],
        invoice.id.as_uuid().to_string()
    );
}

#[tokio::test]
async fn test_get_payment_is_tenant_scoped() {
    let app = test_app();
    let invoice = app.seed_invoice(dec!(500.00));
    let (payment, _) = app.pending_payment_with_success_body(&invoice, dec!(500.00));

    // Same payment id, different tenant header.
    let request = Request::builder()
        .method("GET")
        .uri(format!("/api/v1/payments/{}", payment.id.as_uuid()))
        .header(ORGANIZATION_HEADER, OrganizationId::new().to_string())
        .body(Body::empty())
        .unwrap();
    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_void_payment_restores_document() {
    let app = test_app();
    let invoice = app.seed_invoice(dec!(500.00));
    let (payment, body) = app.pending_payment_with_success_body(&invoice, dec!(500.00));
    app.send(app.webhook(app.organization_id, body, true)).await;

    let (status, response) = app
        .send(app.post_json(
            &format!("/api/v1/payments/{}/void", payment.id.as_uuid()),
            json!({"reason": "entered in error"}),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["status"], "VOID");
    assert_eq!(response["void_reason"], "entered in error");

    let (status, document) = app
        .send(app.get(&format!("/api/v1/documents/{}", invoice.id.as_uuid())))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(document["status"], "OPEN");
    assert_eq!(document["balance_due"], "500.00");
}

#[tokio::test]
async fn test_void_pending_payment_conflicts() {
    let app = test_app();
    let invoice = app.seed_invoice(dec!(500.00));
    let (payment, _) = app.pending_payment_with_success_body(&invoice, dec!(500.00));

    let (status, _) = app
        .send(app.post_json(
            &format!("/api/v1/payments/{}/void", payment.id.as_uuid()),
            json!({}),
        ))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_get_unknown_document_404s() {
    let app = test_app();
    let (status, error) = app
        .send(app.get(&format!("/api/v1/documents/{}", uuid::Uuid::new_v4())))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["error"], "not_found");
}
