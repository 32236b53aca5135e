//! Card rail against an in-process vendor.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};

use panel_payments::korapay::KORAPAY_SIGNATURE_HEADER;
use panel_payments::security::hmac_sha256_hex;
use panel_payments::{KorapayAdapter, KorapayConfig};
use panel_types::{
    Customer, PaymentAdapter, PaymentSessionRequest, PaymentStatus, PaymentWebhookEvent,
    SessionStatus, UpstreamError, WebhookStatus,
};

#[derive(Clone, Default)]
struct Seen(Arc<Mutex<Vec<Value>>>);

impl Seen {
    fn last(&self) -> Value {
        self.0.lock().unwrap().last().cloned().unwrap()
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers.get("authorization").and_then(|v| v.to_str().ok()) == Some("Bearer sk_test")
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "status": false, "message": "Invalid authorization key" })),
    )
        .into_response()
}

async fn initialize(
    State(seen): State<Seen>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    seen.0.lock().unwrap().push(body.clone());
    Json(json!({
        "status": true,
        "message": "Charge created successfully",
        "data": {
            "reference": body["reference"],
            "checkout_url": format!(
                "https://checkout.korapay.com/{}/pay",
                body["reference"].as_str().unwrap_or_default()
            )
        }
    }))
    .into_response()
}

async fn charge(headers: HeaderMap, Path(reference): Path<String>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    match reference.as_str() {
        "ref-ok" => Json(json!({
            "status": true,
            "data": { "reference": "ref-ok", "status": "success", "amount": 2500, "currency": "NGN" }
        }))
        .into_response(),
        "ref-slow" => {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({})).into_response()
        }
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({ "status": false, "message": "Charge not found" })),
        )
            .into_response(),
    }
}

async fn refund(State(seen): State<Seen>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    seen.0.lock().unwrap().push(body.clone());
    Json(json!({
        "status": true,
        "message": "Refund initiated",
        "data": { "reference": body["reference"], "status": "processing" }
    }))
    .into_response()
}

async fn setup() -> (KorapayAdapter, Seen, String) {
    let seen = Seen::default();
    let app = Router::new()
        .route("/merchant/api/v1/charges/initialize", post(initialize))
        .route("/merchant/api/v1/charges/{reference}", get(charge))
        .route("/merchant/api/v1/refunds/initiate", post(refund))
        .with_state(seen.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let base_url = format!("http://{}/merchant/api/v1", addr);
    let mut config = KorapayConfig::new(base_url.clone(), "sk_test");
    config.webhook_secret = "whsec_test".into();
    config.timeout = Duration::from_millis(300);
    (KorapayAdapter::new(config).unwrap(), seen, base_url)
}

fn session_request(order_id: Option<&str>) -> PaymentSessionRequest {
    PaymentSessionRequest {
        amount: 2500.0,
        currency: "NGN".into(),
        order_id: order_id.map(String::from),
        customer: Customer {
            id: "user-7".into(),
            email: "ada@example.com".into(),
            name: Some("Ada".into()),
        },
        callback_url: "https://shop.example.com/payments/return".into(),
        metadata: Some(json!({ "cart": "c-1" })),
    }
}

#[tokio::test]
async fn test_create_payment_session() {
    let (adapter, seen, _) = setup().await;

    let session = adapter
        .create_payment_session(session_request(Some("order-42")))
        .await
        .unwrap();

    assert_eq!(session.id, "order-42");
    assert_eq!(session.status, SessionStatus::Pending);
    assert_eq!(session.amount, 2500.0);
    assert_eq!(
        session.payment_url.as_deref(),
        Some("https://checkout.korapay.com/order-42/pay")
    );
    assert!(session.expires_at.is_some());

    let sent = seen.last();
    assert_eq!(sent["reference"], "order-42");
    assert_eq!(sent["currency"], "NGN");
    assert_eq!(sent["redirect_url"], "https://shop.example.com/payments/return");
    assert_eq!(sent["customer"]["email"], "ada@example.com");
    assert_eq!(sent["metadata"]["cart"], "c-1");
    assert_eq!(sent["metadata"]["customer_id"], "user-7");
}

#[tokio::test]
async fn test_create_payment_session_generates_reference() {
    let (adapter, _seen, _) = setup().await;

    let session = adapter.create_payment_session(session_request(None)).await.unwrap();

    assert!(session.id.starts_with("order_"));
}

#[tokio::test]
async fn test_bad_credentials_surface_vendor_message() {
    let (_adapter, _seen, base_url) = setup().await;
    let wrong = KorapayAdapter::new(KorapayConfig::new(base_url, "sk_wrong")).unwrap();

    let err = wrong.create_payment_session(session_request(None)).await.unwrap_err();

    match err {
        UpstreamError::Protocol { message, .. } => {
            assert!(message.contains("Invalid authorization key"))
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_get_payment_status() {
    let (adapter, _seen, _) = setup().await;

    let report = adapter.get_payment_status("ref-ok").await.unwrap();

    assert_eq!(report.status, PaymentStatus::Completed);
    assert_eq!(report.amount, 2500.0);
    assert_eq!(report.currency, "NGN");
}

#[tokio::test]
async fn test_get_payment_status_failure_is_not_swallowed() {
    let (adapter, _seen, _) = setup().await;

    let err = adapter.get_payment_status("ref-unknown").await.unwrap_err();
    assert!(matches!(err, UpstreamError::Protocol { .. }));

    let err = adapter.get_payment_status("ref-slow").await.unwrap_err();
    assert!(err.is_timeout(), "expected timeout, got {:?}", err);
}

#[tokio::test]
async fn test_refund_payment() {
    let (adapter, seen, _) = setup().await;
    let refundable = adapter.as_refundable().unwrap();

    let result = refundable.refund_payment("ref-ok", Some(1000.0)).await.unwrap();

    assert!(result.success);
    assert!(result.refund_id.starts_with("refund_"));
    let sent = seen.last();
    assert_eq!(sent["payment_reference"], "ref-ok");
    assert_eq!(sent["amount"], 1000.0);
}

#[tokio::test]
async fn test_webhook_verify_then_handle() {
    let (adapter, _seen, _) = setup().await;
    let body = serde_json::to_vec(&json!({
        "event": "charge.success",
        "data": { "reference": "order-42", "status": "success", "amount": 2500, "currency": "NGN" }
    }))
    .unwrap();
    let signature = hmac_sha256_hex(&body, "whsec_test");

    assert_eq!(adapter.signature_header(), KORAPAY_SIGNATURE_HEADER);
    assert!(adapter.verify_webhook(&body, &signature, ""));

    let event = PaymentWebhookEvent::from_body(&body, Some(signature)).unwrap();
    let outcome = adapter.handle_webhook(&event).unwrap();

    assert_eq!(event.event_type, "charge.success");
    assert_eq!(outcome.payment_id, "order-42");
    assert_eq!(outcome.status, WebhookStatus::Completed);
}
