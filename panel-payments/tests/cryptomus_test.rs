//! Crypto rail against an in-process vendor that checks request signatures.

use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use serde_json::{Value, json};

use panel_payments::cryptomus::sign_webhook_body;
use panel_payments::security::base64_md5_sign;
use panel_payments::{CryptomusAdapter, CryptomusConfig, PaymentRegistry};
use panel_types::{
    Customer, PaymentAdapter, PaymentSessionRequest, PaymentStatus, PaymentWebhookEvent,
    UpstreamError, WebhookStatus,
};

const API_KEY: &str = "crypto-api-key";

#[derive(Clone, Default)]
struct Seen(Arc<Mutex<Vec<Value>>>);

fn header<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers.get(name).and_then(|v| v.to_str().ok()).unwrap_or_default()
}

/// Returns the parsed body when the `merchant` and `sign` headers check out.
fn check_signature(headers: &HeaderMap, body: &[u8]) -> Result<Value, Response> {
    if header(headers, "merchant") != "merchant-1"
        || header(headers, "sign") != base64_md5_sign(body, API_KEY)
    {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "state": 1, "message": "Invalid sign" })),
        )
            .into_response());
    }
    serde_json::from_slice(body).map_err(|_| StatusCode::BAD_REQUEST.into_response())
}

async fn create_invoice(State(seen): State<Seen>, headers: HeaderMap, body: Bytes) -> Response {
    let body = match check_signature(&headers, &body) {
        Ok(body) => body,
        Err(resp) => return resp,
    };
    seen.0.lock().unwrap().push(body.clone());
    Json(json!({
        "state": 0,
        "result": {
            "uuid": "26109ba0-b05b-4ee0-93d1-fd62c822ce95",
            "order_id": body["order_id"],
            "amount": body["amount"],
            "currency": body["currency"],
            "url": "https://pay.cryptomus.com/pay/26109ba0",
            "payment_status": "check"
        }
    }))
    .into_response()
}

async fn invoice_info(headers: HeaderMap, body: Bytes) -> Response {
    let body = match check_signature(&headers, &body) {
        Ok(body) => body,
        Err(resp) => return resp,
    };
    let status = match body["order_id"].as_str() {
        Some("o-paid") => "paid",
        Some("o-refunded") => "refund_paid",
        Some("o-checking") => "confirm_check",
        _ => {
            return Json(json!({ "state": 1, "message": "Payment not found" })).into_response();
        }
    };
    Json(json!({
        "state": 0,
        "result": { "order_id": body["order_id"], "payment_status": status, "amount": "15.00", "currency": "USDT" }
    }))
    .into_response()
}

async fn setup(api_key: &str) -> (CryptomusAdapter, Seen) {
    let seen = Seen::default();
    let app = Router::new()
        .route("/v1/payment", post(create_invoice))
        .route("/v1/payment/info", post(invoice_info))
        .with_state(seen.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let mut config = CryptomusConfig::new(format!("http://{}/v1", addr), "merchant-1", api_key);
    config.webhook_secret = "hook-secret".into();
    (CryptomusAdapter::new(config).unwrap(), seen)
}

fn session_request() -> PaymentSessionRequest {
    PaymentSessionRequest {
        amount: 15.0,
        currency: "USDT".into(),
        order_id: Some("o-100".into()),
        customer: Customer {
            id: "user-9".into(),
            email: "grace@example.com".into(),
            name: None,
        },
        callback_url: "https://shop.example.com/hooks/cryptomus".into(),
        metadata: None,
    }
}

#[tokio::test]
async fn test_create_payment_session_is_signed() {
    let (adapter, seen) = setup(API_KEY).await;

    let session = adapter.create_payment_session(session_request()).await.unwrap();

    assert_eq!(session.id, "o-100");
    assert_eq!(session.payment_url.as_deref(), Some("https://pay.cryptomus.com/pay/26109ba0"));
    assert!(session.expires_at.is_some());

    let sent = seen.0.lock().unwrap().last().cloned().unwrap();
    assert_eq!(sent["amount"], "15");
    assert_eq!(sent["currency"], "USDT");
    assert_eq!(sent["url_callback"], "https://shop.example.com/hooks/cryptomus");
    assert_eq!(sent["lifetime"], 3600);
}

#[tokio::test]
async fn test_wrong_api_key_is_rejected() {
    let (adapter, _seen) = setup("not-the-key").await;

    let err = adapter.create_payment_session(session_request()).await.unwrap_err();

    match err {
        UpstreamError::Protocol { vendor, message } => {
            assert_eq!(vendor, "Cryptomus");
            assert!(message.contains("Invalid sign"), "{}", message);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_get_payment_status() {
    let (adapter, _seen) = setup(API_KEY).await;

    let paid = adapter.get_payment_status("o-paid").await.unwrap();
    assert_eq!(paid.status, PaymentStatus::Completed);
    assert_eq!(paid.amount, 15.0);
    assert_eq!(paid.currency, "USDT");

    let refunded = adapter.get_payment_status("o-refunded").await.unwrap();
    assert_eq!(refunded.status, PaymentStatus::Refunded);

    let checking = adapter.get_payment_status("o-checking").await.unwrap();
    assert_eq!(checking.status, PaymentStatus::Processing);
}

#[tokio::test]
async fn test_vendor_state_error_is_surfaced() {
    let (adapter, _seen) = setup(API_KEY).await;

    let err = adapter.get_payment_status("o-missing").await.unwrap_err();

    assert!(matches!(
        err,
        UpstreamError::Protocol { ref message, .. } if message == "Payment not found"
    ));
}

#[tokio::test]
async fn test_webhook_through_registry() {
    let (adapter, _seen) = setup(API_KEY).await;
    let registry = PaymentRegistry::new().with_adapter("cryptomus", Arc::new(adapter));
    let rail = registry.get_payment_adapter("Cryptomus").unwrap();

    let mut body = json!({
        "type": "payment",
        "uuid": "26109ba0",
        "order_id": "o-100",
        "amount": "15.00",
        "currency": "USDT",
        "status": "paid_over"
    });
    body["sign"] = json!(sign_webhook_body(&body, "hook-secret").unwrap());
    let raw = serde_json::to_vec(&body).unwrap();

    assert!(rail.verify_webhook(&raw, "", ""));
    assert!(!rail.verify_webhook(&raw, "", "another-secret"));

    let event = PaymentWebhookEvent::from_body(&raw, None).unwrap();
    let outcome = rail.handle_webhook(&event).unwrap();
    assert_eq!(outcome.status, WebhookStatus::Completed);
    assert_eq!(outcome.amount, 15.0);
}
