//! Crypto rail (Cryptomus).
//!
//! Every request body is signed as `md5(base64(body) + api_key)` and sent with
//! `merchant` and `sign` headers. Webhooks are signed the same way with the
//! webhook secret, over the body minus its own `sign` field.

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use panel_types::wire::{as_f64, as_string, field};
use panel_types::{
    PaymentAdapter, PaymentRail, PaymentSession, PaymentSessionRequest, PaymentStatus,
    PaymentStatusReport, PaymentWebhookEvent, RegistryError, SessionStatus, UpstreamError,
    WebhookOutcome, WebhookStatus,
};

use crate::client::VendorClient;
use crate::config::CryptomusConfig;
use crate::security::{base64_md5_sign, signatures_match};

pub const CRYPTOMUS_SIGNATURE_HEADER: &str = "sign";

const VENDOR: &str = "Cryptomus";

fn webhook_status(vendor_status: &str) -> WebhookStatus {
    match vendor_status {
        "paid" | "paid_over" => WebhookStatus::Completed,
        "cancel" | "system_fail" | "fail" => WebhookStatus::Failed,
        _ => WebhookStatus::Pending,
    }
}

fn poll_status(vendor_status: &str) -> PaymentStatus {
    match vendor_status {
        "paid" | "paid_over" => PaymentStatus::Completed,
        "cancel" | "system_fail" | "fail" => PaymentStatus::Failed,
        "process" | "check" | "confirm_check" => PaymentStatus::Processing,
        "refund_process" | "refund_fail" | "refund_paid" => PaymentStatus::Refunded,
        _ => PaymentStatus::Pending,
    }
}

#[derive(Serialize)]
struct CreateInvoice<'a> {
    /// Sent as a string; the vendor rejects numeric amounts
    amount: String,
    currency: &'a str,
    order_id: &'a str,
    url_return: &'a str,
    url_callback: &'a str,
    lifetime: u64,
}

#[derive(Serialize)]
struct InvoiceInfo<'a> {
    order_id: &'a str,
}

pub struct CryptomusAdapter {
    config: CryptomusConfig,
    client: VendorClient,
}

impl CryptomusAdapter {
    pub fn new(config: CryptomusConfig) -> Result<Self, RegistryError> {
        let client = VendorClient::new(VENDOR, &config.base_url, config.timeout)?;
        Ok(Self { config, client })
    }

    /// POSTs `body` to `path`. The body is serialized once so the signed bytes
    /// are exactly the bytes sent.
    async fn signed_post(
        &self,
        path: &[&str],
        body: &impl Serialize,
    ) -> Result<Value, UpstreamError> {
        let bytes = serde_json::to_vec(body)
            .map_err(|e| self.client.protocol_error(format!("Cannot encode request: {}", e)))?;
        let sign = base64_md5_sign(&bytes, &self.config.api_key);

        let url = self.client.endpoint(path)?;
        let request = self
            .client
            .http()
            .post(url)
            .header("merchant", &self.config.merchant_id)
            .header("sign", sign)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(bytes);
        let response = self.client.send_json(request).await?;

        // `state` is 0 on success
        if let Some(state) = response.get("state").and_then(Value::as_i64).filter(|s| *s != 0) {
            let message = field(&response, "message", as_string)
                .unwrap_or_else(|| format!("request rejected with state {}", state));
            return Err(self.client.protocol_error(message));
        }

        match response.get("result") {
            Some(result) if result.is_object() => Ok(result.clone()),
            _ => Err(self.client.protocol_error("Response has no `result` object")),
        }
    }

    async fn create_invoice(
        &self,
        req: PaymentSessionRequest,
    ) -> Result<PaymentSession, UpstreamError> {
        let order_id = req
            .order_id
            .clone()
            .unwrap_or_else(|| format!("order_{}", Uuid::new_v4().simple()));

        let invoice = CreateInvoice {
            amount: req.amount.to_string(),
            currency: &req.currency,
            order_id: &order_id,
            url_return: &req.callback_url,
            url_callback: &req.callback_url,
            lifetime: self.config.session_lifetime.as_secs(),
        };
        let result = self.signed_post(&["payment"], &invoice).await?;

        let id = field(&result, "order_id", as_string).unwrap_or(order_id);
        let lifetime = chrono::Duration::from_std(self.config.session_lifetime).ok();

        info!(order_id = %id, customer = %req.customer.id, "Cryptomus invoice created");

        Ok(PaymentSession {
            id,
            amount: req.amount,
            currency: req.currency,
            status: SessionStatus::Pending,
            payment_url: field(&result, "url", as_string),
            expires_at: lifetime.map(|l| Utc::now() + l),
            metadata: result,
        })
    }

    async fn invoice_info(&self, payment_id: &str) -> Result<PaymentStatusReport, UpstreamError> {
        let result = self
            .signed_post(&["payment", "info"], &InvoiceInfo { order_id: payment_id })
            .await?;

        let status = result
            .get("payment_status")
            .or_else(|| result.get("status"))
            .and_then(Value::as_str)
            .ok_or_else(|| self.client.protocol_error("Invoice has no `status`"))?;

        Ok(PaymentStatusReport {
            status: poll_status(status),
            amount: field(&result, "amount", as_f64)
                .ok_or_else(|| self.client.protocol_error("Invoice has no `amount`"))?,
            currency: field(&result, "currency", as_string).unwrap_or_default(),
        })
    }
}

#[async_trait]
impl PaymentAdapter for CryptomusAdapter {
    fn name(&self) -> &str {
        VENDOR
    }

    fn rail(&self) -> PaymentRail {
        PaymentRail::Crypto
    }

    fn signature_header(&self) -> &'static str {
        CRYPTOMUS_SIGNATURE_HEADER
    }

    #[instrument(
        skip(self, req),
        fields(vendor = VENDOR, amount = req.amount, currency = %req.currency)
    )]
    async fn create_payment_session(
        &self,
        req: PaymentSessionRequest,
    ) -> Result<PaymentSession, UpstreamError> {
        self.create_invoice(req)
            .await
            .inspect_err(|e| error!("Cryptomus create_payment_session error: {}", e))
    }

    fn verify_webhook(&self, payload: &[u8], signature: &str, secret: &str) -> bool {
        let secret = if secret.is_empty() {
            self.config.webhook_secret.as_str()
        } else {
            secret
        };
        if secret.is_empty() {
            warn!("Cryptomus webhook rejected: no secret configured");
            return false;
        }

        let Ok(Value::Object(mut body)) = serde_json::from_slice::<Value>(payload) else {
            warn!("Cryptomus webhook rejected: body is not a JSON object");
            return false;
        };

        let embedded = body.shift_remove("sign");
        let presented = if signature.trim().is_empty() {
            match embedded.as_ref().and_then(Value::as_str) {
                Some(s) => s.to_string(),
                None => return false,
            }
        } else {
            signature.to_string()
        };

        let Ok(canonical) = serde_json::to_vec(&body) else {
            return false;
        };
        signatures_match(&base64_md5_sign(&canonical, secret), &presented)
    }

    fn handle_webhook(&self, event: &PaymentWebhookEvent) -> Result<WebhookOutcome, UpstreamError> {
        let body = &event.payload;

        let payment_id = field(body, "order_id", as_string)
            .ok_or_else(|| self.client.protocol_error("Webhook has no `order_id`"))?;
        let status = body
            .get("status")
            .and_then(Value::as_str)
            .map(webhook_status)
            .unwrap_or_default();

        let mut metadata = body.clone();
        if let Some(obj) = metadata.as_object_mut() {
            obj.shift_remove("sign");
        }

        Ok(WebhookOutcome {
            payment_id,
            status,
            amount: field(body, "amount", as_f64)
                .ok_or_else(|| self.client.protocol_error("Webhook has no `amount`"))?,
            currency: field(body, "currency", as_string).unwrap_or_default(),
            metadata,
        })
    }

    #[instrument(skip(self), fields(vendor = VENDOR))]
    async fn get_payment_status(
        &self,
        payment_id: &str,
    ) -> Result<PaymentStatusReport, UpstreamError> {
        self.invoice_info(payment_id)
            .await
            .inspect_err(|e| error!("Cryptomus get_payment_status error: {}", e))
    }
}

/// Signs a webhook body the way the vendor does; for tests and the CLI.
pub fn sign_webhook_body(body: &Value, secret: &str) -> Option<String> {
    let mut body = body.clone();
    if let Some(obj) = body.as_object_mut() {
        obj.shift_remove("sign");
    }
    serde_json::to_vec(&body)
        .ok()
        .map(|bytes| base64_md5_sign(&bytes, secret))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CRYPTOMUS_DEFAULT_BASE_URL;
    use serde_json::json;

    fn adapter() -> CryptomusAdapter {
        let mut config = CryptomusConfig::new(CRYPTOMUS_DEFAULT_BASE_URL, "merchant-1", "api-key");
        config.webhook_secret = "hook-secret".into();
        CryptomusAdapter::new(config).unwrap()
    }

    fn event(payload: Value) -> PaymentWebhookEvent {
        PaymentWebhookEvent::new("payment", payload, None)
    }

    #[test]
    fn test_webhook_status_scenarios() {
        assert_eq!(webhook_status("paid"), WebhookStatus::Completed);
        assert_eq!(webhook_status("paid_over"), WebhookStatus::Completed);
        assert_eq!(webhook_status("system_fail"), WebhookStatus::Failed);
        assert_eq!(webhook_status("cancel"), WebhookStatus::Failed);
        assert_eq!(webhook_status("fail"), WebhookStatus::Failed);
        for s in ["check", "wrong_amount", "refund_paid", "PAID", ""] {
            assert_eq!(webhook_status(s), WebhookStatus::Pending, "{:?}", s);
        }
    }

    #[test]
    fn test_poll_status_table() {
        assert_eq!(poll_status("paid_over"), PaymentStatus::Completed);
        assert_eq!(poll_status("fail"), PaymentStatus::Failed);
        assert_eq!(poll_status("confirm_check"), PaymentStatus::Processing);
        assert_eq!(poll_status("refund_paid"), PaymentStatus::Refunded);
        assert_eq!(poll_status("wrong_amount_waiting"), PaymentStatus::Pending);
    }

    #[test]
    fn test_verify_webhook_header_signature() {
        let body = json!({
            "type": "payment",
            "order_id": "o-1",
            "status": "paid",
            "amount": "10.00"
        });
        let payload = serde_json::to_vec(&body).unwrap();
        let signature = sign_webhook_body(&body, "hook-secret").unwrap();

        let adapter = adapter();
        assert!(adapter.verify_webhook(&payload, &signature, ""));
        assert!(adapter.verify_webhook(&payload, &signature, "hook-secret"));
        assert!(!adapter.verify_webhook(&payload, &signature, "other"));
    }

    #[test]
    fn test_verify_webhook_embedded_signature() {
        let mut body = json!({ "order_id": "o-2", "status": "paid_over", "amount": "5" });
        let signature = sign_webhook_body(&body, "hook-secret").unwrap();
        body["sign"] = json!(signature);
        let payload = serde_json::to_vec(&body).unwrap();

        assert!(adapter().verify_webhook(&payload, "", ""));

        body["status"] = json!("paid");
        let tampered = serde_json::to_vec(&body).unwrap();
        assert!(!adapter().verify_webhook(&tampered, "", ""));
    }

    #[test]
    fn test_verify_webhook_rejects_malformed() {
        let adapter = adapter();
        assert!(!adapter.verify_webhook(b"not json", "abc", ""));
        assert!(!adapter.verify_webhook(b"[1,2,3]", "abc", ""));
        assert!(!adapter.verify_webhook(b"", "abc", ""));
        assert!(!adapter.verify_webhook(br#"{"order_id":"o"}"#, "", ""));
    }

    #[test]
    fn test_handle_webhook() {
        let outcome = adapter()
            .handle_webhook(&event(json!({
                "order_id": "o-3", "status": "paid_over", "amount": "12.50", "currency": "USDT", "sign": "x"
            })))
            .unwrap();

        assert_eq!(outcome.payment_id, "o-3");
        assert_eq!(outcome.status, WebhookStatus::Completed);
        assert_eq!(outcome.amount, 12.5);
        assert_eq!(outcome.currency, "USDT");
        assert!(outcome.metadata.get("sign").is_none());
    }

    #[test]
    fn test_handle_webhook_failed_and_unknown() {
        let adapter = adapter();
        let system_fail = event(json!({ "order_id": "o", "status": "system_fail", "amount": 1 }));
        let failed = adapter.handle_webhook(&system_fail).unwrap();
        assert_eq!(failed.status, WebhookStatus::Failed);

        let other = adapter
            .handle_webhook(&event(json!({ "order_id": "o", "status": "locked", "amount": 1 })))
            .unwrap();
        assert_eq!(other.status, WebhookStatus::Pending);
    }

    #[test]
    fn test_no_refund_capability() {
        assert!(adapter().as_refundable().is_none());
        assert_eq!(adapter().signature_header(), "sign");
    }
}
