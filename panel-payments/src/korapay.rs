//! Card rail (Korapay).
//!
//! Requests carry the secret key as a bearer credential. Webhooks are signed
//! with HMAC-SHA256 over the raw body.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::AUTHORIZATION;
use serde_json::{Value, json};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use panel_types::wire::{as_f64, as_string, field};
use panel_types::{
    PaymentAdapter, PaymentRail, PaymentSession, PaymentSessionRequest, PaymentStatus,
    PaymentStatusReport, PaymentWebhookEvent, RefundResult, Refundable, RegistryError,
    SessionStatus, UpstreamError, WebhookOutcome, WebhookStatus,
};

use crate::client::VendorClient;
use crate::config::KorapayConfig;
use crate::security::{hmac_sha256_hex, signatures_match};

pub const KORAPAY_SIGNATURE_HEADER: &str = "x-korapay-signature";

const VENDOR: &str = "Korapay";

fn webhook_status(vendor_status: &str) -> WebhookStatus {
    match vendor_status {
        "success" => WebhookStatus::Completed,
        "failed" => WebhookStatus::Failed,
        _ => WebhookStatus::Pending,
    }
}

fn poll_status(vendor_status: &str) -> PaymentStatus {
    match vendor_status {
        "success" => PaymentStatus::Completed,
        "failed" => PaymentStatus::Failed,
        "processing" => PaymentStatus::Processing,
        _ => PaymentStatus::Pending,
    }
}

pub struct KorapayAdapter {
    config: KorapayConfig,
    client: VendorClient,
}

impl KorapayAdapter {
    pub fn new(config: KorapayConfig) -> Result<Self, RegistryError> {
        let client = VendorClient::new(VENDOR, &config.base_url, config.timeout)?;
        Ok(Self { config, client })
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.config.secret_key)
    }

    /// Korapay answers `{ status, message, data }`; `status: false` is a
    /// rejected request even under HTTP 200.
    fn unwrap_data(&self, body: Value) -> Result<Value, UpstreamError> {
        if body.get("status").and_then(Value::as_bool) == Some(false) {
            let message =
                field(&body, "message", as_string).unwrap_or_else(|| "request rejected".into());
            return Err(self.client.protocol_error(message));
        }
        match body.get("data") {
            Some(data) if data.is_object() => Ok(data.clone()),
            _ => Err(self.client.protocol_error("Response has no `data` object")),
        }
    }

    async fn initialize_charge(
        &self,
        req: PaymentSessionRequest,
    ) -> Result<PaymentSession, UpstreamError> {
        let reference = req
            .order_id
            .clone()
            .unwrap_or_else(|| format!("order_{}", Uuid::new_v4().simple()));

        let mut customer = json!({ "email": req.customer.email });
        if let Some(name) = &req.customer.name {
            customer["name"] = json!(name);
        }

        let mut metadata = req.metadata.clone().unwrap_or_else(|| json!({}));
        if let Some(obj) = metadata.as_object_mut() {
            obj.entry("customer_id").or_insert_with(|| json!(req.customer.id));
        }

        let body = json!({
            "amount": req.amount,
            "currency": req.currency,
            "reference": reference,
            "redirect_url": req.callback_url,
            "customer": customer,
            "metadata": metadata,
        });

        let url = self.client.endpoint(&["charges", "initialize"])?;
        let request = self
            .client
            .http()
            .post(url)
            .header(AUTHORIZATION, self.bearer())
            .json(&body);
        let data = self.unwrap_data(self.client.send_json(request).await?)?;

        let id = field(&data, "reference", as_string)
            .ok_or_else(|| self.client.protocol_error("Charge response has no `reference`"))?;
        let lifetime = chrono::Duration::from_std(self.config.session_lifetime).ok();

        info!(reference = %id, "Korapay charge initialized");

        Ok(PaymentSession {
            id,
            amount: req.amount,
            currency: req.currency,
            status: SessionStatus::Pending,
            payment_url: field(&data, "checkout_url", as_string),
            expires_at: lifetime.map(|l| Utc::now() + l),
            metadata: data,
        })
    }

    async fn query_charge(&self, payment_id: &str) -> Result<PaymentStatusReport, UpstreamError> {
        let url = self.client.endpoint(&["charges", payment_id])?;
        let request = self.client.http().get(url).header(AUTHORIZATION, self.bearer());
        let data = self.unwrap_data(self.client.send_json(request).await?)?;

        let status = data
            .get("status")
            .and_then(Value::as_str)
            .ok_or_else(|| self.client.protocol_error("Charge has no `status`"))?;

        Ok(PaymentStatusReport {
            status: poll_status(status),
            amount: field(&data, "amount", as_f64)
                .ok_or_else(|| self.client.protocol_error("Charge has no `amount`"))?,
            currency: field(&data, "currency", as_string).unwrap_or_default(),
        })
    }

    async fn initiate_refund(
        &self,
        payment_id: &str,
        amount: Option<f64>,
    ) -> Result<RefundResult, UpstreamError> {
        let reference = format!("refund_{}", Uuid::new_v4().simple());
        let mut body = json!({
            "payment_reference": payment_id,
            "reference": reference,
        });
        if let Some(amount) = amount {
            body["amount"] = json!(amount);
        }

        let url = self.client.endpoint(&["refunds", "initiate"])?;
        let request = self
            .client
            .http()
            .post(url)
            .header(AUTHORIZATION, self.bearer())
            .json(&body);
        let response = self.client.send_json(request).await?;

        let success = response.get("status").and_then(Value::as_bool).unwrap_or(false);
        let refund_id = response
            .get("data")
            .and_then(|d| field(d, "reference", as_string))
            .unwrap_or(reference);

        Ok(RefundResult { success, refund_id })
    }
}

#[async_trait]
impl PaymentAdapter for KorapayAdapter {
    fn name(&self) -> &str {
        VENDOR
    }

    fn rail(&self) -> PaymentRail {
        PaymentRail::Card
    }

    fn signature_header(&self) -> &'static str {
        KORAPAY_SIGNATURE_HEADER
    }

    #[instrument(
        skip(self, req),
        fields(vendor = VENDOR, amount = req.amount, currency = %req.currency)
    )]
    async fn create_payment_session(
        &self,
        req: PaymentSessionRequest,
    ) -> Result<PaymentSession, UpstreamError> {
        self.initialize_charge(req)
            .await
            .inspect_err(|e| error!("Korapay create_payment_session error: {}", e))
    }

    fn verify_webhook(&self, payload: &[u8], signature: &str, secret: &str) -> bool {
        let secret = if secret.is_empty() {
            self.config.webhook_secret.as_str()
        } else {
            secret
        };
        if secret.is_empty() || signature.trim().is_empty() {
            warn!("Korapay webhook rejected: no secret or signature");
            return false;
        }
        if serde_json::from_slice::<Value>(payload).is_err() {
            warn!("Korapay webhook rejected: body is not JSON");
            return false;
        }
        signatures_match(&hmac_sha256_hex(payload, secret), signature)
    }

    fn handle_webhook(&self, event: &PaymentWebhookEvent) -> Result<WebhookOutcome, UpstreamError> {
        let charge = match event.payload.get("data") {
            Some(data) if data.is_object() => data,
            _ => &event.payload,
        };

        let payment_id = field(charge, "reference", as_string)
            .ok_or_else(|| self.client.protocol_error("Webhook has no `reference`"))?;
        let status = charge
            .get("status")
            .and_then(Value::as_str)
            .map(webhook_status)
            .unwrap_or_default();

        Ok(WebhookOutcome {
            payment_id,
            status,
            amount: field(charge, "amount", as_f64)
                .ok_or_else(|| self.client.protocol_error("Webhook has no `amount`"))?,
            currency: field(charge, "currency", as_string).unwrap_or_default(),
            metadata: charge.clone(),
        })
    }

    #[instrument(skip(self), fields(vendor = VENDOR))]
    async fn get_payment_status(
        &self,
        payment_id: &str,
    ) -> Result<PaymentStatusReport, UpstreamError> {
        self.query_charge(payment_id)
            .await
            .inspect_err(|e| error!("Korapay get_payment_status error: {}", e))
    }

    fn as_refundable(&self) -> Option<&dyn Refundable> {
        Some(self)
    }
}

#[async_trait]
impl Refundable for KorapayAdapter {
    #[instrument(skip(self), fields(vendor = VENDOR))]
    async fn refund_payment(
        &self,
        payment_id: &str,
        amount: Option<f64>,
    ) -> Result<RefundResult, UpstreamError> {
        self.initiate_refund(payment_id, amount)
            .await
            .inspect_err(|e| error!("Korapay refund_payment error: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KORAPAY_DEFAULT_BASE_URL;

    fn adapter() -> KorapayAdapter {
        let mut config = KorapayConfig::new(KORAPAY_DEFAULT_BASE_URL, "sk_test");
        config.webhook_secret = "whsec".into();
        KorapayAdapter::new(config).unwrap()
    }

    #[test]
    fn test_webhook_status_table() {
        assert_eq!(webhook_status("success"), WebhookStatus::Completed);
        assert_eq!(webhook_status("failed"), WebhookStatus::Failed);
        for s in ["processing", "pending", "SUCCESS", ""] {
            assert_eq!(webhook_status(s), WebhookStatus::Pending, "{:?}", s);
        }
    }

    #[test]
    fn test_poll_status_table() {
        assert_eq!(poll_status("success"), PaymentStatus::Completed);
        assert_eq!(poll_status("failed"), PaymentStatus::Failed);
        assert_eq!(poll_status("processing"), PaymentStatus::Processing);
        assert_eq!(poll_status("expired"), PaymentStatus::Pending);
    }

    #[test]
    fn test_verify_webhook() {
        let adapter = adapter();
        let body = br#"{"event":"charge.success","data":{"reference":"r1"}}"#;
        let signature = hmac_sha256_hex(body, "whsec");

        assert!(adapter.verify_webhook(body, &signature, ""));
        assert!(adapter.verify_webhook(body, &signature, "whsec"));
        assert!(!adapter.verify_webhook(body, &signature, "other"));
        assert!(!adapter.verify_webhook(br#"{"event":"charge.failed"}"#, &signature, ""));
        assert!(!adapter.verify_webhook(body, "", ""));
    }

    #[test]
    fn test_verify_webhook_rejects_non_json() {
        let adapter = adapter();
        let body = b"not json at all";
        let signature = hmac_sha256_hex(body, "whsec");
        assert!(!adapter.verify_webhook(body, &signature, ""));
        assert!(!adapter.verify_webhook(&[0xff, 0xfe], "abc", "whsec"));
    }

    #[test]
    fn test_verify_webhook_without_any_secret() {
        let adapter =
            KorapayAdapter::new(KorapayConfig::new(KORAPAY_DEFAULT_BASE_URL, "sk")).unwrap();
        let body = br#"{"a":1}"#;
        assert!(!adapter.verify_webhook(body, &hmac_sha256_hex(body, ""), ""));
    }

    #[test]
    fn test_handle_webhook_reads_data_envelope() {
        let event = PaymentWebhookEvent::new(
            "charge.success",
            json!({
                "event": "charge.success",
                "data": {
                    "reference": "ref-1",
                    "status": "success",
                    "amount": "2500.00",
                    "currency": "NGN"
                }
            }),
            None,
        );

        let outcome = adapter().handle_webhook(&event).unwrap();

        assert_eq!(outcome.payment_id, "ref-1");
        assert_eq!(outcome.status, WebhookStatus::Completed);
        assert_eq!(outcome.amount, 2500.0);
        assert_eq!(outcome.currency, "NGN");
    }

    #[test]
    fn test_handle_webhook_keeps_raw_charge() {
        let event = PaymentWebhookEvent::new(
            "charge.success",
            json!({
                "event": "charge.success",
                "data": {
                    "reference": "ref-3",
                    "status": "success",
                    "amount": 5000,
                    "currency": "NGN",
                    "fee": 75,
                    "payment_method": "card"
                }
            }),
            None,
        );

        let outcome = adapter().handle_webhook(&event).unwrap();

        assert_eq!(outcome.metadata["fee"], 75);
        assert_eq!(outcome.metadata["payment_method"], "card");
        assert_eq!(outcome.metadata["reference"], "ref-3");
        assert!(outcome.metadata.get("event").is_none());
    }

    #[test]
    fn test_handle_webhook_flat_and_unknown_status() {
        let event = PaymentWebhookEvent::new(
            "payment",
            json!({ "reference": "ref-2", "status": "reversed", "amount": 10, "currency": "USD" }),
            None,
        );

        let outcome = adapter().handle_webhook(&event).unwrap();

        assert_eq!(outcome.status, WebhookStatus::Pending);
        assert_eq!(outcome.payment_id, "ref-2");
    }

    #[test]
    fn test_handle_webhook_without_reference_is_protocol_error() {
        let event = PaymentWebhookEvent::new("payment", json!({ "status": "success" }), None);
        assert!(matches!(
            adapter().handle_webhook(&event),
            Err(UpstreamError::Protocol { .. })
        ));
    }

    #[test]
    fn test_is_refundable() {
        assert!(adapter().as_refundable().is_some());
        assert_eq!(adapter().rail(), PaymentRail::Card);
    }
}
