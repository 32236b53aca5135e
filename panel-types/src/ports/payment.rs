//! Payment vendor port.

use crate::domain::{
    PaymentRail, PaymentSession, PaymentSessionRequest, PaymentStatusReport, PaymentWebhookEvent,
    RefundResult, WebhookOutcome,
};
use crate::error::UpstreamError;

/// Opens payment sessions, authenticates webhooks and reconciles payment state
/// against one payment rail.
#[async_trait::async_trait]
pub trait PaymentAdapter: Send + Sync {
    /// Display name of the rail (e.g. "Korapay").
    fn name(&self) -> &str;

    fn rail(&self) -> PaymentRail;

    /// Header the vendor puts the webhook signature in.
    fn signature_header(&self) -> &'static str;

    async fn create_payment_session(
        &self,
        req: PaymentSessionRequest,
    ) -> Result<PaymentSession, UpstreamError>;

    /// Recomputes the signature of a raw webhook body and compares it with
    /// the presented one. Total over malformed input: anything that cannot be
    /// parsed or hashed is `false`.
    ///
    /// An empty `secret` falls back to the rail's configured webhook secret.
    fn verify_webhook(&self, payload: &[u8], signature: &str, secret: &str) -> bool;

    /// Normalizes a webhook. Does NOT verify it; call `verify_webhook` first.
    fn handle_webhook(&self, event: &PaymentWebhookEvent) -> Result<WebhookOutcome, UpstreamError>;

    /// Live poll against the vendor. Failures are surfaced, never reported as
    /// a default status.
    async fn get_payment_status(
        &self,
        payment_id: &str,
    ) -> Result<PaymentStatusReport, UpstreamError>;

    /// Refund capability, when the rail has one.
    fn as_refundable(&self) -> Option<&dyn Refundable> {
        None
    }
}

/// Optional refund capability of a payment rail.
#[async_trait::async_trait]
pub trait Refundable: Send + Sync {
    /// Refunds `amount`, or the full payment when `None`.
    async fn refund_payment(
        &self,
        payment_id: &str,
        amount: Option<f64>,
    ) -> Result<RefundResult, UpstreamError>;
}
