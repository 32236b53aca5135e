//! Payment vendor domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payment rail family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentRail {
    /// Card and bank transfer
    Card,
    Crypto,
}

/// The paying user, resolved by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Request to open a payment session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSessionRequest {
    pub amount: f64,
    pub currency: String,
    /// Merchant-side reference; generated when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    pub customer: Customer,
    pub callback_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// Status of a freshly opened session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

/// An opened payment session. Created per checkout attempt, never reused.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSession {
    pub id: String,
    pub amount: f64,
    pub currency: String,
    pub status: SessionStatus,
    /// Hosted checkout page the user is redirected to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_url: Option<String>,
    /// When the vendor will treat the unclaimed session as expired
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Raw vendor response, kept for audit
    pub metadata: serde_json::Value,
}

/// An inbound vendor notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentWebhookEvent {
    pub id: Uuid,
    pub event_type: String,
    pub payload: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    pub received_at: DateTime<Utc>,
}

impl PaymentWebhookEvent {
    pub fn new(
        event_type: impl Into<String>,
        payload: serde_json::Value,
        signature: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_type: event_type.into(),
            payload,
            signature,
            received_at: Utc::now(),
        }
    }

    /// Parses a raw webhook body. The event type is taken from the body's
    /// `event` or `type` field, falling back to `"payment"`.
    pub fn from_body(body: &[u8], signature: Option<String>) -> Result<Self, serde_json::Error> {
        let payload: serde_json::Value = serde_json::from_slice(body)?;
        let event_type = ["event", "type"]
            .iter()
            .find_map(|k| payload.get(*k).and_then(|v| v.as_str()))
            .unwrap_or("payment")
            .to_string();
        Ok(Self::new(event_type, payload, signature))
    }
}

/// Status vocabulary a webhook normalizes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WebhookStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

impl AsRef<str> for WebhookStatus {
    fn as_ref(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for WebhookStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_ref())
    }
}

/// A webhook after normalization, ready for the caller to persist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookOutcome {
    pub payment_id: String,
    pub status: WebhookStatus,
    pub amount: f64,
    pub currency: String,
    pub metadata: serde_json::Value,
}

/// Status vocabulary a live poll normalizes to. Polling can observe refunds,
/// which webhooks may report late or not at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
    Refunded,
}

impl From<WebhookStatus> for PaymentStatus {
    fn from(status: WebhookStatus) -> Self {
        match status {
            WebhookStatus::Pending => PaymentStatus::Pending,
            WebhookStatus::Completed => PaymentStatus::Completed,
            WebhookStatus::Failed => PaymentStatus::Failed,
        }
    }
}

impl AsRef<str> for PaymentStatus {
    fn as_ref(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentStatusReport {
    pub status: PaymentStatus,
    pub amount: f64,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundResult {
    pub success: bool,
    pub refund_id: String,
}
