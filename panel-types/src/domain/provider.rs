//! Fulfillment vendor domain model.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Wire protocol spoken by a fulfillment vendor.
///
/// Only `RestJson` has an adapter. The other values are reserved so stored
/// vendor records can name them; selecting one must fail at the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProviderType {
    RestJson,
    RestXml,
    Soap,
}

impl AsRef<str> for ProviderType {
    fn as_ref(&self) -> &str {
        match self {
            Self::RestJson => "REST_JSON",
            Self::RestXml => "REST_XML",
            Self::Soap => "SOAP",
        }
    }
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_ref())
    }
}

/// Overrides for the vendor action names used by the REST-JSON protocol.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub services: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Per-vendor protocol overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderMeta {
    /// Extra headers sent with every request.
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapping: Option<FieldMapping>,
}

/// A fulfillment vendor's connection record.
///
/// Owned by configuration storage; adapters receive it by value.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub provider_type: ProviderType,
    pub base_url: String,
    pub api_key: String,
    /// Multiplier applied to every upstream unit rate.
    #[serde(default = "default_rate_multiplier")]
    pub rate_multiplier: f64,
    /// Request bound in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Advisory ceiling for callers placing many orders at once; not enforced
    /// by adapters.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<ProviderMeta>,
}

fn default_rate_multiplier() -> f64 {
    1.0
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_max_concurrency() -> u32 {
    10
}

impl ProviderConfig {
    /// Creates a REST-JSON vendor record with default multiplier, timeout and
    /// concurrency.
    pub fn rest_json(
        id: impl Into<String>,
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            provider_type: ProviderType::RestJson,
            base_url: base_url.into(),
            api_key: api_key.into(),
            rate_multiplier: default_rate_multiplier(),
            timeout_ms: default_timeout_ms(),
            max_concurrency: default_max_concurrency(),
            meta: None,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn headers(&self) -> impl Iterator<Item = (&String, &String)> {
        self.meta.iter().flat_map(|m| m.headers.iter())
    }

    pub fn mapping(&self) -> Option<&FieldMapping> {
        self.meta.as_ref().and_then(|m| m.mapping.as_ref())
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("provider_type", &self.provider_type)
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("rate_multiplier", &self.rate_multiplier)
            .field("timeout_ms", &self.timeout_ms)
            .field("max_concurrency", &self.max_concurrency)
            .field("meta", &self.meta)
            .finish()
    }
}

/// A normalized catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderService {
    /// Opaque vendor-assigned id
    pub id: String,
    pub name: String,
    pub category: String,
    /// Per-unit rate, already multiplied by the vendor's rate multiplier
    pub rate: f64,
    pub min: u64,
    pub max: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Request to place one fulfillment order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateOrderParams {
    /// Vendor service id
    pub service: String,
    pub link: String,
    pub quantity: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runs: Option<u32>,
    /// Minutes between runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<u32>,
}

impl CreateOrderParams {
    pub fn new(service: impl Into<String>, link: impl Into<String>, quantity: u64) -> Self {
        Self {
            service: service.into(),
            link: link.into(),
            quantity,
            runs: None,
            interval: None,
        }
    }
}

/// Normalized fulfillment order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Partial,
    Completed,
    Canceled,
    Refunded,
}

impl AsRef<str> for OrderStatus {
    fn as_ref(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Partial => "partial",
            Self::Completed => "completed",
            Self::Canceled => "canceled",
            Self::Refunded => "refunded",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_ref())
    }
}

/// A fulfillment order as last reported by the vendor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderOrder {
    /// Vendor-assigned order id
    pub order_id: String,
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remains: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charge: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

impl ProviderOrder {
    /// A freshly accepted order.
    pub fn pending(order_id: impl Into<String>, charge: Option<f64>) -> Self {
        Self {
            order_id: order_id.into(),
            status: OrderStatus::Pending,
            start_count: None,
            remains: None,
            charge,
            currency: None,
        }
    }
}

/// Remaining vendor credit.
///
/// `Unknown` is what a failed balance call degrades to; the failure itself
/// never reaches the caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "amount", rename_all = "lowercase")]
pub enum Balance {
    Known(f64),
    Unknown,
}

impl Balance {
    pub fn is_known(&self) -> bool {
        matches!(self, Self::Known(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_type_wire_names() {
        let json = serde_json::to_string(&ProviderType::RestJson).unwrap();
        assert_eq!(json, r#""REST_JSON""#);
        let parsed: ProviderType = serde_json::from_str(r#""SOAP""#).unwrap();
        assert_eq!(parsed, ProviderType::Soap);
    }

    #[test]
    fn test_provider_config_defaults() {
        let json = r#"{
            "id": "p1",
            "name": "Vendor One",
            "type": "REST_JSON",
            "base_url": "https://vendor.example/api/v2",
            "api_key": "secret"
        }"#;
        let config: ProviderConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.provider_type, ProviderType::RestJson);
        assert_eq!(config.rate_multiplier, 1.0);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.max_concurrency, 10);
        assert!(config.mapping().is_none());
        assert_eq!(config.headers().count(), 0);
    }

    #[test]
    fn test_provider_config_debug_redacts_key() {
        let config = ProviderConfig::rest_json("p1", "Vendor", "https://x", "sk_live_123");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("sk_live_123"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_order_status_serializes_lowercase() {
        let json = serde_json::to_string(&OrderStatus::Processing).unwrap();
        assert_eq!(json, r#""processing""#);
    }

    #[test]
    fn test_balance_accessors() {
        assert!(Balance::Known(0.0).is_known());
        assert!(!Balance::Unknown.is_known());
    }
}
