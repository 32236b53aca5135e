//! Generic REST-JSON fulfillment adapter.
//!
//! Compatible with the common panel API: every call is a POST to the vendor's
//! base URL with `key`, `action` and action-specific fields in the query
//! string, answered with JSON (an array for `services`, an object otherwise).

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use tracing::{debug, error, instrument, warn};

use panel_types::wire::{as_f64, as_string, as_u64, field};
use panel_types::{
    Balance, CreateOrderParams, FieldMapping, OrderStatus, ProviderAdapter, ProviderConfig,
    ProviderOrder, ProviderService, ProviderType, RegistryError, UpstreamError,
};

/// Translates the vendor's status vocabulary. Anything unrecognized is
/// `Pending` so status polling keeps going.
pub fn normalize_order_status(vendor_status: &str) -> OrderStatus {
    match vendor_status {
        "Pending" => OrderStatus::Pending,
        "In progress" | "Processing" => OrderStatus::Processing,
        "Partial" => OrderStatus::Partial,
        "Completed" => OrderStatus::Completed,
        "Canceled" => OrderStatus::Canceled,
        "Refunded" => OrderStatus::Refunded,
        other => {
            debug!(status = %other, "Unrecognized vendor order status, treating as pending");
            OrderStatus::Pending
        }
    }
}

pub struct RestJsonProviderAdapter {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl RestJsonProviderAdapter {
    /// Builds the adapter and its HTTP client. The client carries the
    /// vendor's timeout and `meta.headers` on every request.
    pub fn new(config: ProviderConfig) -> Result<Self, RegistryError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        for (name, value) in config.headers() {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => warn!(
                    provider = %config.name,
                    header = %name,
                    "Skipping invalid vendor header"
                ),
            }
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| RegistryError::Client(e.to_string()))?;

        Ok(Self { config, client })
    }

    fn action<'a>(
        &'a self,
        default: &'a str,
        pick: impl Fn(&'a FieldMapping) -> Option<&'a String>,
    ) -> &'a str {
        self.config
            .mapping()
            .and_then(pick)
            .map(String::as_str)
            .unwrap_or(default)
    }

    fn protocol_error(&self, message: impl Into<String>) -> UpstreamError {
        UpstreamError::protocol(&self.config.name, message)
    }

    fn transport_error(&self, err: reqwest::Error) -> UpstreamError {
        UpstreamError::from_transport(
            &self.config.name,
            err.is_timeout(),
            self.config.timeout(),
            err.to_string(),
        )
    }

    async fn make_request(
        &self,
        action: &str,
        params: &[(&str, String)],
    ) -> Result<Value, UpstreamError> {
        let mut query: Vec<(&str, &str)> =
            vec![("key", self.config.api_key.as_str()), ("action", action)];
        query.extend(params.iter().map(|(k, v)| (*k, v.as_str())));

        let resp = self
            .client
            .post(&self.config.base_url)
            .query(&query)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(self.protocol_error(format!("Provider API error: HTTP {}", status)));
        }

        let body: Value = resp.json().await.map_err(|e| {
            if e.is_timeout() {
                self.transport_error(e)
            } else {
                self.protocol_error(format!("Invalid JSON response: {}", e))
            }
        })?;

        // Panels report request errors with a 200 and an `error` field.
        if let Some(message) = body.get("error").and_then(Value::as_str) {
            return Err(self.protocol_error(message.to_string()));
        }

        Ok(body)
    }

    fn parse_service(&self, index: usize, entry: &Value) -> Result<ProviderService, UpstreamError> {
        let missing = |what: &str| {
            self.protocol_error(format!("service #{} has no valid `{}`", index, what))
        };

        let id = field(entry, "service", as_string).ok_or_else(|| missing("service"))?;
        let rate = field(entry, "rate", as_f64).ok_or_else(|| missing("rate"))?;
        let min = field(entry, "min", as_u64).ok_or_else(|| missing("min"))?;
        let max = field(entry, "max", as_u64).ok_or_else(|| missing("max"))?;

        Ok(ProviderService {
            id,
            name: field(entry, "name", as_string).unwrap_or_default(),
            category: field(entry, "category", as_string)
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| "Other".to_string()),
            rate: rate * self.config.rate_multiplier,
            min,
            max,
            description: field(entry, "description", as_string),
        })
    }

    async fn fetch_services(&self) -> Result<Vec<ProviderService>, UpstreamError> {
        let action = self.action("services", |m| m.services.as_ref());
        let data = self.make_request(action, &[]).await?;

        let Value::Array(entries) = data else {
            return Err(
                self.protocol_error("Invalid response format: expected an array of services")
            );
        };

        entries
            .iter()
            .enumerate()
            .map(|(i, entry)| self.parse_service(i, entry))
            .collect()
    }

    async fn place_order(&self, params: CreateOrderParams) -> Result<ProviderOrder, UpstreamError> {
        let mut fields = vec![
            ("service", params.service),
            ("link", params.link),
            ("quantity", params.quantity.to_string()),
        ];
        if let Some(runs) = params.runs.filter(|r| *r > 0) {
            fields.push(("runs", runs.to_string()));
        }
        if let Some(interval) = params.interval.filter(|i| *i > 0) {
            fields.push(("interval", interval.to_string()));
        }

        let action = self.action("add", |m| m.order.as_ref());
        let data = self.make_request(action, &fields).await?;

        let order_id = field(&data, "order", as_string)
            .ok_or_else(|| self.protocol_error("Order response has no `order` id"))?;

        Ok(ProviderOrder::pending(order_id, field(&data, "charge", as_f64)))
    }

    async fn fetch_status(&self, order_id: &str) -> Result<ProviderOrder, UpstreamError> {
        let action = self.action("status", |m| m.status.as_ref());
        let data = self
            .make_request(action, &[("order", order_id.to_string())])
            .await?;

        if !data.is_object() {
            return Err(self.protocol_error("Invalid response format: expected a status object"));
        }

        let status = data
            .get("status")
            .and_then(Value::as_str)
            .map(normalize_order_status)
            .unwrap_or_default();

        Ok(ProviderOrder {
            order_id: field(&data, "order", as_string).unwrap_or_else(|| order_id.to_string()),
            status,
            start_count: field(&data, "start_count", as_u64),
            remains: field(&data, "remains", as_u64),
            charge: field(&data, "charge", as_f64),
            currency: field(&data, "currency", as_string),
        })
    }
}

#[async_trait]
impl ProviderAdapter for RestJsonProviderAdapter {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn provider_type(&self) -> ProviderType {
        ProviderType::RestJson
    }

    #[instrument(skip(self), fields(provider = %self.config.name))]
    async fn get_services(&self) -> Result<Vec<ProviderService>, UpstreamError> {
        self.fetch_services()
            .await
            .inspect_err(|e| error!("Provider get_services error: {}", e))
    }

    #[instrument(skip(self), fields(provider = %self.config.name, service = %params.service))]
    async fn create_order(
        &self,
        params: CreateOrderParams,
    ) -> Result<ProviderOrder, UpstreamError> {
        self.place_order(params)
            .await
            .inspect_err(|e| error!("Provider create_order error: {}", e))
    }

    #[instrument(skip(self), fields(provider = %self.config.name))]
    async fn get_order_status(&self, order_id: &str) -> Result<ProviderOrder, UpstreamError> {
        self.fetch_status(order_id)
            .await
            .inspect_err(|e| error!("Provider get_order_status error: {}", e))
    }

    #[instrument(skip(self), fields(provider = %self.config.name))]
    async fn get_balance(&self) -> Balance {
        match self.make_request("balance", &[]).await {
            Ok(data) => match field(&data, "balance", as_f64) {
                Some(balance) => Balance::Known(balance),
                None => {
                    warn!("Provider balance response has no numeric `balance`");
                    Balance::Unknown
                }
            },
            Err(e) => {
                error!("Provider getBalance error: {}", e);
                Balance::Unknown
            }
        }
    }
}
