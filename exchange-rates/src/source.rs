//! Live rate vendors.

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, instrument};

/// Error type for rate vendor operations.
#[derive(Debug, thiserror::Error)]
pub enum RateError {
    #[error("Rate vendor unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Rate vendor timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("Invalid rate response: {0}")]
    InvalidResponse(String),

    #[error("Invalid rate configuration: {0}")]
    Config(String),
}

/// A rate table as reported by a vendor, before it is timestamped and cached.
#[derive(Debug, Clone, PartialEq)]
pub struct RateSnapshot {
    pub base: String,
    /// Units of each currency per one unit of `base`
    pub rates: HashMap<String, f64>,
}

/// Port for live rate vendors.
#[async_trait::async_trait]
pub trait RateSource: Send + Sync {
    async fn fetch(&self, base: &str) -> Result<RateSnapshot, RateError>;
}

/// Rate vendor reached with `GET {api_url}/{base}?apikey={key}`.
pub struct HttpRateSource {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    timeout: Duration,
}

#[derive(Deserialize)]
struct RatesResponse {
    base: Option<String>,
    rates: Option<HashMap<String, serde_json::Value>>,
}

impl HttpRateSource {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, RateError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RateError::Config(e.to_string()))?;
        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            timeout,
        })
    }
}

#[async_trait::async_trait]
impl RateSource for HttpRateSource {
    #[instrument(skip(self), fields(api_url = %self.api_url))]
    async fn fetch(&self, base: &str) -> Result<RateSnapshot, RateError> {
        let url = format!("{}/{}", self.api_url, base);
        let resp = self
            .client
            .get(&url)
            .query(&[("apikey", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(RateError::ServiceUnavailable(format!("HTTP {}", status)));
        }

        let body: RatesResponse = resp.json().await.map_err(|e| {
            if e.is_timeout() {
                RateError::Timeout(self.timeout)
            } else {
                RateError::InvalidResponse(e.to_string())
            }
        })?;

        let rates: HashMap<String, f64> = body
            .rates
            .ok_or_else(|| RateError::InvalidResponse("missing `rates`".into()))?
            .into_iter()
            .filter_map(|(code, v)| {
                v.as_f64()
                    .filter(|r| r.is_finite() && *r > 0.0)
                    .map(|r| (code.to_uppercase(), r))
            })
            .collect();

        if rates.is_empty() {
            return Err(RateError::InvalidResponse("empty `rates`".into()));
        }

        debug!(count = rates.len(), "Fetched exchange rates");
        Ok(RateSnapshot {
            base: body.base.unwrap_or_else(|| base.to_string()),
            rates,
        })
    }
}

impl HttpRateSource {
    fn classify(&self, err: reqwest::Error) -> RateError {
        if err.is_timeout() {
            RateError::Timeout(self.timeout)
        } else {
            RateError::ServiceUnavailable(err.to_string())
        }
    }
}
