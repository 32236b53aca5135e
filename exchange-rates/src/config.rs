//! Rate cache configuration loading from environment.

use std::env;
use std::time::Duration;

use crate::source::RateError;

/// Exchange-rate configuration.
#[derive(Debug, Clone)]
pub struct RatesConfig {
    pub base_currency: String,
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub ttl: Duration,
    pub request_timeout: Duration,
    /// Percent added on top of every conversion unless a caller overrides it.
    pub default_markup: f64,
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            base_currency: "USD".into(),
            api_url: None,
            api_key: None,
            ttl: Duration::from_secs(3600),
            request_timeout: Duration::from_secs(10),
            default_markup: 0.0,
        }
    }
}

impl RatesConfig {
    /// Loads configuration from environment variables.
    ///
    /// `EXCHANGE_RATE_API_URL` and `EXCHANGE_RATE_API_KEY` must both be set
    /// for live rates; otherwise the built-in table is used.
    pub fn from_env() -> Result<Self, RateError> {
        let defaults = Self::default();

        let ttl = match non_empty("EXCHANGE_RATE_CACHE_TTL") {
            Some(v) => Duration::from_secs(v.parse().map_err(|_| {
                RateError::Config(format!("EXCHANGE_RATE_CACHE_TTL is not a number: {}", v))
            })?),
            None => defaults.ttl,
        };

        let default_markup = match non_empty("DEFAULT_CURRENCY_MARKUP") {
            Some(v) => v.parse().map_err(|_| {
                RateError::Config(format!("DEFAULT_CURRENCY_MARKUP is not a number: {}", v))
            })?,
            None => defaults.default_markup,
        };

        Ok(Self {
            base_currency: non_empty("BASE_CURRENCY").unwrap_or(defaults.base_currency),
            api_url: non_empty("EXCHANGE_RATE_API_URL"),
            api_key: non_empty("EXCHANGE_RATE_API_KEY"),
            ttl,
            request_timeout: defaults.request_timeout,
            default_markup,
        })
    }

    /// Markup percent applied to conversions into `currency`.
    pub fn currency_markup(&self, _currency: &str) -> f64 {
        self.default_markup
    }

    pub fn is_live(&self) -> bool {
        self.api_url.is_some() && self.api_key.is_some()
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
