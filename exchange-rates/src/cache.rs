//! Time-bounded exchange-rate cache.
//!
//! Lookup policy, in order:
//! 1. cached table younger than the TTL: returned as is, no network call
//! 2. otherwise refresh from the configured [`RateSource`]
//! 3. refresh succeeded: the cached table is replaced wholesale
//! 4. refresh failed: serve the stale table, or the built-in table if there
//!    is nothing cached
//!
//! Concurrent refreshes on a miss are not serialized; the last writer wins.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::CurrencyCode;
use crate::config::RatesConfig;
use crate::convert::{convert_with_table, rate_with_table, same_currency};
use crate::source::{HttpRateSource, RateError, RateSource};

/// Source of "now" for TTL checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock(Mutex<DateTime<Utc>>);

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self(Mutex::new(start))
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.0.lock().unwrap_or_else(|p| p.into_inner());
        if let Ok(delta) = chrono::Duration::from_std(by) {
            *now += delta;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap_or_else(|p| p.into_inner())
    }
}

/// A full rate table relative to one base currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRateTable {
    pub base: String,
    /// Units of each currency per one unit of `base`
    pub rates: HashMap<String, f64>,
    pub fetched_at: DateTime<Utc>,
}

impl ExchangeRateTable {
    /// The built-in table, rebased onto `base` when `base` is a supported
    /// currency and left on USD otherwise.
    pub fn builtin(base: &str, at: DateTime<Utc>) -> Self {
        let (base, divisor) = match base.parse::<CurrencyCode>() {
            Ok(code) => (code.code(), code.default_rate()),
            Err(_) => (CurrencyCode::USD.code(), 1.0),
        };
        let rates = CurrencyCode::all()
            .iter()
            .map(|c| (c.code().to_string(), c.default_rate() / divisor))
            .collect();
        Self {
            base: base.to_string(),
            rates,
            fetched_at: at,
        }
    }

    pub fn rate(&self, code: &str) -> Option<f64> {
        self.rates
            .get(code)
            .or_else(|| self.rates.get(&code.to_uppercase()))
            .copied()
    }

    fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        match (now - self.fetched_at).to_std() {
            Ok(age) => age < ttl,
            // fetched_at is in the future; the clock went backwards
            Err(_) => true,
        }
    }
}

/// Process-wide exchange-rate cache. Construct once at startup and share.
pub struct RateCache {
    base: String,
    ttl: Duration,
    source: Option<Arc<dyn RateSource>>,
    clock: Arc<dyn Clock>,
    slot: RwLock<Option<Arc<ExchangeRateTable>>>,
}

impl RateCache {
    /// Creates an empty cache. With no `source`, lookups resolve to the
    /// built-in table without any network call.
    pub fn new(
        base: impl Into<String>,
        ttl: Duration,
        source: Option<Arc<dyn RateSource>>,
    ) -> Self {
        Self {
            base: base.into().to_uppercase(),
            ttl,
            source,
            clock: Arc::new(SystemClock),
            slot: RwLock::new(None),
        }
    }

    /// Builds a cache backed by [`HttpRateSource`] when both the API URL and
    /// key are configured.
    pub fn from_config(config: &RatesConfig) -> Result<Self, RateError> {
        let source: Option<Arc<dyn RateSource>> = match (&config.api_url, &config.api_key) {
            (Some(url), Some(key)) => Some(Arc::new(HttpRateSource::new(
                url.clone(),
                key.clone(),
                config.request_timeout,
            )?)),
            _ => None,
        };
        Ok(Self::new(config.base_currency.clone(), config.ttl, source))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// The currently cached table, without refreshing.
    pub fn cached(&self) -> Option<Arc<ExchangeRateTable>> {
        self.slot.read().unwrap_or_else(|p| p.into_inner()).clone()
    }

    fn store(&self, table: ExchangeRateTable) -> Arc<ExchangeRateTable> {
        let table = Arc::new(table);
        *self.slot.write().unwrap_or_else(|p| p.into_inner()) = Some(table.clone());
        table
    }

    /// Returns the best available rate table. Never fails.
    pub async fn fetch_exchange_rates(&self) -> Arc<ExchangeRateTable> {
        let cached = self.cached();
        if let Some(table) = &cached {
            if table.is_fresh(self.clock.now(), self.ttl) {
                return table.clone();
            }
        }

        let Some(source) = &self.source else {
            warn!("Exchange rate API not configured, using built-in rates");
            return self.store(ExchangeRateTable::builtin(&self.base, self.clock.now()));
        };

        match source.fetch(&self.base).await {
            Ok(snapshot) => {
                info!(
                    base = %snapshot.base,
                    count = snapshot.rates.len(),
                    "Refreshed exchange rates"
                );
                self.store(ExchangeRateTable {
                    base: snapshot.base.to_uppercase(),
                    rates: snapshot.rates,
                    fetched_at: self.clock.now(),
                })
            }
            Err(e) => {
                error!("Error fetching exchange rates: {}", e);
                match cached {
                    Some(stale) => {
                        warn!(fetched_at = %stale.fetched_at, "Serving stale exchange rates");
                        stale
                    }
                    None => {
                        warn!("No cached exchange rates, using built-in rates");
                        self.store(ExchangeRateTable::builtin(&self.base, self.clock.now()))
                    }
                }
            }
        }
    }

    /// Converts `amount` through the base currency, applies `markup_percent`
    /// and rounds to two decimals. Identical currencies return `amount`
    /// untouched without consulting the cache.
    pub async fn convert_currency(
        &self,
        amount: f64,
        from: &str,
        to: &str,
        markup_percent: f64,
    ) -> f64 {
        if same_currency(from, to) {
            return amount;
        }
        let table = self.fetch_exchange_rates().await;
        convert_with_table(&table, amount, from, to, markup_percent)
    }

    /// Units of `to` per one unit of `from`.
    pub async fn get_exchange_rate(&self, from: &str, to: &str) -> f64 {
        if same_currency(from, to) {
            return 1.0;
        }
        let table = self.fetch_exchange_rates().await;
        rate_with_table(&table, from, to)
    }
}
