//! Configuration loading from environment.

use std::env;

use exchange_rates::RatesConfig;
use panel_payments::PaymentsConfig;

/// Application configuration.
pub struct Config {
    pub port: u16,
    /// `LOG_FORMAT=json` switches the log output to JSON lines
    pub json_logs: bool,
    pub rates: RatesConfig,
    pub payments: PaymentsConfig,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()?;

        let json_logs = env::var("LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        Ok(Self {
            port,
            json_logs,
            rates: RatesConfig::from_env()?,
            payments: PaymentsConfig::from_env()?,
        })
    }
}
