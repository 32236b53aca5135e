//! Payment rail configuration loading from environment.

use std::env;
use std::time::Duration;

pub const KORAPAY_DEFAULT_BASE_URL: &str = "https://api.korapay.com/merchant/api/v1";
pub const CRYPTOMUS_DEFAULT_BASE_URL: &str = "https://api.cryptomus.com/v1";

const DEFAULT_TIMEOUT: Duration = Duration::from_millis(15_000);
const DEFAULT_SESSION_LIFETIME: Duration = Duration::from_secs(3600);

/// Card rail credentials.
#[derive(Clone)]
pub struct KorapayConfig {
    pub base_url: String,
    pub secret_key: String,
    pub webhook_secret: String,
    pub timeout: Duration,
    pub session_lifetime: Duration,
}

impl KorapayConfig {
    pub fn new(base_url: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            secret_key: secret_key.into(),
            webhook_secret: String::new(),
            timeout: DEFAULT_TIMEOUT,
            session_lifetime: DEFAULT_SESSION_LIFETIME,
        }
    }
}

impl std::fmt::Debug for KorapayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KorapayConfig")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Crypto rail credentials.
#[derive(Clone)]
pub struct CryptomusConfig {
    pub base_url: String,
    pub api_key: String,
    pub merchant_id: String,
    pub webhook_secret: String,
    pub timeout: Duration,
    pub session_lifetime: Duration,
}

impl CryptomusConfig {
    pub fn new(
        base_url: impl Into<String>,
        merchant_id: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            merchant_id: merchant_id.into(),
            webhook_secret: String::new(),
            timeout: DEFAULT_TIMEOUT,
            session_lifetime: DEFAULT_SESSION_LIFETIME,
        }
    }
}

impl std::fmt::Debug for CryptomusConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CryptomusConfig")
            .field("base_url", &self.base_url)
            .field("merchant_id", &self.merchant_id)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Configuration of every payment rail the registry constructs.
#[derive(Debug, Clone)]
pub struct PaymentsConfig {
    pub korapay: KorapayConfig,
    pub cryptomus: CryptomusConfig,
}

impl PaymentsConfig {
    /// Loads configuration from environment variables.
    ///
    /// Missing credentials are left empty; the rails are still constructed
    /// and fail at the vendor instead.
    pub fn from_env() -> anyhow::Result<Self> {
        let timeout = match non_empty("PAYMENT_TIMEOUT_MS") {
            Some(v) => Duration::from_millis(v.parse().map_err(|_| {
                anyhow::anyhow!("PAYMENT_TIMEOUT_MS is not a number: {}", v)
            })?),
            None => DEFAULT_TIMEOUT,
        };

        let session_lifetime = match non_empty("PAYMENT_SESSION_LIFETIME_SECS") {
            Some(v) => Duration::from_secs(v.parse().map_err(|_| {
                anyhow::anyhow!("PAYMENT_SESSION_LIFETIME_SECS is not a number: {}", v)
            })?),
            None => DEFAULT_SESSION_LIFETIME,
        };

        let korapay = KorapayConfig {
            base_url: non_empty("KORAPAY_BASE_URL")
                .unwrap_or_else(|| KORAPAY_DEFAULT_BASE_URL.to_string()),
            secret_key: env_or_empty("KORAPAY_SECRET_KEY"),
            webhook_secret: env_or_empty("KORAPAY_WEBHOOK_SECRET"),
            timeout,
            session_lifetime,
        };

        let cryptomus = CryptomusConfig {
            base_url: non_empty("CRYPTOMUS_BASE_URL")
                .unwrap_or_else(|| CRYPTOMUS_DEFAULT_BASE_URL.to_string()),
            api_key: env_or_empty("CRYPTOMUS_API_KEY"),
            merchant_id: env_or_empty("CRYPTOMUS_MERCHANT_ID"),
            webhook_secret: env_or_empty("CRYPTOMUS_WEBHOOK_SECRET"),
            timeout,
            session_lifetime,
        };

        Ok(Self { korapay, cryptomus })
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_or_empty(key: &str) -> String {
    env::var(key).unwrap_or_default()
}
