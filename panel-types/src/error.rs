//! Error types for the vendor normalization layer.

use std::time::Duration;

use crate::domain::ProviderType;

/// Failures talking to a fulfillment or payment vendor.
///
/// Signature verification failures are deliberately absent: a webhook that
/// does not verify is a `false`, not an error.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// The vendor answered, but not with something we can interpret
    /// (non-2xx status, wrong JSON shape, vendor-reported `error` field).
    #[error("{vendor}: upstream protocol error: {message}")]
    Protocol { vendor: String, message: String },

    #[error("{vendor}: request timed out after {}ms", .timeout.as_millis())]
    Timeout { vendor: String, timeout: Duration },

    /// The request never produced a response (connect, DNS, TLS).
    #[error("{vendor}: transport error: {message}")]
    Transport { vendor: String, message: String },
}

impl UpstreamError {
    pub fn protocol(vendor: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Protocol {
            vendor: vendor.into(),
            message: message.into(),
        }
    }

    /// Classifies a `reqwest`-style failure description into a timeout or a
    /// transport error.
    pub fn from_transport(
        vendor: impl Into<String>,
        timed_out: bool,
        timeout: Duration,
        message: impl Into<String>,
    ) -> Self {
        let vendor = vendor.into();
        if timed_out {
            Self::Timeout { vendor, timeout }
        } else {
            Self::Transport {
                vendor,
                message: message.into(),
            }
        }
    }

    /// Name of the vendor the failing call was made against.
    pub fn vendor(&self) -> &str {
        match self {
            Self::Protocol { vendor, .. }
            | Self::Timeout { vendor, .. }
            | Self::Transport { vendor, .. } => vendor,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Configuration references a vendor the registries cannot construct.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Unsupported provider type: {0}")]
    UnsupportedProviderType(ProviderType),

    #[error("Payment adapter not found for provider: {0}")]
    AdapterNotFound(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

/// Application-level errors (for HTTP responses).
///
/// Maps cleanly to HTTP status codes.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Bad gateway: {0}")]
    BadGateway(String),

    #[error("Gateway timeout: {0}")]
    GatewayTimeout(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<UpstreamError> for AppError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Timeout { .. } => AppError::GatewayTimeout(err.to_string()),
            UpstreamError::Protocol { .. } | UpstreamError::Transport { .. } => {
                AppError::BadGateway(err.to_string())
            }
        }
    }
}

impl From<RegistryError> for AppError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::AdapterNotFound(_) => AppError::NotFound(err.to_string()),
            RegistryError::UnsupportedProviderType(_) => AppError::BadRequest(err.to_string()),
            RegistryError::Client(msg) => AppError::Internal(msg),
        }
    }
}
