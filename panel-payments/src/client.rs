//! HTTP plumbing shared by the payment rails.

use std::time::Duration;

use reqwest::{RequestBuilder, Url};
use serde_json::Value;

use panel_types::{RegistryError, UpstreamError};

pub(crate) struct VendorClient {
    vendor: &'static str,
    base_url: String,
    timeout: Duration,
    http: reqwest::Client,
}

impl VendorClient {
    pub(crate) fn new(
        vendor: &'static str,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, RegistryError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RegistryError::Client(e.to_string()))?;

        Ok(Self {
            vendor,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            http,
        })
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn protocol_error(&self, message: impl Into<String>) -> UpstreamError {
        UpstreamError::protocol(self.vendor, message)
    }

    fn transport_error(&self, err: reqwest::Error) -> UpstreamError {
        UpstreamError::from_transport(self.vendor, err.is_timeout(), self.timeout, err.to_string())
    }

    /// Joins `segments` onto the base URL, percent-encoding each one.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url, UpstreamError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| self.protocol_error(format!("Invalid base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| self.protocol_error("Base URL cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Sends the request and reads a JSON object body. Non-2xx is a protocol
    /// error carrying the vendor's `message` when it gives one.
    pub(crate) async fn send_json(&self, request: RequestBuilder) -> Result<Value, UpstreamError> {
        let resp = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = resp.status();

        let body: Value = resp.json().await.map_err(|e| {
            if e.is_timeout() {
                self.transport_error(e)
            } else if !status.is_success() {
                self.protocol_error(format!("HTTP {}", status))
            } else {
                self.protocol_error(format!("Invalid JSON response: {}", e))
            }
        })?;

        if !status.is_success() {
            let detail = body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("no message");
            return Err(self.protocol_error(format!("HTTP {}: {}", status, detail)));
        }

        if !body.is_object() {
            return Err(self.protocol_error("Invalid response format: expected an object"));
        }

        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_encodes_segments() {
        let client =
            VendorClient::new("V", "https://api.example.com/v1/", Duration::from_secs(1)).unwrap();

        let url = client.endpoint(&["charges", "ref/../x?y"]).unwrap();

        assert_eq!(url.as_str(), "https://api.example.com/v1/charges/ref%2F..%2Fx%3Fy");
    }

    #[test]
    fn test_endpoint_rejects_bad_base() {
        let client = VendorClient::new("V", "not a url", Duration::from_secs(1)).unwrap();
        assert!(matches!(
            client.endpoint(&["payment"]),
            Err(UpstreamError::Protocol { .. })
        ));
    }
}
