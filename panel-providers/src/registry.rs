//! Provider registry: stored vendor record in, concrete adapter out.
//!
//! Holds no state across calls.

use std::sync::Arc;

use panel_types::{ProviderAdapter, ProviderConfig, ProviderType, RegistryError};

use crate::mock::MockProviderAdapter;
use crate::rest_json::RestJsonProviderAdapter;

/// Returns the adapter for `config.provider_type`.
///
/// `REST_XML` and `SOAP` are reserved and have no adapter; they fail with
/// `UnsupportedProviderType`.
pub fn create_provider_adapter(
    config: ProviderConfig,
) -> Result<Arc<dyn ProviderAdapter>, RegistryError> {
    match config.provider_type {
        ProviderType::RestJson => Ok(Arc::new(RestJsonProviderAdapter::new(config)?)),
        other @ (ProviderType::RestXml | ProviderType::Soap) => {
            Err(RegistryError::UnsupportedProviderType(other))
        }
    }
}

pub fn create_mock_provider() -> Arc<dyn ProviderAdapter> {
    Arc::new(MockProviderAdapter::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(provider_type: ProviderType) -> ProviderConfig {
        let mut config = ProviderConfig::rest_json("p1", "Vendor", "https://vendor.example", "k");
        config.provider_type = provider_type;
        config
    }

    #[test]
    fn test_rest_json_is_supported() {
        let adapter = create_provider_adapter(config(ProviderType::RestJson)).unwrap();
        assert_eq!(adapter.name(), "Vendor");
        assert_eq!(adapter.provider_type(), ProviderType::RestJson);
    }

    #[test]
    fn test_reserved_types_fail_loudly() {
        for t in [ProviderType::RestXml, ProviderType::Soap] {
            let result = create_provider_adapter(config(t));
            assert!(matches!(
                result,
                Err(RegistryError::UnsupportedProviderType(got)) if got == t
            ));
        }
    }

    #[test]
    fn test_mock_provider() {
        assert_eq!(create_mock_provider().name(), "Mock Provider");
    }
}
