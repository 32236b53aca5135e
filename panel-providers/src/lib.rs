//! # Panel Providers
//!
//! Fulfillment vendor adapters implementing the `ProviderAdapter` port, and
//! the registry that picks one for a stored vendor record.

pub mod mock;
pub mod registry;
pub mod rest_json;

pub use mock::MockProviderAdapter;
pub use registry::{create_mock_provider, create_provider_adapter};
pub use rest_json::{RestJsonProviderAdapter, normalize_order_status};
