//! Fulfillment vendor port.

use crate::domain::{Balance, CreateOrderParams, ProviderOrder, ProviderService, ProviderType};
use crate::error::UpstreamError;

/// Submits and tracks fulfillment orders against one upstream vendor.
///
/// Mutating and ordering calls surface failures. The advisory calls
/// (`get_balance`, `test_connection`) never do: they degrade to
/// `Balance::Unknown` and `false`.
#[async_trait::async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Display name of the vendor.
    fn name(&self) -> &str;

    fn provider_type(&self) -> ProviderType;

    /// Fetches the vendor catalog with every rate multiplied by the vendor's
    /// rate multiplier.
    async fn get_services(&self) -> Result<Vec<ProviderService>, UpstreamError>;

    /// Places an order. The order exists at the vendor once this returns `Ok`.
    async fn create_order(&self, params: CreateOrderParams)
    -> Result<ProviderOrder, UpstreamError>;

    /// Polls the current normalized status of an order.
    async fn get_order_status(&self, order_id: &str) -> Result<ProviderOrder, UpstreamError>;

    /// Remaining vendor credit, or `Balance::Unknown` if the call failed.
    async fn get_balance(&self) -> Balance;

    /// Vendor health check: did the balance call succeed.
    async fn test_connection(&self) -> bool {
        self.get_balance().await.is_known()
    }
}
