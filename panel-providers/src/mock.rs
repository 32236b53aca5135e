//! Mock fulfillment vendor for exercising higher layers without a live panel.

use async_trait::async_trait;
use chrono::Utc;

use panel_types::{
    Balance, CreateOrderParams, OrderStatus, ProviderAdapter, ProviderOrder, ProviderService,
    ProviderType, UpstreamError,
};

/// Fixed three-entry catalog; every order is accepted and immediately
/// reported as completed.
#[derive(Debug, Default, Clone, Copy)]
pub struct MockProviderAdapter;

impl MockProviderAdapter {
    pub fn new() -> Self {
        Self
    }
}

fn catalog_entry(
    id: &str,
    name: &str,
    category: &str,
    rate: f64,
    max: u64,
    description: &str,
) -> ProviderService {
    ProviderService {
        id: id.into(),
        name: name.into(),
        category: category.into(),
        rate,
        min: 100,
        max,
        description: Some(description.into()),
    }
}

#[async_trait]
impl ProviderAdapter for MockProviderAdapter {
    fn name(&self) -> &str {
        "Mock Provider"
    }

    fn provider_type(&self) -> ProviderType {
        ProviderType::RestJson
    }

    async fn get_services(&self) -> Result<Vec<ProviderService>, UpstreamError> {
        Ok(vec![
            catalog_entry(
                "1",
                "Instagram Followers",
                "Instagram",
                0.5,
                10_000,
                "High quality Instagram followers",
            ),
            catalog_entry("2", "TikTok Likes", "TikTok", 0.3, 50_000, "Real TikTok likes"),
            catalog_entry(
                "3",
                "YouTube Views",
                "YouTube",
                0.8,
                100_000,
                "Organic YouTube views",
            ),
        ])
    }

    async fn create_order(
        &self,
        _params: CreateOrderParams,
    ) -> Result<ProviderOrder, UpstreamError> {
        Ok(ProviderOrder::pending(
            format!("mock_{}", Utc::now().timestamp_millis()),
            Some(10.0),
        ))
    }

    async fn get_order_status(&self, order_id: &str) -> Result<ProviderOrder, UpstreamError> {
        Ok(ProviderOrder {
            order_id: order_id.to_string(),
            status: OrderStatus::Completed,
            start_count: Some(100),
            remains: Some(0),
            charge: Some(10.0),
            currency: None,
        })
    }

    async fn get_balance(&self) -> Balance {
        Balance::Known(1000.0)
    }
}
