//! # Panel Hex
//!
//! Application service layer and HTTP adapter for the marketplace's vendor
//! integrations.
//!
//! ## Architecture
//!
//! - `service/` - Application service (quoting, ordering, checkout, webhooks)
//! - `inbound/` - HTTP adapter (Axum server)
//!
//! Fulfillment vendors are passed in per call as `ProviderAdapter`s; payment
//! rails and the rate cache are owned by the service.

pub mod inbound;
pub mod service;


pub use service::{
    HealthReport, MarketplaceService, OrderPoll, PaymentRailInfo, ProviderHealth, ServiceQuote,
};
