//! # Panel Application
//!
//! Binary that wires together all the components:
//! - Load configuration from environment
//! - Build the rate cache and the payment rails
//! - Create the marketplace service
//! - Start the HTTP server

mod config;

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use exchange_rates::RateCache;
use panel_hex::{MarketplaceService, inbound::HttpServer};
use panel_payments::PaymentRegistry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = config::Config::from_env()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,panel_app=debug,panel_hex=debug".into()),
        )
        .with(config.json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!config.json_logs).then(tracing_subscriber::fmt::layer))
        .init();

    tracing::info!("Starting panel server on port {}", config.port);
    if config.rates.is_live() {
        tracing::info!(base = %config.rates.base_currency, "Using live exchange rates");
    } else {
        tracing::warn!("No exchange-rate vendor configured, using built-in rates");
    }

    let rates = Arc::new(RateCache::from_config(&config.rates)?);
    let payments = PaymentRegistry::from_config(&config.payments)?;
    let markup = config.rates.currency_markup(&config.rates.base_currency);

    // Warm the rate cache
    let table = rates.fetch_exchange_rates().await;
    tracing::debug!(currencies = table.rates.len(), "Exchange rates loaded");

    let service = MarketplaceService::new(payments, rates, markup);

    let server = HttpServer::new(service);
    let addr = format!("0.0.0.0:{}", config.port);

    server.run(&addr).await?;

    Ok(())
}
