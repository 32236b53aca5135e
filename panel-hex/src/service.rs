//! Marketplace Application Service
//!
//! Composes the provider adapters, the payment registry and the rate cache
//! into the workflows the marketplace runs: quoting, ordering, checkout and
//! webhook intake. Persistence stays with the caller.

use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{info, warn};

use exchange_rates::{
    RateCache, format_currency_with_symbol, is_crypto_currency, rate_with_table, round2,
};
use panel_payments::PaymentRegistry;
use panel_types::{
    AppError, CreateOrderParams, PaymentRail, PaymentSession, PaymentSessionRequest,
    PaymentStatusReport, PaymentWebhookEvent, ProviderAdapter, ProviderOrder, ProviderService,
    RefundResult, WebhookOutcome,
};

/// A catalog entry priced for display.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceQuote {
    pub service: ProviderService,
    /// Vendor rate converted into `currency`, markup included
    pub price: f64,
    pub currency: String,
    pub display: String,
}

/// Result of polling a fulfillment vendor for an order the caller already
/// tracks.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum OrderPoll {
    Updated(ProviderOrder),
    /// The poll failed; `known` is the caller's last good state, untouched.
    Unchanged { known: ProviderOrder, error: String },
}

impl OrderPoll {
    /// The order state the caller should keep.
    pub fn order(&self) -> &ProviderOrder {
        match self {
            OrderPoll::Updated(order) => order,
            OrderPoll::Unchanged { known, .. } => known,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderHealth {
    pub name: String,
    pub healthy: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentRailInfo {
    pub key: String,
    pub name: String,
    pub rail: PaymentRail,
    pub refunds: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub providers: Vec<ProviderHealth>,
    pub payments: Vec<PaymentRailInfo>,
}

/// Application service for the marketplace.
pub struct MarketplaceService {
    payments: PaymentRegistry,
    rates: Arc<RateCache>,
    markup_percent: f64,
}

impl MarketplaceService {
    pub fn new(payments: PaymentRegistry, rates: Arc<RateCache>, markup_percent: f64) -> Self {
        Self {
            payments,
            rates,
            markup_percent,
        }
    }

    pub fn rates(&self) -> &RateCache {
        &self.rates
    }

    pub fn payments(&self) -> &PaymentRegistry {
        &self.payments
    }

    pub fn markup_percent(&self) -> f64 {
        self.markup_percent
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Fulfillment
    // ─────────────────────────────────────────────────────────────────────────────

    /// Fetches a vendor catalog and prices it in `currency`.
    ///
    /// Vendor rates are taken to be in the rate cache's base currency. Fiat
    /// prices are rounded to cents; crypto prices keep full precision.
    pub async fn quote_services(
        &self,
        provider: &dyn ProviderAdapter,
        currency: &str,
    ) -> Result<Vec<ServiceQuote>, AppError> {
        let services = provider.get_services().await?;
        let table = self.rates.fetch_exchange_rates().await;

        let unconverted = currency.trim().eq_ignore_ascii_case(self.rates.base());
        let factor = if unconverted {
            1.0
        } else {
            let rate = rate_with_table(&table, self.rates.base(), currency);
            rate * (1.0 + self.markup_percent / 100.0)
        };
        let crypto = is_crypto_currency(currency);

        let quotes = services
            .into_iter()
            .map(|service| {
                let raw = service.rate * factor;
                let price = if crypto || unconverted { raw } else { round2(raw) };
                ServiceQuote {
                    display: format_currency_with_symbol(price, currency),
                    currency: currency.trim().to_uppercase(),
                    price,
                    service,
                }
            })
            .collect();
        Ok(quotes)
    }

    /// Places an order at the vendor. A failure is returned as is and never
    /// retried; the caller decides on compensation.
    pub async fn place_order(
        &self,
        provider: &dyn ProviderAdapter,
        params: CreateOrderParams,
    ) -> Result<ProviderOrder, AppError> {
        if params.quantity == 0 {
            return Err(AppError::BadRequest("Quantity must be positive".into()));
        }
        if params.link.trim().is_empty() {
            return Err(AppError::BadRequest("Link cannot be empty".into()));
        }

        let order = provider.create_order(params).await?;
        info!(provider = provider.name(), order_id = %order.order_id, "Order placed");
        Ok(order)
    }

    /// Polls the vendor for `known`. A failed poll keeps `known` as it is.
    pub async fn poll_order_status(
        &self,
        provider: &dyn ProviderAdapter,
        known: ProviderOrder,
    ) -> OrderPoll {
        match provider.get_order_status(&known.order_id).await {
            Ok(order) => OrderPoll::Updated(order),
            Err(e) => {
                warn!(
                    provider = provider.name(),
                    order_id = %known.order_id,
                    "Status poll failed, keeping last known state"
                );
                OrderPoll::Unchanged {
                    known,
                    error: e.to_string(),
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Payments
    // ─────────────────────────────────────────────────────────────────────────────

    /// Opens a checkout session on the rail registered as `rail`.
    pub async fn open_checkout(
        &self,
        rail: &str,
        req: PaymentSessionRequest,
    ) -> Result<PaymentSession, AppError> {
        if !(req.amount.is_finite() && req.amount > 0.0) {
            return Err(AppError::BadRequest("Amount must be positive".into()));
        }
        if req.customer.email.trim().is_empty() {
            return Err(AppError::BadRequest("Customer email is required".into()));
        }

        let adapter = self.payments.get_payment_adapter(rail)?;
        let session = adapter.create_payment_session(req).await?;
        info!(rail = adapter.name(), session_id = %session.id, "Checkout opened");
        Ok(session)
    }

    /// Header the rail's webhook signature arrives in.
    pub fn signature_header(&self, rail: &str) -> Result<&'static str, AppError> {
        Ok(self.payments.get_payment_adapter(rail)?.signature_header())
    }

    /// Verifies a raw webhook body against the rail's configured secret, then
    /// normalizes it. Unverified bodies are never parsed.
    pub fn process_webhook(
        &self,
        rail: &str,
        body: &[u8],
        signature: &str,
    ) -> Result<WebhookOutcome, AppError> {
        let adapter = self.payments.get_payment_adapter(rail)?;

        if !adapter.verify_webhook(body, signature, "") {
            warn!(rail = adapter.name(), "Webhook signature rejected");
            return Err(AppError::Unauthorized("Invalid webhook signature".into()));
        }

        let signature = (!signature.is_empty()).then(|| signature.to_string());
        let event = PaymentWebhookEvent::from_body(body, signature)
            .map_err(|e| AppError::BadRequest(format!("Malformed webhook body: {}", e)))?;
        let outcome = adapter.handle_webhook(&event)?;

        info!(
            rail = adapter.name(),
            event_id = %event.id,
            payment_id = %outcome.payment_id,
            status = %outcome.status,
            "Webhook processed"
        );
        Ok(outcome)
    }

    pub async fn payment_status(
        &self,
        rail: &str,
        payment_id: &str,
    ) -> Result<PaymentStatusReport, AppError> {
        let adapter = self.payments.get_payment_adapter(rail)?;
        Ok(adapter.get_payment_status(payment_id).await?)
    }

    /// Refunds through the rail, when the rail supports refunds at all.
    pub async fn refund(
        &self,
        rail: &str,
        payment_id: &str,
        amount: Option<f64>,
    ) -> Result<RefundResult, AppError> {
        let adapter = self.payments.get_payment_adapter(rail)?;
        let Some(refundable) = adapter.as_refundable() else {
            return Err(AppError::BadRequest(format!(
                "{} does not support refunds",
                adapter.name()
            )));
        };
        Ok(refundable.refund_payment(payment_id, amount).await?)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Health
    // ─────────────────────────────────────────────────────────────────────────────

    /// The registered payment rails, in registration order.
    pub fn payment_rails(&self) -> Vec<PaymentRailInfo> {
        self.payments
            .keys()
            .zip(self.payments.get_all_payment_adapters())
            .map(|(key, adapter)| PaymentRailInfo {
                key: key.to_string(),
                name: adapter.name().to_string(),
                rail: adapter.rail(),
                refunds: adapter.as_refundable().is_some(),
            })
            .collect()
    }

    /// Probes every provider concurrently and lists the payment rails.
    pub async fn health_sweep(&self, providers: &[Arc<dyn ProviderAdapter>]) -> HealthReport {
        let mut probes = JoinSet::new();
        for (index, provider) in providers.iter().enumerate() {
            let provider = Arc::clone(provider);
            probes.spawn(async move { (index, provider.test_connection().await) });
        }

        let mut healthy = vec![false; providers.len()];
        while let Some(joined) = probes.join_next().await {
            match joined {
                Ok((index, ok)) => healthy[index] = ok,
                Err(e) => warn!("Provider health probe aborted: {}", e),
            }
        }

        let providers = providers
            .iter()
            .zip(healthy)
            .map(|(p, healthy)| ProviderHealth {
                name: p.name().to_string(),
                healthy,
            })
            .collect();

        HealthReport {
            providers,
            payments: self.payment_rails(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Currency
    // ─────────────────────────────────────────────────────────────────────────────

    /// Converts with the configured markup.
    pub async fn convert(&self, amount: f64, from: &str, to: &str) -> f64 {
        self.rates
            .convert_currency(amount, from, to, self.markup_percent)
            .await
    }
}
