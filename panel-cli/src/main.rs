//! Panel CLI
//!
//! Operator tooling for the vendor layer: inspect a fulfillment vendor, work
//! with exchange rates, and check payment webhooks offline.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use exchange_rates::{RateCache, RatesConfig, format_currency_with_symbol, is_crypto_currency};
use panel_hex::MarketplaceService;
use panel_payments::{PaymentRegistry, PaymentsConfig};
use panel_providers::{create_mock_provider, create_provider_adapter};
use panel_types::{
    Balance, CreateOrderParams, PaymentAdapter, PaymentWebhookEvent, ProviderAdapter,
    ProviderConfig,
};

#[derive(Parser)]
#[command(name = "panel")]
#[command(author, version, about = "Marketplace vendor tooling", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fulfillment vendor operations
    Provider {
        /// Vendor record as JSON (the stored `ProviderConfig`)
        #[arg(long, env = "PANEL_PROVIDER_CONFIG", conflicts_with = "mock")]
        config: Option<PathBuf>,
        /// Use the built-in mock vendor
        #[arg(long)]
        mock: bool,
        #[command(subcommand)]
        action: ProviderCommands,
    },
    /// Exchange-rate operations
    Rates {
        #[command(subcommand)]
        action: RateCommands,
    },
    /// Payment webhook tools
    Webhook {
        #[command(subcommand)]
        action: WebhookCommands,
    },
    /// Live payment status poll
    PaymentStatus {
        /// Rail name (korapay, cryptomus)
        rail: String,
        payment_id: String,
    },
}

#[derive(Subcommand)]
enum ProviderCommands {
    /// List the vendor's catalog
    Services {
        /// Price the catalog in this currency as well
        #[arg(long)]
        currency: Option<String>,
    },
    /// Show the vendor balance
    Balance,
    /// Check that the vendor answers
    Ping,
    /// Place an order
    Order {
        #[arg(long)]
        service: String,
        #[arg(long)]
        link: String,
        #[arg(long)]
        quantity: u64,
        #[arg(long)]
        runs: Option<u32>,
        #[arg(long)]
        interval: Option<u32>,
    },
    /// Poll an order
    Status {
        order_id: String,
    },
}

#[derive(Subcommand)]
enum RateCommands {
    /// Show the current rate table
    Table,
    /// Convert an amount
    Convert {
        amount: f64,
        from: String,
        to: String,
        /// Markup percent; defaults to DEFAULT_CURRENCY_MARKUP
        #[arg(long)]
        markup: Option<f64>,
    },
}

#[derive(Subcommand)]
enum WebhookCommands {
    /// Verify a captured webhook body against a rail's signature scheme
    Verify {
        #[arg(long)]
        rail: String,
        /// File holding the raw body
        #[arg(long)]
        body: PathBuf,
        /// Presented signature; may be empty for rails that embed it
        #[arg(long, default_value = "")]
        signature: String,
        /// Secret to verify with; defaults to the rail's configured secret
        #[arg(long, default_value = "")]
        secret: String,
    },
    /// Start a local webhook listener that verifies and normalizes deliveries
    Listen {
        /// Port to listen on
        #[arg(long, default_value = "3000")]
        port: u16,
    },
}

fn load_provider(config: Option<&Path>, mock: bool) -> Result<Arc<dyn ProviderAdapter>> {
    if mock {
        return Ok(create_mock_provider());
    }
    let path = config.context("either --config or --mock is required")?;
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    let config: ProviderConfig = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a valid provider record", path.display()))?;
    Ok(create_provider_adapter(config)?)
}

fn payment_registry() -> Result<PaymentRegistry> {
    Ok(PaymentRegistry::from_config(&PaymentsConfig::from_env()?)?)
}

async fn run_provider(provider: &dyn ProviderAdapter, action: ProviderCommands) -> Result<()> {
    match action {
        ProviderCommands::Services { currency } => {
            let Some(currency) = currency else {
                let services = provider.get_services().await?;
                println!("{}", serde_json::to_string_pretty(&services)?);
                return Ok(());
            };

            let rates_config = RatesConfig::from_env()?;
            let rates = Arc::new(RateCache::from_config(&rates_config)?);
            let markup = rates_config.currency_markup(&currency);
            let service = MarketplaceService::new(PaymentRegistry::new(), rates, markup);
            for quote in service.quote_services(provider, &currency).await? {
                println!(
                    "{:>8}  {:<40}  {:>14}  [{}-{}]",
                    quote.service.id,
                    quote.service.name,
                    quote.display,
                    quote.service.min,
                    quote.service.max
                );
            }
        }
        ProviderCommands::Balance => match provider.get_balance().await {
            Balance::Known(amount) => println!("{}: {}", provider.name(), amount),
            Balance::Unknown => {
                println!("{}: balance unknown", provider.name());
                std::process::exit(1);
            }
        },
        ProviderCommands::Ping => {
            if provider.test_connection().await {
                println!("✓ {} is reachable", provider.name());
            } else {
                println!("✗ {} is not reachable", provider.name());
                std::process::exit(1);
            }
        }
        ProviderCommands::Order {
            service,
            link,
            quantity,
            runs,
            interval,
        } => {
            let mut params = CreateOrderParams::new(service, link, quantity);
            params.runs = runs;
            params.interval = interval;
            let order = provider.create_order(params).await?;
            println!("{}", serde_json::to_string_pretty(&order)?);
        }
        ProviderCommands::Status { order_id } => {
            let order = provider.get_order_status(&order_id).await?;
            println!("{}", serde_json::to_string_pretty(&order)?);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Provider {
            config,
            mock,
            action,
        } => {
            let provider = load_provider(config.as_deref(), mock)?;
            run_provider(provider.as_ref(), action).await?;
        }

        Commands::Rates { action } => {
            let rates_config = RatesConfig::from_env()?;
            let rates = RateCache::from_config(&rates_config)?;
            match action {
                RateCommands::Table => {
                    let table = rates.fetch_exchange_rates().await;
                    println!("{}", serde_json::to_string_pretty(table.as_ref())?);
                }
                RateCommands::Convert {
                    amount,
                    from,
                    to,
                    markup,
                } => {
                    let markup = markup.unwrap_or_else(|| rates_config.currency_markup(&to));
                    let converted = rates.convert_currency(amount, &from, &to, markup).await;
                    let note = if is_crypto_currency(&to) { " (crypto)" } else { "" };
                    println!(
                        "{} = {}{}",
                        format_currency_with_symbol(amount, &from),
                        format_currency_with_symbol(converted, &to),
                        note
                    );
                }
            }
        }

        Commands::Webhook { action } => match action {
            WebhookCommands::Verify {
                rail,
                body,
                signature,
                secret,
            } => {
                let adapter = payment_registry()?.get_payment_adapter(&rail)?;
                let raw = std::fs::read(&body)
                    .with_context(|| format!("cannot read {}", body.display()))?;

                if !adapter.verify_webhook(&raw, &signature, &secret) {
                    println!("✗ signature does not verify for {}", adapter.name());
                    std::process::exit(1);
                }
                let event = PaymentWebhookEvent::from_body(&raw, None)?;
                let outcome = adapter.handle_webhook(&event)?;
                println!("✓ verified");
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            }
            WebhookCommands::Listen { port } => {
                let registry = Arc::new(payment_registry()?);
                let app = axum::Router::new()
                    .route("/webhooks/{rail}", axum::routing::post(handle_webhook))
                    .with_state(registry);
                let addr = std::net::SocketAddr::from(([127, 0, 0, 1], port));
                println!("Listening for webhooks on {}", addr);
                let listener = tokio::net::TcpListener::bind(&addr).await?;
                axum::serve(listener, app).await?;
            }
        },

        Commands::PaymentStatus { rail, payment_id } => {
            let adapter = payment_registry()?.get_payment_adapter(&rail)?;
            let report = adapter.get_payment_status(&payment_id).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

/// Prints each delivery with its verification result.
async fn handle_webhook(
    axum::extract::State(registry): axum::extract::State<Arc<PaymentRegistry>>,
    axum::extract::Path(rail): axum::extract::Path<String>,
    headers: axum::http::HeaderMap,
    body: axum::body::Bytes,
) -> axum::http::StatusCode {
    println!("POST /webhooks/{} HTTP/1.1", rail);
    for (name, value) in &headers {
        println!("{}: {:?}", name, value);
    }
    println!();
    println!("{}", String::from_utf8_lossy(&body));

    let status = match registry.get_payment_adapter(&rail) {
        Ok(adapter) => report_delivery(adapter.as_ref(), &headers, &body),
        Err(e) => {
            println!("✗ {}", e);
            axum::http::StatusCode::NOT_FOUND
        }
    };
    println!("----------------------------------------");
    status
}

fn report_delivery(
    adapter: &dyn PaymentAdapter,
    headers: &axum::http::HeaderMap,
    body: &[u8],
) -> axum::http::StatusCode {
    let signature = headers
        .get(adapter.signature_header())
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if !adapter.verify_webhook(body, signature, "") {
        println!("✗ signature does not verify");
        return axum::http::StatusCode::UNAUTHORIZED;
    }

    let outcome = PaymentWebhookEvent::from_body(body, Some(signature.to_string()))
        .map_err(|e| e.to_string())
        .and_then(|event| adapter.handle_webhook(&event).map_err(|e| e.to_string()));
    match outcome {
        Ok(outcome) => {
            println!("✓ {} -> {}", outcome.payment_id, outcome.status);
            axum::http::StatusCode::OK
        }
        Err(e) => {
            println!("✗ {}", e);
            axum::http::StatusCode::BAD_REQUEST
        }
    }
}
