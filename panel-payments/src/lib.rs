//! Payment rail adapters.
//!
//! Two rails implement [`panel_types::PaymentAdapter`]: a card rail
//! ([`KorapayAdapter`]) and a crypto rail ([`CryptomusAdapter`]). The
//! [`PaymentRegistry`] owns the constructed set.

mod client;
pub mod config;
pub mod cryptomus;
pub mod korapay;
pub mod registry;
pub mod security;

pub use config::{CryptomusConfig, KorapayConfig, PaymentsConfig};
pub use cryptomus::CryptomusAdapter;
pub use korapay::KorapayAdapter;
pub use registry::PaymentRegistry;
