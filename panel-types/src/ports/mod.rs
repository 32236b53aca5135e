//! Port traits (interfaces for adapters).
//!
//! These are the contracts that vendor adapters must implement.
//! Callers depend on these traits, never on a concrete vendor.

mod payment;
mod provider;

pub use payment::{PaymentAdapter, Refundable};
pub use provider::ProviderAdapter;
