//! # Panel Types
//!
//! Domain types and port traits for the vendor normalization layer of the
//! engagement-services marketplace. This crate has ZERO network or storage
//! dependencies - only data structures, status vocabularies, and the
//! contracts that vendor adapters implement.
//!
//! ## Architecture
//!
//! - `domain/` - Normalized fulfillment and payment types
//! - `ports/` - `ProviderAdapter` and `PaymentAdapter` contracts
//! - `wire/` - Lenient readers for loosely typed vendor JSON
//! - `error/` - Upstream, registry, and application error types

pub mod domain;
pub mod error;
pub mod ports;
pub mod wire;

// Re-export commonly used types
pub use domain::{
    Balance, CreateOrderParams, Customer, FieldMapping, OrderStatus, PaymentRail, PaymentSession,
    PaymentSessionRequest, PaymentStatus, PaymentStatusReport, PaymentWebhookEvent,
    ProviderConfig, ProviderMeta, ProviderOrder, ProviderService, ProviderType, RefundResult,
    SessionStatus, WebhookOutcome, WebhookStatus,
};
pub use error::{AppError, RegistryError, UpstreamError};
pub use ports::{PaymentAdapter, ProviderAdapter, Refundable};
