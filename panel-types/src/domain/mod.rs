//! Domain models for the vendor normalization layer.

pub mod payment;
pub mod provider;

pub use payment::{
    Customer, PaymentRail, PaymentSession, PaymentSessionRequest, PaymentStatus,
    PaymentStatusReport, PaymentWebhookEvent, RefundResult, SessionStatus, WebhookOutcome,
    WebhookStatus,
};
pub use provider::{
    Balance, CreateOrderParams, FieldMapping, OrderStatus, ProviderConfig, ProviderMeta,
    ProviderOrder, ProviderService, ProviderType,
};
