//! HTTP Inbound Adapter
//!
//! Axum-based HTTP server exposing webhooks, rates and payment status.

mod handlers;
mod server;

pub use server::HttpServer;
