//! HTTP request handlers.

use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use exchange_rates::format_currency_with_symbol;
use panel_types::AppError;

use crate::MarketplaceService;

/// Application state shared across handlers.
pub struct AppState {
    pub service: MarketplaceService,
}

/// Wrapper to implement IntoResponse for AppError (orphan rule workaround).
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            AppError::GatewayTimeout(msg) => (StatusCode::GATEWAY_TIMEOUT, msg.clone()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = serde_json::json!({
            "error": message,
            "code": status.as_u16()
        });

        (status, Json(body)).into_response()
    }
}

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

/// Current exchange-rate table (fresh, stale or built-in).
#[tracing::instrument(skip(state))]
pub async fn rates(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let table = state.service.rates().fetch_exchange_rates().await;
    Json(table.as_ref().clone())
}

#[derive(Debug, Deserialize)]
pub struct ConvertQuery {
    pub amount: f64,
    pub from: String,
    pub to: String,
}

#[tracing::instrument(skip(state))]
pub async fn convert(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ConvertQuery>,
) -> Result<impl IntoResponse, ApiError> {
    if !q.amount.is_finite() {
        return Err(AppError::BadRequest("Amount must be a number".into()).into());
    }
    let converted = state.service.convert(q.amount, &q.from, &q.to).await;
    Ok(Json(serde_json::json!({
        "amount": q.amount,
        "from": q.from.to_uppercase(),
        "to": q.to.to_uppercase(),
        "converted": converted,
        "formatted": format_currency_with_symbol(converted, &q.to),
        "markup_percent": state.service.markup_percent(),
    })))
}

/// Registered payment rails.
#[tracing::instrument(skip(state))]
pub async fn list_rails(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.service.payment_rails())
}

/// Inbound vendor webhook. The raw body is verified before anything else
/// looks at it.
#[tracing::instrument(skip(state, headers, body), fields(rail = %rail, bytes = body.len()))]
pub async fn webhook(
    State(state): State<Arc<AppState>>,
    Path(rail): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let header = state.service.signature_header(&rail)?;
    let signature = headers
        .get(header)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let outcome = state.service.process_webhook(&rail, &body, signature)?;
    Ok(Json(outcome))
}

/// Live payment status poll.
#[tracing::instrument(skip(state))]
pub async fn payment_status(
    State(state): State<Arc<AppState>>,
    Path((rail, payment_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let report = state.service.payment_status(&rail, &payment_id).await?;
    Ok(Json(report))
}
