// ----- standard library imports
// ----- extra library imports
use axum::extract::{rejection::JsonRejection, Json, State};
use solswap_webapi::swap as web_swap;
// ----- local imports
use crate::error::{Error, Result};
use crate::service::{FreshnessSource, RouteFinder, Service, SwapRequest};

// ----- end imports

pub const HEALTH_MESSAGE: &str = "Solana Swap Backend is running!";

#[utoipa::path(
    get,
    path = "/",
    responses (
        (status = 200, description = "Service is up", body = String, content_type = "text/plain"),
    )
)]
pub async fn health() -> &'static str {
    HEALTH_MESSAGE
}

/// --------------------------- Compose an unsigned swap transaction
#[utoipa::path(
    post,
    path = "/v1/swap/transaction",
    request_body(content = web_swap::SwapTransactionRequest, content_type = "application/json"),
    responses (
        (status = 200, description = "Unsigned transaction, base64 encoded", body = web_swap::SwapTransactionResponse, content_type = "application/json"),
        (status = 400, description = "Invalid request or no route", body = web_swap::ErrorResponse, content_type = "application/json"),
        (status = 502, description = "Routing service or ledger unavailable", body = web_swap::ErrorResponse, content_type = "application/json"),
        (status = 500, description = "Composition failure", body = web_swap::ErrorResponse, content_type = "application/json"),
    )
)]
#[tracing::instrument(level = tracing::Level::DEBUG, skip(ctrl))]
pub async fn swap_transaction<Routes, Ledger>(
    State(ctrl): State<Service<Routes, Ledger>>,
    request: std::result::Result<Json<web_swap::SwapTransactionRequest>, JsonRejection>,
) -> Result<Json<web_swap::SwapTransactionResponse>>
where
    Routes: RouteFinder,
    Ledger: FreshnessSource,
{
    let Json(request) = request.map_err(|e| Error::InvalidRequest(e.body_text()))?;
    let request = SwapRequest::try_from(request)?;
    let transaction = ctrl.swap_transaction(&request).await?;
    Ok(Json(web_swap::SwapTransactionResponse { transaction }))
}

/// --------------------------- Fee and slippage policy
#[utoipa::path(
    get,
    path = "/v1/info",
    responses (
        (status = 200, description = "Successful response", body = web_swap::ServiceInfo, content_type = "application/json"),
    )
)]
#[tracing::instrument(level = tracing::Level::DEBUG, skip(ctrl))]
pub async fn service_info<Routes, Ledger>(
    State(ctrl): State<Service<Routes, Ledger>>,
) -> Json<web_swap::ServiceInfo> {
    Json(ctrl.service_info())
}
