// ----- standard library imports
// ----- extra library imports
use axum::http::StatusCode;
use axum::Json;
use solswap_webapi::swap::ErrorResponse;
use thiserror::Error;
// ----- local imports

// ----- end imports

pub type Result<T> = std::result::Result<T, Error>;
#[derive(Debug, Error)]
pub enum Error {
    // external errors wrappers
    #[error("routing service unavailable: {0}")]
    RoutingServiceUnavailable(anyhow::Error),
    #[error("freshness token unavailable: {0}")]
    FreshnessUnavailable(anyhow::Error),
    #[error("bincode error: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("amount overflow")]
    AmountOverflow,
    #[error("No swap routes found")]
    NoRouteFound,
    #[error("composition failed: {0}")]
    CompositionFailed(String),
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Error::InvalidAmount(_) => StatusCode::BAD_REQUEST,
            Error::NoRouteFound => StatusCode::BAD_REQUEST,

            Error::RoutingServiceUnavailable(_) => StatusCode::BAD_GATEWAY,
            Error::FreshnessUnavailable(_) => StatusCode::BAD_GATEWAY,

            Error::CompositionFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::AmountOverflow => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Bincode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl axum::response::IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let message = match &self {
            Error::InvalidRequest(_) | Error::InvalidAmount(_) | Error::NoRouteFound => {
                tracing::debug!("request rejected: {}", self);
                self.to_string()
            }
            Error::RoutingServiceUnavailable(_) => {
                tracing::error!("Error --> axum::Response: {:?}", self);
                String::from("routing service unavailable")
            }
            Error::FreshnessUnavailable(_) => {
                tracing::error!("Error --> axum::Response: {:?}", self);
                String::from("ledger unavailable")
            }
            Error::CompositionFailed(_) | Error::AmountOverflow | Error::Bincode(_) => {
                tracing::error!("Error --> axum::Response: {:?}", self);
                String::from("internal error")
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
