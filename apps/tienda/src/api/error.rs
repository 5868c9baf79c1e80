//! API error type and its HTTP mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tienda_core::ShopError;

/// Every way a request can fail.
#[derive(Debug)]
pub enum ApiError {
    /// A core operation refused the request.
    Shop(ShopError),
    /// The change was valid but could not be persisted.
    Persist(ShopError),
    /// Malformed path or query parameter.
    BadRequest(String),
    /// Missing or wrong API key.
    Unauthorized,
    /// Global rate limit exceeded.
    RateLimited,
    /// No such route.
    NoRoute,
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

impl From<ShopError> for ApiError {
    fn from(err: ShopError) -> Self {
        Self::Shop(err)
    }
}

fn shop_status(err: &ShopError) -> StatusCode {
    match err {
        ShopError::NotFound { .. } => StatusCode::NOT_FOUND,
        ShopError::Conflict(_)
        | ShopError::InsufficientStock { .. }
        | ShopError::Unavailable { .. }
        | ShopError::InvalidTransition { .. }
        | ShopError::EmptyCart
        | ShopError::CartClosed(_) => StatusCode::CONFLICT,
        ShopError::Validation { .. }
        | ShopError::NoShippingTariff { .. }
        | ShopError::NoBankAccount(_)
        | ShopError::Overflow => StatusCode::UNPROCESSABLE_ENTITY,
        ShopError::Storage(_) | ShopError::Format(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Shop(err) => shop_status(err),
            Self::Persist(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::NoRoute => StatusCode::NOT_FOUND,
        }
    }

    fn body(&self) -> ErrorBody {
        match self {
            // Server-side failures are logged, never echoed.
            Self::Shop(err) if shop_status(err).is_server_error() => ErrorBody {
                error: err.kind(),
                message: "internal server error".to_string(),
            },
            Self::Shop(err) => ErrorBody {
                error: err.kind(),
                message: err.to_string(),
            },
            Self::Persist(_) => ErrorBody {
                error: "storage",
                message: "the change could not be saved".to_string(),
            },
            Self::BadRequest(message) => ErrorBody {
                error: "bad_request",
                message: message.clone(),
            },
            Self::Unauthorized => ErrorBody {
                error: "unauthorized",
                message: "missing or invalid API key".to_string(),
            },
            Self::RateLimited => ErrorBody {
                error: "rate_limited",
                message: "too many requests".to_string(),
            },
            Self::NoRoute => ErrorBody {
                error: "not_found",
                message: "no such route".to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        }
        (status, Json(self.body())).into_response()
    }
}
