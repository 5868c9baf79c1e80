//! Request guards: global rate limit and admin API key.

use super::{ApiError, AppState};
use crate::config::API_KEY_HEADER;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use subtle::ConstantTimeEq;

/// Reject the request with 429 once the global quota is spent.
pub async fn rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(limiter) = &state.limiter {
        if limiter.check().is_err() {
            tracing::debug!(path = %request.uri().path(), "rate limited");
            return Err(ApiError::RateLimited);
        }
    }
    Ok(next.run(request).await)
}

/// Require `X-Api-Key` to match the configured key.
///
/// The comparison runs in constant time. With no key configured every
/// request is refused.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected) = state.config.api_key.as_deref() else {
        tracing::warn!(path = %request.uri().path(), "admin request refused: no API key configured");
        return Err(ApiError::Unauthorized);
    };

    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .map(|v| v.as_bytes())
        .unwrap_or_default();

    if bool::from(provided.ct_eq(expected.as_bytes())) {
        Ok(next.run(request).await)
    } else {
        tracing::warn!(path = %request.uri().path(), "admin request refused: bad API key");
        Err(ApiError::Unauthorized)
    }
}
