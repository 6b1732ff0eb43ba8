//! Request interceptors
//!
//! Each interceptor has one job and either forwards the request or answers
//! it directly. `routes` stacks them in order: auth first, then the guard.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use super::error::ApiError;
use super::handlers::AppState;

/// Reject requests whose `Authorization` header is not the shared secret
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let authorized = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|key| key == state.api_key);

    if !authorized {
        tracing::warn!("Unauthorized access attempt: {} {}", req.method(), req.uri());
        return Err(ApiError::unauthorized("Unauthorized"));
    }
    Ok(next.run(req).await)
}

/// Refuse to serve anything while the state record is inconsistent
pub async fn check_invariants(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Err(e) = state.controller.check_invariants().await {
        tracing::error!("Assertion failed on {} {}: {}", req.method(), req.uri(), e);
        return Err(e.into());
    }
    Ok(next.run(req).await)
}
