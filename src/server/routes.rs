//! Route definitions

use std::sync::Arc;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;

use super::handlers::{
    load_model, start_transcribe, status, stop, unload_model, version, AppState,
};
use super::interceptors::{check_invariants, require_auth};

/// Create the control API router
///
/// Read-only routes pass the invariant check only. Control routes run
/// auth, then the invariant check, before the handler.
pub fn api_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let read_only = Router::new()
        .route("/version", get(version))
        .route("/status", get(status))
        .route_layer(from_fn_with_state(state.clone(), check_invariants));

    let control = Router::new()
        .route("/load_model", post(load_model))
        .route("/unload_model", post(unload_model))
        .route("/start_transcribe", post(start_transcribe))
        .route("/stop", post(stop))
        .route_layer(
            ServiceBuilder::new()
                .layer(from_fn_with_state(state.clone(), require_auth))
                .layer(from_fn_with_state(state, check_invariants)),
        );

    read_only.merge(control)
}
