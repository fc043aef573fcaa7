//! API routes

mod auth;
mod cards;
mod health;
pub mod metrics;
pub mod types;
mod users;
mod validation;

use axum::{Router, middleware};
use mesto_auth::require_auth;
use std::sync::Arc;

use crate::error::ApiError;
use crate::state::{AppState, MetricsHandle};

/// Fallback for unknown paths; sits behind the auth gate like the API it guards
async fn not_found() -> ApiError {
    ApiError::NotFound("Page not found".to_string())
}

/// Create the main router
///
/// `/signup`, `/signin` and the health endpoints are open. Every other route,
/// including the fallback, passes through [`require_auth`] first.
pub fn create_router(state: AppState, metrics_handle: Option<Arc<MetricsHandle>>) -> Router {
    let protected = Router::new()
        .merge(users::routes())
        .merge(cards::routes())
        .merge(auth::protected_routes())
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.jwt.clone(), require_auth));

    let mut router = Router::new()
        // Health check
        .merge(health::routes())
        // Account creation and sign-in
        .merge(auth::public_routes())
        .merge(protected)
        .with_state(state);

    // Add metrics endpoint if handle is provided
    if let Some(handle) = metrics_handle {
        router = router.merge(metrics::routes(handle));
    }

    router
}
