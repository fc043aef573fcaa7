//! Prometheus exposition

use axum::{
    Router,
    extract::State,
    http::header::CONTENT_TYPE,
    response::IntoResponse,
    routing::get,
};
use std::sync::Arc;

use crate::state::MetricsHandle;

/// Prometheus text format version served on `/metrics`
const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// GET /metrics, outside the auth gate
async fn render(State(handle): State<Arc<MetricsHandle>>) -> impl IntoResponse {
    ([(CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)], handle.render())
}

pub fn routes(handle: Arc<MetricsHandle>) -> Router {
    Router::new().route("/metrics", get(render)).with_state(handle)
}
