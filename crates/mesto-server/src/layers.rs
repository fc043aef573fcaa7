//! Transport layers wrapped around the API router

use anyhow::{Context, Result};
use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method, header};
use std::sync::Arc;
use std::time::Duration;
use tower_governor::GovernorLayer;
use tower_governor::governor::GovernorConfigBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::info;

use crate::config::{CorsConfig, RateLimitConfig};

/// How often idle per-client rate limit state is dropped
const RATE_LIMIT_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Baseline security headers, set only when a handler has not set them
const SECURITY_HEADERS: &[(&str, &str)] = &[
    ("content-security-policy", "default-src 'none'; frame-ancestors 'none'"),
    ("cross-origin-opener-policy", "same-origin"),
    ("cross-origin-resource-policy", "same-origin"),
    ("origin-agent-cluster", "?1"),
    ("referrer-policy", "no-referrer"),
    ("strict-transport-security", "max-age=15552000; includeSubDomains"),
    ("x-content-type-options", "nosniff"),
    ("x-dns-prefetch-control", "off"),
    ("x-download-options", "noopen"),
    ("x-frame-options", "SAMEORIGIN"),
    ("x-permitted-cross-domain-policies", "none"),
    ("x-xss-protection", "0"),
];

/// Build the CORS layer, or `None` when no origins are configured
pub fn cors_layer(config: &CorsConfig) -> Result<Option<CorsLayer>> {
    if config.allowed_origins.is_empty() {
        return Ok(None);
    }

    let origins = config
        .allowed_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin)
                .with_context(|| format!("Invalid CORS origin: {}", origin))
        })
        .collect::<Result<Vec<_>>>()?;

    let layer = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    Ok(Some(layer))
}

/// Add the baseline security headers to every response
pub fn with_security_headers(app: Router) -> Router {
    SECURITY_HEADERS.iter().fold(app, |app, &(name, value)| {
        app.layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        ))
    })
}

/// Limit each client IP to `requests` per `window_secs`.
///
/// Needs the peer address, so the server must be run with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn with_rate_limit(app: Router, config: &RateLimitConfig) -> Result<Router> {
    if !config.enabled {
        info!("Rate limiting disabled");
        return Ok(app);
    }
    if config.requests == 0 || config.window_secs == 0 {
        anyhow::bail!("rate_limit.requests and rate_limit.window_secs must be positive");
    }

    // One request is replenished every window/requests; a full window's worth may burst
    let period = Duration::from_secs(config.window_secs) / config.requests;
    let governor_config = GovernorConfigBuilder::default()
        .period(period.max(Duration::from_millis(1)))
        .burst_size(config.requests)
        .use_headers()
        .finish()
        .context("Invalid rate limit configuration")?;
    let governor_config = Arc::new(governor_config);

    let limiter = governor_config.limiter().clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(RATE_LIMIT_CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            limiter.retain_recent();
        }
    });

    info!(
        "Rate limiting to {} requests per {}s per client",
        config.requests, config.window_secs
    );

    Ok(app.layer(GovernorLayer {
        config: governor_config,
    }))
}
