//! Mesto - photo sharing API server

use anyhow::{Context, Result};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;
mod layers;

use config::{Config, LoggingConfig};
use mesto_api::{AppState, create_router};
use mesto_auth::{Environment, JwtManager, resolve_signing_secret};
use mesto_db::Database;

/// Mesto - photo sharing API server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    /// Bind address
    #[arg(long, env = "MESTO_BIND")]
    bind: Option<String>,

    /// Port
    #[arg(short, long, env = "MESTO_PORT")]
    port: Option<u16>,

    /// Deployment environment (development or production)
    #[arg(long, env = "MESTO_ENV")]
    environment: Option<Environment>,

    /// Token signing secret
    #[arg(long, env = "MESTO_JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration
    let mut config = Config::load(&args.config)?;
    if let Some(environment) = args.environment {
        config.auth.environment = environment;
    }
    if args.jwt_secret.is_some() {
        config.auth.jwt_secret = args.jwt_secret;
    }

    // Initialize logging
    init_logging(&config.logging);

    info!(
        "Starting Mesto v{} ({})",
        env!("CARGO_PKG_VERSION"),
        config.auth.environment
    );

    // A production deployment without a usable secret never starts
    let secret = resolve_signing_secret(config.auth.environment, config.auth.jwt_secret.as_deref())
        .context("Invalid signing secret configuration")?;
    let jwt = Arc::new(JwtManager::new(Arc::new(secret)));

    // Create data directory
    if let Some(parent) = Path::new(&config.database.path).parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }

    // Initialize database
    let db_path = format!("sqlite:{}?mode=rwc", config.database.path);
    let db = Database::new(&db_path).await?;

    // Install metrics recorder
    let metrics_handle = match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(Arc::new(handle)),
        Err(e) => {
            warn!("Failed to install metrics recorder, /metrics disabled: {}", e);
            None
        }
    };

    // Create application state
    let state = AppState::new(db, jwt)?;

    // Create router
    let mut app = create_router(state, metrics_handle);
    app = layers::with_security_headers(app);
    app = layers::with_rate_limit(app, &config.rate_limit)?;
    if let Some(cors) = layers::cors_layer(&config.cors)? {
        app = app.layer(cors);
    }
    let app = app.layer(TraceLayer::new_for_http());

    // Determine bind address
    let bind_addr = args.bind.unwrap_or(config.server.bind_address);
    let port = args.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", bind_addr, port).parse()?;

    info!("Listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server stopped");
    Ok(())
}

/// Initialize logging
fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let registry = tracing_subscriber::registry().with(filter);
    if config.format == "json" {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
