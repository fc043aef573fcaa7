//! Application state

use mesto_auth::{AuthError, CredentialChecker, JwtManager};
use mesto_db::Database;
use std::sync::Arc;

/// Prometheus handle used to render the `/metrics` endpoint
pub type MetricsHandle = metrics_exporter_prometheus::PrometheusHandle;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub jwt: Arc<JwtManager>,
    pub credentials: Arc<CredentialChecker>,
}

impl AppState {
    pub fn new(db: Database, jwt: Arc<JwtManager>) -> Result<Self, AuthError> {
        let credentials = Arc::new(CredentialChecker::new(Arc::new(db.clone()))?);
        Ok(Self {
            db,
            jwt,
            credentials,
        })
    }
}
