//! Signing secret management
//!
//! The token signing secret is built once at startup and handed to the
//! [`JwtManager`](crate::JwtManager) as an `Arc<dyn SecretProvider>`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::error::AuthError;

/// Well-known secret used when a development deployment has none configured
pub const DEV_SECRET: &str = "dev-secret";

/// Minimum secret length accepted in production (256 bits for HS256)
pub const MIN_PRODUCTION_SECRET_LEN: usize = 32;

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!("Invalid environment: {}", other)),
        }
    }
}

/// Source of the HMAC key used to sign and verify tokens
pub trait SecretProvider: Send + Sync {
    fn signing_secret(&self) -> &[u8];
}

/// Secret fixed for the lifetime of the process
#[derive(Clone)]
pub struct StaticSecret(Vec<u8>);

impl StaticSecret {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self(secret.into())
    }
}

impl fmt::Debug for StaticSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StaticSecret(<redacted>)")
    }
}

impl SecretProvider for StaticSecret {
    fn signing_secret(&self) -> &[u8] {
        &self.0
    }
}

/// Pick the signing secret for an environment.
///
/// Development falls back to [`DEV_SECRET`] when nothing is configured.
/// Production requires a configured secret of at least
/// [`MIN_PRODUCTION_SECRET_LEN`] bytes and fails otherwise.
pub fn resolve_signing_secret(
    environment: Environment,
    configured: Option<&str>,
) -> Result<StaticSecret, AuthError> {
    let configured = configured.map(str::trim).filter(|s| !s.is_empty());

    match (environment, configured) {
        (Environment::Production, Some(secret)) if secret.len() < MIN_PRODUCTION_SECRET_LEN => {
            Err(AuthError::InvalidSecret(format!(
                "production secret must be at least {} bytes",
                MIN_PRODUCTION_SECRET_LEN
            )))
        }
        (Environment::Production, None) => Err(AuthError::InvalidSecret(
            "no signing secret configured for production".to_string(),
        )),
        (_, Some(secret)) => Ok(StaticSecret::new(secret)),
        (Environment::Development, None) => {
            warn!("No JWT secret configured, using the development fallback secret");
            Ok(StaticSecret::new(DEV_SECRET))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_development_falls_back() {
        let secret = resolve_signing_secret(Environment::Development, None).unwrap();
        assert_eq!(secret.signing_secret(), DEV_SECRET.as_bytes());

        let secret = resolve_signing_secret(Environment::Development, Some("   ")).unwrap();
        assert_eq!(secret.signing_secret(), DEV_SECRET.as_bytes());
    }

    #[test]
    fn test_development_uses_configured_secret() {
        let secret = resolve_signing_secret(Environment::Development, Some("short")).unwrap();
        assert_eq!(secret.signing_secret(), b"short");
    }

    #[test]
    fn test_production_requires_secret() {
        let result = resolve_signing_secret(Environment::Production, None);
        assert!(matches!(result, Err(AuthError::InvalidSecret(_))));

        let result = resolve_signing_secret(Environment::Production, Some(""));
        assert!(matches!(result, Err(AuthError::InvalidSecret(_))));

        let result = resolve_signing_secret(Environment::Production, Some("too-short"));
        assert!(matches!(result, Err(AuthError::InvalidSecret(_))));

        let strong = "0123456789abcdef0123456789abcdef";
        let secret = resolve_signing_secret(Environment::Production, Some(strong)).unwrap();
        assert_eq!(secret.signing_secret(), strong.as_bytes());
    }

    #[test]
    fn test_environment_parsing() {
        assert_eq!("production".parse::<Environment>(), Ok(Environment::Production));
        assert_eq!("Dev".parse::<Environment>(), Ok(Environment::Development));
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let secret = StaticSecret::new("super-secret");
        assert!(!format!("{:?}", secret).contains("super-secret"));
    }
}
