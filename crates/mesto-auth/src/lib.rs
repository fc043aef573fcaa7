//! Mesto Authentication and Authorization
//!
//! This crate turns an email and password into a signed, seven-day JWT and
//! guards protected routes with a middleware that resolves the caller's
//! user id from that token. There is one identity (the user id) and one
//! gate (authenticated or not).

pub mod credentials;
pub mod error;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod secret;

pub use credentials::{CredentialChecker, CredentialStore};
pub use error::AuthError;
pub use jwt::{Claims, IssuedToken, JwtManager, TOKEN_TTL_DAYS};
pub use middleware::{AuthUser, authorize, require_auth};
pub use password::{hash_password, verify_password};
pub use secret::{Environment, SecretProvider, StaticSecret, resolve_signing_secret};
