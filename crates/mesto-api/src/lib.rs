//! Mesto REST API
//!
//! This crate provides the Axum-based HTTP API for Mesto: account creation
//! and sign-in, user profiles and photo cards.

pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::{AppState, MetricsHandle};
