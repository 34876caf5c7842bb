//! Axum HTTP API server.
//!
//! This crate provides:
//! - Video registration, listing, status and deletion endpoints
//! - Health, readiness and Prometheus metrics endpoints
//! - Security headers, request ids and request logging
//! - The `reel-api` binary, which also runs the processing executor

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::{ApiConfig, AppConfig};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
