//! HTTP API server for the Trove asset metadata service.
//!
//! This crate provides the HTTP surface over per-asset metadata:
//! - Read all or selected keys, with reference redirects
//! - Overlay writes and single-key writes
//! - Deletes of all or one key
//! - Bearer-token authentication and the permission gate adapter
//! - Health and Prometheus endpoints

pub mod auth;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod routes;
pub mod state;

pub use auth::{AuthenticatedUser, TraceId};
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
