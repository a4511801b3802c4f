//! HTTP server for precisd.
//!
//! This module provides:
//! - Configuration and secrets loading (`config`)
//! - Bearer-key authentication (`auth`)
//! - The axum router and handlers (`routes`)
//! - Request id, timing, security header and CORS middleware (`middleware`)

pub mod auth;
pub mod config;
pub mod middleware;
pub mod routes;

pub use auth::ApiKeys;
pub use config::{Config, Secrets, StoreBackend};
pub use middleware::cors_layer;
pub use routes::{AppState, build_router};
