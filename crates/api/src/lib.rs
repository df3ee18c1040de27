//! # Storefront API
//!
//! HTTP service layer - routes and the application entry point.
//!
//! This crate contains:
//! - The axum router and shared application state
//! - Route handlers (authenticate, sales cache surface, catalog reads)
//! - API error mapping
//!
//! ## Architecture
//! - Depends on `storefront-core` and `storefront-infra`
//! - Wires up the hexagonal architecture
//! - Serves the interactive read paths that consult the cache first

pub mod error;
pub mod routes;
pub mod server;

// Re-export for convenience
pub use error::ApiError;
pub use server::{router, AppState};
