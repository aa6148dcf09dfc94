//! API Layer Module
//!
//! HTTP server, routes and middleware.

pub mod middleware;
pub mod routes;
pub mod server;

// Re-exports for convenience
pub use middleware::ApiError;
pub use server::{create_router, start_server, AppState, SharedAppState};
