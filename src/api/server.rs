//! API Server Module
//!
//! Provides the Axum application builder and server startup logic.

use axum::{middleware, Router};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use super::middleware::{request_logging_middleware, security_headers_middleware};
use super::routes;
use crate::common::logging::log_system_event;
use crate::services::ConfigurationService;
use crate::storage::TreeRecordStore;

/// Combined application state for all API endpoints
pub struct AppState {
    /// Configuration preset service
    pub configurations: ConfigurationService,
    /// Prepared and created tree records
    pub trees: Arc<dyn TreeRecordStore>,
    /// Directory searched for source archives
    pub archive_dir: PathBuf,
}

/// Shared application state type
pub type SharedAppState = Arc<AppState>;

impl AppState {
    pub fn new(
        configurations: ConfigurationService,
        trees: Arc<dyn TreeRecordStore>,
        archive_dir: impl Into<PathBuf>,
    ) -> SharedAppState {
        Arc::new(Self {
            configurations,
            trees,
            archive_dir: archive_dir.into(),
        })
    }
}

/// Create the API router with all endpoints
pub fn create_router(state: SharedAppState) -> Router {
    // CORS configuration - allow frontend origins
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::health::router())
        .merge(routes::estimate::router())
        .merge(routes::configurations::router())
        .merge(routes::trees::router())
        .merge(routes::download::router())
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(request_logging_middleware))
        .layer(cors)
        .with_state(state)
}

/// Start the API server
pub async fn start_server(state: SharedAppState, port: u16) -> Result<(), std::io::Error> {
    let app = create_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    log_system_event(
        "api_server_started",
        serde_json::json!({ "address": addr.to_string() }),
    );
    tracing::info!(target: "soltree::api", "Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log_system_event("api_server_stopped", serde_json::json!({}));
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(target: "soltree::api", "failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
