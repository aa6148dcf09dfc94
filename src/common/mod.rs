//! Common Infrastructure Module
//!
//! Shared utilities and configuration for soltree.
//!
//! This module contains:
//! - Configuration loading from environment variables
//! - Structured logging setup
//! - Common error types

pub mod config;
pub mod error;
pub mod logging;

// Re-exports for convenience
pub use config::{ClusterConfig, ConfigError, SoltreeConfig, StoreBackend, DEFAULT_API_PORT};
pub use error::{Result, SoltreeError};
pub use logging::{
    generate_correlation_id, init_from_config, init_logging, log_api_request, log_api_response,
    log_configuration_event, log_system_event, log_tree_event, log_validation_failure,
    ErrorDetails, EventCategory, LogEvent, LogLevel, LoggingError,
};
