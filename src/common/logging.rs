//! Structured Logging for soltree
//!
//! Provides structured logging with:
//! - JSON output for log aggregation
//! - Correlation IDs for request tracing
//! - Typed events for configuration and tree lifecycle changes
//!
//! # Usage
//!
//! ```rust,no_run
//! use soltree::common::logging::{init_logging, LogLevel};
//!
//! init_logging(LogLevel::Info, true).expect("logging"); // JSON mode
//! ```

use serde::Serialize;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::validation::ValidationError;

// ============================================================================
// Log Levels
// ============================================================================

/// Application log level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

impl From<&str> for LogLevel {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "trace" => LogLevel::Trace,
            "debug" => LogLevel::Debug,
            "info" => LogLevel::Info,
            "warn" | "warning" => LogLevel::Warn,
            "error" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }
}

impl LogLevel {
    fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

// ============================================================================
// Structured Event Types
// ============================================================================

/// Event categories for structured logging
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    /// API request/response events
    Api,
    /// Configuration preset changes
    Configuration,
    /// Tree allocation and status events
    Tree,
    /// Rejected input
    Validation,
    /// System events (startup, shutdown)
    System,
}

/// Structured log event
#[derive(Debug, Serialize)]
pub struct LogEvent {
    /// Event timestamp (ISO 8601)
    pub timestamp: String,
    /// Log level
    pub level: String,
    /// Event category
    pub category: EventCategory,
    /// Human-readable message
    pub message: String,
    /// Correlation ID for request tracing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    /// Additional structured data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Duration in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// Error details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetails>,
}

/// Error details for error events
#[derive(Debug, Serialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
}

impl LogEvent {
    /// Create a new log event
    pub fn new(level: LogLevel, category: EventCategory, message: impl Into<String>) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            level: level.as_filter().to_uppercase(),
            category,
            message: message.into(),
            correlation_id: None,
            data: None,
            duration_ms: None,
            error: None,
        }
    }

    /// Add correlation ID
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Add structured data
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Add duration
    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Add error details
    pub fn with_error(mut self, code: impl Into<String>, message: impl Into<String>) -> Self {
        self.error = Some(ErrorDetails {
            code: code.into(),
            message: message.into(),
        });
        self
    }

    /// Serialize this event to JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(
                "{{\"error\": \"failed to serialize log\", \"message\": \"{}\"}}",
                self.message
            )
        })
    }
}

// ============================================================================
// Event Helpers
// ============================================================================

/// Log an API request
pub fn log_api_request(method: &str, path: &str, client_ip: Option<&str>, correlation_id: &str) {
    let event = LogEvent::new(LogLevel::Info, EventCategory::Api, format!("{} {}", method, path))
        .with_correlation_id(correlation_id)
        .with_data(serde_json::json!({
            "method": method,
            "path": path,
            "client_ip": client_ip
        }));

    tracing::info!(target: "soltree::api", "{}", event.to_json());
}

/// Log an API response
pub fn log_api_response(
    method: &str,
    path: &str,
    status: u16,
    duration_ms: u64,
    correlation_id: &str,
) {
    let level = if status >= 500 {
        LogLevel::Error
    } else if status >= 400 {
        LogLevel::Warn
    } else {
        LogLevel::Info
    };

    let event = LogEvent::new(level, EventCategory::Api, format!("{} {} -> {}", method, path, status))
        .with_correlation_id(correlation_id)
        .with_duration(duration_ms)
        .with_data(serde_json::json!({
            "method": method,
            "path": path,
            "status": status
        }));

    match level {
        LogLevel::Error => tracing::error!(target: "soltree::api", "{}", event.to_json()),
        LogLevel::Warn => tracing::warn!(target: "soltree::api", "{}", event.to_json()),
        _ => tracing::info!(target: "soltree::api", "{}", event.to_json()),
    }
}

/// Log a configuration store change
pub fn log_configuration_event(
    event_type: &str,
    config_id: &str,
    is_default: bool,
    error: Option<&str>,
) {
    let success = error.is_none();
    let level = if success { LogLevel::Info } else { LogLevel::Error };
    let mut event = LogEvent::new(level, EventCategory::Configuration, event_type)
        .with_correlation_id(config_id)
        .with_data(serde_json::json!({
            "config_id": config_id,
            "is_default": is_default,
            "success": success
        }));

    if let Some(err) = error {
        event = event.with_error("CONFIGURATION_ERROR", err);
    }

    if success {
        tracing::info!(target: "soltree::configuration", "{}", event.to_json());
    } else {
        tracing::error!(target: "soltree::configuration", "{}", event.to_json());
    }
}

/// Log a tree allocation or status event
pub fn log_tree_event(
    event_type: &str,
    tree_address: &str,
    account_size: u64,
    success: bool,
    error: Option<&str>,
) {
    let level = if success { LogLevel::Info } else { LogLevel::Error };
    let mut event = LogEvent::new(level, EventCategory::Tree, event_type)
        .with_correlation_id(tree_address)
        .with_data(serde_json::json!({
            "tree_address": tree_address,
            "account_size": account_size,
            "success": success
        }));

    if let Some(err) = error {
        event = event.with_error("TREE_ERROR", err);
    }

    if success {
        tracing::info!(target: "soltree::tree", "{}", event.to_json());
    } else {
        tracing::error!(target: "soltree::tree", "{}", event.to_json());
    }
}

/// Log rejected parameters (the error itself is still returned to the caller)
pub fn log_validation_failure(context: &str, error: &ValidationError) {
    let event = LogEvent::new(LogLevel::Warn, EventCategory::Validation, context)
        .with_error(error.code(), error.to_string())
        .with_data(serde_json::json!({ "field": error.field() }));

    tracing::warn!(target: "soltree::validation", "{}", event.to_json());
}

/// Log a lifecycle event (startup, shutdown)
pub fn log_system_event(message: &str, data: serde_json::Value) {
    let event = LogEvent::new(LogLevel::Info, EventCategory::System, message).with_data(data);
    tracing::info!(target: "soltree::system", "{}", event.to_json());
}

// ============================================================================
// Initialization
// ============================================================================

/// Initialize the logging system
///
/// Logs go to stderr; stdout is reserved for CLI output.
///
/// # Arguments
/// * `level` - Minimum log level to output
/// * `json_format` - Use JSON format (recommended for production)
pub fn init_logging(level: LogLevel, json_format: bool) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = level.as_filter();
        EnvFilter::new(format!(
            "soltree={},tower_http={},axum={}",
            level, level, level
        ))
    });

    if json_format {
        let subscriber = tracing_subscriber::registry().with(filter).with(
            fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .with_span_events(FmtSpan::CLOSE),
        );

        subscriber
            .try_init()
            .map_err(|e| LoggingError::InitFailed(e.to_string()))?;
    } else {
        let subscriber = tracing_subscriber::registry().with(filter).with(
            fmt::layer()
                .pretty()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true)
                .with_span_events(FmtSpan::CLOSE),
        );

        subscriber
            .try_init()
            .map_err(|e| LoggingError::InitFailed(e.to_string()))?;
    }

    Ok(())
}

/// Initialize logging from SoltreeConfig
pub fn init_from_config(config: &super::config::SoltreeConfig) -> Result<(), LoggingError> {
    init_logging(LogLevel::from(config.log_level.as_str()), config.log_json)
}

/// Logging errors
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("failed to initialize logging: {0}")]
    InitFailed(String),
}

/// Generate a unique correlation ID for request tracing
pub fn generate_correlation_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

// ============================================================================
// Tests
// ============================================================================
