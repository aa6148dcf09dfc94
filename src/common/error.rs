//! Common Error Types for soltree
//!
//! Provides unified error handling across all modules.

use thiserror::Error;

use crate::services::ServiceError;
use crate::sol_client::SolError;
use crate::storage::StorageError;
use crate::validation::ValidationError;

/// Root error type for soltree
#[derive(Debug, Error)]
pub enum SoltreeError {
    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(#[from] super::config::ConfigError),

    /// Logging errors
    #[error("logging error: {0}")]
    Logging(#[from] super::logging::LoggingError),

    /// Rejected tree parameters or preset text
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Storage errors
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Service errors
    #[error("service error: {0}")]
    Service(#[from] ServiceError),

    /// Solana-related errors
    #[error("solana error: {0}")]
    Solana(#[from] SolError),

    /// JSON encoding errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SoltreeError {
    /// Check if this is a retryable error
    ///
    /// Nothing inside the crate retries; this only tells callers whether a
    /// second attempt could succeed without changing the input.
    pub fn is_retryable(&self) -> bool {
        match self {
            SoltreeError::Storage(e) => !matches!(
                e,
                StorageError::NotFound(_)
                    | StorageError::Duplicate(_)
                    | StorageError::InvalidData(_)
                    | StorageError::Validation(_)
            ),
            SoltreeError::Service(e) => matches!(e, ServiceError::StoreUnavailable(_)),
            SoltreeError::Solana(e) => matches!(e, SolError::RpcError(_)),
            SoltreeError::Io(_) => true,
            _ => false,
        }
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            SoltreeError::Config(_) => "CONFIG_ERROR",
            SoltreeError::Logging(_) => "LOGGING_ERROR",
            SoltreeError::Validation(e) => e.code(),
            SoltreeError::Storage(_) => "STORAGE_ERROR",
            SoltreeError::Service(e) => e.code(),
            SoltreeError::Solana(_) => "SOLANA_ERROR",
            SoltreeError::Serialization(_) => "SERIALIZATION_ERROR",
            SoltreeError::Io(_) => "IO_ERROR",
        }
    }
}

/// Result type alias using SoltreeError
pub type Result<T> = std::result::Result<T, SoltreeError>;
