//! Domain Services Module
//!
//! Business logic sitting between the transport surfaces (HTTP, CLI) and the
//! storage layer:
//! - Configuration preset management

pub mod configuration;

use thiserror::Error;

use crate::storage::StorageError;
use crate::validation::ValidationError;

pub use configuration::ConfigurationService;

/// Service-level error taxonomy
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("configuration not found: {0}")]
    NotFound(String),

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl ServiceError {
    /// Error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Validation(e) => e.code(),
            ServiceError::NotFound(_) => "NOT_FOUND",
            ServiceError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
        }
    }
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(id) => ServiceError::NotFound(id),
            StorageError::Validation(e) => ServiceError::Validation(e),
            other => ServiceError::StoreUnavailable(other.to_string()),
        }
    }
}
