//! Storage Trait Definitions
//!
//! Defines abstract storage interfaces for configuration presets and tree
//! records. Implementations can use SQLite (production), a JSON file (local
//! keyed persistence) or memory (testing).

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{
    NewTreeConfiguration, TreeConfiguration, TreeConfigurationPatch, TreeRecord, TreeStatus,
};
use crate::validation::ValidationError;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Duplicate record: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A merged update would break the parameter rules
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Configuration preset storage interface
///
/// Every implementation upholds the default invariant: at most one record
/// has `is_default = true`, and promoting one record demotes all others in
/// the same atomic step. Deleting the default never promotes another record.
///
/// `create` trusts its input; the service validates new presets first.
/// `update` merges the patch and validates the whole record inside the same
/// lock or transaction as the write, so a concurrent update can never leave
/// `canopy_depth > max_depth` behind.
///
/// Implementations:
/// - `SqliteStore` - Production storage with SQLite
/// - `FileConfigurationStore` - JSON file under a single lock
/// - `MemoryConfigurationStore` - In-memory storage for testing
#[async_trait]
pub trait ConfigurationStore: Send + Sync {
    /// Insert a new configuration, demoting the others if it is a default
    async fn create(&self, new: NewTreeConfiguration) -> StorageResult<TreeConfiguration>;

    /// All configurations, oldest first
    async fn list(&self) -> StorageResult<Vec<TreeConfiguration>>;

    /// Get a configuration by ID
    async fn get(&self, id: &str) -> StorageResult<Option<TreeConfiguration>>;

    /// The current default configuration, if any
    async fn get_default(&self) -> StorageResult<Option<TreeConfiguration>>;

    /// Merge a partial update into an existing configuration
    ///
    /// Fails with `StorageError::Validation` and leaves the record untouched
    /// when the merged parameters are invalid.
    async fn update(
        &self,
        id: &str,
        patch: TreeConfigurationPatch,
    ) -> StorageResult<TreeConfiguration>;

    /// Delete a configuration by ID
    async fn delete(&self, id: &str) -> StorageResult<()>;

    /// Make `id` the only default configuration
    async fn set_default(&self, id: &str) -> StorageResult<TreeConfiguration>;
}

/// Tree record storage interface
#[async_trait]
pub trait TreeRecordStore: Send + Sync {
    /// Insert a new tree record (tree address must be unique)
    async fn insert(&self, record: &TreeRecord) -> StorageResult<()>;

    /// All records, oldest first
    async fn list(&self) -> StorageResult<Vec<TreeRecord>>;

    /// Get a record by ID
    async fn get(&self, id: &str) -> StorageResult<Option<TreeRecord>>;

    /// Update status, and the signature when one is given
    async fn update_status(
        &self,
        id: &str,
        status: TreeStatus,
        transaction_signature: Option<String>,
    ) -> StorageResult<TreeRecord>;

    /// Delete a record by ID
    async fn delete(&self, id: &str) -> StorageResult<()>;
}
