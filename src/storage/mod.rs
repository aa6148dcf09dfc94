//! Storage Layer Module
//!
//! Provides persistence for configuration presets and tree records.
//!
//! This module contains:
//! - Storage trait definitions for abstraction
//! - SQLite implementation for production
//! - JSON file implementation for local, single-process use
//! - In-memory implementation for testing

pub mod file;
pub mod memory;
pub mod sqlite;
pub mod traits;

// Re-exports for convenience
pub use file::FileConfigurationStore;
pub use memory::{MemoryConfigurationStore, MemoryTreeRecordStore};
pub use sqlite::SqliteStore;
pub use traits::{ConfigurationStore, StorageError, StorageResult, TreeRecordStore};

use std::sync::Arc;

use crate::common::config::{SoltreeConfig, StoreBackend};

/// Stores selected by configuration
#[derive(Clone)]
pub struct Stores {
    pub configurations: Arc<dyn ConfigurationStore>,
    pub trees: Arc<dyn TreeRecordStore>,
}

/// Open the stores named by `config.store`
///
/// - `sqlite`: presets and tree records share one database
/// - `file`: presets in the JSON file, tree records in the SQLite database
/// - `memory`: both in memory
pub fn open_stores(config: &SoltreeConfig) -> StorageResult<Stores> {
    let stores = match config.store {
        StoreBackend::Sqlite => {
            let store = Arc::new(SqliteStore::new(&config.db_path)?);
            Stores {
                configurations: store.clone(),
                trees: store,
            }
        }
        StoreBackend::File => Stores {
            configurations: Arc::new(FileConfigurationStore::new(&config.config_file)),
            trees: Arc::new(SqliteStore::new(&config.db_path)?),
        },
        StoreBackend::Memory => Stores {
            configurations: Arc::new(MemoryConfigurationStore::new()),
            trees: Arc::new(MemoryTreeRecordStore::new()),
        },
    };

    tracing::debug!(target: "soltree::storage", backend = ?config.store, "stores opened");
    Ok(stores)
}
