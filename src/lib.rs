//! soltree - Compressed Merkle Tree Sizing and Configuration Presets
//!
//! Sizes, validates and prepares Solana compressed Merkle tree accounts.
//!
//! ## Core
//!
//! 1. **Parameter validation** - range checks plus `canopy_depth <= max_depth`
//! 2. **Sizing** - account size in bytes and approximate creation cost
//!
//! ## Around the core
//!
//! - Named configuration presets with a single default, over memory,
//!   SQLite or JSON file stores
//! - Allocation transactions prepared against a cluster RPC, left for the
//!   wallet to sign
//! - HTTP API and operator CLI

pub mod api;
pub mod common;
pub mod services;
pub mod sizing;
pub mod sol_client;
pub mod storage;
pub mod types;
pub mod validation;

// Re-exports: core
pub use sizing::{estimate, estimate_account_size, estimate_creation_cost, TreeEstimate};
pub use validation::{validate, ValidationError};

// Re-exports: types
pub use types::{
    Network, NewTreeConfiguration, TreeConfiguration, TreeConfigurationPatch, TreeParameters,
    TreeRecord, TreeStatus, ValidatedParameters,
};

// Re-exports: infrastructure
pub use common::{Result, SoltreeConfig, SoltreeError};
pub use services::{ConfigurationService, ServiceError};
pub use sol_client::{
    prepare_tree_allocation, ClusterRpc, PreparedTree, SolError, SolanaRpc,
    ACCOUNT_COMPRESSION_PROGRAM_ID,
};
pub use storage::{ConfigurationStore, StorageError, TreeRecordStore};
