//! Shared Types Module
//!
//! Data types shared across the soltree crate.

pub mod configuration;
pub mod params;
pub mod tree;

// Re-exports for convenience
pub use configuration::{
    NewTreeConfiguration, TreeConfiguration, TreeConfigurationPatch, MAX_DESCRIPTION_LEN,
    MAX_NAME_LEN,
};
pub use params::{
    Network, TreeParameters, ValidatedParameters, MAX_CANOPY_DEPTH, MAX_MAX_BUFFER_SIZE,
    MAX_MAX_DEPTH, MIN_CANOPY_DEPTH, MIN_MAX_BUFFER_SIZE, MIN_MAX_DEPTH,
};
pub use tree::{TreeRecord, TreeStatus};
