//! API Routes Module
//!
//! Route handlers organized by domain:
//! - health: Liveness check
//! - estimate: Size and cost estimation
//! - configurations: Preset CRUD and default selection
//! - trees: Tree allocation records
//! - download: Source archive download

pub mod configurations;
pub mod download;
pub mod estimate;
pub mod health;
pub mod trees;
