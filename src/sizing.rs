//! Tree Account Sizing and Cost Estimation
//!
//! Approximate on-chain footprint of a concurrent Merkle tree account. The
//! layout model is a simplification of the real account-compression layout
//! and is kept as-is so that estimates match the existing front end:
//!
//! ```text
//! header  = 64
//! tree    = 2^(max_depth + 1) * 32
//! buffer  = max_buffer_size * 32
//! canopy  = canopy_depth > 0 ? 2^canopy_depth * 32 : 0
//! ```
//!
//! Callers validate first; the raw functions saturate instead of panicking
//! when handed values outside the validated domain.

use serde::Serialize;

use crate::types::ValidatedParameters;

/// Fixed account header size in bytes
pub const HEADER_SIZE: u64 = 64;

/// Size of one stored node (a 32-byte hash)
pub const NODE_SIZE: u64 = 32;

/// Base creation cost in SOL
pub const BASE_COST_SOL: f64 = 0.01;

/// Additional cost per canopy level in SOL
pub const CANOPY_LEVEL_COST_SOL: f64 = 0.001;

/// Additional cost per 1000 buffer slots in SOL
pub const BUFFER_KILO_SLOT_COST_SOL: f64 = 0.01;

fn nodes_bytes(levels: u32) -> u64 {
    1u64.checked_shl(levels)
        .unwrap_or(u64::MAX)
        .saturating_mul(NODE_SIZE)
}

/// Account size in bytes for the given tree shape
pub fn estimate_account_size(max_depth: u32, max_buffer_size: u32, canopy_depth: u32) -> u64 {
    let tree_size = nodes_bytes(max_depth.saturating_add(1));
    let buffer_size = (max_buffer_size as u64).saturating_mul(NODE_SIZE);
    let canopy_size = if canopy_depth > 0 {
        nodes_bytes(canopy_depth)
    } else {
        0
    };

    HEADER_SIZE
        .saturating_add(tree_size)
        .saturating_add(buffer_size)
        .saturating_add(canopy_size)
}

/// Heuristic creation cost in SOL, formatted with exactly three decimals
///
/// Evaluated in `f64` in the same order as the existing front end. Within the
/// validated domain the cost stays below 0.0625, so no result falls on a
/// rounding tie.
pub fn estimate_creation_cost(canopy_depth: u32, max_buffer_size: u32) -> String {
    let mut cost = BASE_COST_SOL;
    cost += canopy_depth as f64 * CANOPY_LEVEL_COST_SOL;
    cost += (max_buffer_size as f64 / 1000.0) * BUFFER_KILO_SLOT_COST_SOL;

    format!("{:.3}", cost)
}

/// Full estimate for a validated parameter set
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeEstimate {
    pub parameters: ValidatedParameters,
    /// Required account size in bytes
    pub account_size: u64,
    /// Estimated creation cost in SOL ("0.000" format)
    pub estimated_cost: String,
    /// Number of leaves the tree can hold
    pub leaf_capacity: u64,
    /// Proof nodes a client must supply per update
    pub proof_length: u32,
}

/// Size and cost for a validated parameter set
pub fn estimate(params: &ValidatedParameters) -> TreeEstimate {
    TreeEstimate {
        parameters: *params,
        account_size: estimate_account_size(
            params.max_depth(),
            params.max_buffer_size(),
            params.canopy_depth(),
        ),
        estimated_cost: estimate_creation_cost(params.canopy_depth(), params.max_buffer_size()),
        leaf_capacity: 1u64 << params.max_depth(),
        proof_length: params.max_depth() - params.canopy_depth(),
    }
}
