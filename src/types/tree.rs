//! Tree Record Types
//!
//! Tracks tree accounts prepared for creation:
//! pending → submitted → confirmed | failed

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::params::{Network, ValidatedParameters};

/// Status of a tree account through its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeStatus {
    /// Allocation transaction prepared, not yet signed by the payer
    Pending,
    /// Signed and sent by the wallet collaborator
    Submitted,
    /// Transaction confirmed on the cluster
    Confirmed,
    /// Simulation, submission or confirmation failed
    Failed,
}

impl Default for TreeStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl std::fmt::Display for TreeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Submitted => "submitted",
            Self::Confirmed => "confirmed",
            Self::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for TreeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "submitted" => Ok(Self::Submitted),
            "confirmed" => Ok(Self::Confirmed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("unknown status: {}", s)),
        }
    }
}

/// A tree account created (or being created) by this service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeRecord {
    pub id: String,
    /// Base58 address of the tree account
    pub tree_address: String,
    pub network: Network,
    pub canopy_depth: i64,
    pub max_depth: i64,
    pub max_buffer_size: i64,
    /// Signature reported by the wallet once submitted
    pub transaction_signature: Option<String>,
    pub status: TreeStatus,
    pub created_at: DateTime<Utc>,
}

impl TreeRecord {
    pub fn new(tree_address: String, params: &ValidatedParameters) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            tree_address,
            network: params.network(),
            canopy_depth: params.canopy_depth() as i64,
            max_depth: params.max_depth() as i64,
            max_buffer_size: params.max_buffer_size() as i64,
            transaction_signature: None,
            status: TreeStatus::Pending,
            created_at: Utc::now(),
        }
    }

    /// Terminal states never change again
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, TreeStatus::Confirmed | TreeStatus::Failed)
    }
}
