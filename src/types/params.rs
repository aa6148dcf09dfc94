//! Tree Parameter Types
//!
//! Raw caller-supplied parameters for a concurrent Merkle tree account and the
//! validated form produced by [`crate::validation::validate`].

use serde::{Deserialize, Serialize};

/// Minimum allowed tree height
pub const MIN_MAX_DEPTH: i64 = 5;
/// Maximum allowed tree height
pub const MAX_MAX_DEPTH: i64 = 30;

/// Minimum allowed canopy depth
pub const MIN_CANOPY_DEPTH: i64 = 0;
/// Maximum allowed canopy depth (also bounded by `max_depth`)
pub const MAX_CANOPY_DEPTH: i64 = 20;

/// Minimum number of concurrent buffer slots
pub const MIN_MAX_BUFFER_SIZE: i64 = 8;
/// Maximum number of concurrent buffer slots
pub const MAX_MAX_BUFFER_SIZE: i64 = 2048;

/// Target deployment cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Network {
    #[serde(rename = "devnet")]
    Devnet,
    #[serde(rename = "mainnet-beta")]
    MainnetBeta,
}

impl Default for Network {
    fn default() -> Self {
        Self::Devnet
    }
}

impl Network {
    /// Public cluster RPC endpoint for this network
    pub fn default_rpc_url(&self) -> &'static str {
        match self {
            Network::Devnet => "https://api.devnet.solana.com",
            Network::MainnetBeta => "https://api.mainnet-beta.solana.com",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Devnet => "devnet",
            Network::MainnetBeta => "mainnet-beta",
        }
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "devnet" | "dev" => Ok(Network::Devnet),
            "mainnet-beta" | "mainnet" => Ok(Network::MainnetBeta),
            _ => Err(format!("unknown network: {}", s)),
        }
    }
}

/// Unvalidated tree parameters as supplied by a caller
///
/// Fields are signed so that out-of-range input (including negatives) survives
/// deserialization and is reported by the validator instead of the JSON layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeParameters {
    pub canopy_depth: i64,
    pub max_depth: i64,
    pub max_buffer_size: i64,
    #[serde(default)]
    pub network: Network,
}

impl TreeParameters {
    pub fn new(canopy_depth: i64, max_depth: i64, max_buffer_size: i64, network: Network) -> Self {
        Self {
            canopy_depth,
            max_depth,
            max_buffer_size,
            network,
        }
    }
}

/// Tree parameters that passed range and invariant checks
///
/// Only constructible through [`crate::validation::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedParameters {
    canopy_depth: u32,
    max_depth: u32,
    max_buffer_size: u32,
    network: Network,
}

impl ValidatedParameters {
    pub(crate) fn new_unchecked(
        canopy_depth: u32,
        max_depth: u32,
        max_buffer_size: u32,
        network: Network,
    ) -> Self {
        Self {
            canopy_depth,
            max_depth,
            max_buffer_size,
            network,
        }
    }

    pub fn canopy_depth(&self) -> u32 {
        self.canopy_depth
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn max_buffer_size(&self) -> u32 {
        self.max_buffer_size
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// Back to the raw form, e.g. for persistence
    pub fn into_raw(self) -> TreeParameters {
        TreeParameters {
            canopy_depth: self.canopy_depth as i64,
            max_depth: self.max_depth as i64,
            max_buffer_size: self.max_buffer_size as i64,
            network: self.network,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_parsing() {
        assert_eq!("devnet".parse::<Network>(), Ok(Network::Devnet));
        assert_eq!("mainnet-beta".parse::<Network>(), Ok(Network::MainnetBeta));
        assert_eq!("MAINNET".parse::<Network>(), Ok(Network::MainnetBeta));
        assert!("testnet".parse::<Network>().is_err());
    }

    #[test]
    fn test_network_wire_format() {
        let json = serde_json::to_string(&Network::MainnetBeta).unwrap();
        assert_eq!(json, "\"mainnet-beta\"");

        let parsed: Network = serde_json::from_str("\"devnet\"").unwrap();
        assert_eq!(parsed, Network::Devnet);
    }

    #[test]
    fn test_parameters_camel_case() {
        let params: TreeParameters = serde_json::from_str(
            r#"{"canopyDepth": 3, "maxDepth": 14, "maxBufferSize": 64, "network": "mainnet-beta"}"#,
        )
        .unwrap();
        assert_eq!(params, TreeParameters::new(3, 14, 64, Network::MainnetBeta));
    }

    #[test]
    fn test_network_defaults_to_devnet() {
        let params: TreeParameters =
            serde_json::from_str(r#"{"canopyDepth": 0, "maxDepth": 5, "maxBufferSize": 8}"#)
                .unwrap();
        assert_eq!(params.network, Network::Devnet);
    }
}
