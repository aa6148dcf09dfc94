//! Environment-based Configuration for soltree
//!
//! Configuration is loaded once at startup (optionally from a `.env` file)
//! and passed explicitly to the components that need it. Nothing reads the
//! environment after startup.
//!
//! # Environment Variables
//!
//! ## Cluster
//! - `SOLTREE_NETWORK` - "devnet" or "mainnet-beta" (default: "devnet")
//! - `SOLTREE_RPC_URL` - Custom RPC endpoint (default: public cluster endpoint)
//!
//! ## Storage
//! - `SOLTREE_STORE` - "sqlite", "file" or "memory" (default: "sqlite")
//! - `SOLTREE_DB_PATH` - SQLite database path (default: "data/soltree.db")
//! - `SOLTREE_CONFIG_FILE` - JSON store path (default: "data/soltree-configurations.json")
//!
//! ## Server
//! - `API_PORT` - REST API port (default: 3001)
//! - `SOLTREE_ARCHIVE_DIR` - Directory holding source archives (default: "shared")
//!
//! ## Logging
//! - `SOLTREE_LOG_LEVEL` - Logging level (debug, info, warn, error)
//! - `SOLTREE_LOG_JSON` - Set to "1" for JSON log output

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

use crate::types::Network;

/// Default REST API port
pub const DEFAULT_API_PORT: u16 = 3001;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Which configuration store backs the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Sqlite,
    File,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlite" | "db" => Ok(StoreBackend::Sqlite),
            "file" | "json" => Ok(StoreBackend::File),
            "memory" | "mem" => Ok(StoreBackend::Memory),
            _ => Err(ConfigError::InvalidValue(
                "SOLTREE_STORE".to_string(),
                format!("unknown store: {} (use 'sqlite', 'file' or 'memory')", s),
            )),
        }
    }
}

/// Cluster selection handed to the RPC collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterConfig {
    pub network: Network,
    pub rpc_endpoint: String,
}

impl ClusterConfig {
    /// Public endpoint for the network, or a custom one if given
    pub fn new(network: Network, custom_rpc: Option<String>) -> Self {
        let rpc_endpoint = custom_rpc.unwrap_or_else(|| network.default_rpc_url().to_string());
        Self {
            network,
            rpc_endpoint,
        }
    }
}

/// Main configuration struct
#[derive(Debug, Clone)]
pub struct SoltreeConfig {
    /// Cluster and RPC endpoint
    pub cluster: ClusterConfig,

    /// Configuration store backend
    pub store: StoreBackend,

    /// SQLite database path
    pub db_path: PathBuf,

    /// JSON configuration file path
    pub config_file: PathBuf,

    /// Directory searched for source archives
    pub archive_dir: PathBuf,

    /// REST API port
    pub api_port: u16,

    /// Log level
    pub log_level: String,

    /// Emit JSON logs
    pub log_json: bool,
}

impl Default for SoltreeConfig {
    fn default() -> Self {
        Self {
            cluster: ClusterConfig::new(Network::Devnet, None),
            store: StoreBackend::Sqlite,
            db_path: PathBuf::from("data/soltree.db"),
            config_file: PathBuf::from("data/soltree-configurations.json"),
            archive_dir: PathBuf::from("shared"),
            api_port: DEFAULT_API_PORT,
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

impl SoltreeConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let network = match var("SOLTREE_NETWORK") {
            Some(value) => value
                .parse::<Network>()
                .map_err(|e| ConfigError::InvalidValue("SOLTREE_NETWORK".to_string(), e))?,
            None => Network::Devnet,
        };

        let custom_rpc = var("SOLTREE_RPC_URL").filter(|v| !v.trim().is_empty());
        if let Some(url) = &custom_rpc {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidValue(
                    "SOLTREE_RPC_URL".to_string(),
                    format!("not an http(s) URL: {}", url),
                ));
            }
        }

        let store = match var("SOLTREE_STORE") {
            Some(value) => value.parse()?,
            None => defaults.store,
        };

        let api_port = match var("API_PORT") {
            Some(value) => value.parse().map_err(|_| {
                ConfigError::InvalidValue("API_PORT".to_string(), "must be a port number".to_string())
            })?,
            None => defaults.api_port,
        };

        Ok(Self {
            cluster: ClusterConfig::new(network, custom_rpc),
            store,
            db_path: var("SOLTREE_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            config_file: var("SOLTREE_CONFIG_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.config_file),
            archive_dir: var("SOLTREE_ARCHIVE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.archive_dir),
            api_port,
            log_level: var("SOLTREE_LOG_LEVEL").unwrap_or(defaults.log_level),
            log_json: var("SOLTREE_LOG_JSON").map(|v| v == "1").unwrap_or(false),
        })
    }

    /// Log a configuration summary
    pub fn print_summary(&self) {
        tracing::info!(
            target: "soltree::config",
            network = %self.cluster.network,
            rpc = %self.cluster.rpc_endpoint,
            store = ?self.store,
            db_path = %self.db_path.display(),
            archive_dir = %self.archive_dir.display(),
            api_port = self.api_port,
            "configuration loaded"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<SoltreeConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        SoltreeConfig::from_vars(|name| map.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.cluster.network, Network::Devnet);
        assert_eq!(config.cluster.rpc_endpoint, "https://api.devnet.solana.com");
        assert_eq!(config.store, StoreBackend::Sqlite);
        assert_eq!(config.api_port, 3001);
        assert!(!config.log_json);
    }

    #[test]
    fn test_mainnet_uses_mainnet_endpoint() {
        let config = load(&[("SOLTREE_NETWORK", "mainnet-beta")]).unwrap();
        assert_eq!(config.cluster.rpc_endpoint, "https://api.mainnet-beta.solana.com");
    }

    #[test]
    fn test_custom_rpc_overrides_default() {
        let config = load(&[
            ("SOLTREE_NETWORK", "devnet"),
            ("SOLTREE_RPC_URL", "http://localhost:8899"),
        ])
        .unwrap();
        assert_eq!(config.cluster.rpc_endpoint, "http://localhost:8899");
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            load(&[("SOLTREE_NETWORK", "testnet")]),
            Err(ConfigError::InvalidValue(..))
        ));
        assert!(matches!(
            load(&[("SOLTREE_RPC_URL", "localhost:8899")]),
            Err(ConfigError::InvalidValue(..))
        ));
        assert!(matches!(
            load(&[("SOLTREE_STORE", "postgres")]),
            Err(ConfigError::InvalidValue(..))
        ));
        assert!(matches!(
            load(&[("API_PORT", "http")]),
            Err(ConfigError::InvalidValue(..))
        ));
    }

    #[test]
    fn test_store_parsing() {
        assert_eq!("memory".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert_eq!("JSON".parse::<StoreBackend>().unwrap(), StoreBackend::File);
        assert_eq!("sqlite".parse::<StoreBackend>().unwrap(), StoreBackend::Sqlite);
    }
}
