//! Solana Cluster Client
//!
//! Prepares compressed Merkle tree account allocations. The account size
//! comes from the sizing model; rent comes from the cluster.
//!
//! Flow:
//! 1. Validated parameters → `estimate_account_size` → rent-exempt lamports
//! 2. `create_account` owned by the account-compression program, partially
//!    signed by a fresh tree keypair
//! 3. Simulated against the cluster, then handed back for the wallet to
//!    sign and broadcast
//!
//! The payer never signs here and nothing is broadcast.

use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    hash::Hash,
    pubkey::Pubkey,
    rent::Rent,
    signature::{Keypair, Signature, Signer as SolanaSigner},
    system_instruction,
    transaction::Transaction,
};
use std::str::FromStr;

use crate::common::config::ClusterConfig;
use crate::common::logging::log_tree_event;
use crate::sizing::{estimate_account_size, estimate_creation_cost};
use crate::storage::{StorageError, TreeRecordStore};
use crate::types::{TreeRecord, TreeStatus, ValidatedParameters};
use crate::validation::ValidationError;

// ============================================================================
// Constants
// ============================================================================

/// SPL account-compression program ID
pub const ACCOUNT_COMPRESSION_PROGRAM_ID: Pubkey =
    solana_sdk::pubkey!("cmtDvXumGCrqC1Age74AVPhSRVXJMd8PJS91L8KbNCK");

// ============================================================================
// Helper Functions
// ============================================================================

/// Parse pubkey from string
pub fn parse_pubkey(s: &str) -> Result<Pubkey, SolError> {
    Pubkey::from_str(s).map_err(|e| SolError::InvalidAddress(e.to_string()))
}

/// True when `address` is a well-formed base58 public key
pub fn validate_solana_address(address: &str) -> bool {
    Pubkey::from_str(address).is_ok()
}

/// `abcd...wxyz` form of an address for display
pub fn shorten_address(address: &str, chars: usize) -> String {
    let total = address.chars().count();
    let head: String = address.chars().take(chars).collect();
    let tail: String = address.chars().skip(total.saturating_sub(chars)).collect();
    format!("{}...{}", head, tail)
}

/// Rent-exempt minimum for `space` bytes using the default rent schedule
///
/// Offline approximation; the cluster value from
/// [`ClusterRpc::minimum_balance_for_rent_exemption`] is authoritative.
pub fn default_rent_exempt_lamports(space: u64) -> u64 {
    Rent::default().minimum_balance(space as usize)
}

// ============================================================================
// Cluster RPC
// ============================================================================

/// Outcome of a transaction simulation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulationReport {
    /// Transaction error reported by the cluster, if any
    pub err: Option<String>,
    pub logs: Vec<String>,
    pub units_consumed: Option<u64>,
}

/// The cluster operations the allocation flow depends on
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClusterRpc: Send + Sync {
    /// Rent-exempt minimum balance for an account of `space` bytes
    async fn minimum_balance_for_rent_exemption(&self, space: u64) -> Result<u64, SolError>;

    async fn latest_blockhash(&self) -> Result<Hash, SolError>;

    /// Simulate without signature verification
    async fn simulate(&self, transaction: &Transaction) -> Result<SimulationReport, SolError>;

    async fn account_exists(&self, address: &Pubkey) -> Result<bool, SolError>;

    /// True once the signature reached the client's commitment level without error
    async fn confirm_transaction(&self, signature: &Signature) -> Result<bool, SolError>;

    async fn health(&self) -> Result<(), SolError>;
}

/// [`ClusterRpc`] over the Solana JSON-RPC API
pub struct SolanaRpc {
    rpc: RpcClient,
}

impl SolanaRpc {
    /// Connect to the configured cluster with `confirmed` commitment
    pub fn new(cluster: &ClusterConfig) -> Self {
        let rpc = RpcClient::new_with_commitment(
            cluster.rpc_endpoint.clone(),
            CommitmentConfig::confirmed(),
        );
        Self { rpc }
    }

    pub fn url(&self) -> String {
        self.rpc.url()
    }
}

fn rpc_err(e: impl std::fmt::Display) -> SolError {
    SolError::RpcError(e.to_string())
}

#[async_trait]
impl ClusterRpc for SolanaRpc {
    async fn minimum_balance_for_rent_exemption(&self, space: u64) -> Result<u64, SolError> {
        let space = usize::try_from(space).map_err(rpc_err)?;
        self.rpc
            .get_minimum_balance_for_rent_exemption(space)
            .await
            .map_err(rpc_err)
    }

    async fn latest_blockhash(&self) -> Result<Hash, SolError> {
        self.rpc.get_latest_blockhash().await.map_err(rpc_err)
    }

    async fn simulate(&self, transaction: &Transaction) -> Result<SimulationReport, SolError> {
        let response = self
            .rpc
            .simulate_transaction(transaction)
            .await
            .map_err(rpc_err)?;

        let result = response.value;
        Ok(SimulationReport {
            err: result.err.map(|e| e.to_string()),
            logs: result.logs.unwrap_or_default(),
            units_consumed: result.units_consumed,
        })
    }

    async fn account_exists(&self, address: &Pubkey) -> Result<bool, SolError> {
        let response = self
            .rpc
            .get_account_with_commitment(address, self.rpc.commitment())
            .await
            .map_err(rpc_err)?;
        Ok(response.value.is_some())
    }

    async fn confirm_transaction(&self, signature: &Signature) -> Result<bool, SolError> {
        self.rpc.confirm_transaction(signature).await.map_err(rpc_err)
    }

    async fn health(&self) -> Result<(), SolError> {
        self.rpc.get_health().await.map_err(rpc_err)
    }
}

// ============================================================================
// Tree Allocation
// ============================================================================

/// A simulated allocation transaction awaiting the payer's signature
#[derive(Debug, Clone)]
pub struct PreparedTree {
    pub tree_address: Pubkey,
    /// Account size in bytes, exactly `estimate_account_size`
    pub space: u64,
    /// Rent-exempt lamports funding the account
    pub lamports: u64,
    /// Approximate creation cost in SOL, three decimals
    pub estimated_cost: String,
    /// Signed by the tree keypair only
    pub transaction: Transaction,
    pub simulation_logs: Vec<String>,
}

impl PreparedTree {
    /// Wire form of the partially-signed transaction: bincode, then standard
    /// base64, as wallets and `sendTransaction` accept it
    pub fn encoded_transaction(&self) -> Result<String, SolError> {
        let bytes = bincode::serialize(&self.transaction)
            .map_err(|e| SolError::Encoding(e.to_string()))?;
        Ok(base64::Engine::encode(
            &base64::engine::general_purpose::STANDARD,
            bytes,
        ))
    }
}

/// Inverse of [`PreparedTree::encoded_transaction`]
pub fn decode_transaction(encoded: &str) -> Result<Transaction, SolError> {
    let bytes = base64::Engine::decode(&base64::engine::general_purpose::STANDARD, encoded.trim())
        .map_err(|e| SolError::Encoding(e.to_string()))?;
    bincode::deserialize(&bytes).map_err(|e| SolError::Encoding(e.to_string()))
}

/// Build, tree-sign and simulate the account allocation for a new tree
pub async fn prepare_tree_allocation(
    rpc: &dyn ClusterRpc,
    payer: &Pubkey,
    params: &ValidatedParameters,
) -> Result<PreparedTree, SolError> {
    let space = estimate_account_size(
        params.max_depth(),
        params.max_buffer_size(),
        params.canopy_depth(),
    );
    let lamports = rpc.minimum_balance_for_rent_exemption(space).await?;

    let tree_keypair = Keypair::new();
    let tree_address = tree_keypair.pubkey();

    let ix = system_instruction::create_account(
        payer,
        &tree_address,
        lamports,
        space,
        &ACCOUNT_COMPRESSION_PROGRAM_ID,
    );

    let blockhash = rpc.latest_blockhash().await?;
    let mut transaction = Transaction::new_with_payer(&[ix], Some(payer));
    transaction
        .try_partial_sign(&[&tree_keypair], blockhash)
        .map_err(|e| SolError::InvalidKeypair(e.to_string()))?;

    let report = rpc.simulate(&transaction).await?;
    if let Some(err) = report.err {
        log_tree_event(
            "allocation_simulation_failed",
            &tree_address.to_string(),
            space,
            false,
            Some(&err),
        );
        return Err(SolError::SimulationFailed {
            reason: err,
            logs: report.logs,
        });
    }

    log_tree_event("allocation_prepared", &tree_address.to_string(), space, true, None);

    Ok(PreparedTree {
        tree_address,
        space,
        lamports,
        estimated_cost: estimate_creation_cost(params.canopy_depth(), params.max_buffer_size()),
        transaction,
        simulation_logs: report.logs,
    })
}

/// Prepare an allocation and store a pending record for it
pub async fn prepare_and_record(
    rpc: &dyn ClusterRpc,
    store: &dyn TreeRecordStore,
    payer: &Pubkey,
    params: &ValidatedParameters,
) -> Result<(PreparedTree, TreeRecord), SolError> {
    let prepared = prepare_tree_allocation(rpc, payer, params).await?;
    let record = TreeRecord::new(prepared.tree_address.to_string(), params);
    store.insert(&record).await?;
    Ok((prepared, record))
}

/// Check a submitted signature and move the record to its next status
///
/// A confirmed signature whose tree account exists marks the record
/// `confirmed`; confirmed without the account is `failed`. An unconfirmed
/// signature leaves it `submitted` with the signature attached.
pub async fn confirm_tree(
    rpc: &dyn ClusterRpc,
    store: &dyn TreeRecordStore,
    record_id: &str,
    signature: &str,
) -> Result<TreeRecord, SolError> {
    let parsed =
        Signature::from_str(signature).map_err(|e| SolError::InvalidSignature(e.to_string()))?;

    let record = store
        .get(record_id)
        .await?
        .ok_or_else(|| StorageError::NotFound(record_id.to_string()))?;
    if record.is_terminal() {
        return Ok(record);
    }
    let tree_address = parse_pubkey(&record.tree_address)?;

    let status = if !rpc.confirm_transaction(&parsed).await? {
        TreeStatus::Submitted
    } else if rpc.account_exists(&tree_address).await? {
        TreeStatus::Confirmed
    } else {
        TreeStatus::Failed
    };

    let record = store
        .update_status(record_id, status, Some(signature.to_string()))
        .await?;
    log_tree_event(
        "tree_status_updated",
        &record.tree_address,
        0,
        status != TreeStatus::Failed,
        (status == TreeStatus::Failed).then_some("confirmed without a tree account"),
    );
    Ok(record)
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum SolError {
    #[error("no payer keypair set")]
    NoPayerSet,

    #[error("invalid keypair: {0}")]
    InvalidKeypair(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("transaction encoding error: {0}")]
    Encoding(String),

    #[error("RPC error: {0}")]
    RpcError(String),

    #[error("simulation failed: {reason}")]
    SimulationFailed { reason: String, logs: Vec<String> },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("tree record error: {0}")]
    Storage(#[from] StorageError),
}

// ============================================================================
// Helpers
// ============================================================================

/// Load a payer keypair from a JSON byte-array file (Solana CLI format)
pub fn load_keypair_from_file(path: &str) -> Result<Keypair, SolError> {
    let content =
        std::fs::read_to_string(path).map_err(|e| SolError::InvalidKeypair(e.to_string()))?;
    let bytes: Vec<u8> =
        serde_json::from_str(&content).map_err(|e| SolError::InvalidKeypair(e.to_string()))?;
    Keypair::try_from(bytes.as_slice()).map_err(|e| SolError::InvalidKeypair(e.to_string()))
}
