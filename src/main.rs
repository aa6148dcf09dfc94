//! soltree - API server and operator CLI

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use solana_sdk::{pubkey::Pubkey, signature::Signer as SolanaSigner};

use soltree::api::{start_server, AppState};
use soltree::common::{
    init_from_config, log_system_event, ClusterConfig, SoltreeConfig, SoltreeError,
};
use soltree::sol_client::{
    confirm_tree, load_keypair_from_file, parse_pubkey, prepare_and_record, shorten_address,
    ClusterRpc, SolError, SolanaRpc,
};
use soltree::storage::open_stores;
use soltree::{
    estimate, validate, ConfigurationService, Network, NewTreeConfiguration, TreeParameters,
};

#[derive(Parser)]
#[command(name = "soltree")]
#[command(about = "Compressed Merkle tree sizing, validation and configuration presets")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the REST API server
    Serve {
        /// Listen port (default: API_PORT or 3001)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Validate parameters and print the size and cost estimate
    Estimate(TreeArgs),

    /// Manage configuration presets
    Configs {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Prepare and track tree allocations
    Trees {
        #[command(subcommand)]
        command: TreeCommands,
    },
}

#[derive(Args)]
struct TreeArgs {
    #[arg(short, long)]
    canopy_depth: i64,

    #[arg(short, long)]
    max_depth: i64,

    #[arg(short = 'b', long)]
    max_buffer_size: i64,

    /// devnet or mainnet-beta
    #[arg(short, long, default_value = "devnet")]
    network: Network,
}

impl TreeArgs {
    fn parameters(&self) -> TreeParameters {
        TreeParameters::new(
            self.canopy_depth,
            self.max_depth,
            self.max_buffer_size,
            self.network,
        )
    }
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// List presets
    List,

    /// Show the default preset
    Default,

    /// Create a preset
    Create {
        #[arg(long)]
        name: String,

        #[arg(long)]
        description: Option<String>,

        #[command(flatten)]
        tree: TreeArgs,

        /// Make this the default preset
        #[arg(long)]
        default: bool,
    },

    /// Make a preset the default
    SetDefault { id: String },

    /// Delete a preset
    Delete { id: String },
}

#[derive(Subcommand)]
enum TreeCommands {
    /// List tree records
    List,

    /// Build and simulate an allocation transaction for a new tree
    ///
    /// Prints the tree-signed transaction as base64 for the payer to sign.
    Prepare {
        /// Fee payer public key
        #[arg(long, conflicts_with = "payer_keypair")]
        payer: Option<String>,

        /// Fee payer keypair file (only the public key is used)
        #[arg(long, env = "SOLTREE_PAYER_KEYPAIR")]
        payer_keypair: Option<String>,

        #[command(flatten)]
        tree: TreeArgs,
    },

    /// Record the wallet's signature and check confirmation
    Confirm { id: String, signature: String },
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!(target: "soltree::system", code = e.error_code(), "{}", e);
        eprintln!("error [{}]: {}", e.error_code(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> soltree::Result<()> {
    let config = SoltreeConfig::from_env()?;
    init_from_config(&config)?;

    match cli.command {
        Commands::Serve { port } => serve(config, port).await,
        Commands::Estimate(args) => {
            let validated = validate(&args.parameters())?;
            print_json(&estimate(&validated))
        }
        Commands::Configs { command } => run_configs(&config, command).await,
        Commands::Trees { command } => run_trees(&config, command).await,
    }
}

async fn serve(config: SoltreeConfig, port: Option<u16>) -> soltree::Result<()> {
    config.print_summary();

    let stores = open_stores(&config)?;
    let state = AppState::new(
        ConfigurationService::new(stores.configurations),
        stores.trees,
        config.archive_dir.clone(),
    );

    log_system_event(
        "startup",
        serde_json::json!({ "version": env!("CARGO_PKG_VERSION") }),
    );
    start_server(state, port.unwrap_or(config.api_port)).await?;
    Ok(())
}

async fn run_configs(config: &SoltreeConfig, command: ConfigCommands) -> soltree::Result<()> {
    let stores = open_stores(config)?;
    let service = ConfigurationService::new(stores.configurations);

    match command {
        ConfigCommands::List => print_json(&service.list().await?),
        ConfigCommands::Default => match service.get_default().await? {
            Some(preset) => print_json(&preset),
            None => {
                println!("no default configuration");
                Ok(())
            }
        },
        ConfigCommands::Create {
            name,
            description,
            tree,
            default,
        } => {
            let mut new = NewTreeConfiguration::new(name, tree.parameters());
            if let Some(description) = description {
                new = new.with_description(description);
            }
            if default {
                new = new.as_default();
            }
            print_json(&service.create(new).await?)
        }
        ConfigCommands::SetDefault { id } => print_json(&service.set_default(&id).await?),
        ConfigCommands::Delete { id } => {
            service.delete(&id).await?;
            println!("deleted {}", id);
            Ok(())
        }
    }
}

async fn run_trees(config: &SoltreeConfig, command: TreeCommands) -> soltree::Result<()> {
    let stores = open_stores(config)?;

    match command {
        TreeCommands::List => print_json(&stores.trees.list().await?),
        TreeCommands::Prepare {
            payer,
            payer_keypair,
            tree,
        } => {
            let payer = resolve_payer(payer, payer_keypair)?;
            let validated = validate(&tree.parameters())?;

            let rpc = SolanaRpc::new(&cluster_for(config, validated.network()));
            rpc.health().await?;

            let (prepared, record) =
                prepare_and_record(&rpc, stores.trees.as_ref(), &payer, &validated).await?;

            eprintln!(
                "prepared tree {} ({} bytes, {} lamports, ~{} SOL) on {}",
                shorten_address(&prepared.tree_address.to_string(), 4),
                prepared.space,
                prepared.lamports,
                prepared.estimated_cost,
                rpc.url()
            );
            // The payer signs `transaction` (base64 bincode) and broadcasts it
            print_json(&serde_json::json!({
                "record": record,
                "treeAddress": prepared.tree_address.to_string(),
                "space": prepared.space,
                "lamports": prepared.lamports,
                "estimatedCost": prepared.estimated_cost,
                "transaction": prepared.encoded_transaction()?,
                "simulationLogs": prepared.simulation_logs,
            }))
        }
        TreeCommands::Confirm { id, signature } => {
            let record = stores
                .trees
                .get(&id)
                .await?
                .ok_or_else(|| soltree::StorageError::NotFound(id.clone()))?;
            let rpc = SolanaRpc::new(&cluster_for(config, record.network));
            print_json(&confirm_tree(&rpc, stores.trees.as_ref(), &id, &signature).await?)
        }
    }
}

/// Configured endpoint when the networks match, public endpoint otherwise
fn cluster_for(config: &SoltreeConfig, network: Network) -> ClusterConfig {
    if config.cluster.network == network {
        config.cluster.clone()
    } else {
        ClusterConfig::new(network, None)
    }
}

fn resolve_payer(
    payer: Option<String>,
    payer_keypair: Option<String>,
) -> Result<Pubkey, SolError> {
    match (payer, payer_keypair) {
        (Some(address), _) => parse_pubkey(&address),
        (None, Some(path)) => Ok(load_keypair_from_file(&path)?.pubkey()),
        (None, None) => Err(SolError::NoPayerSet),
    }
}

fn print_json<T: Serialize>(value: &T) -> soltree::Result<()> {
    println!("{}", serde_json::to_string_pretty(value).map_err(SoltreeError::from)?);
    Ok(())
}
