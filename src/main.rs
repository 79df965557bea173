//! custody-engine command line.
//!
//! ```text
//! custody-engine [--config engine.toml] balance <address>
//! custody-engine transfer native     --to <addr> --amount 0.5 [--wait]
//! custody-engine transfer token      --to <addr> --amount 100 [--wait]
//! custody-engine transfer token-from --owner <addr> --to <addr> --amount 100 [--wait]
//! custody-engine allowance --owner <addr> --spender <addr>
//! custody-engine status <tx-hash>
//! ```
//!
//! The signing key is read from `CUSTODY_SIGNING_KEY`, never from a flag.

use alloy::primitives::{Address, TxHash};
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;

use custody_engine::blockchain::types::{TransferKind, TransferRequest};
use custody_engine::blockchain::wallet::KeyMaterial;
use custody_engine::config::{load_config, EngineConfig};
use custody_engine::lifecycle::{signals, startup, Shutdown};

#[derive(Parser)]
#[command(name = "custody-engine")]
#[command(about = "Custodial transfer engine for one EVM chain and one token", long_about = None)]
struct Cli {
    /// TOML configuration file; built-in defaults when omitted
    #[arg(short, long, env = "CUSTODY_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Native and token balance of an address
    Balance { address: Address },
    /// Remaining token allowance of a spender over an owner
    Allowance {
        #[arg(long)]
        owner: Address,
        #[arg(long)]
        spender: Address,
    },
    /// Build, sign and broadcast a transfer
    Transfer {
        #[command(subcommand)]
        kind: TransferCommand,
    },
    /// Poll a transaction until it is mined or the poll budget runs out
    Status { hash: TxHash },
}

#[derive(Subcommand)]
enum TransferCommand {
    /// Native coin, minus the configured gas reserve
    Native(TransferArgs),
    /// Token transfer from the signer's own balance
    Token(TransferArgs),
    /// Token transfer out of an owner that approved the signer
    TokenFrom {
        #[arg(long)]
        owner: Address,
        #[command(flatten)]
        args: TransferArgs,
    },
}

#[derive(Args)]
struct TransferArgs {
    #[arg(long)]
    to: Address,
    /// Whole units (ETH, USDT), not base units
    #[arg(long)]
    amount: Decimal,
    /// Poll for the outcome after broadcasting
    #[arg(long)]
    wait: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => EngineConfig::default(),
    };
    startup::init_observability(&config.observability);

    tracing::info!(
        rpc_url = %config.blockchain.rpc_url,
        chain_id = config.blockchain.chain_id,
        "Configuration loaded"
    );

    let shutdown = Shutdown::new();
    tokio::spawn(signals::wait_for_shutdown_signal(shutdown.clone()));
    let engine = startup::build_engine(&config, shutdown).await?;

    match cli.command {
        Commands::Balance { address } => {
            let snapshot = engine.get_balance(address).await?;
            print_json(&serde_json::to_value(snapshot)?)?;
        }
        Commands::Allowance { owner, spender } => {
            let allowance = engine.allowance(owner, spender).await?;
            print_json(&serde_json::json!({
                "owner": owner,
                "spender": spender,
                "allowance": allowance,
                "symbol": engine.token().symbol,
            }))?;
        }
        Commands::Transfer { kind } => {
            let (kind, args) = match kind {
                TransferCommand::Native(args) => (TransferKind::Native, args),
                TransferCommand::Token(args) => (TransferKind::Token, args),
                TransferCommand::TokenFrom { owner, args } => {
                    (TransferKind::TokenFrom { owner }, args)
                }
            };
            let request = TransferRequest {
                signing_key: KeyMaterial::hex_from_env()?,
                to: args.to,
                amount: args.amount,
                kind,
            };

            let hash = engine.transfer(request).await?;
            if args.wait {
                let outcome = engine.check_status(hash).await?;
                print_json(&serde_json::json!({
                    "tx_hash": hash,
                    "outcome": outcome,
                    "message": outcome.state_message(),
                }))?;
            } else {
                print_json(&serde_json::json!({ "tx_hash": hash }))?;
            }
        }
        Commands::Status { hash } => {
            let outcome = engine.check_status(hash).await?;
            print_json(&serde_json::json!({
                "tx_hash": hash,
                "outcome": outcome,
                "message": outcome.state_message(),
            }))?;
        }
    }

    Ok(())
}

fn print_json(value: &serde_json::Value) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
