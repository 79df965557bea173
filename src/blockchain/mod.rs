//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! TransferRequest (hex key, destination, whole-unit amount)
//!     → wallet.rs (key parsing, sender address)
//!     → transaction.rs (reserve check, nonce, gas, abi.rs call data)
//!     → signer.rs (EIP-155 legacy signature)
//!     → broadcast.rs (eth_sendRawTransaction)
//!     → confirmation.rs (bounded receipt polling)
//!
//! balance.rs reads native and token balances independently.
//! Every component talks to the node through node.rs; client.rs is the
//! JSON-RPC implementation with timeouts and failover.
//! ```
//!
//! # Security Constraints
//! - Signing keys arrive per request and are dropped after signing
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts

pub mod abi;
pub mod balance;
pub mod broadcast;
pub mod client;
pub mod confirmation;
pub mod node;
pub mod signer;
pub mod transaction;
pub mod types;
pub mod units;
pub mod wallet;

pub use balance::BalanceReader;
pub use broadcast::Broadcaster;
pub use client::BlockchainClient;
pub use confirmation::{ConfirmationPoller, Observation, PollHandle, PollState};
pub use node::{CallRequest, NodeRpc, TxLookup};
pub use signer::sign_transaction;
pub use transaction::TxBuilder;
pub use types::{
    BalanceSnapshot, BlockchainConfig, BlockchainError, BlockchainResult, ChainId,
    ConfirmationOutcome, SigningKeyHex, TransferKind, TransferRequest,
};
pub use wallet::KeyMaterial;
