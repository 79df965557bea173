//! The node RPC boundary every component talks through.
//!
//! Components hold an `Arc<dyn NodeRpc>` handed to them at construction.
//! `BlockchainClient` is the JSON-RPC implementation; tests substitute a
//! scripted node.

use alloy::primitives::{Address, Bytes, TxHash, U256};
use async_trait::async_trait;

use crate::blockchain::types::{BlockchainResult, ReceiptInfo};

/// Parameters of a simulated call (`eth_estimateGas`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    pub from: Address,
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
}

/// What `eth_getTransactionByHash` tells us about a known transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxLookup {
    /// `None` while the transaction sits in the mempool.
    pub block_number: Option<u64>,
}

impl TxLookup {
    pub fn pending() -> Self {
        Self { block_number: None }
    }

    pub fn mined(block_number: u64) -> Self {
        Self {
            block_number: Some(block_number),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.block_number.is_none()
    }
}

/// Outbound node calls used by the engine.
///
/// Implementations must be safe to share across tasks without external locking.
#[async_trait]
pub trait NodeRpc: Send + Sync {
    /// `eth_chainId`
    async fn chain_id(&self) -> BlockchainResult<u64>;

    /// `eth_getBalance` at the latest block.
    async fn balance_at(&self, address: Address) -> BlockchainResult<U256>;

    /// `eth_call` at the latest block.
    async fn call(&self, to: Address, data: Bytes) -> BlockchainResult<Bytes>;

    /// `eth_getTransactionCount` at the pending block.
    async fn pending_nonce_at(&self, address: Address) -> BlockchainResult<u64>;

    /// `eth_gasPrice`
    async fn suggest_gas_price(&self) -> BlockchainResult<u128>;

    /// `eth_estimateGas`
    async fn estimate_gas(&self, call: &CallRequest) -> BlockchainResult<u64>;

    /// `eth_sendRawTransaction`
    async fn send_raw_transaction(&self, raw: &[u8]) -> BlockchainResult<TxHash>;

    /// `eth_getTransactionByHash`; `Ok(None)` when the node does not know the hash.
    async fn transaction_by_hash(&self, hash: TxHash) -> BlockchainResult<Option<TxLookup>>;

    /// `eth_getTransactionReceipt`; `Ok(None)` until the transaction is mined.
    async fn transaction_receipt(&self, hash: TxHash) -> BlockchainResult<Option<ReceiptInfo>>;
}
