//! Blockchain RPC client with timeout and error handling.
//!
//! # Responsibilities
//! - Connect to JSON-RPC endpoint
//! - Query chain state (balances, nonces, gas, transactions, receipts)
//! - Handle timeouts and network errors gracefully
//! - Provide health check for blockchain connectivity

use alloy::network::{ReceiptResponse as _, TransactionBuilder};
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::transports::TransportResult;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::blockchain::node::{CallRequest, NodeRpc, TxLookup};
use crate::blockchain::types::{
    BlockchainConfig, BlockchainError, BlockchainResult, ChainId, ReceiptInfo, ReceiptStatus,
};
use crate::observability::metrics;

/// Blockchain RPC client wrapper with failover support.
///
/// Configuration is fixed at construction; clones share the same providers.
#[derive(Clone)]
pub struct BlockchainClient {
    /// List of providers (primary + failovers).
    providers: Vec<Arc<dyn Provider + Send + Sync>>,
    /// Configuration.
    config: BlockchainConfig,
    /// Request timeout duration.
    timeout_duration: Duration,
}

impl BlockchainClient {
    /// Create a new blockchain client.
    ///
    /// Succeeds even when the node is unreachable; a chain ID mismatch is
    /// logged, not fatal.
    pub async fn new(config: BlockchainConfig) -> BlockchainResult<Self> {
        let timeout_duration = Duration::from_secs(config.rpc_timeout_secs);
        let mut providers = Vec::new();

        // 1. Add primary provider
        let primary_url: url::Url = config.rpc_url.parse().map_err(|e| {
            BlockchainError::Network(format!("Invalid RPC URL '{}': {}", config.rpc_url, e))
        })?;
        providers.push(Arc::new(ProviderBuilder::new().connect_http(primary_url))
            as Arc<dyn Provider + Send + Sync>);

        // 2. Add failover providers
        for url_str in &config.failover_urls {
            if let Ok(url) = url_str.parse() {
                providers.push(Arc::new(ProviderBuilder::new().connect_http(url))
                    as Arc<dyn Provider + Send + Sync>);
            } else {
                tracing::warn!(url = %url_str, "Ignoring invalid failover RPC URL");
            }
        }

        let client = Self {
            providers,
            config: config.clone(),
            timeout_duration,
        };

        match client.verify_chain_id().await {
            Ok(()) => {
                tracing::info!(
                    rpc_url = %config.rpc_url,
                    chain_id = config.chain_id,
                    "Blockchain client initialized"
                );
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Blockchain client initialized but chain verification failed"
                );
            }
        }

        Ok(client)
    }

    /// Verify the connected chain ID matches configuration.
    pub async fn verify_chain_id(&self) -> BlockchainResult<()> {
        let chain_id = self.get_chain_id().await?;
        if chain_id.0 != self.config.chain_id {
            return Err(BlockchainError::ChainMismatch {
                expected: self.config.chain_id,
                actual: chain_id.0,
            });
        }
        Ok(())
    }

    /// Get the chain ID from the RPC.
    pub async fn get_chain_id(&self) -> BlockchainResult<ChainId> {
        self.with_failover("get_chain_id", |p| async move { p.get_chain_id().await })
            .await
            .map(ChainId)
    }

    /// Check if the blockchain is reachable and healthy.
    pub async fn is_healthy(&self) -> bool {
        let healthy = self
            .with_failover("get_block_number", |p| async move { p.get_block_number().await })
            .await
            .is_ok();
        metrics::record_node_health(healthy);
        healthy
    }

    /// Get the configuration.
    pub fn config(&self) -> &BlockchainConfig {
        &self.config
    }

    /// Run `op` against each provider in order until one answers in time.
    async fn with_failover<'a, T, F, Fut>(&'a self, op: &'static str, f: F) -> BlockchainResult<T>
    where
        F: Fn(&'a (dyn Provider + Send + Sync)) -> Fut,
        Fut: Future<Output = TransportResult<T>> + 'a,
    {
        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, f(provider.as_ref())).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => {
                    tracing::warn!(provider_idx = i, op, error = %e, "RPC error, trying next provider")
                }
                Err(_) => tracing::warn!(provider_idx = i, op, "RPC timeout, trying next provider"),
            }
        }
        Err(BlockchainError::Network(format!("All providers failed: {}", op)))
    }
}

#[async_trait]
impl NodeRpc for BlockchainClient {
    async fn chain_id(&self) -> BlockchainResult<u64> {
        self.get_chain_id().await.map(u64::from)
    }

    async fn balance_at(&self, address: Address) -> BlockchainResult<U256> {
        self.with_failover("get_balance", |p| async move { p.get_balance(address).await })
            .await
    }

    async fn call(&self, to: Address, data: Bytes) -> BlockchainResult<Bytes> {
        let tx = TransactionRequest::default().with_to(to).with_input(data);
        self.with_failover("call", |p| {
            let tx = tx.clone();
            async move { p.call(tx).await }
        })
        .await
    }

    async fn pending_nonce_at(&self, address: Address) -> BlockchainResult<u64> {
        self.with_failover("get_transaction_count", |p| async move {
            p.get_transaction_count(address).pending().await
        })
        .await
    }

    async fn suggest_gas_price(&self) -> BlockchainResult<u128> {
        self.with_failover("get_gas_price", |p| async move { p.get_gas_price().await })
            .await
    }

    async fn estimate_gas(&self, call: &CallRequest) -> BlockchainResult<u64> {
        let tx = TransactionRequest::default()
            .with_from(call.from)
            .with_to(call.to)
            .with_input(call.data.clone())
            .with_value(call.value);
        self.with_failover("estimate_gas", |p| {
            let tx = tx.clone();
            async move { p.estimate_gas(tx).await }
        })
        .await
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> BlockchainResult<TxHash> {
        // Primary only: a broadcast is never replayed against another endpoint.
        let provider = &self.providers[0];
        match timeout(self.timeout_duration, provider.send_raw_transaction(raw)).await {
            Ok(Ok(pending)) => Ok(*pending.tx_hash()),
            Ok(Err(e)) => Err(BlockchainError::BroadcastFailed(e.to_string())),
            Err(_) => Err(BlockchainError::BroadcastFailed(format!(
                "send_raw_transaction timed out after {}s",
                self.config.rpc_timeout_secs
            ))),
        }
    }

    async fn transaction_by_hash(&self, hash: TxHash) -> BlockchainResult<Option<TxLookup>> {
        let tx = self
            .with_failover("get_transaction_by_hash", |p| async move {
                p.get_transaction_by_hash(hash).await
            })
            .await?;
        Ok(tx.map(|tx| TxLookup {
            block_number: tx.block_number,
        }))
    }

    async fn transaction_receipt(&self, hash: TxHash) -> BlockchainResult<Option<ReceiptInfo>> {
        let receipt = self
            .with_failover("get_transaction_receipt", |p| async move {
                p.get_transaction_receipt(hash).await
            })
            .await?;
        Ok(receipt.map(|r| ReceiptInfo {
            status: if r.status() {
                ReceiptStatus::Success
            } else {
                ReceiptStatus::Reverted
            },
            block_number: r.block_number,
            gas_used: r.gas_used,
        }))
    }
}

impl std::fmt::Debug for BlockchainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockchainClient")
            .field("rpc_url", &self.config.rpc_url)
            .field("chain_id", &self.config.chain_id)
            .field("providers", &self.providers.len())
            .field("timeout_secs", &self.config.rpc_timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> BlockchainConfig {
        BlockchainConfig {
            // Nothing listens on the discard port
            rpc_url: "http://127.0.0.1:9".to_string(),
            failover_urls: Vec::new(),
            chain_id: 31337, // Anvil default
            rpc_timeout_secs: 2,
        }
    }

    #[tokio::test]
    async fn test_client_creation_tolerates_unreachable_node() {
        let result = BlockchainClient::new(test_config()).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_primary_url() {
        let mut config = test_config();
        config.rpc_url = "not a url".to_string();
        let err = BlockchainClient::new(config).await.unwrap_err();
        assert!(matches!(err, BlockchainError::Network(_)));
    }

    #[tokio::test]
    async fn test_rpc_failover_exhausts_every_provider() {
        let mut config = test_config();
        config.failover_urls.push("http://127.0.0.1:10".to_string());
        config.failover_urls.push("::not-a-url::".to_string());

        let client = BlockchainClient::new(config).await.unwrap();
        assert_eq!(client.providers.len(), 2);

        let result = client.pending_nonce_at(Address::ZERO).await;
        let err = result.unwrap_err();
        assert!(err.to_string().contains("All providers failed: get_transaction_count"));
        assert!(!client.is_healthy().await);
    }

    #[tokio::test]
    async fn test_rejected_broadcast_is_single_wrapped() {
        let client = BlockchainClient::new(test_config()).await.unwrap();
        let err = client.send_raw_transaction(&[0x01]).await.unwrap_err();
        assert!(matches!(err, BlockchainError::BroadcastFailed(_)));
        assert!(!err.to_string().contains("Network error"));
    }
}
